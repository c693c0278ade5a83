//! Uniform vertex access over the three geometry representations.
//!
//! A sculpt session is backed by exactly one representation at a time:
//! a plain mesh, multiresolution subdivision grids, or a dynamic-topology
//! half-edge mesh. Brush evaluation resolves the concrete accessor once per
//! node batch and runs representation-agnostic from there; per-vertex code
//! never re-checks the representation tag.

mod dyntopo;
mod grids;
mod plain;

pub use dyntopo::DynTopoMesh;
pub use grids::{GridCoord, SubdivGrids};
pub use plain::{build_fake_neighbor_table, label_islands, PlainMesh};

use glam::{Vec3, Vec4};
use smallvec::SmallVec;

/// Reference to a vertex within the session's active representation.
///
/// Plain meshes use the vertex index directly; grids use a linear index
/// decoded as `(grid, x, y)`; dynamic-topology meshes use the half-edge
/// vertex id. A reference is only meaningful for the representation that
/// produced it, and for dynamic topology only until the next
/// topology-generation bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertRef(pub u32);

/// Inline-capacity neighbor list; valence above 8 spills to the heap.
pub type Neighbors = SmallVec<[VertRef; 8]>;

/// Read/write vertex access shared by all representations.
pub trait GeometryAccessor: Sync {
    fn vertex_count(&self) -> usize;
    fn position(&self, vert: VertRef) -> Vec3;
    fn normal(&self, vert: VertRef) -> Vec3;
    /// Sculpt mask in [0, 1].
    fn mask(&self, vert: VertRef) -> f32;
    fn is_hidden(&self, vert: VertRef) -> bool;
    /// Whether the vertex lies on a boundary: it touches an edge with fewer
    /// than two visible incident faces. Face hide state participates for
    /// every representation.
    fn is_boundary(&self, vert: VertRef) -> bool;
    /// Edge-connected neighbors, deduplicated. Order is stable within one
    /// call but not across calls or representations.
    fn neighbors(&self, vert: VertRef, out: &mut Neighbors);
    fn set_position(&mut self, vert: VertRef, position: Vec3);
    fn set_mask(&mut self, vert: VertRef, mask: f32);

    /// Paint color, linear RGBA. Representations without a color layer
    /// report white and ignore writes.
    fn color(&self, _vert: VertRef) -> Vec4 {
        Vec4::ONE
    }
    fn set_color(&mut self, _vert: VertRef, _color: Vec4) {}

    /// Neighbors usable by smoothing without eroding open boundaries:
    /// a boundary vertex with exactly two neighbors is a corner and gets
    /// none; other boundary vertices only see boundary neighbors.
    fn neighbors_interior(&self, vert: VertRef, out: &mut Neighbors) {
        self.neighbors(vert, out);
        if self.is_boundary(vert) {
            if out.len() == 2 {
                out.clear();
            } else {
                out.retain(|&mut n| self.is_boundary(n));
            }
        }
    }
}

/// The session's active representation.
#[derive(Debug)]
pub enum MeshData {
    Plain(PlainMesh),
    Grids(SubdivGrids),
    DynTopo(DynTopoMesh),
}

impl MeshData {
    pub fn accessor(&self) -> &dyn GeometryAccessor {
        match self {
            MeshData::Plain(mesh) => mesh,
            MeshData::Grids(grids) => grids,
            MeshData::DynTopo(mesh) => mesh,
        }
    }

    pub fn accessor_mut(&mut self) -> &mut dyn GeometryAccessor {
        match self {
            MeshData::Plain(mesh) => mesh,
            MeshData::Grids(grids) => grids,
            MeshData::DynTopo(mesh) => mesh,
        }
    }

    pub fn is_dyntopo(&self) -> bool {
        matches!(self, MeshData::DynTopo(_))
    }

    /// Representation-specific access. Calling the wrong one is a
    /// programming error; silently returning zero-filled data would corrupt
    /// deformation math undetectably, so these fail fast instead.
    pub fn as_plain(&self) -> &PlainMesh {
        match self {
            MeshData::Plain(mesh) => mesh,
            other => panic!("expected plain mesh, session is backed by {}", other.name()),
        }
    }

    pub fn as_plain_mut(&mut self) -> &mut PlainMesh {
        match self {
            MeshData::Plain(mesh) => mesh,
            other => panic!("expected plain mesh, session is backed by {}", other.name()),
        }
    }

    pub fn as_grids(&self) -> &SubdivGrids {
        match self {
            MeshData::Grids(grids) => grids,
            other => panic!("expected subdivision grids, session is backed by {}", other.name()),
        }
    }

    pub fn as_dyntopo(&self) -> &DynTopoMesh {
        match self {
            MeshData::DynTopo(mesh) => mesh,
            other => panic!(
                "expected dynamic-topology mesh, session is backed by {}",
                other.name()
            ),
        }
    }

    pub fn as_dyntopo_mut(&mut self) -> &mut DynTopoMesh {
        match self {
            MeshData::DynTopo(mesh) => mesh,
            other => panic!(
                "expected dynamic-topology mesh, session is backed by {}",
                other.name()
            ),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            MeshData::Plain(_) => "plain mesh",
            MeshData::Grids(_) => "subdivision grids",
            MeshData::DynTopo(_) => "dynamic-topology mesh",
        }
    }
}
