//! Mesh filter cache.
//!
//! Filters are "configure once, iterate N times" operations over a fixed
//! vertex set, as opposed to interactive strokes. The cache pins the node
//! list, orientation and scratch buffers at filter start so every iteration
//! sees the same frame of reference.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::automask::{AutomaskCache, AutomaskSettings};
use crate::brush_test::BrushTest;
use crate::cache::StrokeCache;
use crate::mesh::{GeometryAccessor, Neighbors, VertRef};
use crate::spatial::{NodeId, SpatialIndex};
use crate::types::FalloffShape;

/// Space in which filter displacements are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterOrientation {
    #[default]
    Local = 0,
    World,
    View,
}

/// State pinned for the lifetime of one mesh filter.
pub struct FilterCache {
    pub orientation: FilterOrientation,
    /// Object-to-world rotation, for World orientation.
    pub obmat: Mat3,
    /// World-to-view rotation, for View orientation.
    pub viewmat: Mat3,
    /// Every node the filter touches, fixed at start.
    pub nodes: Vec<NodeId>,
    /// View direction at filter start, when a viewport exists.
    pub view_normal: Option<Vec3>,
    /// Per-vertex Laplacian displacement scratch, sized to the mesh.
    pub laplacian_disp: Vec<Vec3>,
    /// Per-vertex sharpen intensity, normalized to [0, 1].
    pub sharpen_factor: Vec<f32>,
    pub automask: Option<AutomaskCache>,
}

impl FilterCache {
    /// Gather all non-empty nodes and allocate the scratch buffers.
    pub fn new(
        index: &dyn SpatialIndex,
        accessor: &dyn GeometryAccessor,
        orientation: FilterOrientation,
        obmat: Mat3,
        viewmat: Mat3,
        view_normal: Option<Vec3>,
        automask_settings: Option<&AutomaskSettings>,
    ) -> Self {
        let nodes: Vec<NodeId> = index.all_nodes();
        let vert_count = accessor.vertex_count();
        let automask = automask_settings
            .filter(|s| s.enabled())
            .map(|s| AutomaskCache::build(s, accessor, view_normal));
        debug!(nodes = nodes.len(), verts = vert_count, "filter cache created");
        Self {
            orientation,
            obmat,
            viewmat,
            nodes,
            view_normal,
            laplacian_disp: vec![Vec3::ZERO; vert_count],
            sharpen_factor: vec![0.0; vert_count],
            automask,
        }
    }

    /// Rotate a local-space displacement into the configured orientation
    /// and back, so e.g. a view-space "inflate along Z" tracks the camera.
    pub fn to_orientation(&self, local: Vec3) -> Vec3 {
        match self.orientation {
            FilterOrientation::Local => local,
            FilterOrientation::World => self.obmat * local,
            FilterOrientation::View => self.viewmat * (self.obmat * local),
        }
    }

    pub fn from_orientation(&self, oriented: Vec3) -> Vec3 {
        match self.orientation {
            FilterOrientation::Local => oriented,
            FilterOrientation::World => self.obmat.transpose() * oriented,
            FilterOrientation::View => {
                self.obmat.transpose() * (self.viewmat.transpose() * oriented)
            }
        }
    }

    /// Brush test for radius-limited filters. Projected falloff needs a
    /// view; headless iteration falls back to the sphere.
    pub fn make_test(&self, cache: &StrokeCache, shape: FalloffShape) -> BrushTest {
        BrushTest::with_falloff_shape(cache, shape, self.view_normal)
    }

    pub fn automask_factor(&self, vert: VertRef) -> f32 {
        self.automask.as_ref().map_or(1.0, |a| a.factor(vert))
    }

    /// Precompute per-vertex sharpen intensity: the length of each vertex's
    /// Laplacian offset, normalized by the mesh-wide maximum. A flat mesh
    /// has maximum 0; every factor stays 0 rather than dividing by it.
    pub fn compute_sharpen_factors(&mut self, accessor: &dyn GeometryAccessor) {
        let mut neighbors = Neighbors::new();
        let mut max_factor = 0.0f32;
        for i in 0..accessor.vertex_count() {
            let vert = VertRef(i as u32);
            neighbors.clear();
            accessor.neighbors(vert, &mut neighbors);
            if neighbors.is_empty() {
                self.sharpen_factor[i] = 0.0;
                continue;
            }
            let mut avg = Vec3::ZERO;
            for &n in &neighbors {
                avg += accessor.position(n);
            }
            avg /= neighbors.len() as f32;
            let factor = avg.distance(accessor.position(vert));
            self.sharpen_factor[i] = factor;
            max_factor = max_factor.max(factor);
        }
        if max_factor > 0.0 {
            for f in &mut self.sharpen_factor {
                *f /= max_factor;
            }
        }
    }

    /// Store one iteration's Laplacian displacements for the next to read.
    pub fn store_laplacian(&mut self, verts: &[VertRef], disp: &[Vec3]) {
        for (&v, &d) in verts.iter().zip(disp.iter()) {
            self.laplacian_disp[v.0 as usize] = d;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PlainMesh;
    use crate::spatial::NodeSoup;

    fn bumped_grid() -> PlainMesh {
        // 3x3 grid with a raised center vertex.
        let mut positions = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let z = if x == 1 && y == 1 { 0.5 } else { 0.0 };
                positions.push(Vec3::new(x as f32, y as f32, z));
            }
        }
        let mut indices = Vec::new();
        for y in 0..2u32 {
            for x in 0..2u32 {
                let v = y * 3 + x;
                indices.extend_from_slice(&[v, v + 1, v + 4, v, v + 4, v + 3]);
            }
        }
        PlainMesh::from_triangles(&positions, &indices)
    }

    fn make_cache(mesh: &PlainMesh, orientation: FilterOrientation) -> FilterCache {
        let positions: Vec<Vec3> = (0..mesh.vertex_count())
            .map(|i| mesh.position(VertRef(i as u32)))
            .collect();
        let index = NodeSoup::build_uniform(&positions, 4);
        FilterCache::new(
            &index,
            mesh,
            orientation,
            Mat3::IDENTITY,
            Mat3::IDENTITY,
            None,
            None,
        )
    }

    #[test]
    fn test_sharpen_factors_normalized() {
        let mesh = bumped_grid();
        let mut cache = make_cache(&mesh, FilterOrientation::Local);
        cache.compute_sharpen_factors(&mesh);
        let max = cache
            .sharpen_factor
            .iter()
            .cloned()
            .fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        // The bump has the largest offset from its neighborhood.
        assert_eq!(cache.sharpen_factor[4], max);
    }

    #[test]
    fn test_sharpen_flat_mesh_no_division() {
        let mesh = PlainMesh::from_triangles(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            &[0, 1, 2],
        );
        let mut cache = make_cache(&mesh, FilterOrientation::Local);
        cache.compute_sharpen_factors(&mesh);
        assert!(cache.sharpen_factor.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn test_orientation_round_trip() {
        let mesh = bumped_grid();
        let mut cache = make_cache(&mesh, FilterOrientation::View);
        cache.obmat = Mat3::from_rotation_z(0.7);
        cache.viewmat = Mat3::from_rotation_x(-0.3);
        let v = Vec3::new(0.2, -1.4, 3.0);
        let back = cache.from_orientation(cache.to_orientation(v));
        assert!(back.distance(v) < 1e-5);
    }

    #[test]
    fn test_headless_test_falls_back_to_sphere() {
        let mesh = bumped_grid();
        let cache = make_cache(&mesh, FilterOrientation::Local);
        let mut stroke = StrokeCache::default();
        stroke.radius = 1.0;
        stroke.radius_squared = 1.0;
        let test = cache.make_test(&stroke, FalloffShape::Tube);
        assert_eq!(test.shape, FalloffShape::Sphere);
    }
}
