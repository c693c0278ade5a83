//! Multiresolution subdivision-grid representation.
//!
//! Geometry is an array of fixed-size square grids, one per base-mesh face
//! corner. A vertex is addressed by `(grid, x, y)` and stored at the linear
//! index `grid * grid_size² + y * grid_size + x`. Grids meet along seams
//! where both sides store their own copy of the shared vertices; a stitch
//! table maps each seam vertex to its coincident duplicates so neighbor
//! queries can cross grid borders.

use std::collections::HashMap;

use glam::Vec3;
use smallvec::SmallVec;

use super::{GeometryAccessor, Neighbors, VertRef};

/// Decoded grid vertex address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCoord {
    pub grid: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug)]
pub struct SubdivGrids {
    grid_size: u32,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    masks: Vec<f32>,
    hidden: Vec<bool>,
    /// Seam vertex -> coincident copies in other grids.
    duplicates: HashMap<u32, SmallVec<[u32; 4]>>,
}

impl SubdivGrids {
    pub fn new(grid_size: u32, grid_count: u32) -> Self {
        let n = (grid_size * grid_size * grid_count) as usize;
        Self {
            grid_size,
            positions: vec![Vec3::ZERO; n],
            normals: vec![Vec3::Z; n],
            masks: vec![0.0; n],
            hidden: vec![false; n],
            duplicates: HashMap::new(),
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn grid_count(&self) -> u32 {
        (self.positions.len() as u32) / (self.grid_size * self.grid_size)
    }

    pub fn encode(&self, coord: GridCoord) -> VertRef {
        VertRef(
            coord.grid * self.grid_size * self.grid_size
                + coord.y * self.grid_size
                + coord.x,
        )
    }

    pub fn decode(&self, vert: VertRef) -> GridCoord {
        let per_grid = self.grid_size * self.grid_size;
        let grid = vert.0 / per_grid;
        let local = vert.0 % per_grid;
        GridCoord {
            grid,
            x: local % self.grid_size,
            y: local / self.grid_size,
        }
    }

    pub fn set_grid_position(&mut self, coord: GridCoord, position: Vec3) {
        let v = self.encode(coord);
        self.positions[v.0 as usize] = position;
    }

    pub fn set_grid_normal(&mut self, coord: GridCoord, normal: Vec3) {
        let v = self.encode(coord);
        self.normals[v.0 as usize] = normal;
    }

    pub fn set_hidden(&mut self, vert: VertRef, hidden: bool) {
        self.hidden[vert.0 as usize] = hidden;
    }

    fn on_border(&self, coord: GridCoord) -> bool {
        coord.x == 0
            || coord.y == 0
            || coord.x == self.grid_size - 1
            || coord.y == self.grid_size - 1
    }

    /// Rebuild the seam stitch table by welding coincident border vertices.
    /// Must be called after grid positions change shape (not per stroke
    /// step; sculpt displacement moves all copies together).
    pub fn stitch_seams(&mut self) {
        let quantize = |p: Vec3| -> [i64; 3] {
            [
                (p.x * 1_000_000.0) as i64,
                (p.y * 1_000_000.0) as i64,
                (p.z * 1_000_000.0) as i64,
            ]
        };
        let mut by_position: HashMap<[i64; 3], SmallVec<[u32; 4]>> = HashMap::new();
        for v in 0..self.positions.len() as u32 {
            if self.on_border(self.decode(VertRef(v))) {
                by_position
                    .entry(quantize(self.positions[v as usize]))
                    .or_default()
                    .push(v);
            }
        }
        self.duplicates.clear();
        for (_, verts) in by_position {
            if verts.len() < 2 {
                continue;
            }
            for &v in &verts {
                let copies: SmallVec<[u32; 4]> =
                    verts.iter().copied().filter(|&o| o != v).collect();
                self.duplicates.insert(v, copies);
            }
        }
        tracing::debug!(
            "stitch_seams: {} seam vertices stitched across {} grids",
            self.duplicates.len(),
            self.grid_count()
        );
    }

    pub fn duplicates_of(&self, vert: VertRef) -> &[u32] {
        self.duplicates
            .get(&vert.0)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    fn in_grid_neighbors(&self, coord: GridCoord, out: &mut Neighbors) {
        let gs = self.grid_size;
        if coord.x > 0 {
            out.push(self.encode(GridCoord { x: coord.x - 1, ..coord }));
        }
        if coord.x + 1 < gs {
            out.push(self.encode(GridCoord { x: coord.x + 1, ..coord }));
        }
        if coord.y > 0 {
            out.push(self.encode(GridCoord { y: coord.y - 1, ..coord }));
        }
        if coord.y + 1 < gs {
            out.push(self.encode(GridCoord { y: coord.y + 1, ..coord }));
        }
    }

    /// Neighbor query with control over seam duplicates. When
    /// `include_duplicates` is set the coincident copies themselves are
    /// returned alongside the stitched cross-grid neighbors; smoothing
    /// passes that average positions want them excluded, visibility
    /// propagation wants them included.
    pub fn neighbors_with_duplicates(
        &self,
        vert: VertRef,
        include_duplicates: bool,
        out: &mut Neighbors,
    ) {
        out.clear();
        let coord = self.decode(vert);
        self.in_grid_neighbors(coord, out);

        if self.on_border(coord) {
            for &dup in self.duplicates_of(vert) {
                if include_duplicates && !out.contains(&VertRef(dup)) {
                    out.push(VertRef(dup));
                }
                let dup_coord = self.decode(VertRef(dup));
                let mut across = Neighbors::new();
                self.in_grid_neighbors(dup_coord, &mut across);
                for n in across {
                    // Skip copies of the query vertex itself.
                    if n == vert || self.duplicates_of(n).contains(&vert.0) {
                        continue;
                    }
                    if !out.contains(&n) {
                        out.push(n);
                    }
                }
            }
        }
    }

    /// Incident quad origins for a vertex (up to 4, in-grid).
    fn incident_quads(&self, coord: GridCoord) -> SmallVec<[GridCoord; 4]> {
        let mut quads = SmallVec::new();
        let gs = self.grid_size;
        for (dx, dy) in [(0i64, 0i64), (-1, 0), (0, -1), (-1, -1)] {
            let qx = coord.x as i64 + dx;
            let qy = coord.y as i64 + dy;
            if qx >= 0 && qy >= 0 && (qx as u32) + 1 < gs && (qy as u32) + 1 < gs {
                quads.push(GridCoord {
                    grid: coord.grid,
                    x: qx as u32,
                    y: qy as u32,
                });
            }
        }
        quads
    }

    /// A quad is visible when all four of its corners are visible.
    fn quad_visible(&self, origin: GridCoord) -> bool {
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let v = self.encode(GridCoord {
                grid: origin.grid,
                x: origin.x + dx,
                y: origin.y + dy,
            });
            if self.hidden[v.0 as usize] {
                return false;
            }
        }
        true
    }
}

impl GeometryAccessor for SubdivGrids {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, vert: VertRef) -> Vec3 {
        self.positions[vert.0 as usize]
    }

    fn normal(&self, vert: VertRef) -> Vec3 {
        self.normals[vert.0 as usize]
    }

    fn mask(&self, vert: VertRef) -> f32 {
        self.masks[vert.0 as usize]
    }

    fn is_hidden(&self, vert: VertRef) -> bool {
        self.hidden[vert.0 as usize]
    }

    fn is_boundary(&self, vert: VertRef) -> bool {
        let coord = self.decode(vert);
        // Grid-border vertices without seam copies lie on the base-mesh
        // boundary. Hidden incident quads also produce a visibility
        // boundary, same policy as the other representations.
        if self.on_border(coord) && self.duplicates_of(vert).is_empty() {
            return true;
        }
        self.incident_quads(coord)
            .iter()
            .any(|&q| !self.quad_visible(q))
    }

    fn neighbors(&self, vert: VertRef, out: &mut Neighbors) {
        self.neighbors_with_duplicates(vert, false, out);
    }

    fn set_position(&mut self, vert: VertRef, position: Vec3) {
        self.positions[vert.0 as usize] = position;
        // Keep seam copies coincident.
        if let Some(dups) = self.duplicates.get(&vert.0) {
            let dups = dups.clone();
            for dup in dups {
                self.positions[dup as usize] = position;
            }
        }
    }

    fn set_mask(&mut self, vert: VertRef, mask: f32) {
        let mask = mask.clamp(0.0, 1.0);
        self.masks[vert.0 as usize] = mask;
        if let Some(dups) = self.duplicates.get(&vert.0) {
            let dups = dups.clone();
            for dup in dups {
                self.masks[dup as usize] = mask;
            }
        }
    }
}
