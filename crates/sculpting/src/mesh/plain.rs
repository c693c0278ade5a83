//! Plain-mesh representation: packed attribute arrays plus face topology.

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use smallvec::SmallVec;

use super::{GeometryAccessor, Neighbors, VertRef};

/// Flat vertex arrays with polygon topology and a vertex-to-face incidence
/// map. Faces are stored offset-list style: face `f` owns the corner range
/// `face_offsets[f]..face_offsets[f + 1]` into `corner_verts`.
#[derive(Debug)]
pub struct PlainMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    mask: Vec<f32>,
    /// Paint colors; absent until a paint tool allocates the layer.
    colors: Option<Vec<Vec4>>,
    face_offsets: Vec<u32>,
    corner_verts: Vec<u32>,
    /// CSR vertex-to-face incidence.
    vert_face_offsets: Vec<u32>,
    vert_face_indices: Vec<u32>,
    hide_vert: Vec<bool>,
    hide_poly: Vec<bool>,
    /// Precomputed boundary bits; rebuilt by `ensure_boundary`.
    boundary: Option<Vec<bool>>,
    /// Long-range pairings stitching disconnected islands for smoothing.
    fake_neighbors: Option<Vec<Option<u32>>>,
}

impl PlainMesh {
    /// Build from positions and an offset-list face table.
    pub fn new(positions: Vec<Vec3>, face_offsets: Vec<u32>, corner_verts: Vec<u32>) -> Self {
        let vert_count = positions.len();
        let face_count = face_offsets.len().saturating_sub(1);

        // Build the vertex-to-face map by counting then filling.
        let mut counts = vec![0u32; vert_count];
        for &v in &corner_verts {
            counts[v as usize] += 1;
        }
        let mut vert_face_offsets = Vec::with_capacity(vert_count + 1);
        let mut total = 0u32;
        vert_face_offsets.push(0);
        for &c in &counts {
            total += c;
            vert_face_offsets.push(total);
        }
        let mut cursor = vert_face_offsets.clone();
        let mut vert_face_indices = vec![0u32; total as usize];
        for face in 0..face_count {
            let start = face_offsets[face] as usize;
            let end = face_offsets[face + 1] as usize;
            for &v in &corner_verts[start..end] {
                vert_face_indices[cursor[v as usize] as usize] = face as u32;
                cursor[v as usize] += 1;
            }
        }

        let mut mesh = Self {
            normals: vec![Vec3::ZERO; vert_count],
            mask: vec![0.0; vert_count],
            colors: None,
            hide_vert: vec![false; vert_count],
            hide_poly: vec![false; face_count],
            positions,
            face_offsets,
            corner_verts,
            vert_face_offsets,
            vert_face_indices,
            boundary: None,
            fake_neighbors: None,
        };
        mesh.recompute_normals();
        mesh
    }

    /// Build from a flat triangle index list.
    pub fn from_triangles(positions: &[Vec3], indices: &[u32]) -> Self {
        let face_count = indices.len() / 3;
        let face_offsets = (0..=face_count).map(|f| (f * 3) as u32).collect();
        Self::new(positions.to_vec(), face_offsets, indices.to_vec())
    }

    pub fn face_count(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    pub fn face_corners(&self, face: u32) -> &[u32] {
        let start = self.face_offsets[face as usize] as usize;
        let end = self.face_offsets[face as usize + 1] as usize;
        &self.corner_verts[start..end]
    }

    pub fn vertex_faces(&self, vert: u32) -> &[u32] {
        let start = self.vert_face_offsets[vert as usize] as usize;
        let end = self.vert_face_offsets[vert as usize + 1] as usize;
        &self.vert_face_indices[start..end]
    }

    pub fn set_hide_vert(&mut self, vert: u32, hidden: bool) {
        self.hide_vert[vert as usize] = hidden;
    }

    pub fn set_hide_poly(&mut self, face: u32, hidden: bool) {
        self.hide_poly[face as usize] = hidden;
        self.boundary = None;
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Area-weighted vertex normals from face geometry.
    pub fn recompute_normals(&mut self) {
        for n in &mut self.normals {
            *n = Vec3::ZERO;
        }
        for face in 0..self.face_count() {
            let corners = {
                let start = self.face_offsets[face] as usize;
                let end = self.face_offsets[face + 1] as usize;
                &self.corner_verts[start..end]
            };
            if corners.len() < 3 {
                continue;
            }
            let p0 = self.positions[corners[0] as usize];
            let mut weighted = Vec3::ZERO;
            for i in 1..corners.len() - 1 {
                let p1 = self.positions[corners[i] as usize];
                let p2 = self.positions[corners[i + 1] as usize];
                weighted += (p1 - p0).cross(p2 - p0);
            }
            for &v in corners {
                self.normals[v as usize] += weighted;
            }
        }
        for n in &mut self.normals {
            *n = n.normalize_or_zero();
        }
    }

    /// Allocate the paint color layer, white-initialized, if absent.
    pub fn ensure_colors(&mut self) {
        if self.colors.is_none() {
            self.colors = Some(vec![Vec4::ONE; self.positions.len()]);
        }
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Install the island-stitching table; entry `v` is the far vertex
    /// paired with `v`, or None.
    pub fn set_fake_neighbors(&mut self, table: Option<Vec<Option<u32>>>) {
        self.fake_neighbors = table;
    }

    pub fn has_fake_neighbors(&self) -> bool {
        self.fake_neighbors.is_some()
    }

    /// Boundary test for one vertex: some incident edge has fewer than two
    /// visible incident faces.
    fn compute_boundary(&self, vert: u32) -> bool {
        let mut edge_counts: SmallVec<[(u32, u32); 16]> = SmallVec::new();
        let mut any_face = false;
        for &face in self.vertex_faces(vert) {
            if self.hide_poly[face as usize] {
                continue;
            }
            any_face = true;
            let corners = self.face_corners(face);
            let k = corners.iter().position(|&c| c == vert).unwrap_or(0);
            let prev = corners[(k + corners.len() - 1) % corners.len()];
            let next = corners[(k + 1) % corners.len()];
            for other in [prev, next] {
                if let Some(entry) = edge_counts.iter_mut().find(|(o, _)| *o == other) {
                    entry.1 += 1;
                } else {
                    edge_counts.push((other, 1));
                }
            }
        }
        if !any_face {
            return true;
        }
        edge_counts.iter().any(|&(_, count)| count < 2)
    }

    /// Precompute boundary bits for every vertex. Cheap to query afterwards;
    /// invalidated automatically when face visibility changes.
    pub fn ensure_boundary(&mut self) {
        if self.boundary.is_some() {
            return;
        }
        let bits = (0..self.positions.len() as u32)
            .map(|v| self.compute_boundary(v))
            .collect();
        self.boundary = Some(bits);
    }

    pub fn invalidate_boundary(&mut self) {
        self.boundary = None;
    }
}

impl GeometryAccessor for PlainMesh {
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
        self.mask[vert.0 as usize]
    }

    fn is_hidden(&self, vert: VertRef) -> bool {
        self.hide_vert[vert.0 as usize]
    }

    fn is_boundary(&self, vert: VertRef) -> bool {
        match &self.boundary {
            Some(bits) => bits[vert.0 as usize],
            None => self.compute_boundary(vert.0),
        }
    }

    fn neighbors(&self, vert: VertRef, out: &mut Neighbors) {
        out.clear();
        for &face in self.vertex_faces(vert.0) {
            if self.hide_poly[face as usize] {
                continue;
            }
            let corners = self.face_corners(face);
            let Some(k) = corners.iter().position(|&c| c == vert.0) else {
                continue;
            };
            let prev = corners[(k + corners.len() - 1) % corners.len()];
            let next = corners[(k + 1) % corners.len()];
            for other in [prev, next] {
                let r = VertRef(other);
                if !out.contains(&r) {
                    out.push(r);
                }
            }
        }
        if let Some(table) = &self.fake_neighbors {
            if let Some(Some(far)) = table.get(vert.0 as usize) {
                let r = VertRef(*far);
                if !out.contains(&r) {
                    out.push(r);
                }
            }
        }
    }

    fn set_position(&mut self, vert: VertRef, position: Vec3) {
        self.positions[vert.0 as usize] = position;
    }

    fn set_mask(&mut self, vert: VertRef, mask: f32) {
        self.mask[vert.0 as usize] = mask.clamp(0.0, 1.0);
    }

    fn color(&self, vert: VertRef) -> Vec4 {
        match &self.colors {
            Some(colors) => colors[vert.0 as usize],
            None => Vec4::ONE,
        }
    }

    fn set_color(&mut self, vert: VertRef, color: Vec4) {
        if let Some(colors) = &mut self.colors {
            colors[vert.0 as usize] = color;
        }
    }
}

/// Build a fake-neighbor table pairing each island-boundary vertex with the
/// nearest vertex of a different island, within `max_distance`.
pub fn build_fake_neighbor_table(mesh: &PlainMesh, max_distance: f32) -> Vec<Option<u32>> {
    let islands = label_islands(mesh);
    let max_sq = max_distance * max_distance;
    let n = mesh.vertex_count();
    let mut table: Vec<Option<u32>> = vec![None; n];
    // Quadratic pairing; the table is rebuilt rarely (only when the feature
    // is toggled or topology changes) and meshes with many islands are small
    // in practice.
    for v in 0..n as u32 {
        if table[v as usize].is_some() {
            continue;
        }
        let pos = mesh.position(VertRef(v));
        let mut best: Option<(u32, f32)> = None;
        for other in 0..n as u32 {
            if islands[other as usize] == islands[v as usize] {
                continue;
            }
            let dist_sq = pos.distance_squared(mesh.position(VertRef(other)));
            if dist_sq <= max_sq && best.map_or(true, |(_, b)| dist_sq < b) {
                best = Some((other, dist_sq));
            }
        }
        if let Some((other, _)) = best {
            table[v as usize] = Some(other);
            table[other as usize] = Some(v);
        }
    }
    table
}

/// Connected-component labels via iterative flood fill over edge adjacency.
pub fn label_islands(mesh: &PlainMesh) -> Vec<u32> {
    let n = mesh.vertex_count();
    let mut labels = vec![u32::MAX; n];
    let mut next_label = 0u32;
    let mut stack = Vec::new();
    let mut scratch = Neighbors::new();
    for seed in 0..n as u32 {
        if labels[seed as usize] != u32::MAX {
            continue;
        }
        labels[seed as usize] = next_label;
        stack.push(seed);
        while let Some(v) = stack.pop() {
            mesh.neighbors(VertRef(v), &mut scratch);
            for &n_ref in scratch.iter() {
                if labels[n_ref.0 as usize] == u32::MAX {
                    labels[n_ref.0 as usize] = next_label;
                    stack.push(n_ref.0);
                }
            }
        }
        next_label += 1;
    }
    labels
}
