//! Construction methods for HalfEdgeMesh.

use std::collections::HashMap;

use glam::Vec3;

use super::types::{Face, FaceId, HalfEdge, HalfEdgeError, HalfEdgeId, Vertex, VertexId};
use super::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Build a half-edge mesh from a triangle soup.
    ///
    /// Positionally-identical vertices are welded first. Exported triangle
    /// soups commonly duplicate vertices along UV seams; without welding the
    /// duplicates produce boundary half-edges (twin = None) that break ring
    /// walks around what is really an interior vertex, which in turn breaks
    /// boundary detection during brush evaluation.
    pub fn from_triangles(
        positions: &[Vec3],
        indices: &[u32],
    ) -> Result<Self, HalfEdgeError> {
        if indices.len() % 3 != 0 {
            return Err(HalfEdgeError::InvalidIndexCount);
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(HalfEdgeError::IndexOutOfRange(bad, positions.len()));
        }

        let quantize = |p: Vec3| -> [i64; 3] {
            [
                (p.x * 1_000_000.0) as i64,
                (p.y * 1_000_000.0) as i64,
                (p.z * 1_000_000.0) as i64,
            ]
        };

        let mut position_to_canonical: HashMap<[i64; 3], usize> = HashMap::new();
        let mut canonical_map: Vec<usize> = Vec::with_capacity(positions.len());

        for (i, &pos) in positions.iter().enumerate() {
            let key = quantize(pos);
            let canonical = *position_to_canonical.entry(key).or_insert(i);
            canonical_map.push(canonical);
        }

        let welded_count = canonical_map
            .iter()
            .enumerate()
            .filter(|(i, c)| **c != *i)
            .count();
        if welded_count > 0 {
            tracing::debug!(
                "from_triangles: welded {} duplicate vertices ({} unique of {} total)",
                welded_count,
                position_to_canonical.len(),
                positions.len()
            );
        }

        let indices: Vec<u32> = indices
            .iter()
            .map(|&i| canonical_map[i as usize] as u32)
            .collect();

        // Drop triangles degenerated by welding.
        let indices: Vec<u32> = indices
            .chunks(3)
            .filter(|tri| tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2])
            .flat_map(|tri| tri.iter().copied())
            .collect();

        let mut vertices: Vec<Vertex> = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| Vertex {
                id: VertexId(i as u32),
                position: pos,
                normal: Vec3::ZERO,
                mask: 0.0,
                hidden: false,
                outgoing_half_edge: None,
            })
            .collect();

        let mut half_edges: Vec<HalfEdge> = Vec::new();
        let mut faces: Vec<Face> = Vec::new();
        let mut edge_map: HashMap<(VertexId, VertexId), HalfEdgeId> = HashMap::new();

        let num_triangles = indices.len() / 3;
        for tri_idx in 0..num_triangles {
            let i0 = indices[tri_idx * 3] as usize;
            let i1 = indices[tri_idx * 3 + 1] as usize;
            let i2 = indices[tri_idx * 3 + 2] as usize;

            let v0 = VertexId(i0 as u32);
            let v1 = VertexId(i1 as u32);
            let v2 = VertexId(i2 as u32);

            let face_id = FaceId(faces.len() as u32);

            let he0_id = HalfEdgeId(half_edges.len() as u32);
            let he1_id = HalfEdgeId(half_edges.len() as u32 + 1);
            let he2_id = HalfEdgeId(half_edges.len() as u32 + 2);

            for (he_id, origin, next, prev) in [
                (he0_id, v0, he1_id, he2_id),
                (he1_id, v1, he2_id, he0_id),
                (he2_id, v2, he0_id, he1_id),
            ] {
                half_edges.push(HalfEdge {
                    id: he_id,
                    origin,
                    twin: None,
                    next,
                    prev,
                    face: face_id,
                });
            }

            if vertices[i0].outgoing_half_edge.is_none() {
                vertices[i0].outgoing_half_edge = Some(he0_id);
            }
            if vertices[i1].outgoing_half_edge.is_none() {
                vertices[i1].outgoing_half_edge = Some(he1_id);
            }
            if vertices[i2].outgoing_half_edge.is_none() {
                vertices[i2].outgoing_half_edge = Some(he2_id);
            }

            for (he_id, (origin, dest)) in [
                (he0_id, (v0, v1)),
                (he1_id, (v1, v2)),
                (he2_id, (v2, v0)),
            ] {
                if let Some(&twin_id) = edge_map.get(&(dest, origin)) {
                    half_edges[he_id.0 as usize].twin = Some(twin_id);
                    half_edges[twin_id.0 as usize].twin = Some(he_id);
                }
                edge_map.insert((origin, dest), he_id);
            }

            let p0 = vertices[i0].position;
            let p1 = vertices[i1].position;
            let p2 = vertices[i2].position;
            let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();

            faces.push(Face {
                id: face_id,
                half_edge: he0_id,
                normal,
                hidden: false,
            });
        }

        let mut mesh = Self {
            vertices,
            half_edges,
            faces,
            edge_map,
            topology_generation: 0,
        };
        mesh.recompute_vertex_normals();
        Ok(mesh)
    }

    /// Recompute per-vertex normals as the area-weighted average of incident
    /// face normals.
    pub fn recompute_vertex_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = Vec3::ZERO;
        }
        for face in &self.faces {
            let ids = [
                self.half_edges[face.half_edge.0 as usize].origin,
                self.half_edges[self.half_edges[face.half_edge.0 as usize].next.0 as usize]
                    .origin,
                self.half_edges[self.half_edges[face.half_edge.0 as usize].prev.0 as usize]
                    .origin,
            ];
            let p0 = self.vertices[ids[0].0 as usize].position;
            let p1 = self.vertices[ids[1].0 as usize].position;
            let p2 = self.vertices[ids[2].0 as usize].position;
            // Unnormalized cross product weights by twice the triangle area.
            let weighted = (p1 - p0).cross(p2 - p0);
            for id in ids {
                self.vertices[id.0 as usize].normal += weighted;
            }
        }
        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.normalize_or_zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welds_duplicate_positions() {
        // Two triangles sharing an edge, with the shared vertices duplicated
        // as a seam exporter would.
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 3, 4, 5];
        let mesh = HalfEdgeMesh::from_triangles(&positions, &indices).unwrap();

        // The shared edge must be twinned after welding.
        let he = mesh.find_half_edge(VertexId(1), VertexId(2)).unwrap();
        assert!(mesh.half_edge(he).unwrap().twin.is_some());
    }

    #[test]
    fn test_rejects_bad_indices() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(matches!(
            HalfEdgeMesh::from_triangles(&positions, &[0, 1]),
            Err(HalfEdgeError::InvalidIndexCount)
        ));
        assert!(matches!(
            HalfEdgeMesh::from_triangles(&positions, &[0, 1, 7]),
            Err(HalfEdgeError::IndexOutOfRange(7, 3))
        ));
    }

    #[test]
    fn test_vertex_normals_point_up_for_flat_quad() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        let mesh = HalfEdgeMesh::from_triangles(&positions, &indices).unwrap();
        for vertex in mesh.vertices() {
            assert!((vertex.normal - Vec3::Z).length() < 1e-6);
        }
    }
}
