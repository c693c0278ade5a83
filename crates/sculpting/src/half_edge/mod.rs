//! Half-edge mesh data structure backing the dynamic-topology
//! representation.
//!
//! Provides the adjacency information (vertex rings, boundary detection)
//! that a flat triangle soup cannot answer, at the cost of per-vertex
//! indexed storage instead of packed attribute arrays.

mod construction;
mod topology;
mod types;

use std::collections::HashMap;

pub use topology::NeighborList;
pub use types::{Face, FaceId, HalfEdge, HalfEdgeError, HalfEdgeId, Vertex, VertexId};

/// Half-edge mesh data structure
///
/// Provides efficient topology queries for brush evaluation over meshes
/// whose connectivity can change between stroke steps.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
    /// Map from (origin, destination) vertex pair to half-edge
    pub(crate) edge_map: HashMap<(VertexId, VertexId), HalfEdgeId>,
    /// Bumped by any edit that adds or removes elements. Vertex references
    /// captured before a bump must not be dereferenced after it.
    pub(crate) topology_generation: u64,
}

impl HalfEdgeMesh {
    /// Record a topology-changing edit, invalidating outstanding references.
    pub fn bump_topology_generation(&mut self) {
        self.topology_generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_single_triangle() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
        ];
        let mesh = HalfEdgeMesh::from_triangles(&positions, &[0, 1, 2]).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.topology_generation(), 0);
    }

    #[test]
    fn test_generation_bump() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
        ];
        let mut mesh = HalfEdgeMesh::from_triangles(&positions, &[0, 1, 2]).unwrap();
        mesh.bump_topology_generation();
        assert_eq!(mesh.topology_generation(), 1);
    }
}
