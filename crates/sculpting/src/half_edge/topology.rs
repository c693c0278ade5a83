//! Topology query methods for HalfEdgeMesh.

use smallvec::SmallVec;

use super::types::{Face, FaceId, HalfEdge, HalfEdgeId, Vertex, VertexId};
use super::HalfEdgeMesh;

/// Inline-capacity list of ring neighbors. Typical sculpt meshes have
/// valence 6; spilling to the heap is rare.
pub type NeighborList = SmallVec<[VertexId; 8]>;

impl HalfEdgeMesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0 as usize)
    }

    /// Get mutable vertex by ID
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.0 as usize)
    }

    /// Get half-edge by ID
    pub fn half_edge(&self, id: HalfEdgeId) -> Option<&HalfEdge> {
        self.half_edges.get(id.0 as usize)
    }

    /// Get face by ID
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.0 as usize)
    }

    /// Get all vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Get all faces
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Monotonic counter bumped by every topology-changing edit. References
    /// captured at one generation are invalid at any later one.
    pub fn topology_generation(&self) -> u64 {
        self.topology_generation
    }

    // ========================================================================
    // Topology Queries
    // ========================================================================

    /// Walk the outgoing half-edges around a vertex, calling `visit` once per
    /// outgoing half-edge. Stops early if the ring hits a boundary in one
    /// direction; callers needing the full ring of an open fan should also
    /// walk backwards from the start edge.
    fn walk_vertex_ring(&self, vertex_id: VertexId, mut visit: impl FnMut(&HalfEdge)) {
        let Some(vertex) = self.vertex(vertex_id) else {
            return;
        };
        let Some(start_he) = vertex.outgoing_half_edge else {
            return;
        };

        let mut current = start_he;
        // Hard cap guards against corrupt next/prev cycles.
        for _ in 0..self.half_edges.len() {
            let Some(he) = self.half_edge(current) else {
                return;
            };
            visit(he);

            let Some(prev_he) = self.half_edge(he.prev) else {
                return;
            };
            let Some(twin) = prev_he.twin else {
                return;
            };
            current = twin;
            if current == start_he {
                return;
            }
        }
    }

    /// Get all vertices adjacent to a vertex (connected by an edge).
    ///
    /// For open fans this walks both rotation directions so neighbors on
    /// either side of the boundary are found.
    pub fn adjacent_vertices(&self, vertex_id: VertexId) -> NeighborList {
        let mut neighbors = NeighborList::new();
        self.walk_vertex_ring(vertex_id, |he| {
            if let Some(next_he) = self.half_edge(he.next) {
                if !neighbors.contains(&next_he.origin) {
                    neighbors.push(next_he.origin);
                }
            }
        });

        // Backward walk for the far side of an open fan: the vertex preceding
        // this one on each face is also an edge neighbor.
        self.walk_vertex_ring(vertex_id, |he| {
            if let Some(prev_he) = self.half_edge(he.prev) {
                if !neighbors.contains(&prev_he.origin) {
                    neighbors.push(prev_he.origin);
                }
            }
        });

        neighbors
    }

    /// Get all faces adjacent to a vertex
    pub fn vertex_faces(&self, vertex_id: VertexId) -> SmallVec<[FaceId; 8]> {
        let mut faces = SmallVec::new();
        self.walk_vertex_ring(vertex_id, |he| {
            if !faces.contains(&he.face) {
                faces.push(he.face);
            }
        });
        faces
    }

    /// Get the vertices of a face in winding order
    pub fn face_vertices(&self, face_id: FaceId) -> [VertexId; 3] {
        let face = &self.faces[face_id.0 as usize];
        let he0 = &self.half_edges[face.half_edge.0 as usize];
        let he1 = &self.half_edges[he0.next.0 as usize];
        let he2 = &self.half_edges[he0.prev.0 as usize];
        [he0.origin, he1.origin, he2.origin]
    }

    /// Find a half-edge by its origin and destination vertices
    pub fn find_half_edge(&self, from: VertexId, to: VertexId) -> Option<HalfEdgeId> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// Check if a half-edge is on the mesh boundary (has no twin)
    pub fn is_boundary_edge(&self, he_id: HalfEdgeId) -> bool {
        self.half_edge(he_id)
            .map(|he| he.twin.is_none())
            .unwrap_or(true)
    }

    /// Check if a vertex is on the mesh boundary
    pub fn is_boundary_vertex(&self, vertex_id: VertexId) -> bool {
        let Some(vertex) = self.vertex(vertex_id) else {
            return false;
        };
        let Some(start_he) = vertex.outgoing_half_edge else {
            return true; // Isolated vertex
        };

        // A closed ring walk returns to the start edge without ever meeting a
        // twin-less half-edge. Hitting one in either the outgoing edge or the
        // incoming (prev) edge means the fan is open.
        let mut current = start_he;
        for _ in 0..self.half_edges.len() {
            let Some(he) = self.half_edge(current) else {
                return true;
            };
            if he.twin.is_none() {
                return true;
            }
            let Some(prev_he) = self.half_edge(he.prev) else {
                return true;
            };
            let Some(twin) = prev_he.twin else {
                return true;
            };
            current = twin;
            if current == start_he {
                return false;
            }
        }
        false
    }
}
