//! Type definitions for the half-edge mesh data structure.

use glam::Vec3;

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Type-safe half-edge identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HalfEdgeId(pub u32);

/// Type-safe face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

/// A vertex in the half-edge mesh.
///
/// Sculpt attributes (mask, hidden) live directly on the vertex so brush
/// evaluation never needs a side lookup table.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
    pub normal: Vec3,
    /// Sculpt mask in [0, 1]; 1 means fully masked.
    pub mask: f32,
    pub hidden: bool,
    /// One outgoing half-edge from this vertex (arbitrary choice if multiple)
    pub outgoing_half_edge: Option<HalfEdgeId>,
}

/// A half-edge in the mesh
///
/// Each edge in the mesh is represented by two half-edges pointing in opposite
/// directions. Half-edges store connectivity information for traversing the mesh.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub id: HalfEdgeId,
    /// The vertex this half-edge originates from
    pub origin: VertexId,
    /// The opposite half-edge (None for boundary edges)
    pub twin: Option<HalfEdgeId>,
    /// The next half-edge around the face (counter-clockwise)
    pub next: HalfEdgeId,
    /// The previous half-edge around the face (counter-clockwise)
    pub prev: HalfEdgeId,
    /// The face this half-edge borders
    pub face: FaceId,
}

/// A triangle face in the mesh
#[derive(Debug, Clone)]
pub struct Face {
    pub id: FaceId,
    /// One half-edge on the boundary of this face
    pub half_edge: HalfEdgeId,
    /// Cached face normal
    pub normal: Vec3,
    pub hidden: bool,
}

/// Errors that can occur during half-edge mesh operations
#[derive(Debug, thiserror::Error)]
pub enum HalfEdgeError {
    #[error("Triangle index count not divisible by 3")]
    InvalidIndexCount,
    #[error("Triangle index {0} out of range for {1} vertices")]
    IndexOutOfRange(u32, usize),
    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),
}
