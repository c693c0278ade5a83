//! Per-node original-state snapshots backing stroke undo and the
//! "original coordinates" reads used by non-accumulating brushes.

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use tracing::debug;

use crate::mesh::{GeometryAccessor, VertRef};
use crate::spatial::NodeId;

/// Which attribute a snapshot covers. Positions and normals are captured
/// together since a restore of one without the other leaves shading stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndoAttribute {
    Position,
    Mask,
    Color,
}

/// Pristine pre-stroke state of one node.
#[derive(Debug, Default)]
pub struct NodeSnapshot {
    verts: Vec<VertRef>,
    positions: Option<Vec<Vec3>>,
    normals: Option<Vec<Vec3>>,
    mask: Option<Vec<f32>>,
    colors: Option<Vec<Vec4>>,
}

impl NodeSnapshot {
    pub fn verts(&self) -> &[VertRef] {
        &self.verts
    }

    pub fn positions(&self) -> Option<&[Vec3]> {
        self.positions.as_deref()
    }

    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    pub fn mask(&self) -> Option<&[f32]> {
        self.mask.as_deref()
    }

    pub fn colors(&self) -> Option<&[Vec4]> {
        self.colors.as_deref()
    }
}

/// Snapshot store for one stroke. Created at stroke begin, dropped at
/// stroke end; `restore_all` rewinds every touched node on cancel.
#[derive(Debug, Default)]
pub struct StrokeUndo {
    nodes: HashMap<NodeId, NodeSnapshot>,
}

impl StrokeUndo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's pristine state before its first mutation in this
    /// stroke. Idempotent per (node, attribute): later touches of an
    /// already-pushed node are no-ops, so the snapshot always holds
    /// pre-stroke data. Must be called before any write to the node's
    /// vertices in the same stroke step.
    pub fn push_node(
        &mut self,
        node: NodeId,
        verts: &[VertRef],
        accessor: &dyn GeometryAccessor,
        attribute: UndoAttribute,
    ) {
        let snapshot = self.nodes.entry(node).or_insert_with(|| NodeSnapshot {
            verts: verts.to_vec(),
            ..NodeSnapshot::default()
        });
        match attribute {
            UndoAttribute::Position => {
                if snapshot.positions.is_none() {
                    snapshot.positions =
                        Some(snapshot.verts.iter().map(|&v| accessor.position(v)).collect());
                    snapshot.normals =
                        Some(snapshot.verts.iter().map(|&v| accessor.normal(v)).collect());
                }
            }
            UndoAttribute::Mask => {
                if snapshot.mask.is_none() {
                    snapshot.mask =
                        Some(snapshot.verts.iter().map(|&v| accessor.mask(v)).collect());
                }
            }
            UndoAttribute::Color => {
                if snapshot.colors.is_none() {
                    snapshot.colors =
                        Some(snapshot.verts.iter().map(|&v| accessor.color(v)).collect());
                }
            }
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.get(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn touched_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Revert every touched node to its pushed snapshot. Used on stroke
    /// cancel and by anchored/non-accumulating tools that restore then
    /// reapply each step.
    pub fn restore_all(&self, accessor: &mut dyn GeometryAccessor) {
        debug!("restore_all: reverting {} nodes", self.nodes.len());
        for snapshot in self.nodes.values() {
            if let Some(positions) = &snapshot.positions {
                for (&v, &p) in snapshot.verts.iter().zip(positions) {
                    accessor.set_position(v, p);
                }
            }
            if let Some(mask) = &snapshot.mask {
                for (&v, &m) in snapshot.verts.iter().zip(mask) {
                    accessor.set_mask(v, m);
                }
            }
            if let Some(colors) = &snapshot.colors {
                for (&v, &c) in snapshot.verts.iter().zip(colors) {
                    accessor.set_color(v, c);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PlainMesh;

    fn grid_mesh(n: u32) -> (PlainMesh, Vec<VertRef>) {
        // n*n vertex grid of triangles.
        let mut positions = Vec::new();
        for y in 0..n {
            for x in 0..n {
                positions.push(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        let mut indices = Vec::new();
        for y in 0..n - 1 {
            for x in 0..n - 1 {
                let v = y * n + x;
                indices.extend_from_slice(&[v, v + 1, v + n + 1, v, v + n + 1, v + n]);
            }
        }
        let verts = (0..n * n).map(VertRef).collect();
        (PlainMesh::from_triangles(&positions, &indices), verts)
    }

    #[test]
    fn test_push_is_idempotent() {
        let (mut mesh, verts) = grid_mesh(3);
        let mut undo = StrokeUndo::new();
        undo.push_node(NodeId(0), &verts, &mesh, UndoAttribute::Position);
        // Mutate, then push again: the snapshot must keep pre-stroke data.
        mesh.set_position(VertRef(0), Vec3::splat(9.0));
        undo.push_node(NodeId(0), &verts, &mesh, UndoAttribute::Position);
        let snap = undo.get(NodeId(0)).unwrap();
        assert_eq!(snap.positions().unwrap()[0], Vec3::ZERO);
    }

    #[test]
    fn test_restore_after_multi_step_stroke() {
        // 100 vertices touched over 3 steps, then cancelled.
        let (mut mesh, verts) = grid_mesh(10);
        let before: Vec<Vec3> = verts.iter().map(|&v| mesh.position(v)).collect();

        let mut undo = StrokeUndo::new();
        for step in 0..3 {
            undo.push_node(NodeId(0), &verts, &mesh, UndoAttribute::Position);
            for &v in &verts {
                let p = mesh.position(v);
                mesh.set_position(v, p + Vec3::new(0.0, 0.0, 0.1 * (step + 1) as f32));
            }
        }

        undo.restore_all(&mut mesh);
        for (&v, &orig) in verts.iter().zip(&before) {
            assert_eq!(mesh.position(v), orig);
        }
    }

    #[test]
    fn test_attributes_tracked_independently() {
        let (mut mesh, verts) = grid_mesh(3);
        let mut undo = StrokeUndo::new();
        undo.push_node(NodeId(0), &verts, &mesh, UndoAttribute::Mask);
        mesh.set_mask(VertRef(0), 0.75);
        let snap = undo.get(NodeId(0)).unwrap();
        assert!(snap.positions().is_none());
        assert_eq!(snap.mask().unwrap()[0], 0.0);

        undo.restore_all(&mut mesh);
        assert_eq!(mesh.mask(VertRef(0)), 0.0);
    }

    #[test]
    fn test_color_snapshot_restores_paint() {
        let (mut mesh, verts) = grid_mesh(3);
        mesh.ensure_colors();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);

        let mut undo = StrokeUndo::new();
        undo.push_node(NodeId(0), &verts, &mesh, UndoAttribute::Color);
        mesh.set_color(VertRef(0), red);
        assert_eq!(mesh.color(VertRef(0)), red);

        let snap = undo.get(NodeId(0)).unwrap();
        assert_eq!(snap.colors().unwrap()[0], Vec4::ONE);

        undo.restore_all(&mut mesh);
        assert_eq!(mesh.color(VertRef(0)), Vec4::ONE);
    }
}
