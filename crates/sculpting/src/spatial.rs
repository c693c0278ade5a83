//! Spatial-index consumption: node gathering for the brush.
//!
//! The index itself (a bounding-volume tree in the surrounding system) is an
//! external collaborator; this crate only consumes its node-query
//! capability through [`SpatialIndex`]. A flat [`NodeSoup`] implementation
//! ships for sessions and tests.

use glam::Vec3;

use crate::brush::Brush;
use crate::mesh::{GeometryAccessor, VertRef};
use crate::types::FalloffShape;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Grow the box by `amount` on every side.
    pub fn inflated(&self, amount: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    /// Squared distance from `point` to the nearest point on the box.
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let nearest = point.clamp(self.min, self.max);
        nearest.distance_squared(point)
    }
}

/// Result of [`SpatialIndex::raycast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub vert: VertRef,
    /// Ray parameter at the closest approach to the vertex.
    pub t: f32,
    /// Squared distance from the ray line to the vertex.
    pub dist_sq: f32,
}

/// Opaque handle to one leaf node of the external spatial index.
///
/// Borrowed by the core for the duration of one traversal; the index owns
/// the node and its vertex batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Read-only node-query capability of the external spatial index.
pub trait SpatialIndex: Sync {
    fn leaf_count(&self) -> usize;

    /// Live bounds of a leaf.
    fn bounds(&self, node: NodeId) -> Aabb;

    /// Pre-stroke bounds of a leaf, for tools that test against original
    /// coordinates.
    fn original_bounds(&self, node: NodeId) -> Aabb;

    /// The vertex batch owned by this leaf. Batches of distinct leaves are
    /// disjoint; this is what makes node-level parallelism safe.
    fn verts(&self, node: NodeId) -> &[VertRef];

    fn fully_hidden(&self, node: NodeId) -> bool;
    fn fully_masked(&self, node: NodeId) -> bool;

    /// Gather every leaf accepted by `predicate`, in leaf order.
    fn search(&self, predicate: &mut dyn FnMut(NodeId) -> bool) -> Vec<NodeId> {
        (0..self.leaf_count() as u32)
            .map(NodeId)
            .filter(|node| predicate(*node))
            .collect()
    }

    /// Every leaf, for operations without a radius (filters, full-mesh
    /// passes).
    fn all_nodes(&self) -> Vec<NodeId> {
        self.search(&mut |_| true)
    }

    /// Nearest vertex hit by a ray, for cursor placement.
    ///
    /// A vertex counts as hit when its distance to the ray line is within
    /// `radius`; of those, the hit with the smallest forward ray parameter
    /// wins. Hidden vertices are skipped. `original` culls nodes against
    /// their pre-stroke bounds instead of the live ones.
    fn raycast(
        &self,
        accessor: &dyn GeometryAccessor,
        origin: Vec3,
        dir: Vec3,
        radius: f32,
        original: bool,
    ) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let precalc = RayDistPrecalc::new(origin, dir);
        let radius_sq = radius * radius;
        let mut best: Option<RayHit> = None;
        for node in (0..self.leaf_count() as u32).map(NodeId) {
            let bounds = if original {
                self.original_bounds(node)
            } else {
                self.bounds(node)
            };
            if !precalc.intersects(&bounds.inflated(radius)) {
                continue;
            }
            for &vert in self.verts(node) {
                if accessor.is_hidden(vert) {
                    continue;
                }
                let co = accessor.position(vert);
                let t = (co - origin).dot(dir);
                if t < 0.0 {
                    continue;
                }
                let dist_sq = (origin + dir * t).distance_squared(co);
                if dist_sq > radius_sq {
                    continue;
                }
                if best.map_or(true, |b| t < b.t) {
                    best = Some(RayHit {
                        node,
                        vert,
                        t,
                        dist_sq,
                    });
                }
            }
        }
        best
    }
}

/// Sphere-vs-AABB node test.
pub fn node_in_sphere(
    index: &dyn SpatialIndex,
    node: NodeId,
    location: Vec3,
    radius_sq: f32,
    original: bool,
) -> bool {
    let bounds = if original {
        index.original_bounds(node)
    } else {
        index.bounds(node)
    };
    bounds.distance_squared_to_point(location) < radius_sq
}

/// Precomputed state for ray-vs-AABB distance tests (tube falloff).
#[derive(Debug, Clone, Copy)]
pub struct RayDistPrecalc {
    origin: Vec3,
    dir: Vec3,
    inv_dir: Vec3,
}

impl RayDistPrecalc {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        let dir = dir.normalize_or_zero();
        let inv = Vec3::new(
            if dir.x != 0.0 { 1.0 / dir.x } else { f32::MAX },
            if dir.y != 0.0 { 1.0 / dir.y } else { f32::MAX },
            if dir.z != 0.0 { 1.0 / dir.z } else { f32::MAX },
        );
        Self {
            origin,
            dir,
            inv_dir: inv,
        }
    }

    /// Slab test against `bounds` for the full (two-sided) line through the
    /// origin; the brush tube extends both ways along the view direction.
    fn intersects(&self, bounds: &Aabb) -> bool {
        if self.dir.length_squared() < f32::EPSILON {
            return bounds.distance_squared_to_point(self.origin) == 0.0;
        }
        let t1 = (bounds.min - self.origin) * self.inv_dir;
        let t2 = (bounds.max - self.origin) * self.inv_dir;
        let t_min = t1.min(t2);
        let t_max = t1.max(t2);
        let near = t_min.max_element();
        let far = t_max.min_element();
        near <= far
    }
}

/// Cylinder-vs-AABB node test for tube falloff.
///
/// Tests the brush axis against the node bounds inflated by the radius.
/// Conservative: the inflated slab can over-include near box corners but
/// never culls a node the tube actually touches.
pub fn node_in_cylinder(
    ray: &RayDistPrecalc,
    index: &dyn SpatialIndex,
    node: NodeId,
    radius: f32,
    original: bool,
) -> bool {
    let bounds = if original {
        index.original_bounds(node)
    } else {
        index.bounds(node)
    };
    ray.intersects(&bounds.inflated(radius))
}

fn node_fully_masked_or_hidden(index: &dyn SpatialIndex, node: NodeId) -> bool {
    index.fully_hidden(node) || index.fully_masked(node)
}

/// All nodes potentially within the brush's area of influence.
///
/// `radius_scale` comes from [`Brush::query_radius_scale`]; `view_normal`
/// must be supplied for tube falloff (headless contexts fall back to the
/// sphere test).
pub fn gather_brush_nodes(
    index: &dyn SpatialIndex,
    brush: &Brush,
    center: Vec3,
    radius: f32,
    radius_scale: f32,
    view_normal: Option<Vec3>,
    use_original: bool,
) -> Vec<NodeId> {
    if brush.tool.needs_all_nodes() {
        return index.search(&mut |_| true);
    }

    let radius = radius * radius_scale;
    let radius_sq = radius * radius;
    let ignore_ineffective = brush.tool.ignores_fully_masked();

    let shape = match (brush.falloff_shape, view_normal) {
        (FalloffShape::Tube, Some(_)) => FalloffShape::Tube,
        _ => FalloffShape::Sphere,
    };

    match shape {
        FalloffShape::Sphere => index.search(&mut |node| {
            if ignore_ineffective && node_fully_masked_or_hidden(index, node) {
                return false;
            }
            node_in_sphere(index, node, center, radius_sq, use_original)
        }),
        FalloffShape::Tube => {
            let ray = RayDistPrecalc::new(center, view_normal.unwrap_or(Vec3::Z));
            index.search(&mut |node| {
                if ignore_ineffective && node_fully_masked_or_hidden(index, node) {
                    return false;
                }
                node_in_cylinder(&ray, index, node, radius, use_original)
            })
        }
    }
}

/// Leaf record of the flat index implementation.
#[derive(Debug, Clone)]
struct Leaf {
    verts: Vec<VertRef>,
    bounds: Aabb,
    original_bounds: Aabb,
    fully_hidden: bool,
    fully_masked: bool,
}

/// A flat list of leaf nodes over contiguous vertex batches.
///
/// Stands in for the external bounding-volume tree; construction and
/// rebalancing of the real index are out of scope for this crate.
#[derive(Debug, Default)]
pub struct NodeSoup {
    leaves: Vec<Leaf>,
}

impl NodeSoup {
    /// Partition `positions` into batches of `batch_size` vertices.
    pub fn build_uniform(positions: &[Vec3], batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let mut leaves = Vec::new();
        let mut start = 0usize;
        while start < positions.len() {
            let end = (start + batch_size).min(positions.len());
            let verts: Vec<VertRef> = (start as u32..end as u32).map(VertRef).collect();
            let mut bounds = Aabb::empty();
            for &v in &verts {
                bounds.include_point(positions[v.0 as usize]);
            }
            leaves.push(Leaf {
                verts,
                original_bounds: bounds,
                bounds,
                fully_hidden: false,
                fully_masked: false,
            });
            start = end;
        }
        Self { leaves }
    }

    /// Refresh the live bounds of every leaf after deformation. The original
    /// bounds stay pinned to the pre-stroke state.
    pub fn update_bounds(&mut self, positions: &[Vec3]) {
        for leaf in &mut self.leaves {
            let mut bounds = Aabb::empty();
            for &v in &leaf.verts {
                bounds.include_point(positions[v.0 as usize]);
            }
            leaf.bounds = bounds;
        }
    }

    /// Re-pin the original bounds at stroke start.
    pub fn commit_original_bounds(&mut self) {
        for leaf in &mut self.leaves {
            leaf.original_bounds = leaf.bounds;
        }
    }

    pub fn set_fully_hidden(&mut self, node: NodeId, hidden: bool) {
        self.leaves[node.0 as usize].fully_hidden = hidden;
    }

    pub fn set_fully_masked(&mut self, node: NodeId, masked: bool) {
        self.leaves[node.0 as usize].fully_masked = masked;
    }

    /// Bounds of the whole object, used by the tiling driver.
    pub fn object_bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for leaf in &self.leaves {
            bounds.merge(&leaf.bounds);
        }
        bounds
    }
}

impl SpatialIndex for NodeSoup {
    fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn bounds(&self, node: NodeId) -> Aabb {
        self.leaves[node.0 as usize].bounds
    }

    fn original_bounds(&self, node: NodeId) -> Aabb {
        self.leaves[node.0 as usize].original_bounds
    }

    fn verts(&self, node: NodeId) -> &[VertRef] {
        &self.leaves[node.0 as usize].verts
    }

    fn fully_hidden(&self, node: NodeId) -> bool {
        self.leaves[node.0 as usize].fully_hidden
    }

    fn fully_masked(&self, node: NodeId) -> bool {
        self.leaves[node.0 as usize].fully_masked
    }
}
