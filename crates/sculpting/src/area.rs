//! Area normal and center estimation.
//!
//! Computes the brush reference plane: an area-weighted average position and
//! normal over the vertices near the brush, split into front and back facing
//! buckets relative to the view. Reduction over nodes is a component-wise
//! sum, so parallel tree reduction and serial accumulation agree exactly up
//! to float association order of the per-node partials.

use glam::Vec3;
use rayon::prelude::*;
use std::collections::HashMap;

use crate::brush::Brush;
use crate::brush_test::BrushTest;
use crate::cache::StrokeCache;
use crate::mesh::{GeometryAccessor, MeshData};
use crate::spatial::{NodeId, SpatialIndex};
use crate::types::SculptTool;
use crate::undo::StrokeUndo;

/// Front/back bucketed accumulator. Bucket 0 collects vertices facing the
/// view, bucket 1 the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaNormalCenterData {
    pub area_cos: [Vec3; 2],
    pub count_co: [u32; 2],
    pub area_nos: [Vec3; 2],
    pub count_no: [u32; 2],
}

impl AreaNormalCenterData {
    /// Associative, commutative combine; required for deterministic
    /// parallel reduction.
    pub fn join(a: Self, b: Self) -> Self {
        Self {
            area_cos: [a.area_cos[0] + b.area_cos[0], a.area_cos[1] + b.area_cos[1]],
            count_co: [a.count_co[0] + b.count_co[0], a.count_co[1] + b.count_co[1]],
            area_nos: [a.area_nos[0] + b.area_nos[0], a.area_nos[1] + b.area_nos[1]],
            count_no: [a.count_no[0] + b.count_no[0], a.count_no[1] + b.count_no[1]],
        }
    }
}

/// Smoothstep weight toward the brush center; zero at the query boundary so
/// the estimated plane has no discontinuity as vertices enter the radius.
pub fn area_normal_calc_weight(distance_sq: f32, radius: f32) -> f32 {
    let p = 1.0 - distance_sq.sqrt() / radius;
    (3.0 * p * p - 2.0 * p * p * p).clamp(0.0, 1.0)
}

/// Weight a coordinate toward the test location by the same smoothstep.
pub fn area_center_calc_weighted(
    test_location: Vec3,
    distance_sq: f32,
    radius: f32,
    co: Vec3,
) -> Vec3 {
    let afactor = area_normal_calc_weight(distance_sq, radius);
    test_location + (co - test_location) * (1.0 - afactor)
}

fn normal_test_radius(brush: &Brush, cache: &StrokeCache) -> f32 {
    cache.radius * brush.normal_radius_factor
}

fn area_test_radius(brush: &Brush, cache: &StrokeCache) -> f32 {
    // Area radius control is limited to the plane-fitting tools; other
    // tools produce artifacts when the two radii diverge.
    if matches!(brush.tool, SculptTool::Scrape | SculptTool::Fill)
        && brush.area_radius_factor > 0.0
    {
        let mut radius = cache.radius * brush.area_radius_factor;
        if brush.area_radius_pressure {
            radius *= cache.pressure;
        }
        radius
    } else {
        normal_test_radius(brush, cache)
    }
}

/// Original-coordinate triangle soup for nodes whose topology changed this
/// stroke; raw per-vertex original lookup is unreliable there, so the
/// estimate projects onto the pre-stroke triangles instead.
#[derive(Debug, Default)]
pub struct OrigTriangles {
    per_node: HashMap<NodeId, Vec<[Vec3; 3]>>,
}

impl OrigTriangles {
    pub fn insert(&mut self, node: NodeId, triangles: Vec<[Vec3; 3]>) {
        self.per_node.insert(node, triangles);
    }

    pub fn get(&self, node: NodeId) -> Option<&[[Vec3; 3]]> {
        self.per_node.get(&node).map(|t| t.as_slice())
    }
}

/// Closest point on triangle `(a, b, c)` to `p`.
pub fn closest_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Inputs shared by the center/normal estimators.
pub struct AreaQuery<'a> {
    pub brush: &'a Brush,
    pub cache: &'a StrokeCache,
    pub mesh: &'a MeshData,
    pub index: &'a dyn SpatialIndex,
    pub undo: Option<&'a StrokeUndo>,
    pub orig_triangles: Option<&'a OrigTriangles>,
}

struct NodeTests {
    normal_test: BrushTest,
    area_test: BrushTest,
}

impl AreaQuery<'_> {
    fn make_tests(&self) -> NodeTests {
        let view = Some(self.cache.view_normal);
        let mut normal_test =
            BrushTest::with_falloff_shape(self.cache, self.brush.falloff_shape, view);
        normal_test.set_radius(normal_test_radius(self.brush, self.cache));
        let mut area_test =
            BrushTest::with_falloff_shape(self.cache, self.brush.falloff_shape, view);
        area_test.set_radius(area_test_radius(self.brush, self.cache));
        NodeTests {
            normal_test,
            area_test,
        }
    }

    fn accumulate_point(
        &self,
        tests: &NodeTests,
        co: Vec3,
        no: Vec3,
        use_nos: bool,
        use_cos: bool,
        data: &mut AreaNormalCenterData,
    ) {
        let normal_hit = tests.normal_test.test_sq(co);
        let area_hit = tests.area_test.test_sq(co);
        if normal_hit.is_none() && area_hit.is_none() {
            return;
        }

        let flip_index = usize::from(self.cache.view_normal.dot(no) <= 0.0);
        if use_cos {
            if let Some(dist_sq) = area_hit {
                data.area_cos[flip_index] += area_center_calc_weighted(
                    tests.area_test.location,
                    dist_sq,
                    tests.area_test.radius,
                    co,
                );
                data.count_co[flip_index] += 1;
            }
        }
        if use_nos {
            if let Some(dist_sq) = normal_hit {
                data.area_nos[flip_index] +=
                    no * area_normal_calc_weight(dist_sq, tests.normal_test.radius);
                data.count_no[flip_index] += 1;
            }
        }
    }

    fn accumulate_node(
        &self,
        node: NodeId,
        use_nos: bool,
        use_cos: bool,
        data: &mut AreaNormalCenterData,
    ) {
        let tests = self.make_tests();
        let accessor = self.mesh.accessor();

        // Non-accumulating tools estimate from pre-stroke geometry so the
        // plane does not drift as the surface deforms under the stroke.
        let snapshot = if !self.cache.accum {
            self.undo.and_then(|undo| undo.get(node)).filter(|snap| snap.positions().is_some())
        } else {
            None
        };

        if snapshot.is_some() && self.mesh.is_dyntopo() {
            if let Some(triangles) = self.orig_triangles.and_then(|t| t.get(node)) {
                for tri in triangles {
                    let co = closest_on_triangle(
                        tests.normal_test.location,
                        tri[0],
                        tri[1],
                        tri[2],
                    );
                    let no = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
                    self.accumulate_point(&tests, co, no, use_nos, use_cos, data);
                }
                return;
            }
        }

        let verts = self.index.verts(node);
        match snapshot {
            Some(snap) => {
                let positions = snap.positions().unwrap_or(&[]);
                let normals = snap.normals().unwrap_or(&[]);
                for (i, &vert) in snap.verts().iter().enumerate() {
                    if accessor.is_hidden(vert) {
                        continue;
                    }
                    self.accumulate_point(
                        &tests,
                        positions[i],
                        normals[i],
                        use_nos,
                        use_cos,
                        data,
                    );
                }
            }
            None => {
                for &vert in verts {
                    if accessor.is_hidden(vert) {
                        continue;
                    }
                    self.accumulate_point(
                        &tests,
                        accessor.position(vert),
                        accessor.normal(vert),
                        use_nos,
                        use_cos,
                        data,
                    );
                }
            }
        }
    }

    fn reduce(&self, nodes: &[NodeId], use_nos: bool, use_cos: bool) -> AreaNormalCenterData {
        nodes
            .par_iter()
            .fold(AreaNormalCenterData::default, |mut acc, &node| {
                self.accumulate_node(node, use_nos, use_cos, &mut acc);
                acc
            })
            .reduce(AreaNormalCenterData::default, AreaNormalCenterData::join)
    }
}

fn extract_center(data: &AreaNormalCenterData, cache: &StrokeCache) -> Vec3 {
    // Prefer the front-facing bucket; fall back to the cached stroke
    // location on an empty query so the plane never snaps to the origin.
    for i in 0..2 {
        if data.count_co[i] != 0 {
            return data.area_cos[i] / data.count_co[i] as f32;
        }
    }
    cache.location
}

fn extract_normal(data: &AreaNormalCenterData) -> Option<Vec3> {
    for i in 0..2 {
        if data.count_no[i] != 0 && data.area_nos[i] != Vec3::ZERO {
            return Some(data.area_nos[i].normalize());
        }
    }
    None
}

pub fn calc_area_center(query: &AreaQuery, nodes: &[NodeId]) -> Vec3 {
    let data = query.reduce(nodes, false, true);
    extract_center(&data, query.cache)
}

pub fn calc_area_normal(query: &AreaQuery, nodes: &[NodeId]) -> Option<Vec3> {
    let data = query.reduce(nodes, true, false);
    extract_normal(&data)
}

pub fn calc_area_normal_and_center(query: &AreaQuery, nodes: &[NodeId]) -> (Option<Vec3>, Vec3) {
    let data = query.reduce(nodes, true, true);
    (extract_normal(&data), extract_center(&data, query.cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{PlainMesh, VertRef};
    use crate::spatial::NodeSoup;

    fn flat_grid(n: u32) -> (MeshData, NodeSoup) {
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
        let soup = NodeSoup::build_uniform(&positions, 16);
        let mesh = MeshData::Plain(PlainMesh::from_triangles(&positions, &indices));
        (mesh, soup)
    }

    fn cache_at(location: Vec3, radius: f32) -> StrokeCache {
        let mut cache = StrokeCache::default();
        cache.location = location;
        cache.radius = radius;
        cache.radius_squared = radius * radius;
        cache.view_normal = Vec3::Z;
        cache.accum = true;
        cache
    }

    #[test]
    fn test_weight_bounds() {
        assert!((area_normal_calc_weight(0.0, 1.0) - 1.0).abs() < 1e-6);
        assert!(area_normal_calc_weight(1.0, 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_center_pull() {
        let center = Vec3::ZERO;
        // At distance zero the contribution collapses to the test location.
        let at_center = area_center_calc_weighted(center, 0.0, 1.0, Vec3::ZERO);
        assert_eq!(at_center, center);
        // At the boundary the raw coordinate survives unweighted.
        let co = Vec3::new(1.0, 0.0, 0.0);
        let at_edge = area_center_calc_weighted(center, 1.0, 1.0, co);
        assert!((at_edge - co).length() < 1e-6);
    }

    #[test]
    fn test_flat_grid_normal_is_z() {
        let (mesh, soup) = flat_grid(8);
        let brush = Brush::new(SculptTool::Draw);
        let cache = cache_at(Vec3::new(3.5, 3.5, 0.0), 3.0);
        let query = AreaQuery {
            brush: &brush,
            cache: &cache,
            mesh: &mesh,
            index: &soup,
            undo: None,
            orig_triangles: None,
        };
        let nodes: Vec<NodeId> = (0..soup.leaf_count() as u32).map(NodeId).collect();
        let (normal, center) = calc_area_normal_and_center(&query, &nodes);
        let normal = normal.unwrap();
        assert!((normal - Vec3::Z).length() < 1e-5);
        assert!((center.z).abs() < 1e-5);
    }

    #[test]
    fn test_empty_query_falls_back_to_cache_location() {
        let (mesh, soup) = flat_grid(4);
        let brush = Brush::new(SculptTool::Draw);
        let cache = cache_at(Vec3::new(100.0, 100.0, 100.0), 0.5);
        let query = AreaQuery {
            brush: &brush,
            cache: &cache,
            mesh: &mesh,
            index: &soup,
            undo: None,
            orig_triangles: None,
        };
        let nodes: Vec<NodeId> = (0..soup.leaf_count() as u32).map(NodeId).collect();
        assert!(calc_area_normal(&query, &nodes).is_none());
        assert_eq!(calc_area_center(&query, &nodes), cache.location);
    }

    #[test]
    fn test_reduction_is_associative() {
        // Accumulate one batch of synthetic points serially vs. in 8 chunks
        // joined pairwise; the bucket sums must agree.
        let points: Vec<(Vec3, Vec3)> = (0..1000)
            .map(|i| {
                let f = i as f32 * 0.01;
                (
                    Vec3::new(f.sin(), f.cos(), f * 0.001),
                    Vec3::new(0.0, 0.0, if i % 3 == 0 { -1.0 } else { 1.0 }),
                )
            })
            .collect();

        let accumulate = |chunk: &[(Vec3, Vec3)]| {
            let mut data = AreaNormalCenterData::default();
            for &(co, no) in chunk {
                let flip = usize::from(Vec3::Z.dot(no) <= 0.0);
                data.area_cos[flip] += co;
                data.count_co[flip] += 1;
                data.area_nos[flip] += no;
                data.count_no[flip] += 1;
            }
            data
        };

        let whole = accumulate(&points);
        let chunked = points
            .chunks(125)
            .map(accumulate)
            .fold(AreaNormalCenterData::default(), AreaNormalCenterData::join);

        for i in 0..2 {
            assert!((whole.area_cos[i] - chunked.area_cos[i]).length() < 1e-3);
            assert_eq!(whole.count_co[i], chunked.count_co[i]);
            assert!((whole.area_nos[i] - chunked.area_nos[i]).length() < 1e-3);
            assert_eq!(whole.count_no[i], chunked.count_no[i]);
        }
    }

    #[test]
    fn test_closest_on_triangle_regions() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        // Above the interior projects straight down.
        let p = closest_on_triangle(Vec3::new(0.25, 0.25, 5.0), a, b, c);
        assert!((p - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
        // Beyond a vertex clamps to the vertex.
        let p = closest_on_triangle(Vec3::new(2.0, -1.0, 0.0), a, b, c);
        assert!((p - b).length() < 1e-6);
        // Beyond an edge clamps to the edge.
        let p = closest_on_triangle(Vec3::new(0.5, -1.0, 0.0), a, b, c);
        assert!((p - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_original_coords_keep_plane_fixed() {
        use crate::undo::{StrokeUndo, UndoAttribute};

        let (mut mesh, soup) = flat_grid(6);
        let brush = Brush::new(SculptTool::Scrape);
        let mut cache = cache_at(Vec3::new(2.5, 2.5, 0.0), 2.0);
        cache.accum = false;

        // Snapshot, then deform the live surface upward.
        let mut undo = StrokeUndo::new();
        for n in 0..soup.leaf_count() as u32 {
            undo.push_node(NodeId(n), soup.verts(NodeId(n)), mesh.accessor(), UndoAttribute::Position);
        }
        {
            let accessor = mesh.accessor_mut();
            for v in 0..accessor.vertex_count() as u32 {
                let p = accessor.position(VertRef(v));
                accessor.set_position(VertRef(v), p + Vec3::new(0.0, 0.0, 2.0));
            }
        }

        let query = AreaQuery {
            brush: &brush,
            cache: &cache,
            mesh: &mesh,
            index: &soup,
            undo: Some(&undo),
            orig_triangles: None,
        };
        let nodes: Vec<NodeId> = (0..soup.leaf_count() as u32).map(NodeId).collect();
        let center = calc_area_center(&query, &nodes);
        // The estimate reads the pre-stroke snapshot: still on z = 0.
        assert!(center.z.abs() < 1e-5);
    }
}
