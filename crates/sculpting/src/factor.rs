//! Per-node influence factor pipeline.
//!
//! Brush evaluation runs over one node's vertex batch at a time, with every
//! stage operating on parallel slices (`factors`, `distances`) indexed like
//! the batch. Every stage is a multiplier in [0, 1]; the only ordering
//! constraint is that hardness remaps distances before the falloff curve
//! reads them.

use glam::{Mat4, Vec3};

use crate::automask::AutomaskCache;
use crate::brush::{apply_hardness, Brush};
use crate::brush_test::BrushTest;
use crate::cache::StrokeCache;
use crate::curve::FalloffCurve;
use crate::mesh::{GeometryAccessor, VertRef};
use crate::texture::{sample_brush_texture, TextureSampler};

/// Gather batch positions into a scratch slice.
pub fn gather_positions(accessor: &dyn GeometryAccessor, verts: &[VertRef], out: &mut [Vec3]) {
    for (i, &v) in verts.iter().enumerate() {
        out[i] = accessor.position(v);
    }
}

/// Gather batch normals into a scratch slice.
pub fn gather_normals(accessor: &dyn GeometryAccessor, verts: &[VertRef], out: &mut [Vec3]) {
    for (i, &v) in verts.iter().enumerate() {
        out[i] = accessor.normal(v);
    }
}

/// Stage 1: visibility and paint mask. Hidden vertices get factor 0, the
/// rest start at `1 - mask`.
pub fn fill_factor_from_hide_and_mask(
    accessor: &dyn GeometryAccessor,
    verts: &[VertRef],
    factors: &mut [f32],
) {
    for (i, &v) in verts.iter().enumerate() {
        factors[i] = if accessor.is_hidden(v) {
            0.0
        } else {
            1.0 - accessor.mask(v)
        };
    }
}

/// Stage 2: front-face attenuation by `max(dot(normal, view), 0)`.
pub fn calc_front_face(view_normal: Vec3, normals: &[Vec3], factors: &mut [f32]) {
    for (no, factor) in normals.iter().zip(factors.iter_mut()) {
        *factor *= no.dot(view_normal).max(0.0);
    }
}

/// Stage 3: brush distances. Vertices outside the influence volume get
/// factor 0 and an infinite distance; the rest record their Euclidean
/// distance to the brush.
pub fn calc_brush_distances(
    test: &BrushTest,
    positions: &[Vec3],
    distances: &mut [f32],
    factors: &mut [f32],
) {
    for (i, &co) in positions.iter().enumerate() {
        match test.test_sq(co) {
            Some(dist_sq) => distances[i] = dist_sq.sqrt(),
            None => {
                distances[i] = f32::INFINITY;
                factors[i] = 0.0;
            }
        }
    }
}

/// Cube-tip variant of stage 3. Cube distances are already normalized to
/// [0, 1]; scale by the radius so the shared curve stage applies.
pub fn calc_brush_cube_distances(
    test: &BrushTest,
    local: &Mat4,
    roundness: f32,
    tip_scale_x: f32,
    positions: &[Vec3],
    distances: &mut [f32],
    factors: &mut [f32],
) {
    for (i, &co) in positions.iter().enumerate() {
        match test.cube(co, local, roundness, tip_scale_x) {
            Some(dist) => distances[i] = dist * test.radius,
            None => {
                distances[i] = f32::INFINITY;
                factors[i] = 0.0;
            }
        }
    }
}

/// Drop influence for distances beyond `radius`. For test-derived distances
/// this only pins the boundary; callers computing raw distances themselves
/// (filters, proxies) rely on it fully.
pub fn filter_distances_with_radius(radius: f32, distances: &[f32], factors: &mut [f32]) {
    for (d, factor) in distances.iter().zip(factors.iter_mut()) {
        if *d > radius {
            *factor = 0.0;
        }
    }
}

/// Stage 4: hardness remap, in place over the distances.
pub fn apply_hardness_to_distances(radius: f32, hardness: f32, distances: &mut [f32]) {
    if hardness <= 0.0 {
        return;
    }
    for d in distances.iter_mut() {
        if d.is_finite() {
            *d = apply_hardness(*d, radius, hardness);
        }
    }
}

/// Stage 5: falloff curve over the (remapped) distances.
pub fn calc_brush_strength_factors(
    curve: FalloffCurve,
    radius: f32,
    distances: &[f32],
    factors: &mut [f32],
) {
    for (d, factor) in distances.iter().zip(factors.iter_mut()) {
        *factor *= curve.strength(*d, radius);
    }
}

/// Stage 6: brush texture, when configured.
pub fn calc_brush_texture_factors(
    brush: &Brush,
    sampler: Option<&dyn TextureSampler>,
    cache: &StrokeCache,
    projection: Option<&Mat4>,
    positions: &[Vec3],
    factors: &mut [f32],
) {
    let (Some(texture), Some(sampler)) = (&brush.texture, sampler) else {
        return;
    };
    for (co, factor) in positions.iter().zip(factors.iter_mut()) {
        *factor *= sample_brush_texture(texture, sampler, cache, projection, *co);
    }
}

/// Stage 7: automask composition; a disabled cache leaves factors alone.
pub fn calc_automask_factors(
    automask: Option<&AutomaskCache>,
    verts: &[VertRef],
    factors: &mut [f32],
) {
    let Some(automask) = automask else {
        return;
    };
    for (&v, factor) in verts.iter().zip(factors.iter_mut()) {
        *factor *= automask.factor(v);
    }
}

/// Inputs for one node batch's factor computation.
pub struct FactorContext<'a> {
    pub brush: &'a Brush,
    pub cache: &'a StrokeCache,
    pub accessor: &'a dyn GeometryAccessor,
    pub automask: Option<&'a AutomaskCache>,
    pub texture_sampler: Option<&'a dyn TextureSampler>,
    pub projection: Option<&'a Mat4>,
}

/// Run the full pipeline for one batch, filling `factors` and `distances`.
/// `positions` and `normals` are scratch slices the caller sizes to the
/// batch; they hold the gathered attributes afterwards.
pub fn compute_node_factors(
    ctx: &FactorContext,
    test: &BrushTest,
    verts: &[VertRef],
    positions: &mut [Vec3],
    normals: &mut [Vec3],
    distances: &mut [f32],
    factors: &mut [f32],
) {
    gather_positions(ctx.accessor, verts, positions);
    gather_normals(ctx.accessor, verts, normals);

    fill_factor_from_hide_and_mask(ctx.accessor, verts, factors);
    if ctx.brush.front_face_only {
        calc_front_face(ctx.cache.view_normal, normals, factors);
    }

    if ctx.brush.has_cube_tip() {
        calc_brush_cube_distances(
            test,
            &ctx.cache.brush_local_mat_inv,
            ctx.brush.tip_roundness,
            ctx.brush.tip_scale_x,
            positions,
            distances,
            factors,
        );
    } else {
        calc_brush_distances(test, positions, distances, factors);
        filter_distances_with_radius(test.radius, distances, factors);
    }
    apply_hardness_to_distances(test.radius, ctx.brush.hardness, distances);
    calc_brush_strength_factors(ctx.brush.curve, test.radius, distances, factors);

    calc_brush_texture_factors(
        ctx.brush,
        ctx.texture_sampler,
        ctx.cache,
        ctx.projection,
        positions,
        factors,
    );
    calc_automask_factors(ctx.automask, verts, factors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PlainMesh;
    use crate::types::SculptTool;

    fn line_mesh(n: u32) -> PlainMesh {
        // A strip of triangles along X.
        let mut positions = Vec::new();
        for i in 0..n {
            positions.push(Vec3::new(i as f32 * 0.25, 0.0, 0.0));
            positions.push(Vec3::new(i as f32 * 0.25, 1.0, 0.0));
        }
        let mut indices = Vec::new();
        for i in 0..n - 1 {
            let v = i * 2;
            indices.extend_from_slice(&[v, v + 2, v + 1, v + 1, v + 2, v + 3]);
        }
        PlainMesh::from_triangles(&positions, &indices)
    }

    fn test_setup(radius: f32) -> (Brush, StrokeCache) {
        let brush = Brush::new(SculptTool::Draw);
        let mut cache = StrokeCache::default();
        cache.radius = radius;
        cache.radius_squared = radius * radius;
        cache.view_normal = Vec3::Z;
        (brush, cache)
    }

    #[test]
    fn test_factor_zero_outside_radius() {
        let mesh = line_mesh(8);
        let (brush, cache) = test_setup(1.0);
        let test = BrushTest::new(&cache);
        let verts: Vec<VertRef> = (0..mesh.vertex_count() as u32).map(VertRef).collect();
        let n = verts.len();
        let (mut positions, mut normals) = (vec![Vec3::ZERO; n], vec![Vec3::ZERO; n]);
        let (mut distances, mut factors) = (vec![0.0; n], vec![0.0; n]);

        let ctx = FactorContext {
            brush: &brush,
            cache: &cache,
            accessor: &mesh,
            automask: None,
            texture_sampler: None,
            projection: None,
        };
        compute_node_factors(
            &ctx,
            &test,
            &verts,
            &mut positions,
            &mut normals,
            &mut distances,
            &mut factors,
        );

        for (i, &factor) in factors.iter().enumerate() {
            let dist = positions[i].distance(cache.location);
            if dist > cache.radius {
                assert_eq!(factor, 0.0, "vertex {i} at distance {dist}");
            }
        }
        // The vertex at the brush center has full influence.
        assert!(factors[0] > 0.99);
    }

    #[test]
    fn test_filter_distances_zeroes_beyond_radius() {
        let distances = [0.5, 1.0, 1.5];
        let mut factors = [1.0f32; 3];
        filter_distances_with_radius(1.0, &distances, &mut factors);
        assert_eq!(factors, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_hidden_vertex_factor_zero() {
        let mut mesh = line_mesh(4);
        mesh.set_hide_vert(0, true);
        let verts: Vec<VertRef> = (0..4).map(VertRef).collect();
        let mut factors = vec![0.0; 4];
        fill_factor_from_hide_and_mask(&mesh, &verts, &mut factors);
        assert_eq!(factors[0], 0.0);
        assert_eq!(factors[1], 1.0);
    }

    #[test]
    fn test_mask_reduces_factor() {
        let mut mesh = line_mesh(4);
        mesh.set_mask(VertRef(1), 0.25);
        let verts: Vec<VertRef> = (0..4).map(VertRef).collect();
        let mut factors = vec![0.0; 4];
        fill_factor_from_hide_and_mask(&mesh, &verts, &mut factors);
        assert!((factors[1] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_front_face_attenuation() {
        let normals = vec![Vec3::Z, Vec3::X, -Vec3::Z];
        let mut factors = vec![1.0; 3];
        calc_front_face(Vec3::Z, &normals, &mut factors);
        assert_eq!(factors[0], 1.0);
        assert_eq!(factors[1], 0.0);
        // Back-facing clamps to zero rather than going negative.
        assert_eq!(factors[2], 0.0);
    }

    #[test]
    fn test_hardness_full_effect_inside_radius() {
        // With hardness 1 every in-radius distance remaps to 0.
        let mut distances = vec![0.1, 0.5, 0.9, f32::INFINITY];
        apply_hardness_to_distances(1.0, 1.0, &mut distances);
        assert_eq!(&distances[..3], &[0.0, 0.0, 0.0]);
        assert!(distances[3].is_infinite());
    }

    #[test]
    fn test_automask_multiplies() {
        use crate::automask::{AutomaskCache, AutomaskSettings};
        let mesh = line_mesh(4);
        let settings = AutomaskSettings {
            boundary_steps: 1,
            ..Default::default()
        };
        let automask = AutomaskCache::build(&settings, &mesh, None);
        let verts: Vec<VertRef> = (0..4).map(VertRef).collect();
        let mut factors = vec![1.0; 4];
        calc_automask_factors(Some(&automask), &verts, &mut factors);
        // Every vertex of an open strip is boundary: fully masked.
        assert!(factors.iter().all(|&f| f == 0.0));
    }
}
