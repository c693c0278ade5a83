//! Mirror/radial symmetry and spatial tiling for brush actions.
//!
//! A stroke step runs the brush action once per valid (mirror × radial ×
//! tile) combination. Pass (0, 0, 0) is distinguished: sculpt-normal and
//! brush-plane state is computed there and reused by every other pass, so
//! the brush plane stays frozen within one stroke step.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::cache::StrokeCache;
use crate::spatial::Aabb;

/// Bitmask over the X/Y/Z mirror planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SymmetryFlags(pub u8);

impl SymmetryFlags {
    pub const NONE: SymmetryFlags = SymmetryFlags(0);
    pub const X: SymmetryFlags = SymmetryFlags(1);
    pub const Y: SymmetryFlags = SymmetryFlags(2);
    pub const Z: SymmetryFlags = SymmetryFlags(4);

    pub fn contains(self, other: SymmetryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A mirror axis for radial symmetry passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Session-level symmetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymmetrySettings {
    pub mirror: SymmetryFlags,
    /// Number of radial repetitions per axis (1 = disabled).
    pub radial: [u8; 3],
    /// Blend overlapping mirrored strokes instead of doubling their
    /// strength.
    pub feather: bool,
    /// Axes with spatial tiling enabled.
    pub tile: [bool; 3],
    /// Tile step per axis; a non-positive step disables that axis.
    pub tile_step: [f32; 3],
}

impl Default for SymmetrySettings {
    fn default() -> Self {
        Self {
            mirror: SymmetryFlags::NONE,
            radial: [1, 1, 1],
            feather: false,
            tile: [false; 3],
            tile_step: [0.0; 3],
        }
    }
}

/// Flip a vector across the mirror planes selected by `symm`.
pub fn symmetry_flip(v: Vec3, symm: SymmetryFlags) -> Vec3 {
    let mut out = v;
    if symm.contains(SymmetryFlags::X) {
        out.x = -out.x;
    }
    if symm.contains(SymmetryFlags::Y) {
        out.y = -out.y;
    }
    if symm.contains(SymmetryFlags::Z) {
        out.z = -out.z;
    }
    out
}

/// Flip a rotation across the mirror planes selected by `symm`.
pub fn symmetry_flip_quat(q: Quat, symm: SymmetryFlags) -> Quat {
    let (axis, mut angle) = q.to_axis_angle();
    let mut axis = axis.normalize_or_zero();
    if symm.contains(SymmetryFlags::X) {
        axis.x = -axis.x;
        angle = -angle;
    }
    if symm.contains(SymmetryFlags::Y) {
        axis.y = -axis.y;
        angle = -angle;
    }
    if symm.contains(SymmetryFlags::Z) {
        axis.z = -axis.z;
        angle = -angle;
    }
    if axis.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis.normalize(), angle)
}

/// Whether mirror combination `i` is a valid pass for the enabled axes.
///
/// `symm` is a bit combination of XYZ: 1 = X, 2 = Y, 3 = XY, 4 = Z, 5 = XZ,
/// 6 = YZ, 7 = XYZ. Combinations that include a disabled axis are skipped,
/// as are the XY pass when only XZ is enabled and the XY/XZ passes when only
/// YZ is enabled.
pub fn is_symmetry_iteration_valid(i: u8, symm: u8) -> bool {
    i == 0 || (symm & i == i && (symm != 5 || i != 3) && (symm != 6 || !(i == 3 || i == 5)))
}

/// All valid mirror passes for the enabled axes, in pass order.
pub fn valid_mirror_passes(symm: SymmetryFlags) -> impl Iterator<Item = SymmetryFlags> {
    let bits = symm.0;
    (0..=bits).filter(move |i| is_symmetry_iteration_valid(*i, bits)).map(SymmetryFlags)
}

fn overlap_for_pass(cache: &StrokeCache, symm: SymmetryFlags, axis: Option<Axis>, angle: f32) -> f32 {
    let mut mirror = symmetry_flip(cache.true_location, symm);
    if let Some(axis) = axis {
        mirror = Quat::from_axis_angle(axis.unit(), angle) * mirror;
    }

    let dist_sq = mirror.distance_squared(cache.true_location);
    if dist_sq <= 4.0 * cache.radius_squared {
        (2.0 * cache.radius - dist_sq.sqrt()) / (2.0 * cache.radius)
    } else {
        0.0
    }
}

fn radial_overlap(settings: &SymmetrySettings, cache: &StrokeCache, symm: SymmetryFlags, axis: Axis) -> f32 {
    let repeats = settings.radial[axis as usize].max(1) as i32;
    let mut overlap = 0.0;
    for i in 1..repeats {
        let angle = std::f32::consts::TAU * i as f32 / repeats as f32;
        overlap += overlap_for_pass(cache, symm, Some(axis), angle);
    }
    overlap
}

/// Symmetry-overlap compensation factor, used as a strength divisor.
///
/// Measures how much each mirrored/rotated copy of the stroke overlaps the
/// un-mirrored location and inverts the accumulated sum. 1.0 when feathering
/// is disabled.
pub fn symmetry_feather(settings: &SymmetrySettings, cache: &StrokeCache) -> f32 {
    if !settings.feather {
        return 1.0;
    }

    let mut overlap = 0.0;
    for pass in valid_mirror_passes(settings.mirror) {
        overlap += overlap_for_pass(cache, pass, None, 0.0);
        for axis in Axis::ALL {
            overlap += radial_overlap(settings, cache, pass, axis);
        }
    }

    if overlap <= 0.0 {
        return 1.0;
    }
    1.0 / overlap
}

/// Transform the cached brush-space state for one symmetry pass.
///
/// Must run before the brush action of every pass; the test structs and the
/// translation pipeline all read the pass-local fields this writes.
pub fn calc_brushdata_symm(
    cache: &mut StrokeCache,
    symm: SymmetryFlags,
    axis: Option<Axis>,
    angle: f32,
) {
    cache.location = symmetry_flip(cache.true_location, symm);
    cache.last_location = symmetry_flip(cache.true_last_location, symm);
    cache.grab_delta_symm = symmetry_flip(cache.grab_delta, symm);
    cache.view_normal = symmetry_flip(cache.true_view_normal, symm);

    cache.initial_location = symmetry_flip(cache.true_initial_location, symm);
    cache.initial_normal = symmetry_flip(cache.true_initial_normal, symm);

    cache.symm_rot_mat = Mat4::IDENTITY;
    cache.symm_rot_mat_inv = Mat4::IDENTITY;
    cache.plane_offset = Vec3::ZERO;

    if let Some(axis) = axis {
        cache.symm_rot_mat = Mat4::from_axis_angle(axis.unit(), angle);
        cache.symm_rot_mat_inv = Mat4::from_axis_angle(axis.unit(), -angle);
    }

    cache.location = cache.symm_rot_mat.transform_point3(cache.location);
    cache.grab_delta_symm = cache.symm_rot_mat.transform_vector3(cache.grab_delta_symm);

    if cache.supports_gravity {
        cache.gravity_direction = symmetry_flip(cache.true_gravity_direction, symm);
        cache.gravity_direction = cache.symm_rot_mat.transform_vector3(cache.gravity_direction);
    }

    if let Some(rake) = cache.rake_rotation {
        cache.rake_rotation_symm = Some(symmetry_flip_quat(rake, symm));
    }
}

fn do_tiled(
    settings: &SymmetrySettings,
    cache: &mut StrokeCache,
    object_bounds: &Aabb,
    action: &mut dyn FnMut(&mut StrokeCache),
) {
    let radius = cache.radius;
    let org_loc = cache.location;
    let org_initial = cache.initial_location;

    // Integer tile coordinates; tile (0, 0, 0) is the prototype stroke.
    let mut start = [0i32; 3];
    let mut end = [0i32; 3];
    for dim in 0..3 {
        let step = settings.tile_step[dim];
        if settings.tile[dim] && step > 0.0 {
            start[dim] = ((object_bounds.min[dim] - org_loc[dim] - radius) / step) as i32;
            end[dim] = ((object_bounds.max[dim] - org_loc[dim] + radius) / step) as i32;
        }
    }

    // The un-tiled position initializes the stroke for this location.
    cache.tile_pass = 0;
    action(cache);

    for x in start[0]..=end[0] {
        for y in start[1]..=end[1] {
            for z in start[2]..=end[2] {
                if x == 0 && y == 0 && z == 0 {
                    continue;
                }
                cache.tile_pass += 1;
                let offset = Vec3::new(
                    x as f32 * settings.tile_step[0],
                    y as f32 * settings.tile_step[1],
                    z as f32 * settings.tile_step[2],
                );
                cache.location = org_loc + offset;
                cache.plane_offset = offset;
                cache.initial_location = org_initial + offset;
                action(cache);
            }
        }
    }
}

fn do_radial(
    settings: &SymmetrySettings,
    cache: &mut StrokeCache,
    object_bounds: &Aabb,
    symm: SymmetryFlags,
    axis: Axis,
    action: &mut dyn FnMut(&mut StrokeCache),
) {
    let repeats = settings.radial[axis as usize].max(1) as i32;
    for i in 1..repeats {
        let angle = std::f32::consts::TAU * i as f32 / repeats as f32;
        cache.radial_symmetry_pass = i as u8;
        calc_brushdata_symm(cache, symm, Some(axis), angle);
        do_tiled(settings, cache, object_bounds, action);
    }
}

/// Run `action` once per valid (mirror × radial × tile) combination.
///
/// The per-pass cache state is fully recomputed before each invocation. The
/// ordering is significant for undo grouping and for tools with
/// path-dependent state.
pub fn for_each_symmetry_pass(
    settings: &SymmetrySettings,
    cache: &mut StrokeCache,
    object_bounds: &Aabb,
    mut action: impl FnMut(&mut StrokeCache),
) {
    let symm = settings.mirror;
    cache.symmetry = symm;

    for i in 0..=symm.0 {
        if !is_symmetry_iteration_valid(i, symm.0) {
            continue;
        }
        let pass = SymmetryFlags(i);
        cache.mirror_symmetry_pass = pass;
        cache.radial_symmetry_pass = 0;

        calc_brushdata_symm(cache, pass, None, 0.0);
        do_tiled(settings, cache, object_bounds, &mut action);

        for axis in Axis::ALL {
            do_radial(settings, cache, object_bounds, pass, axis, &mut action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_round_trips() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        let once = symmetry_flip(v, SymmetryFlags::X);
        let twice = symmetry_flip(once, SymmetryFlags::X);
        assert!((twice - v).length() < 1e-6);
        assert!((once.x + v.x).abs() < 1e-6);
        assert_eq!(once.y, v.y);
    }

    #[test]
    fn test_iteration_validity() {
        // XZ enabled (5): the XY pass (3) is invalid.
        assert!(is_symmetry_iteration_valid(0, 5));
        assert!(is_symmetry_iteration_valid(1, 5));
        assert!(!is_symmetry_iteration_valid(3, 5));
        assert!(is_symmetry_iteration_valid(5, 5));
        // YZ enabled (6): passes 3 and 5 are invalid.
        assert!(!is_symmetry_iteration_valid(3, 6));
        assert!(!is_symmetry_iteration_valid(5, 6));
        assert!(is_symmetry_iteration_valid(6, 6));
        // Disabled axes never produce passes.
        assert!(!is_symmetry_iteration_valid(2, 1));
    }

    #[test]
    fn test_pass_count_full_symmetry() {
        let passes: Vec<_> = valid_mirror_passes(SymmetryFlags(7)).collect();
        assert_eq!(passes.len(), 8);
    }

    #[test]
    fn test_driver_runs_once_without_symmetry() {
        let settings = SymmetrySettings::default();
        let mut cache = StrokeCache::default();
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let mut count = 0;
        for_each_symmetry_pass(&settings, &mut cache, &bounds, |_| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_driver_mirror_x_runs_twice() {
        let settings = SymmetrySettings {
            mirror: SymmetryFlags::X,
            ..Default::default()
        };
        let mut cache = StrokeCache::default();
        cache.true_location = Vec3::new(0.5, 0.0, 0.0);
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let mut locations = Vec::new();
        for_each_symmetry_pass(&settings, &mut cache, &bounds, |c| {
            locations.push(c.location);
        });
        assert_eq!(locations.len(), 2);
        assert!((locations[0].x - 0.5).abs() < 1e-6);
        assert!((locations[1].x + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_radial_passes() {
        let settings = SymmetrySettings {
            radial: [1, 1, 4],
            ..Default::default()
        };
        let mut cache = StrokeCache::default();
        cache.true_location = Vec3::new(1.0, 0.0, 0.0);
        cache.radius = 0.1;
        cache.radius_squared = 0.01;
        let bounds = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let mut count = 0;
        for_each_symmetry_pass(&settings, &mut cache, &bounds, |_| count += 1);
        // 1 mirror pass x 4 radial positions.
        assert_eq!(count, 4);
    }

    #[test]
    fn test_feather_overlapping_stroke() {
        let settings = SymmetrySettings {
            mirror: SymmetryFlags::X,
            feather: true,
            ..Default::default()
        };
        let mut cache = StrokeCache::default();
        cache.radius = 1.0;
        cache.radius_squared = 1.0;
        // A stroke exactly on the mirror plane fully overlaps its mirror
        // image: overlap = 1 (self) + 1 (mirror) -> feather 0.5.
        cache.true_location = Vec3::ZERO;
        let feather = symmetry_feather(&settings, &cache);
        assert!((feather - 0.5).abs() < 1e-6);

        // Far from the plane there is no overlap with the mirror copy.
        cache.true_location = Vec3::new(10.0, 0.0, 0.0);
        let feather = symmetry_feather(&settings, &cache);
        assert!((feather - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tiling_covers_bounds() {
        let settings = SymmetrySettings {
            tile: [true, false, false],
            tile_step: [1.0, 0.0, 0.0],
            ..Default::default()
        };
        let mut cache = StrokeCache::default();
        cache.radius = 0.25;
        let bounds = Aabb::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let mut xs = Vec::new();
        for_each_symmetry_pass(&settings, &mut cache, &bounds, |c| xs.push(c.location.x));
        // Prototype tile plus repeats across [-2, 2].
        assert!(xs.len() >= 4);
        assert!((xs[0] - 0.0).abs() < 1e-6);
    }
}
