//! Live stroke state.
//!
//! One [`StrokeCache`] exists per stroke-in-progress, owned exclusively by
//! the session. It is allocated when the stroke begins, mutated once per
//! input sample, and destroyed when the stroke ends or is cancelled.
//!
//! Fields come in `true_*` / pass-local pairs: the `true_*` values hold the
//! raw input-space state, the pass-local values are rewritten by
//! [`crate::symmetry::calc_brushdata_symm`] for every symmetry pass.

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::symmetry::SymmetryFlags;

/// One input sample of a stroke (mouse move event).
#[derive(Debug, Clone, Copy)]
pub struct StrokeSample {
    /// Hit location on the surface, object space.
    pub location: Vec3,
    /// Screen-space cursor position.
    pub mouse: Vec2,
    /// Tablet pressure in [0, 1].
    pub pressure: f32,
    /// Pen tilt, each axis in [-1, 1].
    pub tilt: Vec2,
    /// Pen eraser/barrel flip.
    pub pen_flip: bool,
}

impl Default for StrokeSample {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            mouse: Vec2::ZERO,
            pressure: 1.0,
            tilt: Vec2::ZERO,
            pen_flip: false,
        }
    }
}

/// Cloth solver state persisted across the steps of one stroke. Allocated
/// by cloth-enabled tools on their first step.
#[derive(Debug, Clone, Default)]
pub struct ClothSimCache {
    pub init_positions: Vec<Vec3>,
    pub prev_positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

/// Pose chain state, computed once when the pose tool starts pulling.
#[derive(Debug, Clone, Default)]
pub struct PoseIkCache {
    pub pivot: Vec3,
    pub initial_pivot: Vec3,
    /// Per-vertex chain weights.
    pub factors: Vec<f32>,
}

/// Mutable state of one stroke-in-progress.
#[derive(Debug, Clone)]
pub struct StrokeCache {
    // Raw (un-mirrored) state.
    pub true_location: Vec3,
    pub true_last_location: Vec3,
    pub true_initial_location: Vec3,
    pub true_initial_normal: Vec3,
    pub true_view_normal: Vec3,
    pub true_gravity_direction: Vec3,

    // Pass-local state, rewritten per symmetry pass.
    pub location: Vec3,
    pub last_location: Vec3,
    pub initial_location: Vec3,
    pub initial_normal: Vec3,
    pub view_normal: Vec3,
    pub gravity_direction: Vec3,

    pub mouse: Vec2,
    pub last_mouse: Vec2,

    pub radius: f32,
    pub radius_squared: f32,

    pub pressure: f32,
    pub x_tilt: f32,
    pub y_tilt: f32,
    pub pen_flip: bool,
    pub invert: bool,

    /// Stroke movement since the previous step, and its per-pass image.
    pub grab_delta: Vec3,
    pub grab_delta_symm: Vec3,

    /// Precomputed symmetry-overlap divisor input (see
    /// [`crate::symmetry::symmetry_feather`]).
    pub overlap_factor: f32,
    /// Final signed strength for this step.
    pub bstrength: f32,

    pub symmetry: SymmetryFlags,
    pub mirror_symmetry_pass: SymmetryFlags,
    pub radial_symmetry_pass: u8,
    pub tile_pass: u32,
    pub symm_rot_mat: Mat4,
    pub symm_rot_mat_inv: Mat4,
    /// Offset of the current tile, subtracted before texture sampling so
    /// tiles repeat the texture instead of smearing it.
    pub plane_offset: Vec3,

    /// Brush plane normal computed on pass (0, 0, 0) and its per-pass image.
    pub sculpt_normal: Vec3,
    pub sculpt_normal_symm: Vec3,

    /// Brush-local frame (model space -> brush tip space) and its inverse.
    pub brush_local_mat: Mat4,
    pub brush_local_mat_inv: Mat4,

    pub rake_rotation: Option<Quat>,
    pub rake_rotation_symm: Option<Quat>,

    pub supports_gravity: bool,

    /// Whether displacement accumulates across steps. When false, area
    /// normal/center estimation reads original coordinates so the brush
    /// plane cannot drift under repeated strokes.
    pub accum: bool,

    /// Cloth solver state; empty until a cloth tool allocates it, dropped
    /// with the stroke.
    pub cloth: Option<Box<ClothSimCache>>,
    /// Pose chain state, same lifetime rules as `cloth`.
    pub pose: Option<Box<PoseIkCache>>,

    /// True only during the first step of the stroke.
    pub first_time: bool,
    /// Number of completed stroke steps.
    pub step: u32,
}

impl Default for StrokeCache {
    fn default() -> Self {
        Self {
            true_location: Vec3::ZERO,
            true_last_location: Vec3::ZERO,
            true_initial_location: Vec3::ZERO,
            true_initial_normal: Vec3::Z,
            true_view_normal: Vec3::Z,
            true_gravity_direction: Vec3::NEG_Z,
            location: Vec3::ZERO,
            last_location: Vec3::ZERO,
            initial_location: Vec3::ZERO,
            initial_normal: Vec3::Z,
            view_normal: Vec3::Z,
            gravity_direction: Vec3::NEG_Z,
            mouse: Vec2::ZERO,
            last_mouse: Vec2::ZERO,
            radius: 1.0,
            radius_squared: 1.0,
            pressure: 1.0,
            x_tilt: 0.0,
            y_tilt: 0.0,
            pen_flip: false,
            invert: false,
            grab_delta: Vec3::ZERO,
            grab_delta_symm: Vec3::ZERO,
            overlap_factor: 1.0,
            bstrength: 0.0,
            symmetry: SymmetryFlags::NONE,
            mirror_symmetry_pass: SymmetryFlags::NONE,
            radial_symmetry_pass: 0,
            tile_pass: 0,
            symm_rot_mat: Mat4::IDENTITY,
            symm_rot_mat_inv: Mat4::IDENTITY,
            plane_offset: Vec3::ZERO,
            sculpt_normal: Vec3::Z,
            sculpt_normal_symm: Vec3::Z,
            brush_local_mat: Mat4::IDENTITY,
            brush_local_mat_inv: Mat4::IDENTITY,
            rake_rotation: None,
            rake_rotation_symm: None,
            supports_gravity: false,
            accum: false,
            cloth: None,
            pose: None,
            first_time: true,
            step: 0,
        }
    }
}

impl StrokeCache {
    /// Initialize the cache at stroke start.
    pub fn start(sample: &StrokeSample, radius: f32, view_normal: Vec3, invert: bool) -> Self {
        Self {
            true_location: sample.location,
            true_last_location: sample.location,
            true_initial_location: sample.location,
            true_view_normal: view_normal.normalize_or_zero(),
            mouse: sample.mouse,
            last_mouse: sample.mouse,
            radius,
            radius_squared: radius * radius,
            pressure: sample.pressure,
            x_tilt: sample.tilt.x,
            y_tilt: sample.tilt.y,
            pen_flip: sample.pen_flip,
            invert,
            ..Default::default()
        }
    }

    /// Per-step update from a new input sample.
    pub fn update(&mut self, sample: &StrokeSample) {
        self.true_last_location = self.true_location;
        self.last_mouse = self.mouse;

        self.true_location = sample.location;
        self.mouse = sample.mouse;
        self.pressure = sample.pressure;
        self.x_tilt = sample.tilt.x;
        self.y_tilt = sample.tilt.y;
        self.pen_flip = sample.pen_flip;

        self.grab_delta = self.true_location - self.true_last_location;
    }

    /// Mark one stroke step as completed.
    pub fn finish_step(&mut self) {
        self.first_time = false;
        self.step += 1;
    }

    /// Whether the current pass is the distinguished (0, 0, 0) pass.
    pub fn is_primary_pass(&self) -> bool {
        self.mirror_symmetry_pass.is_empty() && self.radial_symmetry_pass == 0 && self.tile_pass == 0
    }
}
