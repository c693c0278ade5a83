//! Brush configuration and stroke strength.
//!
//! The strength table reproduces the per-tool multipliers artists rely on;
//! each tool combines squared alpha, pressure, symmetry-overlap compensation
//! and sign in its own documented way.

use serde::{Deserialize, Serialize};

use crate::cache::StrokeCache;
use crate::curve::FalloffCurve;
use crate::types::{
    ClothDeformType, FalloffShape, MaskToolMode, SculptPlane, SculptTool, TextureMapMode,
};

/// Brush texture settings. Sampling itself is delegated to an external
/// [`crate::texture::TextureSampler`]; the brush only configures the mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrushTexture {
    pub map_mode: TextureMapMode,
    /// Texture-space scale per axis.
    pub size: [f32; 3],
    /// Texture-space offset per axis.
    pub offset: [f32; 3],
    /// Rotation of the brush tip in radians, folded into the brush-local
    /// matrix together with the rake angle.
    pub rotation: f32,
    /// Subtracted from sampled values, so flat texture areas can be neutral.
    pub sample_bias: f32,
}

impl Default for BrushTexture {
    fn default() -> Self {
        Self {
            map_mode: TextureMapMode::Volume,
            size: [1.0; 3],
            offset: [0.0; 3],
            rotation: 0.0,
            sample_bias: 0.0,
        }
    }
}

/// Brush configuration for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brush {
    pub tool: SculptTool,
    /// Brush radius in object space.
    pub radius: f32,
    /// Primary strength input in [0, 1]. Squared before use so low values
    /// stay sensitive.
    pub alpha: f32,
    /// Remaps distance so influence stays at maximum up to
    /// `hardness * radius`.
    pub hardness: f32,
    pub curve: FalloffCurve,
    pub falloff_shape: FalloffShape,
    pub sculpt_plane: SculptPlane,
    /// Attenuate influence by how much the vertex normal faces the view.
    pub front_face_only: bool,
    /// Built-in direction of the tool (push vs. pull).
    pub dir_in: bool,
    /// Inverting switches scrape<->fill instead of negating strength.
    pub invert_to_scrape_fill: bool,
    /// Whether tablet pressure modulates alpha.
    pub use_alpha_pressure: bool,
    /// Keep the sculpt normal from the first step of the stroke.
    pub original_normal: bool,
    /// Displacement accumulates across steps instead of being measured from
    /// the pre-stroke original.
    pub accumulate: bool,
    /// Anchored brushes restore the original state and reapply every step.
    pub anchored: bool,
    /// Scale applied to the normal-estimation radius.
    pub normal_radius_factor: f32,
    /// Scale applied to the area-center radius (scrape/fill style tools).
    /// Zero disables the override and the normal factor is used instead.
    pub area_radius_factor: f32,
    /// Modulate the area radius by pen pressure.
    pub area_radius_pressure: bool,
    /// Blend between a square tip (0) and a round tip (1) for cube tests.
    pub tip_roundness: f32,
    /// Width scale of the tip along local X.
    pub tip_scale_x: f32,
    /// View-normal weight for snake hook.
    pub normal_weight: f32,
    pub cloth_deform_type: ClothDeformType,
    pub mask_tool: MaskToolMode,
    pub texture: Option<BrushTexture>,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            tool: SculptTool::Draw,
            radius: 1.0,
            alpha: 0.5,
            hardness: 0.0,
            curve: FalloffCurve::Smooth,
            falloff_shape: FalloffShape::Sphere,
            sculpt_plane: SculptPlane::AreaNormal,
            front_face_only: false,
            dir_in: false,
            invert_to_scrape_fill: false,
            use_alpha_pressure: true,
            original_normal: false,
            accumulate: false,
            anchored: false,
            normal_radius_factor: 0.5,
            area_radius_factor: 0.0,
            area_radius_pressure: false,
            tip_roundness: 1.0,
            tip_scale_x: 1.0,
            normal_weight: 0.0,
            cloth_deform_type: ClothDeformType::Drag,
            mask_tool: MaskToolMode::Draw,
            texture: None,
        }
    }
}

impl Brush {
    pub fn new(tool: SculptTool) -> Self {
        Self {
            tool,
            ..Self::default()
        }
    }

    /// Whether the square-tip test applies, requiring the √2 query radius.
    pub fn has_cube_tip(&self) -> bool {
        self.tip_roundness < 1.0 || self.tip_scale_x != 1.0
    }

    /// Scale factor for the spatial query radius. Under-covering here causes
    /// visible seams at the brush boundary, so this is a correctness
    /// requirement rather than a tuning knob.
    pub fn query_radius_scale(&self) -> f32 {
        if self.has_cube_tip() {
            return std::f32::consts::SQRT_2;
        }
        if self.tool == SculptTool::Draw && self.original_normal {
            return 2.0;
        }
        1.0
    }
}

/// Remap a raw distance according to brush hardness.
///
/// Everything inside `hardness * radius` maps to 0 (full effect); the
/// remainder is rescaled to fill `[0, radius]`. A hardness of 0 leaves the
/// distance untouched; a hardness of 1 gives every in-radius vertex full
/// effect.
pub fn apply_hardness(distance: f32, radius: f32, hardness: f32) -> f32 {
    if radius <= 0.0 {
        return distance;
    }
    let p = distance / radius;
    if p < hardness {
        0.0
    } else if hardness >= 1.0 {
        radius
    } else {
        (p - hardness) / (1.0 - hardness) * radius
    }
}

fn pow4(x: f32) -> f32 {
    let sq = x * x;
    sq * sq
}

/// Modified brush strength for one stroke step.
///
/// Positive values pull vertices, negative values push. `feather` is the
/// symmetry-overlap compensation factor from
/// [`crate::symmetry::symmetry_feather`].
pub fn brush_strength(brush: &Brush, cache: &StrokeCache, feather: f32) -> f32 {
    let root_alpha = brush.alpha;
    // Square the primary strength input to make lower values more sensitive.
    let alpha = root_alpha * root_alpha;
    let dir = if brush.dir_in { -1.0 } else { 1.0 };
    let pressure = if brush.use_alpha_pressure {
        cache.pressure
    } else {
        1.0
    };
    let pen_flip = if cache.pen_flip { -1.0 } else { 1.0 };
    let invert = if cache.invert { -1.0 } else { 1.0 };
    let mut overlap = cache.overlap_factor;

    let mut flip = dir * invert * pen_flip;
    if brush.invert_to_scrape_fill {
        flip = 1.0;
    }

    match brush.tool {
        SculptTool::Clay => {
            let final_pressure = pow4(pressure);
            overlap = (1.0 + overlap) / 2.0;
            0.25 * alpha * flip * final_pressure * overlap * feather
        }
        SculptTool::Draw | SculptTool::DrawSharp | SculptTool::Layer => {
            alpha * flip * pressure * overlap * feather
        }
        SculptTool::DisplacementEraser => alpha * pressure * overlap * feather,
        SculptTool::Cloth => match brush.cloth_deform_type {
            // Grab deform uses the same falloff as a regular grab brush.
            ClothDeformType::Grab => root_alpha * feather,
            ClothDeformType::SnakeHook => root_alpha * feather * pressure * overlap,
            // Expand keeps expanding the cloth when sculpting over the same
            // vertices, so it needs far less strength.
            ClothDeformType::Expand => 0.1 * alpha * flip * pressure * overlap * feather,
            ClothDeformType::Drag => 10.0 * alpha * flip * pressure * overlap * feather,
        },
        SculptTool::DrawFaceSets => alpha * pressure * overlap * feather,
        SculptTool::SlideRelax => alpha * pressure * overlap * feather * 2.0,
        SculptTool::Paint => {
            let final_pressure = pressure * pressure;
            final_pressure * overlap * feather
        }
        SculptTool::Smear | SculptTool::DisplacementSmear => alpha * pressure * overlap * feather,
        SculptTool::ClayStrips => {
            // Clay strips needs less strength to compensate the curve.
            let final_pressure = pressure.powf(1.5);
            alpha * flip * final_pressure * overlap * feather * 0.3
        }
        SculptTool::ClayThumb => {
            let final_pressure = pressure * pressure;
            alpha * flip * final_pressure * overlap * feather * 1.3
        }
        SculptTool::Mask => {
            overlap = (1.0 + overlap) / 2.0;
            match brush.mask_tool {
                MaskToolMode::Draw => alpha * flip * pressure * overlap * feather,
                MaskToolMode::Smooth => alpha * pressure * feather,
            }
        }
        SculptTool::Crease | SculptTool::Blob => alpha * flip * pressure * overlap * feather,
        SculptTool::Inflate => {
            if flip > 0.0 {
                0.250 * alpha * flip * pressure * overlap * feather
            } else {
                0.125 * alpha * flip * pressure * overlap * feather
            }
        }
        SculptTool::MultiplaneScrape => {
            overlap = (1.0 + overlap) / 2.0;
            alpha * flip * pressure * overlap * feather
        }
        SculptTool::Fill | SculptTool::Scrape | SculptTool::Flatten => {
            if flip > 0.0 {
                overlap = (1.0 + overlap) / 2.0;
                alpha * flip * pressure * overlap * feather
            } else {
                // Reduce strength for deepen, peaks and contrast.
                0.5 * alpha * flip * pressure * overlap * feather
            }
        }
        SculptTool::Smooth => flip * alpha * pressure * feather,
        SculptTool::Pinch => {
            if flip > 0.0 {
                alpha * flip * pressure * overlap * feather
            } else {
                0.25 * alpha * flip * pressure * overlap * feather
            }
        }
        SculptTool::Nudge => {
            overlap = (1.0 + overlap) / 2.0;
            alpha * pressure * overlap * feather
        }
        SculptTool::Thumb => alpha * pressure * feather,
        SculptTool::SnakeHook | SculptTool::Grab => root_alpha * feather,
        SculptTool::Rotate => alpha * pressure * feather,
        SculptTool::ElasticDeform | SculptTool::Pose | SculptTool::Boundary => {
            root_alpha * feather
        }
    }
}
