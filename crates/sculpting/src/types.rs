//! Core sculpting types shared across the brush evaluation pipeline.

use serde::{Deserialize, Serialize};

/// Sculpt tool kinds.
///
/// The tool-specific displacement math lives outside this crate; the tool
/// identity is still needed here because brush strength, radius scaling and
/// node gathering all depend on which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SculptTool {
    #[default]
    Draw = 0,
    DrawSharp,
    Clay,
    ClayStrips,
    ClayThumb,
    Layer,
    Inflate,
    Blob,
    Crease,
    Smooth,
    Flatten,
    Fill,
    Scrape,
    MultiplaneScrape,
    Pinch,
    Grab,
    ElasticDeform,
    SnakeHook,
    Thumb,
    Pose,
    Nudge,
    Rotate,
    SlideRelax,
    Boundary,
    Cloth,
    Mask,
    DrawFaceSets,
    Paint,
    Smear,
    DisplacementEraser,
    DisplacementSmear,
}

impl SculptTool {
    /// Tools whose effect is not bounded by the brush radius. For these the
    /// node gather must return every leaf, not just nodes inside the radius.
    pub fn needs_all_nodes(self) -> bool {
        matches!(
            self,
            SculptTool::Pose | SculptTool::Boundary | SculptTool::ElasticDeform
        )
    }

    /// The mask tool also affects fully masked nodes, so the
    /// fully-hidden/fully-masked node filter must be skipped for it.
    pub fn ignores_fully_masked(self) -> bool {
        self != SculptTool::Mask
    }
}

/// Shape of the brush influence volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FalloffShape {
    /// Volumetric 3D falloff around the brush location.
    #[default]
    Sphere = 0,
    /// Projected falloff: a cylinder aligned with the view direction.
    /// Requires a cached view normal; falls back to sphere without one.
    Tube = 1,
}

/// How the cloth solver deforms geometry, relevant only to strength scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClothDeformType {
    #[default]
    Drag = 0,
    Grab,
    SnakeHook,
    Expand,
}

/// Sub-mode of the mask tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MaskToolMode {
    #[default]
    Draw = 0,
    Smooth,
}

/// Reference plane used to compute the primary direction of movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SculptPlane {
    #[default]
    AreaNormal = 0,
    ViewNormal,
    AxisX,
    AxisY,
    AxisZ,
}

/// How a brush texture is mapped onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TextureMapMode {
    /// Sample the texture directly at the 3D vertex location.
    #[default]
    Volume = 0,
    /// Project from the brush plane (brush-local XY).
    Area,
    /// Project from the view plane.
    View,
}

/// Errors surfaced to the operator level.
///
/// Only precondition violations propagate this way; geometric edge cases are
/// recovered locally (see the factor and area modules).
#[derive(Debug, thiserror::Error)]
pub enum SculptError {
    #[error("active shape key '{0}' is locked")]
    ShapeKeyLocked(String),
    #[error("no stroke in progress")]
    NoActiveStroke,
    #[error("a stroke is already in progress")]
    StrokeInProgress,
    #[error("mesh has no vertices under the cursor")]
    EmptyTarget,
}
