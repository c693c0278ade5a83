//! Interactive mesh-sculpting brush evaluation
//!
//! This crate implements the evaluation core of a sculpt mode:
//! - [`mesh`] - Uniform vertex access over plain meshes, subdivision grids
//!   and dynamic-topology half-edge meshes
//! - [`spatial`] - Node gathering against an external spatial index
//! - [`brush`] / [`brush_test`] / [`curve`] - Brush configuration, influence
//!   volume tests and falloff
//! - [`area`] - Weighted area normal/center estimation for the brush plane
//! - [`factor`] - The per-vertex strength pipeline (mask, front-face,
//!   hardness, curve, texture, automask)
//! - [`symmetry`] - Mirror/radial symmetry and tiling passes
//! - [`translation`] - Displacement post-processing and position writes
//! - [`undo`] - Original-coordinate snapshots and stroke cancel
//! - [`session`] - The stroke lifecycle driving all of the above
//! - [`filter`] - Cache for iterative whole-mesh filters

pub mod area;
pub mod automask;
pub mod brush;
pub mod cache;
pub mod curve;
pub mod factor;
pub mod filter;
pub mod half_edge;
pub mod mesh;
pub mod session;
pub mod spatial;
pub mod symmetry;
pub mod texture;
pub mod translation;
pub mod types;
pub mod undo;

pub use area::{calc_area_normal, calc_area_normal_and_center, AreaQuery, OrigTriangles};
pub use automask::{AutomaskCache, AutomaskSettings, CavitySettings};
pub use brush::{apply_hardness, brush_strength, Brush, BrushTexture};
pub use brush_test::{BrushTest, ClipPlanes};
pub use cache::{ClothSimCache, PoseIkCache, StrokeCache, StrokeSample};
pub use curve::FalloffCurve;
pub use filter::{FilterCache, FilterOrientation};
pub use mesh::{DynTopoMesh, GeometryAccessor, MeshData, Neighbors, PlainMesh, SubdivGrids, VertRef};
pub use session::{ActionContext, BrushAction, SculptSession, StepStats};
pub use spatial::{gather_brush_nodes, Aabb, NodeId, NodeSoup, RayHit, SpatialIndex};
pub use symmetry::{SymmetryFlags, SymmetrySettings};
pub use texture::TextureSampler;
pub use translation::{MirrorClip, ShapeKey, ShapeKeys};
pub use types::{FalloffShape, SculptError, SculptTool, TextureMapMode};
pub use undo::{StrokeUndo, UndoAttribute};
