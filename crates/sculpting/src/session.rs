//! The sculpt session: stroke lifecycle and per-step brush evaluation.
//!
//! A session owns one mesh representation, its spatial index and all stroke
//! state. A stroke runs `begin_stroke`, any number of `stroke_step` calls
//! and then `end_stroke` or `cancel_stroke`. Each step evaluates the brush
//! once per symmetry pass: gather nodes, snapshot them for undo, compute
//! factors and translations in parallel over nodes, then apply the
//! translations serially through the shared pipeline.

use glam::{Mat3, Mat4, Vec3};
use rayon::prelude::*;
use tracing::debug;

use crate::area::{calc_area_normal, AreaQuery, OrigTriangles};
use crate::automask::{AutomaskCache, AutomaskSettings};
use crate::brush::{brush_strength, Brush};
use crate::brush_test::BrushTest;
use crate::cache::{StrokeCache, StrokeSample};
use crate::factor::{compute_node_factors, FactorContext};
use crate::filter::{FilterCache, FilterOrientation};
use crate::mesh::{GeometryAccessor, MeshData, VertRef};
use crate::spatial::{gather_brush_nodes, NodeId, NodeSoup, SpatialIndex};
use crate::symmetry::{
    calc_brushdata_symm, for_each_symmetry_pass, symmetry_feather, symmetry_flip, SymmetryFlags,
    SymmetrySettings,
};
use crate::texture::TextureSampler;
use crate::translation::{MirrorClip, ShapeKeys, TranslationApply};
use crate::types::SculptError;
use crate::undo::{StrokeUndo, UndoAttribute};

/// Inputs handed to a brush action for one node batch. All slices are
/// indexed like `verts`.
pub struct ActionContext<'a> {
    pub brush: &'a Brush,
    pub cache: &'a StrokeCache,
    pub verts: &'a [VertRef],
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    /// Remapped brush distances; infinite outside the influence volume.
    pub distances: &'a [f32],
}

/// Tool-specific displacement math, plugged in per brush.
///
/// `compute` receives the final per-vertex factors and fills `translations`
/// with raw displacements; the session owns clipping, axis locks,
/// deformation correction and the actual position writes. Implementations
/// run concurrently across node batches and must not carry mutable state.
pub trait BrushAction: Sync {
    fn compute(&self, ctx: &ActionContext, factors: &[f32], translations: &mut [Vec3]);
}

/// Counters reported per stroke step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub nodes_visited: usize,
    pub verts_modified: usize,
}

/// One sculptable object: geometry, index and stroke state.
pub struct SculptSession {
    mesh: MeshData,
    index: NodeSoup,
    pub symmetry: SymmetrySettings,
    pub axis_lock: [bool; 3],
    pub mirror_clip: MirrorClip,
    /// Per-vertex inverse deformation matrices when the object is deformed
    /// by modifiers; translations computed on the deformed shape are mapped
    /// back through these.
    pub deform_imats: Option<Vec<Mat3>>,
    pub shape_keys: Option<ShapeKeys>,
    automask_settings: AutomaskSettings,
    automask: Option<AutomaskCache>,
    cache: Option<StrokeCache>,
    undo: StrokeUndo,
    orig_triangles: Option<OrigTriangles>,
    filter: Option<FilterCache>,
}

impl SculptSession {
    /// Wrap a mesh and build a flat spatial index over `batch_size` vertex
    /// batches.
    pub fn new(mesh: MeshData, batch_size: usize) -> Self {
        let positions = gather_all_positions(mesh.accessor());
        let mut index = NodeSoup::build_uniform(&positions, batch_size);
        index.commit_original_bounds();
        Self {
            mesh,
            index,
            symmetry: SymmetrySettings::default(),
            axis_lock: [false; 3],
            mirror_clip: MirrorClip::default(),
            deform_imats: None,
            shape_keys: None,
            automask_settings: AutomaskSettings::default(),
            automask: None,
            cache: None,
            undo: StrokeUndo::new(),
            orig_triangles: None,
            filter: None,
        }
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut MeshData {
        &mut self.mesh
    }

    pub fn index(&self) -> &NodeSoup {
        &self.index
    }

    pub fn stroke_active(&self) -> bool {
        self.cache.is_some()
    }

    pub fn stroke_cache(&self) -> Option<&StrokeCache> {
        self.cache.as_ref()
    }

    /// Start a stroke at `sample`. Fails when a stroke is already running,
    /// the active shape key is locked, or the mesh is empty.
    pub fn begin_stroke(
        &mut self,
        brush: &Brush,
        sample: &StrokeSample,
        radius: f32,
        view_normal: Vec3,
        invert: bool,
    ) -> Result<(), SculptError> {
        if self.cache.is_some() {
            return Err(SculptError::StrokeInProgress);
        }
        if let Some(keys) = &self.shape_keys {
            keys.check_editable()?;
        }
        if self.mesh.accessor().vertex_count() == 0 {
            return Err(SculptError::EmptyTarget);
        }

        self.undo.clear();
        self.index.commit_original_bounds();

        let mut cache = StrokeCache::start(sample, radius, view_normal, invert);
        cache.accum = brush.accumulate;

        if self.mesh.is_dyntopo() && !cache.accum {
            self.orig_triangles = Some(self.capture_orig_triangles());
        }

        debug!(
            tool = ?brush.tool,
            radius,
            location = ?sample.location,
            "stroke begin"
        );
        self.cache = Some(cache);
        Ok(())
    }

    /// Evaluate one stroke step. `sampler` supplies brush texture values,
    /// `projection` the view matrix for view-mapped textures; both optional.
    pub fn stroke_step(
        &mut self,
        brush: &Brush,
        action: &dyn BrushAction,
        sample: &StrokeSample,
        sampler: Option<&dyn TextureSampler>,
        projection: Option<&Mat4>,
    ) -> Result<StepStats, SculptError> {
        let mut cache = self.cache.take().ok_or(SculptError::NoActiveStroke)?;
        cache.update(sample);

        // Anchored brushes rewind the previous step and reapply from
        // scratch, so the result tracks the cursor instead of accumulating.
        if brush.anchored && !cache.first_time {
            self.undo.restore_all(self.mesh.accessor_mut());
            self.refresh_normals();
        }

        cache.bstrength = brush_strength(brush, &cache, symmetry_feather(&self.symmetry, &cache));

        self.update_sculpt_normal(brush, &mut cache);
        self.ensure_automask(Some(cache.true_view_normal));

        let settings = self.symmetry.clone();
        let bounds = self.index.object_bounds();
        let mut stats = StepStats::default();
        {
            let mesh = &mut self.mesh;
            let index = &self.index;
            let undo = &mut self.undo;
            let shape_keys = &mut self.shape_keys;
            let automask = self.automask.as_ref();
            let axis_lock = self.axis_lock;
            let mirror_clip = &self.mirror_clip;
            let deform_imats = self.deform_imats.as_deref();
            for_each_symmetry_pass(&settings, &mut cache, &bounds, |cache| {
                brush_pass(
                    mesh,
                    index,
                    undo,
                    shape_keys,
                    automask,
                    axis_lock,
                    mirror_clip,
                    deform_imats,
                    brush,
                    action,
                    sampler,
                    projection,
                    cache,
                    &mut stats,
                );
            });
        }

        self.refresh_normals();
        let positions = gather_all_positions(self.mesh.accessor());
        self.index.update_bounds(&positions);

        cache.finish_step();
        debug!(step = cache.step, ?stats, "stroke step");
        self.cache = Some(cache);
        Ok(stats)
    }

    /// Finish the stroke, keeping its result.
    pub fn end_stroke(&mut self) -> Result<(), SculptError> {
        self.cache.take().ok_or(SculptError::NoActiveStroke)?;
        self.orig_triangles = None;
        debug!("stroke end");
        Ok(())
    }

    /// Abort the stroke and rewind every touched node to its pre-stroke
    /// state.
    pub fn cancel_stroke(&mut self) -> Result<(), SculptError> {
        self.cache.take().ok_or(SculptError::NoActiveStroke)?;
        self.undo.restore_all(self.mesh.accessor_mut());
        self.refresh_normals();
        let positions = gather_all_positions(self.mesh.accessor());
        self.index.update_bounds(&positions);
        self.orig_triangles = None;
        debug!("stroke cancelled");
        Ok(())
    }

    pub fn undo_log(&self) -> &StrokeUndo {
        &self.undo
    }

    pub fn automask_settings(&self) -> &AutomaskSettings {
        &self.automask_settings
    }

    pub fn set_automask_settings(&mut self, settings: AutomaskSettings) {
        self.automask_settings = settings;
        self.automask = None;
    }

    /// Build the automask cache lazily; it stays valid until settings change
    /// or topology is edited.
    pub fn ensure_automask(&mut self, view_normal: Option<Vec3>) {
        if self.automask.is_some() || !self.automask_settings.enabled() {
            return;
        }
        self.automask = Some(AutomaskCache::build(
            &self.automask_settings,
            self.mesh.accessor(),
            view_normal,
        ));
    }

    pub fn invalidate_automask(&mut self) {
        self.automask = None;
    }

    /// Connect mesh islands within `max_distance` so smoothing-style tools
    /// can cross small gaps. Plain meshes only.
    pub fn ensure_fake_neighbors(&mut self, max_distance: f32) {
        let mesh = self.mesh.as_plain_mut();
        if !mesh.has_fake_neighbors() {
            let table = crate::mesh::build_fake_neighbor_table(mesh, max_distance);
            mesh.set_fake_neighbors(Some(table));
        }
    }

    /// Re-capture vertex references and rebuild the index after a
    /// dynamic-topology edit added or removed elements.
    pub fn notify_topology_changed(&mut self, batch_size: usize) {
        if let MeshData::DynTopo(mesh) = &mut self.mesh {
            mesh.capture_generation();
        }
        let positions = gather_all_positions(self.mesh.accessor());
        self.index = NodeSoup::build_uniform(&positions, batch_size);
        self.index.commit_original_bounds();
        self.automask = None;
        self.orig_triangles = None;
        self.undo.clear();
    }

    /// Begin a mesh filter; fails while a stroke is running.
    pub fn begin_filter(
        &mut self,
        orientation: FilterOrientation,
        obmat: Mat3,
        viewmat: Mat3,
        view_normal: Option<Vec3>,
    ) -> Result<(), SculptError> {
        if self.cache.is_some() {
            return Err(SculptError::StrokeInProgress);
        }
        self.filter = Some(FilterCache::new(
            &self.index,
            self.mesh.accessor(),
            orientation,
            obmat,
            viewmat,
            view_normal,
            Some(&self.automask_settings),
        ));
        Ok(())
    }

    pub fn filter_cache(&mut self) -> Option<&mut FilterCache> {
        self.filter.as_mut()
    }

    pub fn end_filter(&mut self) {
        self.filter = None;
    }

    /// Re-estimate the sculpt normal on the un-mirrored state. Skipped after
    /// the first step for brushes pinned to their original normal.
    fn update_sculpt_normal(&mut self, brush: &Brush, cache: &mut StrokeCache) {
        if !cache.first_time && brush.original_normal {
            return;
        }
        calc_brushdata_symm(cache, SymmetryFlags::NONE, None, 0.0);
        let use_original = !cache.accum;
        let nodes = gather_brush_nodes(
            &self.index,
            brush,
            cache.location,
            cache.radius,
            brush.query_radius_scale(),
            Some(cache.view_normal),
            use_original,
        );
        let query = AreaQuery {
            brush,
            cache,
            mesh: &self.mesh,
            index: &self.index,
            undo: use_original.then_some(&self.undo),
            orig_triangles: self.orig_triangles.as_ref(),
        };
        if let Some(normal) = calc_area_normal(&query, &nodes) {
            cache.sculpt_normal = normal;
        }
    }

    fn refresh_normals(&mut self) {
        match &mut self.mesh {
            MeshData::Plain(mesh) => mesh.recompute_normals(),
            MeshData::DynTopo(mesh) => mesh.recompute_normals(),
            // Grid normals are owned by the subdivision evaluator.
            MeshData::Grids(_) => {}
        }
    }

    /// Snapshot the dyntopo triangles per node, for original-coordinate area
    /// estimation after this stroke starts splitting edges.
    fn capture_orig_triangles(&self) -> OrigTriangles {
        let dyntopo = self.mesh.as_dyntopo();
        let he = dyntopo.mesh();
        let mut node_of_vert = vec![0u32; he.vertex_count()];
        for node in self.index.all_nodes() {
            for &v in self.index.verts(node) {
                node_of_vert[v.0 as usize] = node.0;
            }
        }
        let mut orig = OrigTriangles::default();
        let mut per_node: std::collections::HashMap<NodeId, Vec<[Vec3; 3]>> =
            std::collections::HashMap::new();
        for face in he.faces() {
            let [a, b, c] = he.face_vertices(face.id);
            let verts = he.vertices();
            let tri = [
                verts[a.0 as usize].position,
                verts[b.0 as usize].position,
                verts[c.0 as usize].position,
            ];
            // A triangle belongs to the node of its first corner.
            let node = NodeId(node_of_vert[a.0 as usize]);
            per_node.entry(node).or_default().push(tri);
        }
        for (node, tris) in per_node {
            orig.insert(node, tris);
        }
        orig
    }
}

fn gather_all_positions(accessor: &dyn GeometryAccessor) -> Vec<Vec3> {
    (0..accessor.vertex_count())
        .map(|i| accessor.position(VertRef(i as u32)))
        .collect()
}

/// One symmetry pass of the brush over its gathered nodes.
#[allow(clippy::too_many_arguments)]
fn brush_pass(
    mesh: &mut MeshData,
    index: &NodeSoup,
    undo: &mut StrokeUndo,
    shape_keys: &mut Option<ShapeKeys>,
    automask: Option<&AutomaskCache>,
    axis_lock: [bool; 3],
    mirror_clip: &MirrorClip,
    deform_imats: Option<&[Mat3]>,
    brush: &Brush,
    action: &dyn BrushAction,
    sampler: Option<&dyn TextureSampler>,
    projection: Option<&Mat4>,
    cache: &mut StrokeCache,
    stats: &mut StepStats,
) {
    cache.sculpt_normal_symm = cache
        .symm_rot_mat
        .transform_vector3(symmetry_flip(cache.sculpt_normal, cache.mirror_symmetry_pass));

    let use_original = !cache.accum;
    let nodes = gather_brush_nodes(
        index,
        brush,
        cache.location,
        cache.radius,
        brush.query_radius_scale(),
        Some(cache.view_normal),
        use_original,
    );
    stats.nodes_visited += nodes.len();
    if nodes.is_empty() {
        return;
    }

    // Snapshots must predate the first write of this pass.
    for &node in &nodes {
        undo.push_node(node, index.verts(node), mesh.accessor(), UndoAttribute::Position);
    }

    // Phase 1: read-only factor and translation computation, parallel over
    // node batches. Dynamic topology stays serial; its accessor asserts
    // reference validity per call and its batches are small.
    let results: Vec<(NodeId, Vec<Vec3>, Vec<Vec3>)> = {
        let accessor = mesh.accessor();
        let cache_ref: &StrokeCache = cache;
        let ctx = FactorContext {
            brush,
            cache: cache_ref,
            accessor,
            automask,
            texture_sampler: sampler,
            projection,
        };
        let test = BrushTest::with_falloff_shape(
            cache_ref,
            brush.falloff_shape,
            Some(cache_ref.view_normal),
        );
        let compute = |&node: &NodeId| {
            let verts = index.verts(node);
            let n = verts.len();
            let mut positions = vec![Vec3::ZERO; n];
            let mut normals = vec![Vec3::ZERO; n];
            let mut distances = vec![0.0f32; n];
            let mut factors = vec![0.0f32; n];
            compute_node_factors(
                &ctx,
                &test,
                verts,
                &mut positions,
                &mut normals,
                &mut distances,
                &mut factors,
            );
            let action_ctx = ActionContext {
                brush,
                cache: cache_ref,
                verts,
                positions: &positions,
                normals: &normals,
                distances: &distances,
            };
            let mut translations = vec![Vec3::ZERO; n];
            action.compute(&action_ctx, &factors, &mut translations);
            (node, positions, translations)
        };
        if mesh.is_dyntopo() {
            nodes.iter().map(compute).collect()
        } else {
            nodes.par_iter().map(compute).collect()
        }
    };

    // Phase 2: serial write-back through the shared translation pipeline.
    let apply = TranslationApply {
        axis_lock,
        mirror_clip,
        deform_imats,
    };
    let accessor = mesh.accessor_mut();
    for (node, positions, mut translations) in results {
        let verts = index.verts(node);
        stats.verts_modified += apply.apply(
            &mut *accessor,
            shape_keys.as_mut(),
            verts,
            &positions,
            &mut translations,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PlainMesh;
    use crate::types::SculptTool;

    /// Draw-style action: displace along the sculpt normal by the factor.
    struct DrawAction;

    impl BrushAction for DrawAction {
        fn compute(&self, ctx: &ActionContext, factors: &[f32], translations: &mut [Vec3]) {
            let offset = ctx.cache.sculpt_normal_symm * ctx.cache.radius * ctx.cache.bstrength;
            for (f, t) in factors.iter().zip(translations.iter_mut()) {
                *t = offset * *f;
            }
        }
    }

    fn grid_session(n: u32) -> SculptSession {
        let mut positions = Vec::new();
        for y in 0..n {
            for x in 0..n {
                positions.push(Vec3::new(x as f32 * 0.2, y as f32 * 0.2, 0.0));
            }
        }
        let mut indices = Vec::new();
        for y in 0..n - 1 {
            for x in 0..n - 1 {
                let v = y * n + x;
                indices.extend_from_slice(&[v, v + 1, v + n + 1, v, v + n + 1, v + n]);
            }
        }
        let mesh = PlainMesh::from_triangles(&positions, &indices);
        SculptSession::new(MeshData::Plain(mesh), 16)
    }

    fn max_height(session: &SculptSession) -> f32 {
        let accessor = session.mesh().accessor();
        (0..accessor.vertex_count())
            .map(|i| accessor.position(VertRef(i as u32)).z)
            .fold(f32::MIN, f32::max)
    }

    fn center_sample(session: &SculptSession) -> StrokeSample {
        let bounds = session.index().object_bounds();
        StrokeSample {
            location: bounds.center(),
            ..Default::default()
        }
    }

    #[test]
    fn test_step_requires_active_stroke() {
        let mut session = grid_session(5);
        let brush = Brush::new(SculptTool::Draw);
        let err = session
            .stroke_step(&brush, &DrawAction, &StrokeSample::default(), None, None)
            .unwrap_err();
        assert!(matches!(err, SculptError::NoActiveStroke));
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut session = grid_session(5);
        let brush = Brush::new(SculptTool::Draw);
        let sample = center_sample(&session);
        session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap();
        let err = session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap_err();
        assert!(matches!(err, SculptError::StrokeInProgress));
    }

    #[test]
    fn test_draw_stroke_raises_surface() {
        let mut session = grid_session(7);
        let brush = Brush::new(SculptTool::Draw);
        let sample = center_sample(&session);
        session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap();
        let stats = session
            .stroke_step(&brush, &DrawAction, &sample, None, None)
            .unwrap();
        session.end_stroke().unwrap();

        assert!(stats.nodes_visited > 0);
        assert!(stats.verts_modified > 0);
        let accessor = session.mesh().accessor();
        let max_z = (0..accessor.vertex_count())
            .map(|i| accessor.position(VertRef(i as u32)).z)
            .fold(f32::MIN, f32::max);
        assert!(max_z > 0.0);
    }

    #[test]
    fn test_anchored_reapplies_instead_of_accumulating() {
        let mut session = grid_session(7);
        let brush = Brush {
            anchored: true,
            ..Brush::new(SculptTool::Draw)
        };
        let sample = center_sample(&session);
        session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap();
        session
            .stroke_step(&brush, &DrawAction, &sample, None, None)
            .unwrap();
        let after_one = max_height(&session);
        for _ in 0..2 {
            session
                .stroke_step(&brush, &DrawAction, &sample, None, None)
                .unwrap();
        }
        let after_three = max_height(&session);
        session.end_stroke().unwrap();

        assert!(after_one > 0.0);
        // Later steps rewind before reapplying, so the height stays put
        // where a drag brush would keep stacking offsets.
        assert!((after_three - after_one).abs() < 1e-5);
    }

    #[test]
    fn test_cancel_restores_positions() {
        let mut session = grid_session(7);
        let brush = Brush::new(SculptTool::Draw);
        let sample = center_sample(&session);
        let accessor = session.mesh().accessor();
        let before: Vec<Vec3> = (0..accessor.vertex_count())
            .map(|i| accessor.position(VertRef(i as u32)))
            .collect();

        session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap();
        for _ in 0..3 {
            session
                .stroke_step(&brush, &DrawAction, &sample, None, None)
                .unwrap();
        }
        session.cancel_stroke().unwrap();

        let accessor = session.mesh().accessor();
        for (i, &orig) in before.iter().enumerate() {
            let now = accessor.position(VertRef(i as u32));
            assert!(now.distance(orig) < 1e-6, "vertex {i} not restored");
        }
    }

    #[test]
    fn test_mirror_symmetry_modifies_both_sides() {
        let mut session = grid_session(7);
        session.symmetry.mirror = SymmetryFlags::X;
        let brush = Brush::new(SculptTool::Draw);
        // Center the grid on the X mirror plane, stroke off to one side.
        let bounds = session.index().object_bounds();
        let center = bounds.center();
        {
            let mesh = session.mesh_mut().as_plain_mut();
            let count = mesh.vertex_count();
            for i in 0..count {
                let p = mesh.position(VertRef(i as u32));
                mesh.set_position(VertRef(i as u32), p - center);
            }
        }
        session.notify_topology_changed(16);
        let sample = StrokeSample {
            location: Vec3::new(0.4, 0.0, 0.0),
            ..Default::default()
        };
        session
            .begin_stroke(&brush, &sample, 0.3, Vec3::Z, false)
            .unwrap();
        session
            .stroke_step(&brush, &DrawAction, &sample, None, None)
            .unwrap();
        session.end_stroke().unwrap();

        let accessor = session.mesh().accessor();
        let mut pos_side = 0.0f32;
        let mut neg_side = 0.0f32;
        for i in 0..accessor.vertex_count() {
            let p = accessor.position(VertRef(i as u32));
            if p.x > 0.1 {
                pos_side = pos_side.max(p.z);
            } else if p.x < -0.1 {
                neg_side = neg_side.max(p.z);
            }
        }
        assert!(pos_side > 0.0);
        assert!((pos_side - neg_side).abs() < 1e-4);
    }

    #[test]
    fn test_locked_shape_key_blocks_stroke() {
        use crate::translation::{ShapeKey, ShapeKeys};
        let mut session = grid_session(5);
        session.shape_keys = Some(ShapeKeys {
            keys: vec![ShapeKey {
                name: "Basis".into(),
                locked: true,
                data: vec![Vec3::ZERO; 25],
                dependent: false,
            }],
            active: Some(0),
        });
        let brush = Brush::new(SculptTool::Draw);
        let sample = center_sample(&session);
        let err = session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap_err();
        assert!(matches!(err, SculptError::ShapeKeyLocked(_)));
    }

    #[test]
    fn test_filter_lifecycle() {
        let mut session = grid_session(5);
        session
            .begin_filter(FilterOrientation::Local, Mat3::IDENTITY, Mat3::IDENTITY, None)
            .unwrap();
        assert!(session.filter_cache().is_some());
        session.end_filter();
        assert!(session.filter_cache().is_none());
    }

    #[test]
    fn test_dyntopo_stroke_serial_path() {
        use crate::mesh::DynTopoMesh;
        let mut positions = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                positions.push(Vec3::new(x as f32 * 0.2, y as f32 * 0.2, 0.0));
            }
        }
        let mut indices = Vec::new();
        for y in 0..4u32 {
            for x in 0..4u32 {
                let v = y * 5 + x;
                indices.extend_from_slice(&[v, v + 1, v + 6, v, v + 6, v + 5]);
            }
        }
        let mesh = DynTopoMesh::from_triangles(&positions, &indices).unwrap();
        let mut session = SculptSession::new(MeshData::DynTopo(mesh), 8);
        let brush = Brush::new(SculptTool::Draw);
        let sample = center_sample(&session);
        session
            .begin_stroke(&brush, &sample, 0.5, Vec3::Z, false)
            .unwrap();
        let stats = session
            .stroke_step(&brush, &DrawAction, &sample, None, None)
            .unwrap();
        session.end_stroke().unwrap();
        assert!(stats.verts_modified > 0);
    }
}
