//! Translation post-processing and application.
//!
//! Brush actions produce raw per-vertex translations; this module runs them
//! through the shared pipeline of plane projection, mirror clipping, axis
//! locks and deformation correction before writing positions back, and
//! propagates the result to shape keys when the mesh carries them.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mesh::{GeometryAccessor, VertRef};
use crate::types::SculptError;

/// Mirror clipping from a mirror modifier: translations may not push a
/// vertex across a clipped symmetry plane, and vertices already within the
/// tolerance band of the plane are pinned onto it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MirrorClip {
    pub axis: [bool; 3],
    pub tolerance: [f32; 3],
    /// Mirror-object space transform; identity when the mirror uses the
    /// sculpted object's own axes.
    #[serde(skip)]
    pub mirror_mat: Option<Mat4>,
}

impl MirrorClip {
    pub fn enabled(&self) -> bool {
        self.axis.iter().any(|&a| a)
    }

    /// Clamp `translation` so `position + translation` stays on the
    /// positive side of every clipped plane. A vertex inside the tolerance
    /// band snaps to the plane itself.
    pub fn clip(&self, position: Vec3, translation: Vec3) -> Vec3 {
        if !self.enabled() {
            return translation;
        }
        let (to_mirror, from_mirror) = match self.mirror_mat {
            Some(m) => (m.inverse(), m),
            None => (Mat4::IDENTITY, Mat4::IDENTITY),
        };
        let local_pos = to_mirror.transform_point3(position);
        let mut local_new = to_mirror.transform_point3(position + translation);
        for i in 0..3 {
            if !self.axis[i] {
                continue;
            }
            // The clip decision uses the pre-translation position: a vertex
            // sitting inside the tolerance band stays welded to the plane
            // no matter where the brush pushes it.
            if local_pos[i].abs() <= self.tolerance[i] {
                local_new[i] = 0.0;
            }
        }
        from_mirror.transform_point3(local_new) - position
    }
}

/// Zero out translation components along locked object axes.
pub fn lock_axis(axis_lock: [bool; 3], translations: &mut [Vec3]) {
    if !axis_lock.iter().any(|&a| a) {
        return;
    }
    for t in translations.iter_mut() {
        for i in 0..3 {
            if axis_lock[i] {
                t[i] = 0.0;
            }
        }
    }
}

/// Apply mirror clipping over a batch.
pub fn clip_translations(
    clip: &MirrorClip,
    positions: &[Vec3],
    translations: &mut [Vec3],
) {
    if !clip.enabled() {
        return;
    }
    for (co, t) in positions.iter().zip(translations.iter_mut()) {
        *t = clip.clip(*co, *t);
    }
}

/// Remove the component of each translation along `plane_normal`, leaving
/// motion within the plane. Applying this twice is a no-op.
pub fn project_translations(plane_normal: Vec3, translations: &mut [Vec3]) {
    let n = plane_normal.normalize_or_zero();
    if n == Vec3::ZERO {
        return;
    }
    for t in translations.iter_mut() {
        *t -= n * t.dot(n);
    }
}

/// Deform-corrected application: translations computed against the deformed
/// evaluated shape are mapped back into the stored mesh's space through the
/// per-vertex inverse deformation matrices.
pub fn apply_crazyspace(imats: &[Mat3], verts: &[VertRef], translations: &mut [Vec3]) {
    for (&v, t) in verts.iter().zip(translations.iter_mut()) {
        *t = imats[v.0 as usize] * *t;
    }
}

/// One shape key layer. `data` mirror the mesh's vertex order.
#[derive(Debug, Clone)]
pub struct ShapeKey {
    pub name: String,
    pub locked: bool,
    pub data: Vec<Vec3>,
    /// Relative keys that follow the basis receive basis edits too.
    pub dependent: bool,
}

/// Shape key stack attached to a plain mesh.
#[derive(Debug, Clone, Default)]
pub struct ShapeKeys {
    pub keys: Vec<ShapeKey>,
    pub active: Option<usize>,
}

impl ShapeKeys {
    pub fn active_key(&self) -> Option<&ShapeKey> {
        self.active.and_then(|i| self.keys.get(i))
    }

    /// Reject strokes up front when the active key cannot be edited.
    pub fn check_editable(&self) -> Result<(), SculptError> {
        match self.active_key() {
            Some(key) if key.locked => Err(SculptError::ShapeKeyLocked(key.name.clone())),
            _ => Ok(()),
        }
    }

    /// Write the batch's new positions into the active key, and into every
    /// dependent key when the basis (index 0) is active.
    pub fn propagate(&mut self, verts: &[VertRef], new_positions: &[Vec3]) {
        let Some(active) = self.active else {
            return;
        };
        let is_basis = active == 0;
        for (ki, key) in self.keys.iter_mut().enumerate() {
            let write = ki == active || (is_basis && key.dependent);
            if !write {
                continue;
            }
            for (i, &v) in verts.iter().enumerate() {
                key.data[v.0 as usize] = new_positions[i];
            }
        }
    }
}

/// Shared write-back path: run the translation pipeline for one batch and
/// store the results through the accessor.
pub struct TranslationApply<'a> {
    pub axis_lock: [bool; 3],
    pub mirror_clip: &'a MirrorClip,
    pub deform_imats: Option<&'a [Mat3]>,
}

impl TranslationApply<'_> {
    pub fn apply(
        &self,
        accessor: &mut dyn GeometryAccessor,
        shape_keys: Option<&mut ShapeKeys>,
        verts: &[VertRef],
        positions: &[Vec3],
        translations: &mut [Vec3],
    ) -> usize {
        lock_axis(self.axis_lock, translations);
        clip_translations(self.mirror_clip, positions, translations);
        if let Some(imats) = self.deform_imats {
            apply_crazyspace(imats, verts, translations);
        }

        let mut modified = 0;
        let mut new_positions = Vec::with_capacity(verts.len());
        for (i, &v) in verts.iter().enumerate() {
            let new_pos = accessor.position(v) + translations[i];
            if translations[i] != Vec3::ZERO {
                modified += 1;
            }
            accessor.set_position(v, new_pos);
            new_positions.push(new_pos);
        }
        if let Some(keys) = shape_keys {
            keys.propagate(verts, &new_positions);
        }
        debug!(verts = verts.len(), modified, "applied node translations");
        modified
    }
}
