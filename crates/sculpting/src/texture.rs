//! Brush texture sampling.
//!
//! The sampler itself (procedural nodes, image lookup) is an external
//! collaborator; this module owns the mapping from a model-space brush point
//! to the sampler's input space per map mode, including undoing the current
//! symmetry pass so the texture stays oriented with the original stroke.

use glam::{Mat4, Vec3};

use crate::brush::BrushTexture;
use crate::cache::StrokeCache;
use crate::symmetry::symmetry_flip;
use crate::types::TextureMapMode;

/// External texture evaluation capability. 2D map modes pass the projected
/// coordinate with z = 0.
pub trait TextureSampler: Sync {
    fn sample(&self, point: Vec3) -> f32;
}

/// Sample the brush texture for one model-space point.
///
/// `projection` is the view projection used by [`TextureMapMode::View`];
/// headless contexts pass `None` and view mapping degrades to volume
/// mapping.
pub fn sample_brush_texture(
    texture: &BrushTexture,
    sampler: &dyn TextureSampler,
    cache: &StrokeCache,
    projection: Option<&Mat4>,
    brush_point: Vec3,
) -> f32 {
    // Tile offsets shift the sample space so each tile repeats the texture.
    let mut point = brush_point - cache.plane_offset;

    match texture.map_mode {
        TextureMapMode::Volume => {
            sampler.sample(point * Vec3::from(texture.size) + Vec3::from(texture.offset))
        }
        TextureMapMode::Area | TextureMapMode::View => {
            // Flip the point back across the symmetry axis and rotate it to
            // the original position so the projected texture stays oriented
            // with the unmirrored stroke.
            if cache.radial_symmetry_pass != 0 {
                point = cache.symm_rot_mat_inv.transform_point3(point);
            }
            let symm_point = symmetry_flip(point, cache.mirror_symmetry_pass);

            match texture.map_mode {
                TextureMapMode::Area => {
                    // Project from the brush plane rather than the view.
                    let local = cache.brush_local_mat.transform_point3(symm_point);
                    let x = local.x * texture.size[0] + texture.offset[0];
                    let y = local.y * texture.size[1] + texture.offset[1];
                    sampler.sample(Vec3::new(x, y, 0.0)) - texture.sample_bias
                }
                TextureMapMode::View => match projection {
                    Some(projection) => {
                        let projected = projection.project_point3(symm_point);
                        sampler.sample(Vec3::new(projected.x, projected.y, 0.0))
                    }
                    None => sampler.sample(symm_point),
                },
                TextureMapMode::Volume => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symmetry::SymmetryFlags;

    /// Sampler returning the x coordinate, to observe the mapped point.
    struct XSampler;

    impl TextureSampler for XSampler {
        fn sample(&self, point: Vec3) -> f32 {
            point.x
        }
    }

    fn texture(map_mode: TextureMapMode) -> BrushTexture {
        BrushTexture {
            map_mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_volume_mapping_uses_raw_point() {
        let cache = StrokeCache::default();
        let value = sample_brush_texture(
            &texture(TextureMapMode::Volume),
            &XSampler,
            &cache,
            None,
            Vec3::new(2.0, 0.0, 0.0),
        );
        assert!((value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_plane_offset_subtracted() {
        let mut cache = StrokeCache::default();
        cache.plane_offset = Vec3::new(1.0, 0.0, 0.0);
        let value = sample_brush_texture(
            &texture(TextureMapMode::Volume),
            &XSampler,
            &cache,
            None,
            Vec3::new(2.0, 0.0, 0.0),
        );
        assert!((value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_area_mapping_unflips_symmetry() {
        let mut cache = StrokeCache::default();
        cache.mirror_symmetry_pass = SymmetryFlags::X;
        // brush_local_mat is identity by default, so the sampled x is the
        // unflipped coordinate.
        let value = sample_brush_texture(
            &texture(TextureMapMode::Area),
            &XSampler,
            &cache,
            None,
            Vec3::new(-2.0, 0.0, 0.0),
        );
        assert!((value - 2.0).abs() < 1e-6);
    }
}
