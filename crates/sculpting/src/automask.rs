//! Auto-masking: per-vertex influence limiters independent of brush
//! distance.
//!
//! The cache composes cavity, boundary and view-angle masks into one factor
//! per vertex, precomputed session-wide and invalidated on topology change.
//! Brush evaluation tolerates a missing cache (factor 1.0 everywhere).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mesh::{GeometryAccessor, Neighbors, VertRef};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CavitySettings {
    /// Positive factors mask crevices, negative mask ridges.
    pub factor: f32,
    /// Neighbor-averaging blur iterations over the raw cavity signal.
    pub blur_steps: u32,
    pub invert: bool,
}

impl Default for CavitySettings {
    fn default() -> Self {
        Self {
            factor: 1.0,
            blur_steps: 2,
            invert: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AutomaskSettings {
    /// Mask out boundary vertices, fading in over this many topology steps
    /// from the boundary (0 disables).
    pub boundary_steps: u32,
    /// Limit influence to vertices facing the view within this angle
    /// (radians, 0 disables).
    pub view_angle_limit: f32,
    pub cavity: Option<CavitySettings>,
}

impl AutomaskSettings {
    pub fn enabled(&self) -> bool {
        self.boundary_steps > 0 || self.view_angle_limit > 0.0 || self.cavity.is_some()
    }
}

/// Precomputed per-vertex automask factors.
#[derive(Debug)]
pub struct AutomaskCache {
    factors: Vec<f32>,
}

impl AutomaskCache {
    /// Composite factor for one vertex, in [0, 1].
    pub fn factor(&self, vert: VertRef) -> f32 {
        self.factors.get(vert.0 as usize).copied().unwrap_or(1.0)
    }

    pub fn build(
        settings: &AutomaskSettings,
        accessor: &dyn GeometryAccessor,
        view_normal: Option<Vec3>,
    ) -> Self {
        let n = accessor.vertex_count();
        let mut factors = vec![1.0f32; n];

        if settings.boundary_steps > 0 {
            apply_boundary_mask(accessor, settings.boundary_steps, &mut factors);
        }
        if settings.view_angle_limit > 0.0 {
            if let Some(view) = view_normal {
                apply_view_angle_mask(accessor, view, settings.view_angle_limit, &mut factors);
            }
        }
        if let Some(cavity) = &settings.cavity {
            apply_cavity_mask(accessor, cavity, &mut factors);
        }

        debug!("automask: built factors for {} vertices", n);
        Self { factors }
    }
}

/// Zero at the boundary, fading linearly to 1 over `steps` topology rings.
fn apply_boundary_mask(accessor: &dyn GeometryAccessor, steps: u32, factors: &mut [f32]) {
    let n = accessor.vertex_count();
    // Multi-source BFS from all boundary vertices.
    let mut distance: Vec<u32> = vec![u32::MAX; n];
    let mut frontier: Vec<u32> = Vec::new();
    for v in 0..n as u32 {
        if accessor.is_boundary(VertRef(v)) {
            distance[v as usize] = 0;
            frontier.push(v);
        }
    }
    let mut ring = 0u32;
    let mut scratch = Neighbors::new();
    while !frontier.is_empty() && ring < steps {
        ring += 1;
        let mut next = Vec::new();
        for &v in &frontier {
            accessor.neighbors(VertRef(v), &mut scratch);
            for &nb in scratch.iter() {
                if distance[nb.0 as usize] == u32::MAX {
                    distance[nb.0 as usize] = ring;
                    next.push(nb.0);
                }
            }
        }
        frontier = next;
    }
    for (v, factor) in factors.iter_mut().enumerate() {
        if distance[v] != u32::MAX {
            *factor *= distance[v] as f32 / steps as f32;
        }
    }
}

fn apply_view_angle_mask(
    accessor: &dyn GeometryAccessor,
    view_normal: Vec3,
    angle_limit: f32,
    factors: &mut [f32],
) {
    let cos_limit = angle_limit.cos();
    for (v, factor) in factors.iter_mut().enumerate() {
        let facing = accessor.normal(VertRef(v as u32)).dot(view_normal);
        if facing <= cos_limit {
            *factor = 0.0;
        } else if cos_limit < 1.0 {
            *factor *= (facing - cos_limit) / (1.0 - cos_limit);
        }
    }
}

/// Cavity signal from the offset of a vertex to its neighbor centroid
/// projected on the normal: positive in crevices, negative on ridges.
fn apply_cavity_mask(
    accessor: &dyn GeometryAccessor,
    settings: &CavitySettings,
    factors: &mut [f32],
) {
    let n = accessor.vertex_count();
    let mut cavity = vec![0.5f32; n];
    let mut scratch = Neighbors::new();
    for v in 0..n as u32 {
        accessor.neighbors(VertRef(v), &mut scratch);
        if scratch.is_empty() {
            continue;
        }
        let mut centroid = Vec3::ZERO;
        for &nb in scratch.iter() {
            centroid += accessor.position(nb);
        }
        centroid /= scratch.len() as f32;
        let offset = centroid - accessor.position(VertRef(v));
        let signal = offset.dot(accessor.normal(VertRef(v))) * settings.factor;
        cavity[v as usize] = (0.5 + signal).clamp(0.0, 1.0);
    }

    for _ in 0..settings.blur_steps {
        let prev = cavity.clone();
        for v in 0..n as u32 {
            accessor.neighbors(VertRef(v), &mut scratch);
            if scratch.is_empty() {
                continue;
            }
            let sum: f32 = scratch.iter().map(|&nb| prev[nb.0 as usize]).sum();
            cavity[v as usize] = (prev[v as usize] + sum) / (scratch.len() + 1) as f32;
        }
    }

    for (v, factor) in factors.iter_mut().enumerate() {
        let c = if settings.invert {
            1.0 - cavity[v]
        } else {
            cavity[v]
        };
        *factor *= c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PlainMesh;

    fn grid(n: u32) -> PlainMesh {
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
        PlainMesh::from_triangles(&positions, &indices)
    }

    #[test]
    fn test_disabled_settings() {
        let settings = AutomaskSettings::default();
        assert!(!settings.enabled());
    }

    #[test]
    fn test_boundary_mask_zero_at_boundary() {
        let mesh = grid(5);
        let settings = AutomaskSettings {
            boundary_steps: 2,
            ..Default::default()
        };
        let cache = AutomaskCache::build(&settings, &mesh, None);
        // Corner vertex is on the boundary: fully masked.
        assert_eq!(cache.factor(VertRef(0)), 0.0);
        // Center vertex of a 5x5 grid is 2 rings in: unmasked.
        assert_eq!(cache.factor(VertRef(12)), 1.0);
        // One ring in: half masked.
        assert!((cache.factor(VertRef(6)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_view_angle_mask() {
        let mesh = grid(3);
        let settings = AutomaskSettings {
            view_angle_limit: std::f32::consts::FRAC_PI_4,
            ..Default::default()
        };
        // Normals are +Z; viewing along +Z keeps everything.
        let facing = AutomaskCache::build(&settings, &mesh, Some(Vec3::Z));
        assert!(facing.factor(VertRef(4)) > 0.9);
        // Viewing along +X puts every normal past the limit.
        let side = AutomaskCache::build(&settings, &mesh, Some(Vec3::X));
        assert_eq!(side.factor(VertRef(4)), 0.0);
    }

    #[test]
    fn test_flat_surface_cavity_is_neutral() {
        let mesh = grid(4);
        let settings = AutomaskSettings {
            cavity: Some(CavitySettings::default()),
            ..Default::default()
        };
        let cache = AutomaskCache::build(&settings, &mesh, None);
        // A flat grid has no cavities; the signal stays at the midpoint.
        assert!((cache.factor(VertRef(5)) - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_missing_vertex_defaults_to_one() {
        let cache = AutomaskCache { factors: vec![] };
        assert_eq!(cache.factor(VertRef(42)), 1.0);
    }
}
