//! Reference Scene Visibility
//!
//! A flat list of lights and objects culled with bounding spheres. Enough to
//! drive the pipeline from demos, benchmarks and tests; engines plug in their
//! own [`Visibility`] implementation.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::renderer::culling::{
    Bounds, CullResults, CullingParameters, ShadowViewProjection, Visibility,
};
use crate::scene::camera::{Camera, Frustum};
use crate::scene::light::{LightKind, VisibleLight};
use crate::scene::object::VisibleObject;

/// Near plane of spot shadow projections.
pub const SHADOW_NEAR_PLANE: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct SceneLight {
    pub light: VisibleLight,
    pub enabled: bool,
}

#[derive(Debug, Default)]
pub struct SceneVisibility {
    lights: Vec<SceneLight>,
    objects: Vec<VisibleObject>,
    /// Lights that survived the last cull, indexed like the cull results.
    visible: Vec<VisibleLight>,
}

impl SceneVisibility {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light and returns its scene index.
    pub fn add_light(&mut self, light: VisibleLight) -> usize {
        self.lights.push(SceneLight {
            light,
            enabled: true,
        });
        self.lights.len() - 1
    }

    pub fn add_object(&mut self, object: VisibleObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn set_light_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(entry) = self.lights.get_mut(index) {
            entry.enabled = enabled;
        }
    }

    #[must_use]
    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    fn visible_spot(&self, light_index: usize) -> Option<(&VisibleLight, f32)> {
        let light = self.visible.get(light_index)?;
        match light.kind {
            LightKind::Spot { spot_angle } => Some((light, spot_angle)),
            _ => None,
        }
    }
}

/// Spot shadow view and GL-style projection.
#[must_use]
pub fn spot_shadow_view_projection(light: &VisibleLight, spot_angle: f32) -> ShadowViewProjection {
    let position = light.position();
    let forward = light.forward().normalize_or(Vec3::Z);
    let up = if forward.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
    let view = Mat4::look_at_rh(position, position + forward, up);

    let fov = spot_angle.to_radians().clamp(0.01, PI - 0.01);
    let far = light.range.max(SHADOW_NEAR_PLANE + 0.01);
    let projection = Mat4::perspective_rh_gl(fov, 1.0, SHADOW_NEAR_PLANE, far);

    ShadowViewProjection { view, projection }
}

impl Visibility for SceneVisibility {
    fn culling_parameters(&self, camera: &Camera) -> Option<CullingParameters> {
        if !camera.has_valid_projection() {
            return None;
        }
        let view_projection = camera.view_projection_matrix();
        if !view_projection.is_finite() {
            return None;
        }
        Some(CullingParameters {
            frustum: Frustum::from_matrix(view_projection),
            camera_position: camera.position(),
        })
    }

    fn cull(&mut self, params: &CullingParameters, results: &mut CullResults) {
        results.clear();
        self.visible.clear();

        for entry in self.lights.iter().filter(|l| l.enabled) {
            let light = &entry.light;
            let visible = match light.kind {
                LightKind::Directional => true,
                LightKind::Point | LightKind::Spot { .. } => params
                    .frustum
                    .intersects_sphere(light.position(), light.range),
            };
            if visible {
                self.visible.push(*light);
            }
        }
        results.visible_lights.extend_from_slice(&self.visible);

        for object in &self.objects {
            if params
                .frustum
                .intersects_sphere(object.bounds_center, object.bounds_radius)
            {
                let mut visible = *object;
                visible.distance_sq = (object.bounds_center - params.camera_position).length_squared();
                results.visible_objects.push(visible);
            }
        }

        results.reset_light_index_map();
    }

    fn shadow_caster_bounds(&self, light_index: usize) -> Option<Bounds> {
        let (light, spot_angle) = self.visible_spot(light_index)?;
        let vp = spot_shadow_view_projection(light, spot_angle);

        // Frustum extraction expects [0, 1] clip depth.
        let fov = spot_angle.to_radians().clamp(0.01, PI - 0.01);
        let far = light.range.max(SHADOW_NEAR_PLANE + 0.01);
        let frustum = Frustum::from_matrix(
            Mat4::perspective_rh(fov, 1.0, SHADOW_NEAR_PLANE, far) * vp.view,
        );

        self.objects
            .iter()
            .filter(|o| o.casts_shadows && frustum.intersects_sphere(o.bounds_center, o.bounds_radius))
            .map(|o| Bounds::from_sphere(o.bounds_center, o.bounds_radius))
            .reduce(Bounds::union)
    }

    fn compute_shadow_matrices(
        &self,
        light_index: usize,
        _split_count: u32,
    ) -> Option<ShadowViewProjection> {
        let (light, spot_angle) = self.visible_spot(light_index)?;
        Some(spot_shadow_view_projection(light, spot_angle))
    }
}
