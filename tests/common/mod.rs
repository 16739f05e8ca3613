//! Shared fixtures for integration tests.

#![allow(dead_code)]

use glam::{Mat4, Vec3};

use forward_atlas::renderer::culling::{
    Bounds, CullResults, CullingParameters, ShadowViewProjection, Visibility,
};
use forward_atlas::scene::camera::{Camera, Frustum};
use forward_atlas::scene::light::{LightShadows, VisibleLight};
use forward_atlas::scene::object::{QUEUE_GEOMETRY, QUEUE_TRANSPARENT, VisibleObject};

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_camera() -> Camera {
    let mut camera = Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 200.0).with_name("Main");
    camera.look_at(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO);
    camera
}

/// Visibility that returns exactly what the test scripted, in order.
#[derive(Debug, Default)]
pub struct ScriptedVisibility {
    pub valid: bool,
    pub lights: Vec<VisibleLight>,
    pub objects: Vec<VisibleObject>,
    /// Per light index; missing or `None` means no casters.
    pub caster_bounds: Vec<Option<Bounds>>,
    /// Overrides the default spot shadow matrices per light index.
    pub shadow_matrices: Vec<Option<ShadowViewProjection>>,
    pub matrices_unavailable: Vec<usize>,
    pub cull_calls: usize,
}

impl ScriptedVisibility {
    pub fn new() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Adds a light whose casters are a unit box in front of it.
    pub fn with_light(mut self, light: VisibleLight) -> Self {
        let bounds = light
            .wants_shadows()
            .then(|| Bounds::from_sphere(light.position() + light.forward() * 3.0, 1.0));
        self.lights.push(light);
        self.caster_bounds.push(bounds);
        self.shadow_matrices.push(None);
        self
    }

    pub fn with_light_without_casters(mut self, light: VisibleLight) -> Self {
        self.lights.push(light);
        self.caster_bounds.push(None);
        self.shadow_matrices.push(None);
        self
    }

    pub fn with_object(mut self, object: VisibleObject) -> Self {
        self.objects.push(object);
        self
    }
}

impl Visibility for ScriptedVisibility {
    fn culling_parameters(&self, camera: &Camera) -> Option<CullingParameters> {
        if !self.valid || !camera.has_valid_projection() {
            return None;
        }
        Some(CullingParameters {
            frustum: Frustum::from_matrix(camera.view_projection_matrix()),
            camera_position: camera.position(),
        })
    }

    fn cull(&mut self, params: &CullingParameters, results: &mut CullResults) {
        self.cull_calls += 1;
        results.clear();
        results.visible_lights.extend_from_slice(&self.lights);
        results
            .visible_objects
            .extend(self.objects.iter().map(|object| {
                let mut visible = *object;
                visible.distance_sq =
                    (object.bounds_center - params.camera_position).length_squared();
                visible
            }));
        results.reset_light_index_map();
    }

    fn shadow_caster_bounds(&self, light_index: usize) -> Option<Bounds> {
        self.caster_bounds.get(light_index).copied().flatten()
    }

    fn compute_shadow_matrices(
        &self,
        light_index: usize,
        _split_count: u32,
    ) -> Option<ShadowViewProjection> {
        if self.matrices_unavailable.contains(&light_index) {
            return None;
        }
        if let Some(Some(vp)) = self.shadow_matrices.get(light_index) {
            return Some(*vp);
        }
        let light = self.lights.get(light_index)?;
        let position = light.position();
        let forward = light.forward();
        let up = if forward.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
        Some(ShadowViewProjection {
            view: Mat4::look_at_rh(position, position + forward, up),
            projection: Mat4::perspective_rh_gl(1.0, 1.0, 0.05, light.range),
        })
    }
}

// ============================================================================
// Light Builders
// ============================================================================

pub fn sun() -> VisibleLight {
    VisibleLight::directional(
        Vec3::new(1.0, 0.95, 0.9),
        1.2,
        forward_atlas::scene::light::transform_facing(Vec3::ZERO, Vec3::new(0.3, -1.0, 0.2)),
    )
}

pub fn point_light(i: usize) -> VisibleLight {
    VisibleLight::point(Vec3::ONE, 2.0, Vec3::new(i as f32, 1.0, 0.0), 4.0 + i as f32)
}

pub fn shadowed_spot(i: usize, mode: LightShadows) -> VisibleLight {
    VisibleLight::spot(
        Vec3::new(1.0, 0.8, 0.6),
        3.0,
        Vec3::new(i as f32 * 2.0, 6.0, 0.0),
        Vec3::NEG_Y,
        15.0,
        50.0,
    )
    .with_shadows(mode, 0.9)
}

pub fn opaque(id: u64, material: u32, z: f32) -> VisibleObject {
    VisibleObject::new(id, QUEUE_GEOMETRY, material).with_bounds(Vec3::new(0.0, 0.0, z), 0.5)
}

pub fn transparent(id: u64, z: f32) -> VisibleObject {
    VisibleObject::new(id, QUEUE_TRANSPARENT, 0).with_bounds(Vec3::new(0.0, 0.0, z), 0.5)
}
