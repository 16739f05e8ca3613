//! Visible Objects

use glam::Vec3;

/// Render queue value of the default opaque geometry queue.
pub const QUEUE_GEOMETRY: u32 = 2000;
/// Render queue value of the default transparent queue.
pub const QUEUE_TRANSPARENT: u32 = 3000;

/// A renderable that survived culling for the current camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleObject {
    pub id: u64,
    pub render_queue: u32,
    /// Batching key; objects sharing it share render state.
    pub material_id: u32,
    /// Squared distance from the camera, filled in by culling.
    pub distance_sq: f32,
    /// Whether the object's shader has a pass this pipeline draws.
    pub shader_supported: bool,
    pub casts_shadows: bool,
    pub bounds_center: Vec3,
    pub bounds_radius: f32,
}

impl VisibleObject {
    #[must_use]
    pub fn new(id: u64, render_queue: u32, material_id: u32) -> Self {
        Self {
            id,
            render_queue,
            material_id,
            distance_sq: 0.0,
            shader_supported: true,
            casts_shadows: true,
            bounds_center: Vec3::ZERO,
            bounds_radius: 0.5,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, center: Vec3, radius: f32) -> Self {
        self.bounds_center = center;
        self.bounds_radius = radius;
        self
    }

    #[must_use]
    pub fn with_unsupported_shader(mut self) -> Self {
        self.shader_supported = false;
        self
    }
}
