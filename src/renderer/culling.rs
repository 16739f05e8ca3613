//! Visibility Collaborator Interface
//!
//! The renderer does not cull. It asks a [`Visibility`] implementation for
//! culling parameters, lets it fill a reusable [`CullResults`], and queries it
//! for per-light shadow data while building the shadow atlas.
//!
//! # Data Flow
//!
//! ```text
//! FrameRenderer
//!     ├── Visibility::culling_parameters(camera)  → None: camera skipped
//!     ├── Visibility::cull(params, &mut results)  → lights, objects, index map
//!     ├── Visibility::shadow_caster_bounds(i)     → LightParameterPacker
//!     └── Visibility::compute_shadow_matrices(i)  → ShadowPassExecutor
//! ```

use glam::{Mat4, Vec3};

use crate::scene::camera::{Camera, Frustum};
use crate::scene::light::VisibleLight;
use crate::scene::object::VisibleObject;

/// Sentinel stored in the light index map for lights with no buffer slot.
pub const UNUSED_LIGHT_INDEX: i32 = -1;

/// Opaque culling input derived from a camera.
#[derive(Debug, Clone, Copy)]
pub struct CullingParameters {
    pub frustum: Frustum,
    pub camera_position: Vec3,
}

/// Axis-aligned bounds of a light's shadow casters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    #[must_use]
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        Self {
            min: center - Vec3::splat(radius),
            max: center + Vec3::splat(radius),
        }
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Empty or inverted bounds enclose no caster.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let extent = self.max - self.min;
        !extent.is_finite() || extent.min_element() < 0.0 || extent.max_element() <= 0.0
    }
}

/// View and projection used to render one shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowViewProjection {
    pub view: Mat4,
    /// Clip depth is expected in `[-1, 1]`.
    pub projection: Mat4,
}

/// Output of one culling run. Owned by the renderer and reused every frame.
#[derive(Debug, Default)]
pub struct CullResults {
    pub visible_lights: Vec<VisibleLight>,
    pub visible_objects: Vec<VisibleObject>,
    /// Per visible light: effective buffer index, or [`UNUSED_LIGHT_INDEX`].
    pub light_index_map: Vec<i32>,
}

impl CullResults {
    #[must_use]
    pub fn with_capacity(light_capacity: usize, object_capacity: usize) -> Self {
        Self {
            visible_lights: Vec::with_capacity(light_capacity),
            visible_objects: Vec::with_capacity(object_capacity),
            light_index_map: Vec::with_capacity(light_capacity),
        }
    }

    pub fn clear(&mut self) {
        self.visible_lights.clear();
        self.visible_objects.clear();
        self.light_index_map.clear();
    }

    /// Resets the light index map to identity over the visible lights.
    pub fn reset_light_index_map(&mut self) {
        self.light_index_map.clear();
        self.light_index_map
            .extend((0..self.visible_lights.len()).map(|i| i as i32));
    }

    /// Whether per-object lighting may reference visible light `index`.
    #[inline]
    #[must_use]
    pub fn is_light_active(&self, index: usize) -> bool {
        self.light_index_map
            .get(index)
            .is_some_and(|&mapped| mapped != UNUSED_LIGHT_INDEX)
    }
}

/// Scene visibility supplied by the surrounding engine.
pub trait Visibility {
    /// Returns `None` when the camera cannot be culled (degenerate geometry).
    fn culling_parameters(&self, camera: &Camera) -> Option<CullingParameters>;

    /// Fills `results` from scratch. The light index map must be identity
    /// over the visible lights on return.
    fn cull(&mut self, params: &CullingParameters, results: &mut CullResults);

    /// Bounds of everything visible light `light_index` can shadow, or `None`
    /// when there is nothing to render into its shadow map.
    fn shadow_caster_bounds(&self, light_index: usize) -> Option<Bounds>;

    /// Shadow view/projection fitted for visible light `light_index`.
    ///
    /// `split_count` is the number of cascades requested; spot shadows use one.
    fn compute_shadow_matrices(
        &self,
        light_index: usize,
        split_count: u32,
    ) -> Option<ShadowViewProjection>;
}
