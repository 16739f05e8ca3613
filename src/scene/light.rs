//! Visible Lights
//!
//! Per-frame light records handed to the renderer by the visibility
//! collaborator. They are read-only to the pipeline and discarded at the end
//! of the frame.

use glam::{Mat4, Vec3, Vec4};

/// Shadow mode requested by a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

impl LightShadows {
    #[inline]
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Light type, with the parameters only that type uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point,
    /// `spot_angle` is the full cone angle in degrees.
    Spot { spot_angle: f32 },
}

/// Per-light shadow parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    pub mode: LightShadows,
    /// Shadow strength in `0..=1`. Zero means no visible shadow.
    pub strength: f32,
    pub bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            mode: LightShadows::None,
            strength: 1.0,
            bias: 0.05,
        }
    }
}

/// A light that survived culling for the current camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    pub kind: LightKind,
    /// Final linear-space color, intensity already applied.
    pub final_color: Vec4,
    /// Light transform. The light shines along its local +Z.
    pub local_to_world: Mat4,
    pub range: f32,
    pub shadow: ShadowConfig,
}

impl VisibleLight {
    #[must_use]
    pub fn directional(color: Vec3, intensity: f32, local_to_world: Mat4) -> Self {
        Self {
            kind: LightKind::Directional,
            final_color: (color * intensity).extend(1.0),
            local_to_world,
            range: 0.0,
            shadow: ShadowConfig::default(),
        }
    }

    #[must_use]
    pub fn point(color: Vec3, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            final_color: (color * intensity).extend(1.0),
            local_to_world: Mat4::from_translation(position),
            range,
            shadow: ShadowConfig::default(),
        }
    }

    /// Builds a spot light at `position` shining along `direction`.
    #[must_use]
    pub fn spot(
        color: Vec3,
        intensity: f32,
        position: Vec3,
        direction: Vec3,
        range: f32,
        spot_angle: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot { spot_angle },
            final_color: (color * intensity).extend(1.0),
            local_to_world: transform_facing(position, direction),
            range,
            shadow: ShadowConfig::default(),
        }
    }

    #[must_use]
    pub fn with_shadows(mut self, mode: LightShadows, strength: f32) -> Self {
        self.shadow.mode = mode;
        self.shadow.strength = strength;
        self
    }

    /// World position (translation column).
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.local_to_world.w_axis.truncate()
    }

    /// Direction the light shines along (local +Z in world space).
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.local_to_world.z_axis.truncate()
    }

    /// Whether this light asks for a shadow map this frame.
    #[inline]
    #[must_use]
    pub fn wants_shadows(&self) -> bool {
        self.shadow.mode.is_enabled() && self.shadow.strength > 0.0
    }
}

/// Rigid transform placed at `position` whose local +Z points along `direction`.
#[must_use]
pub fn transform_facing(position: Vec3, direction: Vec3) -> Mat4 {
    let forward = if direction.length_squared() > 1e-6 {
        direction.normalize()
    } else {
        Vec3::Z
    };
    let up = if forward.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
    let right = up.cross(forward).normalize();
    let up = forward.cross(right);
    Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        position.extend(1.0),
    )
}
