//! Light Parameter Packer
//!
//! Linearizes the visible lights of one camera into fixed-capacity arrays the
//! shading code indexes by light slot.
//!
//! # Slot Layout
//!
//! | Array                       | Directional      | Point            | Spot                          |
//! |-----------------------------|------------------|------------------|-------------------------------|
//! | `colors`                    | final color      | final color      | final color                   |
//! | `directions_or_positions`   | `-forward`, w=0  | position, w=1    | position, w=1                 |
//! | `spot_directions`           | `0`              | `0`              | `-forward`, w=0               |
//! | `attenuations`              | `(0, 0, 0, 1)`   | `(1/r², 0, 0, 1)`| `(1/r², 0, 1/Δ, -cosθo/Δ)`    |
//! | `shadow_data`               | `0`              | `0`              | `(strength, soft, 0, 0)`      |
//!
//! `Δ` is the cosine range between the inner and outer cone. Slots past the
//! packed light count are all zero.
//!
//! # Overflow
//!
//! Lights beyond the buffer capacity are dropped and marked
//! [`UNUSED_LIGHT_INDEX`] in the light index map so per-object lighting never
//! reads past the arrays.

use glam::{Mat4, Vec4};
use log::debug;

use crate::renderer::culling::{CullResults, UNUSED_LIGHT_INDEX, Visibility};
use crate::scene::light::{LightKind, LightShadows, VisibleLight};

/// Light buffer capacity of the full-featured pipeline.
pub const MAX_VISIBLE_LIGHTS: usize = 16;
/// Light buffer capacity of the simplified pipeline.
pub const SIMPLE_MAX_VISIBLE_LIGHTS: usize = 4;
/// Largest number of tiles a 4x4 atlas grid holds.
pub const MAX_SHADOW_TILES: usize = 16;

/// Ratio between inner and outer cone tangents. Empirical; it shapes the
/// penumbra, so keep it fixed.
pub const INNER_CONE_TAN_RATIO: f32 = 46.0 / 64.0;

const MIN_RANGE_SQ: f32 = 1e-6;
const MIN_ANGLE_RANGE: f32 = 1e-3;
const DEFAULT_ATTENUATION: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Shader-facing light arrays, one entry per slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedLightBuffer<const N: usize> {
    pub colors: [Vec4; N],
    pub directions_or_positions: [Vec4; N],
    pub spot_directions: [Vec4; N],
    pub attenuations: [Vec4; N],
    /// x: shadow strength (0 means no shadow this frame), y: 1 for soft shadows.
    pub shadow_data: [Vec4; N],
    /// Filled by the shadow pass; zero for slots without a shadow tile.
    pub world_to_shadow: [Mat4; N],
    /// Depth bias per slot, applied while rendering the slot's tile.
    pub shadow_bias: [f32; N],
    len: usize,
}

impl<const N: usize> Default for PackedLightBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PackedLightBuffer<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: [Vec4::ZERO; N],
            directions_or_positions: [Vec4::ZERO; N],
            spot_directions: [Vec4::ZERO; N],
            attenuations: [Vec4::ZERO; N],
            shadow_data: [Vec4::ZERO; N],
            world_to_shadow: [Mat4::ZERO; N],
            shadow_bias: [0.0; N],
            len: 0,
        }
    }

    /// Zeroes every slot.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of packed lights.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `slot` holds a packed light.
    #[inline]
    #[must_use]
    pub fn is_light_active(&self, slot: usize) -> bool {
        slot < self.len
    }

    /// Whether `slot` renders a shadow this frame.
    #[inline]
    #[must_use]
    pub fn is_shadow_caster(&self, slot: usize) -> bool {
        slot < N && self.shadow_data[slot].x > 0.0
    }

    /// Whether the caster in `slot` uses soft filtering.
    #[inline]
    #[must_use]
    pub fn is_soft_shadow(&self, slot: usize) -> bool {
        self.is_shadow_caster(slot) && self.shadow_data[slot].y > 0.0
    }

    /// Marks `slot` as casting no shadow this frame.
    pub fn clear_shadow(&mut self, slot: usize) {
        if slot < N {
            self.shadow_data[slot] = Vec4::ZERO;
            self.world_to_shadow[slot] = Mat4::ZERO;
        }
    }

    /// Concatenated raw bytes of all arrays, in declaration order.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(N * (5 * 16 + 64 + 4));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.colors));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.directions_or_positions));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.spot_directions));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.attenuations));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.shadow_data));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.world_to_shadow));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.shadow_bias));
        bytes
    }
}

/// Summary of one packing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    pub visible_lights: usize,
    pub packed_lights: usize,
    /// Lights that received a shadow slot; drives the atlas layout.
    pub shadow_tile_count: usize,
    pub has_hard_shadows: bool,
    pub has_soft_shadows: bool,
}

impl PackStats {
    #[inline]
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.visible_lights > self.packed_lights
    }
}

/// Packs one camera's visible lights into a [`PackedLightBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct LightParameterPacker {
    max_shadow_tiles: usize,
}

impl Default for LightParameterPacker {
    fn default() -> Self {
        Self {
            max_shadow_tiles: MAX_SHADOW_TILES,
        }
    }
}

impl LightParameterPacker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds `buffer` from `results.visible_lights` and masks overflowing
    /// lights in `results.light_index_map`.
    pub fn pack<const N: usize>(
        &self,
        results: &mut CullResults,
        visibility: &dyn Visibility,
        buffer: &mut PackedLightBuffer<N>,
    ) -> PackStats {
        buffer.reset();

        let visible = results.visible_lights.len();
        let packed = visible.min(N);
        let mut stats = PackStats {
            visible_lights: visible,
            packed_lights: packed,
            ..PackStats::default()
        };

        for (slot, light) in results.visible_lights.iter().take(packed).enumerate() {
            buffer.colors[slot] = light.final_color;
            buffer.attenuations[slot] = DEFAULT_ATTENUATION;

            match light.kind {
                LightKind::Directional => {
                    buffer.directions_or_positions[slot] = (-light.forward()).extend(0.0);
                }
                LightKind::Point => {
                    buffer.directions_or_positions[slot] = light.position().extend(1.0);
                    buffer.attenuations[slot].x = inverse_range_sq(light.range);
                }
                LightKind::Spot { spot_angle } => {
                    buffer.directions_or_positions[slot] = light.position().extend(1.0);
                    buffer.spot_directions[slot] = (-light.forward()).extend(0.0);

                    let (scale, offset) = spot_falloff(spot_angle);
                    let attenuation = &mut buffer.attenuations[slot];
                    attenuation.x = inverse_range_sq(light.range);
                    attenuation.z = scale;
                    attenuation.w = offset;

                    if stats.shadow_tile_count < self.max_shadow_tiles
                        && casts_shadow(light, slot, visibility)
                    {
                        let soft = light.shadow.mode == LightShadows::Soft;
                        buffer.shadow_data[slot] =
                            Vec4::new(light.shadow.strength, if soft { 1.0 } else { 0.0 }, 0.0, 0.0);
                        buffer.shadow_bias[slot] = light.shadow.bias;
                        stats.shadow_tile_count += 1;
                        stats.has_soft_shadows |= soft;
                        stats.has_hard_shadows |= !soft;
                    }
                }
            }
        }
        buffer.len = packed;

        if stats.overflowed() {
            debug!(
                "Light overflow: {visible} visible, {packed} packed; masking the remainder"
            );
            if results.light_index_map.len() < visible {
                results.reset_light_index_map();
            }
            for mapped in &mut results.light_index_map[packed..] {
                *mapped = UNUSED_LIGHT_INDEX;
            }
        }

        stats
    }
}

fn casts_shadow(light: &VisibleLight, slot: usize, visibility: &dyn Visibility) -> bool {
    if !light.wants_shadows() {
        return false;
    }
    match visibility.shadow_caster_bounds(slot) {
        Some(bounds) if !bounds.is_degenerate() => true,
        _ => {
            debug!("Spot light {slot} requests shadows but has no casters; shadow disabled");
            false
        }
    }
}

/// `1 / max(r², ε)`.
#[inline]
#[must_use]
pub fn inverse_range_sq(range: f32) -> f32 {
    1.0 / (range * range).max(MIN_RANGE_SQ)
}

/// Angular falloff `(scale, offset)` for a spot of full angle `spot_angle` degrees.
///
/// Shading evaluates `saturate(dot(L, spot_dir) * scale + offset)`.
#[must_use]
pub fn spot_falloff(spot_angle: f32) -> (f32, f32) {
    let outer = (0.5 * spot_angle).to_radians();
    let outer_cos = outer.cos();
    let outer_tan = outer.tan();
    let inner_cos = (INNER_CONE_TAN_RATIO * outer_tan).atan().cos();
    let angle_range = (inner_cos - outer_cos).max(MIN_ANGLE_RANGE);
    let scale = 1.0 / angle_range;
    (scale, -outer_cos * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_range_is_clamped_at_zero_range() {
        assert!((inverse_range_sq(2.0) - 0.25).abs() < 1e-6);
        let clamped = inverse_range_sq(0.0);
        assert!(clamped.is_finite());
        assert!((clamped - 1e6).abs() < 1.0);
    }

    #[test]
    fn spot_falloff_is_zero_at_outer_edge_and_one_at_inner_edge() {
        let angle: f32 = 60.0;
        let (scale, offset) = spot_falloff(angle);
        let outer_cos = (angle * 0.5).to_radians().cos();
        assert!((outer_cos * scale + offset).abs() < 1e-4);

        let inner = (INNER_CONE_TAN_RATIO * (angle * 0.5).to_radians().tan()).atan();
        assert!((inner.cos() * scale + offset - 1.0).abs() < 1e-3);
    }

    #[test]
    fn spot_falloff_stays_finite_up_to_180_degrees() {
        for step in 0..=180 {
            let (scale, offset) = spot_falloff(step as f32);
            assert!(scale.is_finite() && offset.is_finite(), "angle {step}");
            assert!(scale <= 1.0 / MIN_ANGLE_RANGE + 1e-2, "angle {step}");
        }
    }

    #[test]
    fn predicates_follow_shadow_data() {
        let mut buffer = PackedLightBuffer::<4>::new();
        buffer.shadow_data[1] = Vec4::new(0.8, 1.0, 0.0, 0.0);
        assert!(buffer.is_shadow_caster(1));
        assert!(buffer.is_soft_shadow(1));
        assert!(!buffer.is_shadow_caster(0));
        assert!(!buffer.is_shadow_caster(7));

        buffer.clear_shadow(1);
        assert!(!buffer.is_shadow_caster(1));
    }

    #[test]
    fn byte_view_covers_every_array() {
        let buffer = PackedLightBuffer::<SIMPLE_MAX_VISIBLE_LIGHTS>::new();
        assert_eq!(buffer.to_bytes().len(), 4 * (5 * 16 + 64 + 4));
    }
}
