//! Shader Property IDs
//!
//! Global input and keyword names, interned once per renderer.

use crate::renderer::command::RenderTargetId;
use crate::utils::PropertyId;

/// Interned names of every global input and keyword the pipeline sets.
#[derive(Debug, Clone, Copy)]
pub struct ShaderIds {
    pub visible_light_colors: PropertyId,
    pub visible_light_directions_or_positions: PropertyId,
    pub visible_light_spot_directions: PropertyId,
    pub visible_light_attenuations: PropertyId,
    pub light_indices_offset_and_count: PropertyId,

    pub shadow_data: PropertyId,
    pub world_to_shadow_matrices: PropertyId,
    pub shadow_bias: PropertyId,
    pub shadow_map: PropertyId,
    pub shadow_map_size: PropertyId,

    pub shadows_hard_keyword: PropertyId,
    pub shadows_soft_keyword: PropertyId,
}

impl ShaderIds {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible_light_colors: PropertyId::new("_VisibleLightColors"),
            visible_light_directions_or_positions: PropertyId::new(
                "_VisibleLightDirectionsOrPositions",
            ),
            visible_light_spot_directions: PropertyId::new("_VisibleLightSpotDirections"),
            visible_light_attenuations: PropertyId::new("_VisibleLightAttenuations"),
            light_indices_offset_and_count: PropertyId::new("unity_LightIndicesOffsetAndCount"),
            shadow_data: PropertyId::new("_ShadowData"),
            world_to_shadow_matrices: PropertyId::new("_WorldToShadowMatrices"),
            shadow_bias: PropertyId::new("_ShadowBias"),
            shadow_map: PropertyId::new("_ShadowMap"),
            shadow_map_size: PropertyId::new("_ShadowMapSize"),
            shadows_hard_keyword: PropertyId::new("_SHADOWS_HARD"),
            shadows_soft_keyword: PropertyId::new("_SHADOWS_SOFT"),
        }
    }

    /// The shadow atlas doubles as its own temporary target handle.
    #[inline]
    #[must_use]
    pub fn shadow_map_target(&self) -> RenderTargetId {
        RenderTargetId(self.shadow_map)
    }
}

impl Default for ShaderIds {
    fn default() -> Self {
        Self::new()
    }
}
