//! Shadow Pass Executor
//!
//! Renders every shadowed spot light into its tile of the shared atlas and
//! publishes the resulting matrices, shadow data and keywords.
//!
//! # State Machine
//!
//! ```text
//! Idle ──acquire──▶ AtlasAcquired ──┬─▶ TileBound ──▶ DepthDraw ──┐
//!                                   │                              │ next light
//!                                   └──────────────◀───────────────┘
//!                                   │
//!                                   └─▶ AtlasFinalized ──release──▶ Idle
//! ```
//!
//! The atlas stays bound as a global texture through the camera's draw
//! passes; the frame renderer calls [`ShadowPassExecutor::release`] once they
//! are issued.

use glam::Vec4;
use log::{debug, trace};

use crate::renderer::command::{CommandStream, RenderTarget};
use crate::renderer::culling::Visibility;
use crate::renderer::light_packer::PackedLightBuffer;
use crate::renderer::shader_ids::ShaderIds;
use crate::renderer::shadow_atlas::ShadowAtlasLayout;

/// Spot shadows are never cascaded.
const SPOT_SPLIT_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowPassState {
    #[default]
    Idle,
    AtlasAcquired,
    TileBound { tile: usize },
    DepthDraw { slot: usize },
    AtlasFinalized,
}

/// Outcome of one atlas build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowPassOutput {
    pub split: u32,
    pub tiles_rendered: usize,
    pub hard_shadows: bool,
    pub soft_shadows: bool,
}

#[derive(Debug, Default)]
pub struct ShadowPassExecutor {
    state: ShadowPassState,
}

impl ShadowPassExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ShadowPassState {
        self.state
    }

    fn transition(&mut self, next: ShadowPassState) {
        trace!("Shadow pass: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Clears both shadow keywords for a frame without shadowed lights.
    pub fn skip(&mut self, stream: &mut dyn CommandStream, ids: &ShaderIds) {
        self.release(stream, ids);
        stream.set_keyword(ids.shadows_hard_keyword, false);
        stream.set_keyword(ids.shadows_soft_keyword, false);
    }

    /// Builds the atlas. Leaves the executor in `AtlasFinalized`.
    pub fn execute<const N: usize>(
        &mut self,
        layout: &ShadowAtlasLayout,
        buffer: &mut PackedLightBuffer<N>,
        visibility: &dyn Visibility,
        stream: &mut dyn CommandStream,
        ids: &ShaderIds,
    ) -> ShadowPassOutput {
        if self.state != ShadowPassState::Idle {
            // A previous camera never released its atlas.
            self.release(stream, ids);
        }

        let target = ids.shadow_map_target();
        stream.get_temporary_depth_target(target, layout.resolution);
        stream.set_render_target(RenderTarget::Temporary(target));
        stream.clear_render_target(true, false, Vec4::ZERO);
        self.transition(ShadowPassState::AtlasAcquired);

        let reversed_z = stream.uses_reversed_z_buffer();
        let mut output = ShadowPassOutput {
            split: layout.split,
            ..ShadowPassOutput::default()
        };

        for slot in 0..buffer.len() {
            if !buffer.is_shadow_caster(slot) {
                continue;
            }
            if output.tiles_rendered >= layout.tile_count {
                buffer.clear_shadow(slot);
                continue;
            }
            let Some(vp) = visibility.compute_shadow_matrices(slot, SPOT_SPLIT_COUNT) else {
                debug!("Spot light {slot}: no shadow view/projection; shadow disabled");
                buffer.clear_shadow(slot);
                continue;
            };

            let tile = layout.tile(output.tiles_rendered);
            stream.set_viewport(tile.viewport);
            if let Some(scissor) = tile.scissor {
                stream.enable_scissor(scissor);
            }
            stream.set_view_projection(vp.view, vp.projection);
            stream.set_global_float(ids.shadow_bias, buffer.shadow_bias[slot]);
            self.transition(ShadowPassState::TileBound { tile: tile.index });

            self.transition(ShadowPassState::DepthDraw { slot });
            stream.draw_shadow_casters(slot);

            buffer.world_to_shadow[slot] =
                layout.world_to_shadow(&tile, vp.view, vp.projection, reversed_z);
            trace!(
                "Spot light {slot} -> tile {} at ({}, {})",
                tile.index, tile.offset.x, tile.offset.y
            );

            if buffer.is_soft_shadow(slot) {
                output.soft_shadows = true;
            } else {
                output.hard_shadows = true;
            }
            output.tiles_rendered += 1;
        }

        if layout.uses_scissor() {
            stream.disable_scissor();
        }
        stream.set_global_matrix_array(ids.world_to_shadow_matrices, &buffer.world_to_shadow);
        stream.set_global_vector_array(ids.shadow_data, &buffer.shadow_data);
        stream.set_global_texture(ids.shadow_map, target);
        stream.set_global_vector(ids.shadow_map_size, layout.texel_size());
        stream.set_keyword(ids.shadows_hard_keyword, output.hard_shadows);
        stream.set_keyword(ids.shadows_soft_keyword, output.soft_shadows);
        self.transition(ShadowPassState::AtlasFinalized);

        output
    }

    /// Releases the atlas target. No-op when nothing is held.
    pub fn release(&mut self, stream: &mut dyn CommandStream, ids: &ShaderIds) {
        if self.state == ShadowPassState::Idle {
            return;
        }
        stream.release_temporary_target(ids.shadow_map_target());
        self.transition(ShadowPassState::Idle);
    }
}


#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::renderer::command::{Command, CommandBuffer};
    use crate::renderer::culling::{Bounds, CullResults, CullingParameters, ShadowViewProjection};
    use crate::renderer::light_packer::LightParameterPacker;
    use crate::scene::camera::Camera;
    use crate::scene::light::{LightShadows, VisibleLight};

    /// Every spot has casters; `missing` has no shadow matrices.
    struct Spots {
        missing: Option<usize>,
    }

    impl Visibility for Spots {
        fn culling_parameters(&self, _camera: &Camera) -> Option<CullingParameters> {
            None
        }

        fn cull(&mut self, _params: &CullingParameters, _results: &mut CullResults) {}

        fn shadow_caster_bounds(&self, _light_index: usize) -> Option<Bounds> {
            Some(Bounds::from_sphere(Vec3::ZERO, 1.0))
        }

        fn compute_shadow_matrices(
            &self,
            light_index: usize,
            _split_count: u32,
        ) -> Option<ShadowViewProjection> {
            (self.missing != Some(light_index)).then_some(ShadowViewProjection {
                view: Mat4::IDENTITY,
                projection: Mat4::IDENTITY,
            })
        }
    }

    fn packed(visibility: &Spots, count: usize) -> PackedLightBuffer<4> {
        let mut results = CullResults::default();
        for i in 0..count {
            let spot = VisibleLight::spot(Vec3::ONE, 1.0, Vec3::new(i as f32, 4.0, 0.0), Vec3::NEG_Y, 10.0, 45.0);
            results.visible_lights.push(spot.with_shadows(LightShadows::Hard, 1.0));
        }
        results.reset_light_index_map();
        let mut buffer = PackedLightBuffer::new();
        LightParameterPacker::new().pack(&mut results, visibility, &mut buffer);
        buffer
    }

    fn releases(stream: &CommandBuffer) -> usize {
        stream
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ReleaseTemporaryTarget(_)))
            .count()
    }

    #[test]
    fn execute_finalizes_and_release_returns_to_idle() {
        let ids = ShaderIds::new();
        let visibility = Spots { missing: None };
        let mut buffer = packed(&visibility, 2);
        let layout = ShadowAtlasLayout::new(2, 1024, 4);
        let mut stream = CommandBuffer::new();
        let mut executor = ShadowPassExecutor::new();
        assert_eq!(executor.state(), ShadowPassState::Idle);

        let output = executor.execute(&layout, &mut buffer, &visibility, &mut stream, &ids);
        assert_eq!(output.tiles_rendered, 2);
        assert_eq!(executor.state(), ShadowPassState::AtlasFinalized);
        assert_eq!(releases(&stream), 0);

        executor.release(&mut stream, &ids);
        assert_eq!(executor.state(), ShadowPassState::Idle);
        assert_eq!(releases(&stream), 1);

        executor.release(&mut stream, &ids);
        assert_eq!(releases(&stream), 1, "release while idle holds nothing");
    }

    #[test]
    fn execute_over_held_atlas_releases_it_first() {
        let ids = ShaderIds::new();
        let visibility = Spots { missing: None };
        let mut buffer = packed(&visibility, 1);
        let layout = ShadowAtlasLayout::new(1, 512, 4);
        let mut stream = CommandBuffer::new();
        let mut executor = ShadowPassExecutor::new();

        executor.execute(&layout, &mut buffer, &visibility, &mut stream, &ids);
        executor.execute(&layout, &mut buffer, &visibility, &mut stream, &ids);
        assert_eq!(executor.state(), ShadowPassState::AtlasFinalized);
        assert_eq!(releases(&stream), 1);

        let commands = stream.commands();
        let release = commands
            .iter()
            .position(|c| matches!(c, Command::ReleaseTemporaryTarget(_)))
            .unwrap();
        let second_acquire = commands
            .iter()
            .rposition(|c| matches!(c, Command::GetTemporaryDepthTarget { .. }))
            .unwrap();
        assert!(release < second_acquire);
    }

    #[test]
    fn skip_while_idle_only_clears_keywords() {
        let ids = ShaderIds::new();
        let mut stream = CommandBuffer::new();
        let mut executor = ShadowPassExecutor::new();

        executor.skip(&mut stream, &ids);
        assert_eq!(executor.state(), ShadowPassState::Idle);
        assert_eq!(
            stream.commands(),
            &[
                Command::SetKeyword(ids.shadows_hard_keyword, false),
                Command::SetKeyword(ids.shadows_soft_keyword, false),
            ]
        );
    }

    #[test]
    fn skip_after_execute_releases_the_atlas() {
        let ids = ShaderIds::new();
        let visibility = Spots { missing: None };
        let mut buffer = packed(&visibility, 1);
        let layout = ShadowAtlasLayout::new(1, 256, 4);
        let mut stream = CommandBuffer::new();
        let mut executor = ShadowPassExecutor::new();

        executor.execute(&layout, &mut buffer, &visibility, &mut stream, &ids);
        executor.skip(&mut stream, &ids);
        assert_eq!(executor.state(), ShadowPassState::Idle);
        assert_eq!(releases(&stream), 1);
        let state = stream.global_state();
        assert!(!state.keyword_enabled("_SHADOWS_HARD"));
        assert!(!state.keyword_enabled("_SHADOWS_SOFT"));
    }

    #[test]
    fn tile_is_bound_before_its_depth_draw() {
        let ids = ShaderIds::new();
        let visibility = Spots { missing: Some(0) };
        let mut buffer = packed(&visibility, 2);
        let layout = ShadowAtlasLayout::new(2, 1024, 4);
        let mut stream = CommandBuffer::new();
        let mut executor = ShadowPassExecutor::new();

        let output = executor.execute(&layout, &mut buffer, &visibility, &mut stream, &ids);
        assert_eq!(output.tiles_rendered, 1);
        assert!(!buffer.is_shadow_caster(0));
        assert_eq!(buffer.world_to_shadow[0], Mat4::ZERO);

        let commands = stream.commands();
        let viewport = commands
            .iter()
            .position(|c| matches!(c, Command::SetViewport(_)))
            .unwrap();
        let draw = commands
            .iter()
            .position(|c| matches!(c, Command::DrawShadowCasters { .. }))
            .unwrap();
        assert!(viewport < draw);
        assert_eq!(commands[draw], Command::DrawShadowCasters { light_index: 1 });
    }
}
