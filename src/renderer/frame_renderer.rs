//! Frame Renderer
//!
//! Runs the forward pipeline for a single camera.
//!
//! # Per-Camera Flow
//!
//! ```text
//! culling_parameters ── None ──▶ skipped
//!        │
//!        ▼
//! [scene view geometry] → cull → pack lights → shadow atlas | clear keywords
//!        │
//!        ▼
//! camera setup → clear → "Render Camera" {
//!     light uploads → opaque → skybox → transparent → [error pass]
//! } → release atlas → submit
//! ```
//!
//! All per-frame buffers live here and are overwritten for every camera.

use glam::Vec4;
use log::debug;

use crate::errors::{PipelineError, Result};
use crate::renderer::command::{
    CommandStream, DrawFlags, PerObjectData, RenderQueueRange, RenderTarget, SortMode,
};
use crate::renderer::culling::{CullResults, Visibility};
use crate::renderer::draw_list::DrawListBuilder;
use crate::renderer::light_packer::{
    LightParameterPacker, MAX_VISIBLE_LIGHTS, PackStats, PackedLightBuffer,
};
use crate::renderer::shader_ids::ShaderIds;
use crate::renderer::shadow_atlas::ShadowAtlasLayout;
use crate::renderer::shadow_pass::{ShadowPassExecutor, ShadowPassState};
use crate::scene::camera::{Camera, CameraKind, ClearFlags};
use crate::settings::PipelineSettings;

/// Profiling sample wrapping a camera's draw passes.
pub const CAMERA_SAMPLE_NAME: &str = "Render Camera";

/// What happened while rendering one camera.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraFrameStats {
    pub camera: String,
    pub visible_lights: usize,
    pub packed_lights: usize,
    pub shadow_tile_count: usize,
    pub atlas_split: u32,
    pub shadow_tiles_rendered: usize,
    pub opaque_objects: usize,
    pub transparent_objects: usize,
    pub error_objects: usize,
}

pub struct FrameRenderer<const N: usize = MAX_VISIBLE_LIGHTS> {
    ids: ShaderIds,
    draw_flags: DrawFlags,
    atlas_resolution: u32,
    tile_margin: u32,
    debug_overlay_enabled: bool,

    packer: LightParameterPacker,
    shadow_pass: ShadowPassExecutor,
    draw_lists: DrawListBuilder,

    // Reused across cameras and frames
    cull: CullResults,
    lights: PackedLightBuffer<N>,
}

impl<const N: usize> FrameRenderer<N> {
    /// Fails when `N` is outside `1..=16`.
    pub fn new(settings: &PipelineSettings) -> Result<Self> {
        if N == 0 || N > MAX_VISIBLE_LIGHTS {
            return Err(PipelineError::UnsupportedLightCapacity(N));
        }
        Ok(Self {
            ids: ShaderIds::new(),
            draw_flags: settings.draw_flags(),
            atlas_resolution: settings.shadow_atlas_resolution.texels(),
            tile_margin: settings.shadow_tile_margin,
            debug_overlay_enabled: settings.debug_overlay_enabled,
            packer: LightParameterPacker::new(),
            shadow_pass: ShadowPassExecutor::new(),
            draw_lists: DrawListBuilder::new(),
            cull: CullResults::with_capacity(N * 2, 1024),
            lights: PackedLightBuffer::new(),
        })
    }

    /// Packed light arrays of the last rendered camera.
    #[must_use]
    pub fn light_buffer(&self) -> &PackedLightBuffer<N> {
        &self.lights
    }

    /// Culling output of the last rendered camera.
    #[must_use]
    pub fn cull_results(&self) -> &CullResults {
        &self.cull
    }

    #[must_use]
    pub fn shader_ids(&self) -> &ShaderIds {
        &self.ids
    }

    /// `Idle` between cameras.
    #[must_use]
    pub fn shadow_state(&self) -> ShadowPassState {
        self.shadow_pass.state()
    }

    /// Renders `camera`. Returns `None` when the camera cannot be culled.
    pub fn render_camera(
        &mut self,
        camera: &Camera,
        visibility: &mut dyn Visibility,
        stream: &mut dyn CommandStream,
    ) -> Option<CameraFrameStats> {
        let Some(params) = visibility.culling_parameters(camera) else {
            debug!("Camera '{}' has no valid culling parameters; skipped", camera.name);
            return None;
        };

        if self.debug_overlay_enabled && camera.kind == CameraKind::SceneView {
            stream.emit_scene_view_geometry(camera);
        }

        self.cull.clear();
        visibility.cull(&params, &mut self.cull);

        let pack = self
            .packer
            .pack(&mut self.cull, &*visibility, &mut self.lights);

        let mut stats = CameraFrameStats {
            camera: camera.name.to_string(),
            visible_lights: pack.visible_lights,
            packed_lights: pack.packed_lights,
            shadow_tile_count: pack.shadow_tile_count,
            ..CameraFrameStats::default()
        };

        if pack.shadow_tile_count > 0 {
            let layout =
                ShadowAtlasLayout::new(pack.shadow_tile_count, self.atlas_resolution, self.tile_margin);
            let output =
                self.shadow_pass
                    .execute(&layout, &mut self.lights, &*visibility, stream, &self.ids);
            stats.atlas_split = output.split;
            stats.shadow_tiles_rendered = output.tiles_rendered;
        } else {
            self.shadow_pass.skip(stream, &self.ids);
        }

        stream.setup_camera_properties(camera);
        stream.set_render_target(RenderTarget::Camera);
        stream.clear_render_target(
            camera.clear_flags.contains(ClearFlags::DEPTH),
            camera.clear_flags.contains(ClearFlags::COLOR),
            camera.background_color,
        );

        stream.begin_sample(CAMERA_SAMPLE_NAME);
        self.upload_lights(&pack, stream);
        self.draw_passes(camera, &pack, stream, &mut stats);
        stream.end_sample(CAMERA_SAMPLE_NAME);

        self.shadow_pass.release(stream, &self.ids);
        stream.submit();

        debug!(
            "Camera '{}': {} visible lights, {} packed, {} shadow tiles (split {})",
            stats.camera,
            stats.visible_lights,
            stats.packed_lights,
            stats.shadow_tile_count,
            stats.atlas_split
        );
        Some(stats)
    }

    fn upload_lights(&self, pack: &PackStats, stream: &mut dyn CommandStream) {
        if pack.visible_lights == 0 {
            stream.set_global_vector(self.ids.light_indices_offset_and_count, Vec4::ZERO);
        }
        let ids = &self.ids;
        stream.set_global_vector_array(ids.visible_light_colors, &self.lights.colors);
        stream.set_global_vector_array(
            ids.visible_light_directions_or_positions,
            &self.lights.directions_or_positions,
        );
        stream.set_global_vector_array(
            ids.visible_light_spot_directions,
            &self.lights.spot_directions,
        );
        stream.set_global_vector_array(ids.visible_light_attenuations, &self.lights.attenuations);
    }

    fn draw_passes(
        &mut self,
        camera: &Camera,
        pack: &PackStats,
        stream: &mut dyn CommandStream,
        stats: &mut CameraFrameStats,
    ) {
        let per_object = if pack.visible_lights > 0 {
            PerObjectData::LightIndices8
        } else {
            PerObjectData::None
        };
        let objects = &self.cull.visible_objects;

        let opaque = self.draw_lists.build(
            "Opaque",
            objects,
            RenderQueueRange::OPAQUE,
            SortMode::CommonOpaque,
            self.draw_flags,
            per_object,
        );
        stats.opaque_objects = opaque.objects.len();
        stream.draw_renderers(&opaque);

        stream.draw_skybox(camera);

        let transparent = self.draw_lists.build(
            "Transparent",
            objects,
            RenderQueueRange::TRANSPARENT,
            SortMode::CommonTransparent,
            self.draw_flags,
            per_object,
        );
        stats.transparent_objects = transparent.objects.len();
        stream.draw_renderers(&transparent);

        if self.debug_overlay_enabled {
            let error = self.draw_lists.build_error(objects);
            stats.error_objects = error.objects.len();
            if !error.objects.is_empty() {
                stream.draw_renderers(&error);
            }
        }
    }
}
