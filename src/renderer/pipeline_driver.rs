//! Pipeline Driver
//!
//! Renders a frame's cameras in order through one shared [`FrameRenderer`].

use log::trace;

use crate::errors::Result;
use crate::renderer::command::CommandStream;
use crate::renderer::culling::Visibility;
use crate::renderer::frame_renderer::{CameraFrameStats, FrameRenderer};
use crate::renderer::light_packer::MAX_VISIBLE_LIGHTS;
use crate::scene::camera::Camera;
use crate::settings::PipelineSettings;

/// Result of one [`PipelineDriver::render`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub cameras_rendered: usize,
    pub cameras_skipped: usize,
    /// One entry per rendered camera, in submission order.
    pub cameras: Vec<CameraFrameStats>,
}

/// Entry point of the pipeline: renders every active camera of a frame in
/// order through one shared [`FrameRenderer`].
pub struct PipelineDriver<const N: usize = MAX_VISIBLE_LIGHTS> {
    settings: PipelineSettings,
    renderer: FrameRenderer<N>,
    frame_index: u64,
}

impl<const N: usize> PipelineDriver<N> {
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        let renderer = FrameRenderer::new(&settings)?;
        Ok(Self {
            settings,
            renderer,
            frame_index: 0,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn renderer(&self) -> &FrameRenderer<N> {
        &self.renderer
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn render(
        &mut self,
        cameras: &[Camera],
        visibility: &mut dyn Visibility,
        stream: &mut dyn CommandStream,
    ) -> FrameStats {
        let mut stats = FrameStats {
            frame_index: self.frame_index,
            cameras: Vec::with_capacity(cameras.len()),
            ..FrameStats::default()
        };

        for camera in cameras {
            match self.renderer.render_camera(camera, visibility, stream) {
                Some(camera_stats) => {
                    stats.cameras_rendered += 1;
                    stats.cameras.push(camera_stats);
                }
                None => stats.cameras_skipped += 1,
            }
        }

        trace!(
            "Frame {}: {} cameras rendered, {} skipped",
            stats.frame_index, stats.cameras_rendered, stats.cameras_skipped
        );
        self.frame_index += 1;
        stats
    }
}
