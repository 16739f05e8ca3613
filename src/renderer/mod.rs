//! Forward Renderer
//!
//! The per-camera forward pipeline and the seams it talks through.
//!
//! - [`PipelineDriver`]: renders every camera of a frame
//! - [`FrameRenderer`]: one camera, from culling to submit
//! - [`light_packer`]: visible lights → fixed-capacity shader arrays
//! - [`shadow_atlas`] / [`shadow_pass`]: tiled spot shadow atlas
//! - [`culling`]: the [`Visibility`] collaborator interface
//! - [`command`]: the [`CommandStream`] submission interface

pub mod command;
pub mod culling;
pub mod draw_list;
pub mod frame_renderer;
pub mod light_packer;
pub mod pipeline_driver;
pub mod shader_ids;
pub mod shadow_atlas;
pub mod shadow_pass;

pub use command::{Command, CommandBuffer, CommandStream, DrawCall, GlobalState, GlobalValue};
pub use culling::{CullResults, UNUSED_LIGHT_INDEX, Visibility};
pub use frame_renderer::{CameraFrameStats, FrameRenderer};
pub use light_packer::{
    LightParameterPacker, MAX_VISIBLE_LIGHTS, PackStats, PackedLightBuffer,
    SIMPLE_MAX_VISIBLE_LIGHTS,
};
pub use pipeline_driver::{FrameStats, PipelineDriver};
pub use shader_ids::ShaderIds;
pub use shadow_atlas::{ShadowAtlasLayout, ShadowTile};
pub use shadow_pass::{ShadowPassExecutor, ShadowPassState};
