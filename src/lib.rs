#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod utils;

pub use errors::{PipelineError, Result};
pub use renderer::{
    CommandBuffer, CommandStream, FrameRenderer, FrameStats, PackedLightBuffer, PipelineDriver,
    Visibility,
};
pub use scene::{Camera, SceneVisibility, VisibleLight, VisibleObject};
pub use settings::{PipelineSettings, ShadowAtlasResolution};
pub use utils::interner;
