//! Pipeline Settings
//!
//! Externally supplied configuration for the forward pipeline.
//!
//! The settings are consumed once when a [`PipelineDriver`](crate::renderer::PipelineDriver)
//! is created. They can be built in code or parsed from a JSON document:
//!
//! ```rust,ignore
//! use forward_atlas::settings::{PipelineSettings, ShadowAtlasResolution};
//!
//! let settings = PipelineSettings {
//!     instancing: true,
//!     shadow_atlas_resolution: ShadowAtlasResolution::X2048,
//!     ..Default::default()
//! };
//!
//! let parsed = PipelineSettings::from_json(r#"{ "dynamic_batching": true }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::renderer::command::DrawFlags;

// ---------------------------------------------------------------------------
// ShadowAtlasResolution
// ---------------------------------------------------------------------------

/// Edge length of the square shadow atlas, in texels.
///
/// Serialized as a plain integer. Any value outside the enumerated set is
/// rejected with [`PipelineError::InvalidAtlasResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ShadowAtlasResolution {
    X256,
    X512,
    #[default]
    X1024,
    X2048,
    X4096,
}

impl ShadowAtlasResolution {
    /// Returns the atlas edge length in texels.
    #[inline]
    #[must_use]
    pub const fn texels(self) -> u32 {
        match self {
            Self::X256 => 256,
            Self::X512 => 512,
            Self::X1024 => 1024,
            Self::X2048 => 2048,
            Self::X4096 => 4096,
        }
    }
}

impl TryFrom<u32> for ShadowAtlasResolution {
    type Error = PipelineError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            256 => Ok(Self::X256),
            512 => Ok(Self::X512),
            1024 => Ok(Self::X1024),
            2048 => Ok(Self::X2048),
            4096 => Ok(Self::X4096),
            other => Err(PipelineError::InvalidAtlasResolution(other)),
        }
    }
}

impl From<ShadowAtlasResolution> for u32 {
    fn from(value: ShadowAtlasResolution) -> Self {
        value.texels()
    }
}

// ---------------------------------------------------------------------------
// PipelineSettings
// ---------------------------------------------------------------------------

/// Global configuration for the forward pipeline.
///
/// # Fields
///
/// | Field                     | Description                                  | Default                   |
/// |---------------------------|----------------------------------------------|---------------------------|
/// | `dynamic_batching`        | Let the draw layer merge small meshes        | `false`                   |
/// | `instancing`              | Let the draw layer use GPU instancing        | `false`                   |
/// | `shadow_atlas_resolution` | Edge length of the shared shadow atlas       | `1024`                    |
/// | `debug_overlay_enabled`   | Issue the unsupported-shader error pass      | `cfg!(debug_assertions)`  |
/// | `shadow_tile_margin`      | Scissor inset per atlas tile, in texels      | `4`                       |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Enable dynamic batching for the opaque and transparent passes.
    pub dynamic_batching: bool,

    /// Enable GPU instancing for the opaque and transparent passes.
    pub instancing: bool,

    /// Resolution of the shadow atlas shared by all shadowed spot lights.
    pub shadow_atlas_resolution: ShadowAtlasResolution,

    /// Re-draw objects with unsupported shaders using the error material.
    ///
    /// Diagnostic aid; keep it off in shipping configurations.
    pub debug_overlay_enabled: bool,

    /// Scissor inset applied to every atlas tile when more than one tile is in use.
    pub shadow_tile_margin: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dynamic_batching: false,
            instancing: false,
            shadow_atlas_resolution: ShadowAtlasResolution::default(),
            debug_overlay_enabled: cfg!(debug_assertions),
            shadow_tile_margin: 4,
        }
    }
}

impl PipelineSettings {
    /// Parses settings from a JSON document. Missing fields take their defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(doc)?;
        Ok(settings)
    }

    /// Draw-layer flags derived from the batching toggles.
    #[inline]
    #[must_use]
    pub fn draw_flags(&self) -> DrawFlags {
        let mut flags = DrawFlags::empty();
        if self.dynamic_batching {
            flags |= DrawFlags::DYNAMIC_BATCHING;
        }
        if self.instancing {
            flags |= DrawFlags::INSTANCING;
        }
        flags
    }
}
