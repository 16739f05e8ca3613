//! Error Types
//!
//! This module defines the error types used by the pipeline.
//!
//! # Overview
//!
//! [`PipelineError`] only covers configuration-time failures:
//! - Shadow atlas resolutions outside the supported set
//! - Light buffer capacities the shading side cannot address
//! - Malformed settings documents
//!
//! The per-frame path never produces errors. Invalid cameras, light overflow
//! and degenerate shadow casters are absorbed by policy inside the renderer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use forward_atlas::errors::Result;
//! use forward_atlas::settings::PipelineSettings;
//!
//! fn load(doc: &str) -> Result<PipelineSettings> {
//!     PipelineSettings::from_json(doc)
//! }
//! ```

use thiserror::Error;

/// The error type for pipeline construction and configuration.
#[derive(Error, Debug)]
pub enum PipelineError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The requested shadow atlas resolution is not one of the supported sizes.
    #[error("Unsupported shadow atlas resolution: {0} (expected 256, 512, 1024, 2048 or 4096)")]
    InvalidAtlasResolution(u32),

    /// The light buffer capacity cannot be addressed by the shadow atlas grid.
    #[error("Unsupported light buffer capacity: {0} (expected 1..=16)")]
    UnsupportedLightCapacity(usize),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// Settings document could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),
}

/// Alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;
