//! Utility Module
//!
//! - [`interner`]: String interning for shader property and keyword names
//!
//! # String Interning
//!
//! ```rust,ignore
//! use forward_atlas::utils::PropertyId;
//!
//! let a = PropertyId::new("_ShadowMap");
//! let b = PropertyId::new("_ShadowMap");
//! assert_eq!(a, b); // O(1) comparison
//! ```

pub mod interner;

pub use interner::{PropertyId, Symbol};
