//! Scene-side data handed to the renderer each frame:
//! - Camera: projection, clear settings and cached matrices
//! - VisibleLight / VisibleObject: per-frame culling output records
//! - SceneVisibility: a simple reference culler

pub mod camera;
pub mod light;
pub mod object;
pub mod visibility;

pub use camera::{Camera, CameraKind, ClearFlags, Frustum};
pub use light::{LightKind, LightShadows, ShadowConfig, VisibleLight};
pub use object::VisibleObject;
pub use visibility::SceneVisibility;
