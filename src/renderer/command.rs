//! Command Stream
//!
//! The submission surface between the pipeline and the graphics layer.
//!
//! The pipeline never touches a device. Every effect it has on the frame is
//! expressed as a call on a [`CommandStream`]: binding targets, uploading
//! global shading inputs, toggling keywords, and issuing draws.
//!
//! [`CommandBuffer`] is a recording implementation. It stores each call as a
//! [`Command`] and can replay the uploads into a [`GlobalState`], which is
//! what shading code would observe after the stream executes.

use bitflags::bitflags;
use glam::{Mat4, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::scene::camera::Camera;
use crate::utils::PropertyId;

// ============================================================================
// Draw Settings
// ============================================================================

bitflags! {
    /// Batching features the draw layer may use.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DrawFlags: u32 {
        const DYNAMIC_BATCHING = 1 << 0;
        const INSTANCING       = 1 << 1;
    }
}

/// Inclusive range of render queue values a draw call accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueRange {
    pub min: u32,
    pub max: u32,
}

impl RenderQueueRange {
    pub const OPAQUE: Self = Self { min: 0, max: 2500 };
    pub const TRANSPARENT: Self = Self { min: 2501, max: 5000 };
    pub const ALL: Self = Self { min: 0, max: 5000 };

    #[inline]
    #[must_use]
    pub fn contains(&self, queue: u32) -> bool {
        (self.min..=self.max).contains(&queue)
    }
}

/// Object ordering inside a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Queue, then render state, then front-to-back.
    CommonOpaque,
    /// Queue, then back-to-front.
    CommonTransparent,
    Unsorted,
}

/// Extra per-object data the draw layer must provide to shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerObjectData {
    #[default]
    None,
    /// Up to eight light indices per object, remapped through the light index map.
    LightIndices8,
}

/// Material substituted for every object in a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideMaterial {
    /// Flat magenta material marking shaders this pipeline cannot draw.
    Error,
}

/// Shader pass names a draw call renders, in priority order.
pub type ShaderPassSelector = SmallVec<[&'static str; 6]>;

/// One filtered, sorted draw of visible objects.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub label: &'static str,
    /// Indices into the frame's visible objects, in draw order.
    pub objects: Vec<u32>,
    pub passes: ShaderPassSelector,
    pub flags: DrawFlags,
    pub sort: SortMode,
    pub queue_range: RenderQueueRange,
    pub per_object: PerObjectData,
    pub override_material: Option<OverrideMaterial>,
}

// ============================================================================
// Targets & Rects
// ============================================================================

/// Handle of a temporary render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub PropertyId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The current camera's color and depth attachments.
    Camera,
    /// A temporary target acquired earlier in the stream.
    Temporary(RenderTargetId),
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrinks the rect by `margin` on every side.
    #[must_use]
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            x: self.x + margin,
            y: self.y + margin,
            width: (self.width - 2.0 * margin).max(0.0),
            height: (self.height - 2.0 * margin).max(0.0),
        }
    }
}

// ============================================================================
// CommandStream
// ============================================================================

/// Operations the pipeline issues to the graphics layer.
pub trait CommandStream {
    /// Backend depth convention. `true` when near maps to 1 and far to 0.
    fn uses_reversed_z_buffer(&self) -> bool {
        false
    }

    fn setup_camera_properties(&mut self, camera: &Camera);
    fn emit_scene_view_geometry(&mut self, camera: &Camera);

    fn get_temporary_depth_target(&mut self, id: RenderTargetId, size: u32);
    fn release_temporary_target(&mut self, id: RenderTargetId);
    fn set_render_target(&mut self, target: RenderTarget);
    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: Vec4);

    fn set_viewport(&mut self, rect: Rect);
    fn enable_scissor(&mut self, rect: Rect);
    fn disable_scissor(&mut self);
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);

    fn set_global_float(&mut self, id: PropertyId, value: f32);
    fn set_global_vector(&mut self, id: PropertyId, value: Vec4);
    fn set_global_vector_array(&mut self, id: PropertyId, values: &[Vec4]);
    fn set_global_matrix_array(&mut self, id: PropertyId, values: &[Mat4]);
    fn set_global_texture(&mut self, id: PropertyId, target: RenderTargetId);
    fn set_keyword(&mut self, keyword: PropertyId, enabled: bool);

    fn draw_shadow_casters(&mut self, light_index: usize);
    fn draw_renderers(&mut self, call: &DrawCall);
    fn draw_skybox(&mut self, camera: &Camera);

    fn begin_sample(&mut self, name: &'static str);
    fn end_sample(&mut self, name: &'static str);

    /// Hands everything recorded so far to the device.
    fn submit(&mut self);
}

// ============================================================================
// Recording Implementation
// ============================================================================

/// A recorded [`CommandStream`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetupCameraProperties { camera: String },
    EmitSceneViewGeometry { camera: String },
    GetTemporaryDepthTarget { id: RenderTargetId, size: u32 },
    ReleaseTemporaryTarget(RenderTargetId),
    SetRenderTarget(RenderTarget),
    ClearRenderTarget { depth: bool, color: bool, value: Vec4 },
    SetViewport(Rect),
    EnableScissor(Rect),
    DisableScissor,
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetGlobalFloat(PropertyId, f32),
    SetGlobalVector(PropertyId, Vec4),
    SetGlobalVectorArray(PropertyId, Vec<Vec4>),
    SetGlobalMatrixArray(PropertyId, Vec<Mat4>),
    SetGlobalTexture(PropertyId, RenderTargetId),
    SetKeyword(PropertyId, bool),
    DrawShadowCasters { light_index: usize },
    DrawRenderers(DrawCall),
    DrawSkybox,
    BeginSample(&'static str),
    EndSample(&'static str),
    Submit,
}

/// Value of a global shading input.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue {
    Float(f32),
    Vector(Vec4),
    VectorArray(Vec<Vec4>),
    MatrixArray(Vec<Mat4>),
    Texture(RenderTargetId),
}

/// Global shading state after replaying a command sequence.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub values: FxHashMap<PropertyId, GlobalValue>,
    pub keywords: FxHashSet<PropertyId>,
}

impl GlobalState {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GlobalValue> {
        PropertyId::lookup(name).and_then(|id| self.values.get(&id))
    }

    #[must_use]
    pub fn vector_array(&self, name: &str) -> Option<&[Vec4]> {
        match self.get(name)? {
            GlobalValue::VectorArray(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn matrix_array(&self, name: &str) -> Option<&[Mat4]> {
        match self.get(name)? {
            GlobalValue::MatrixArray(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn keyword_enabled(&self, name: &str) -> bool {
        PropertyId::lookup(name).is_some_and(|id| self.keywords.contains(&id))
    }

    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::SetGlobalFloat(id, v) => {
                self.values.insert(*id, GlobalValue::Float(*v));
            }
            Command::SetGlobalVector(id, v) => {
                self.values.insert(*id, GlobalValue::Vector(*v));
            }
            Command::SetGlobalVectorArray(id, v) => {
                self.values.insert(*id, GlobalValue::VectorArray(v.clone()));
            }
            Command::SetGlobalMatrixArray(id, v) => {
                self.values.insert(*id, GlobalValue::MatrixArray(v.clone()));
            }
            Command::SetGlobalTexture(id, target) => {
                self.values.insert(*id, GlobalValue::Texture(*target));
            }
            Command::SetKeyword(id, true) => {
                self.keywords.insert(*id);
            }
            Command::SetKeyword(id, false) => {
                self.keywords.remove(id);
            }
            _ => {}
        }
    }
}

/// Records every call for later inspection or replay.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    reversed_z: bool,
    submitted: usize,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that reports a reversed depth convention.
    #[must_use]
    pub fn with_reversed_z(reversed_z: bool) -> Self {
        Self {
            reversed_z,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of `submit` calls seen.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.submitted = 0;
    }

    /// Replays the recorded uploads and keyword toggles.
    #[must_use]
    pub fn global_state(&self) -> GlobalState {
        let mut state = GlobalState::default();
        for command in &self.commands {
            state.apply(command);
        }
        state
    }

    /// Recorded draw calls, in order.
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::DrawRenderers(call) => Some(call),
            _ => None,
        })
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl CommandStream for CommandBuffer {
    fn uses_reversed_z_buffer(&self) -> bool {
        self.reversed_z
    }

    fn setup_camera_properties(&mut self, camera: &Camera) {
        self.push(Command::SetupCameraProperties {
            camera: camera.name.to_string(),
        });
    }

    fn emit_scene_view_geometry(&mut self, camera: &Camera) {
        self.push(Command::EmitSceneViewGeometry {
            camera: camera.name.to_string(),
        });
    }

    fn get_temporary_depth_target(&mut self, id: RenderTargetId, size: u32) {
        self.push(Command::GetTemporaryDepthTarget { id, size });
    }

    fn release_temporary_target(&mut self, id: RenderTargetId) {
        self.push(Command::ReleaseTemporaryTarget(id));
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.push(Command::SetRenderTarget(target));
    }

    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool, color: Vec4) {
        self.push(Command::ClearRenderTarget {
            depth: clear_depth,
            color: clear_color,
            value: color,
        });
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.push(Command::SetViewport(rect));
    }

    fn enable_scissor(&mut self, rect: Rect) {
        self.push(Command::EnableScissor(rect));
    }

    fn disable_scissor(&mut self) {
        self.push(Command::DisableScissor);
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.push(Command::SetViewProjection { view, projection });
    }

    fn set_global_float(&mut self, id: PropertyId, value: f32) {
        self.push(Command::SetGlobalFloat(id, value));
    }

    fn set_global_vector(&mut self, id: PropertyId, value: Vec4) {
        self.push(Command::SetGlobalVector(id, value));
    }

    fn set_global_vector_array(&mut self, id: PropertyId, values: &[Vec4]) {
        self.push(Command::SetGlobalVectorArray(id, values.to_vec()));
    }

    fn set_global_matrix_array(&mut self, id: PropertyId, values: &[Mat4]) {
        self.push(Command::SetGlobalMatrixArray(id, values.to_vec()));
    }

    fn set_global_texture(&mut self, id: PropertyId, target: RenderTargetId) {
        self.push(Command::SetGlobalTexture(id, target));
    }

    fn set_keyword(&mut self, keyword: PropertyId, enabled: bool) {
        self.push(Command::SetKeyword(keyword, enabled));
    }

    fn draw_shadow_casters(&mut self, light_index: usize) {
        self.push(Command::DrawShadowCasters { light_index });
    }

    fn draw_renderers(&mut self, call: &DrawCall) {
        self.push(Command::DrawRenderers(call.clone()));
    }

    fn draw_skybox(&mut self, _camera: &Camera) {
        self.push(Command::DrawSkybox);
    }

    fn begin_sample(&mut self, name: &'static str) {
        self.push(Command::BeginSample(name));
    }

    fn end_sample(&mut self, name: &'static str) {
        self.push(Command::EndSample(name));
    }

    fn submit(&mut self) {
        self.push(Command::Submit);
        self.submitted += 1;
    }
}
