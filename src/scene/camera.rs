//! Camera
//!
//! Perspective camera with cached matrices and a view frustum for culling.

use std::borrow::Cow;

use bitflags::bitflags;
use glam::{Affine3A, Mat4, Vec3, Vec4};

bitflags! {
    /// What the camera clears before drawing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraKind {
    #[default]
    Game,
    /// Editor scene view; gets world geometry emitted in diagnostic builds.
    SceneView,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub name: Cow<'static, str>,
    pub kind: CameraKind,
    pub clear_flags: ClearFlags,
    pub background_color: Vec4,

    // === Projection ===
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // Cached matrices, read-only for the renderer
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            name: Cow::Borrowed("Camera"),
            kind: CameraKind::Game,
            clear_flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            background_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: CameraKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the projection parameters describe a usable frustum.
    #[must_use]
    pub fn has_valid_projection(&self) -> bool {
        self.fov.is_finite()
            && self.fov > 0.0
            && self.aspect.is_finite()
            && self.aspect > 0.0
            && self.near > 0.0
            && self.far.is_finite()
            && self.far > self.near
    }

    pub fn update_projection_matrix(&mut self) {
        // Degenerate parameters are kept as-is; culling rejects the camera.
        if self.has_valid_projection() {
            self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        }
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Places the camera at `eye` looking at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        self.update_view_projection(&Affine3A::from_mat4(view.inverse()));
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }
}

/// Six clip planes extracted from a view-projection matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    /// Gribb-Hartmann extraction for a `[0, 1]` clip depth range.
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[2],
            rows[3] - rows[2],
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}
