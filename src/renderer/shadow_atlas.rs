//! Shadow Atlas Planner
//!
//! Pure layout and matrix math for the tiled spot-light shadow atlas.
//!
//! # Provided Functions
//!
//! - Grid split selection from the shadow tile count
//! - Per-tile viewport and inset scissor rectangles
//! - World-to-shadow matrix assembly (clip → texture → atlas tile)

use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::renderer::command::Rect;
use crate::renderer::light_packer::MAX_SHADOW_TILES;

/// Largest grid dimension of the atlas.
pub const MAX_SPLIT: u32 = 4;

/// Maps clip space `[-1, 1]` to texture space `[0, 1]` on every axis.
pub const CLIP_TO_TEXTURE: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.5, 0.5, 0.5, 1.0),
);

// ============================================================================
// Layout
// ============================================================================

/// Grid dimension that fits `tile_count` tiles.
#[must_use]
pub const fn split_for(tile_count: usize) -> u32 {
    match tile_count {
        0..=1 => 1,
        2..=4 => 2,
        5..=9 => 3,
        _ => MAX_SPLIT,
    }
}

/// One light's region of the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowTile {
    pub index: usize,
    /// Grid cell, `(index mod split, index div split)`.
    pub offset: UVec2,
    /// Pixel rectangle of the whole tile.
    pub viewport: Rect,
    /// Inset rectangle, present only when tiles share the atlas.
    pub scissor: Option<Rect>,
}

/// Atlas grid for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowAtlasLayout {
    pub resolution: u32,
    pub tile_count: usize,
    pub split: u32,
    /// Tile edge in texels.
    pub tile_size: f32,
    /// Tile edge in normalized atlas units.
    pub tile_scale: f32,
    margin: f32,
}

impl ShadowAtlasLayout {
    /// Plans the grid for `tile_count` shadowed lights (capped at 16).
    #[must_use]
    pub fn new(tile_count: usize, resolution: u32, margin: u32) -> Self {
        let tile_count = tile_count.min(MAX_SHADOW_TILES);
        let split = split_for(tile_count);
        Self {
            resolution,
            tile_count,
            split,
            tile_size: resolution as f32 / split as f32,
            tile_scale: 1.0 / split as f32,
            margin: margin as f32,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tile_count == 0
    }

    /// Whether tiles need a scissor to keep filtering inside their cell.
    #[inline]
    #[must_use]
    pub fn uses_scissor(&self) -> bool {
        self.tile_count > 1
    }

    /// `(1/R, 1/R, R, R)`, the texel size uploaded for filtering.
    #[must_use]
    pub fn texel_size(&self) -> Vec4 {
        let r = self.resolution as f32;
        Vec4::new(1.0 / r, 1.0 / r, r, r)
    }

    #[must_use]
    pub fn tile(&self, index: usize) -> ShadowTile {
        let offset = UVec2::new(index as u32 % self.split, index as u32 / self.split);
        let viewport = Rect::new(
            self.tile_size * offset.x as f32,
            self.tile_size * offset.y as f32,
            self.tile_size,
            self.tile_size,
        );
        ShadowTile {
            index,
            offset,
            viewport,
            scissor: self.uses_scissor().then(|| viewport.inset(self.margin)),
        }
    }

    /// Remaps the light's normalized shadow space into its atlas cell.
    /// Identity when the atlas holds a single tile.
    #[must_use]
    pub fn tile_matrix(&self, tile: &ShadowTile) -> Mat4 {
        if self.split <= 1 {
            return Mat4::IDENTITY;
        }
        let s = self.tile_scale;
        Mat4::from_translation(Vec3::new(
            tile.offset.x as f32 * s,
            tile.offset.y as f32 * s,
            0.0,
        )) * Mat4::from_scale(Vec3::new(s, s, 1.0))
    }

    /// World space → atlas texture space of `tile`, depth in `[0, 1]`.
    #[must_use]
    pub fn world_to_shadow(
        &self,
        tile: &ShadowTile,
        view: Mat4,
        projection: Mat4,
        reversed_z: bool,
    ) -> Mat4 {
        let projection = if reversed_z {
            negate_depth_row(projection)
        } else {
            projection
        };
        self.tile_matrix(tile) * CLIP_TO_TEXTURE * projection * view
    }
}

/// Negates the third row, flipping clip depth for reversed-z backends.
#[must_use]
pub fn negate_depth_row(mut m: Mat4) -> Mat4 {
    m.x_axis.z = -m.x_axis.z;
    m.y_axis.z = -m.y_axis.z;
    m.z_axis.z = -m.z_axis.z;
    m.w_axis.z = -m.w_axis.z;
    m
}
