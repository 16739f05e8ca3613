//! Draw List Assembly
//!
//! Filters the frame's visible objects by queue range and orders them with a
//! packed 64-bit sort key, reusing its buffers across cameras.

use crate::renderer::command::{
    DrawCall, DrawFlags, OverrideMaterial, PerObjectData, RenderQueueRange, ShaderPassSelector,
    SortMode,
};
use crate::scene::object::VisibleObject;

/// Pass drawn for lit and unlit geometry.
pub const DEFAULT_UNLIT_PASS: &str = "SRPDefaultUnlit";

/// Legacy passes whose presence marks a shader this pipeline cannot draw.
pub const LEGACY_PASSES: [&str; 6] = [
    "ForwardBase",
    "PrepassBase",
    "Always",
    "Vertex",
    "VertexLMRGBM",
    "VertexLM",
];

/// Packed sort key.
///
/// ```text
/// | 63..50 queue (14) | 49..30 material (20) | 29..0 depth (30) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderKey(u64);

impl RenderKey {
    const DEPTH_MASK: u64 = 0x3FFF_FFFF;

    /// Ascending order: queue, material, near to far.
    #[must_use]
    pub fn opaque(queue: u32, material_id: u32, distance_sq: f32) -> Self {
        let q_bits = u64::from(queue & 0x3FFF) << 50;
        let m_bits = u64::from(material_id & 0xF_FFFF) << 30;
        Self(q_bits | m_bits | Self::depth_bits(distance_sq))
    }

    /// Ascending order: queue, far to near.
    #[must_use]
    pub fn transparent(queue: u32, distance_sq: f32) -> Self {
        let q_bits = u64::from(queue & 0x3FFF) << 50;
        let d_bits = !Self::depth_bits(distance_sq) & Self::DEPTH_MASK;
        Self(q_bits | d_bits)
    }

    /// Non-negative floats order like their bit patterns.
    fn depth_bits(depth: f32) -> u64 {
        let d = if depth.is_sign_negative() || depth.is_nan() {
            0
        } else {
            depth.to_bits() >> 2
        };
        u64::from(d) & Self::DEPTH_MASK
    }
}

/// Reusable scratch for building draw calls.
#[derive(Debug, Default)]
pub struct DrawListBuilder {
    keyed: Vec<(RenderKey, u32)>,
}

impl DrawListBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keyed: Vec::with_capacity(512),
        }
    }

    /// Lit draw of every supported object inside `queue_range`.
    pub fn build(
        &mut self,
        label: &'static str,
        objects: &[VisibleObject],
        queue_range: RenderQueueRange,
        sort: SortMode,
        flags: DrawFlags,
        per_object: PerObjectData,
    ) -> DrawCall {
        self.keyed.clear();
        for (index, object) in objects.iter().enumerate() {
            if !object.shader_supported || !queue_range.contains(object.render_queue) {
                continue;
            }
            let key = match sort {
                SortMode::CommonOpaque => RenderKey::opaque(
                    object.render_queue,
                    object.material_id,
                    object.distance_sq,
                ),
                SortMode::CommonTransparent => {
                    RenderKey::transparent(object.render_queue, object.distance_sq)
                }
                SortMode::Unsorted => RenderKey(0),
            };
            self.keyed.push((key, index as u32));
        }

        if sort != SortMode::Unsorted {
            self.keyed.sort_unstable();
        }

        DrawCall {
            label,
            objects: self.keyed.iter().map(|&(_, index)| index).collect(),
            passes: ShaderPassSelector::from_slice(&[DEFAULT_UNLIT_PASS]),
            flags,
            sort,
            queue_range,
            per_object,
            override_material: None,
        }
    }

    /// Error-material draw of every object whose shader is unsupported.
    #[must_use]
    pub fn build_error(&mut self, objects: &[VisibleObject]) -> DrawCall {
        DrawCall {
            label: "Render Error",
            objects: objects
                .iter()
                .enumerate()
                .filter(|(_, object)| !object.shader_supported)
                .map(|(index, _)| index as u32)
                .collect(),
            passes: ShaderPassSelector::from_slice(&LEGACY_PASSES),
            flags: DrawFlags::empty(),
            sort: SortMode::Unsorted,
            queue_range: RenderQueueRange::ALL,
            per_object: PerObjectData::None,
            override_material: Some(OverrideMaterial::Error),
        }
    }
}
