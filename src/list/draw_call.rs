//! Draw-Call Data Model
//!
//! Per-frame containers making up a stage list: the [`DrawCall`] unit, the
//! per-instance GPU stream ([`InstanceData`]), externally pre-batched calls
//! ([`BatchedDrawCall`]), the contiguous-run descriptor ([`DrawBatch`]) and
//! the per-stage [`DrawCallsList`].
//!
//! Everything here lives exactly one frame inside the frame aggregate's
//! backing arrays; clearing resets counts but keeps capacity, so a warm
//! pipeline performs no steady-state allocations.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::gpu::{GeometryHandle, MaterialHandle};
use crate::view::StaticFlags;

/// One GPU submission unit: geometry + material + transform.
///
/// Created fresh each frame by the collector; indices into the frame
/// aggregate's master array are what stage lists and batches refer to.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    /// Object-to-world transform.
    pub world: Mat4,
    /// Bounding sphere center in world space; also the distance reference
    /// for depth sorting.
    pub bounds_center: Vec3,
    pub bounds_radius: f32,
    /// Coarse draw-order bias for opaque sorting (e.g. decal layers).
    pub sort_order: i16,
    /// Static baking flags of the source object.
    pub static_flags: StaticFlags,
    /// Stable per-object random value forwarded to shaders.
    pub per_instance_random: f32,
    /// LOD crossfade dither factor.
    pub lod_dither_factor: f32,
    /// Sign of the world matrix determinant (mirrored transforms flip
    /// triangle winding).
    pub world_determinant_sign: f32,
    /// Number of instances this call already represents.
    pub instance_count: u32,
    /// Per-call opt-out from hardware instancing (skinned meshes and other
    /// non-mergeable geometry).
    pub allow_instancing: bool,
}

impl DrawCall {
    /// A single-instance draw call with neutral modifiers.
    #[must_use]
    pub fn new(geometry: GeometryHandle, material: MaterialHandle, world: Mat4) -> Self {
        Self {
            geometry,
            material,
            world,
            bounds_center: world.w_axis.truncate(),
            bounds_radius: 0.0,
            sort_order: 0,
            static_flags: StaticFlags::empty(),
            per_instance_random: 0.0,
            lod_dither_factor: 0.0,
            world_determinant_sign: 1.0,
            instance_count: 1,
            allow_instancing: true,
        }
    }
}

/// Per-instance element of the instancing stream handed to the backend.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct InstanceData {
    pub origin: [f32; 3],
    pub per_instance_random: f32,
    pub rotation_x: [f32; 3],
    pub lod_dither_factor: f32,
    pub rotation_y: [f32; 3],
    pub rotation_z: [f32; 3],
}

impl InstanceData {
    /// Extracts the instance stream element for one draw call.
    #[must_use]
    pub fn from_draw_call(draw_call: &DrawCall) -> Self {
        let world = &draw_call.world;
        Self {
            origin: world.w_axis.truncate().to_array(),
            per_instance_random: draw_call.per_instance_random,
            rotation_x: world.x_axis.truncate().to_array(),
            lod_dither_factor: draw_call.lod_dither_factor,
            rotation_y: world.y_axis.truncate().to_array(),
            rotation_z: world.z_axis.truncate().to_array(),
        }
    }
}

/// A draw call whose instances were assembled by the producer (particle
/// systems, foliage). Bypasses the sorter and is submitted verbatim.
#[derive(Clone, Debug)]
pub struct BatchedDrawCall {
    pub draw_call: DrawCall,
    pub instances: Vec<InstanceData>,
}

/// A contiguous run of sorted indices sharing one sort key, mapped to a
/// single instanced GPU submission.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DrawBatch {
    /// Key shared by every draw call in the run.
    pub sort_key: u64,
    /// First position inside the stage list's index array.
    pub start: u32,
    /// Number of draw calls submitted at once.
    pub len: u32,
    /// Total instances summed over the run.
    pub instance_count: u32,
}

/// The rendering stages draw calls are collected into.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum DrawListType {
    /// Hardware depth rendering.
    Depth = 0,
    /// Geometry-buffer fill.
    GBuffer = 1,
    /// Geometry-buffer fill after decals.
    GBufferNoDecals = 2,
    /// Forward/translucency rendering.
    Forward = 3,
    /// Distortion accumulation.
    Distortion = 4,
    /// Motion vectors rendering.
    MotionVectors = 5,
}

impl DrawListType {
    /// Number of stage lists in a frame aggregate.
    pub const COUNT: usize = 6;

    /// All stages in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Depth,
        Self::GBuffer,
        Self::GBufferNoDecals,
        Self::Forward,
        Self::Distortion,
        Self::MotionVectors,
    ];

    /// Index into the frame aggregate's list array.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stage name (for debugging).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Depth => "Depth",
            Self::GBuffer => "GBuffer",
            Self::GBufferNoDecals => "GBufferNoDecals",
            Self::Forward => "Forward",
            Self::Distortion => "Distortion",
            Self::MotionVectors => "MotionVectors",
        }
    }
}

/// Per-stage list of draw calls: indices into the frame aggregate's master
/// array plus the batches derived from them by the sorter.
#[derive(Default)]
pub struct DrawCallsList {
    /// Indices of regular draw calls to render.
    pub indices: Vec<u32>,
    /// Indices into the pre-batched array; these skip sorting.
    pub pre_batched: Vec<u32>,
    /// Contiguous batches produced by the sorter. Invariant: batches
    /// partition `indices` without gaps or overlap.
    pub batches: Vec<DrawBatch>,
    /// False when any contained call or the device rules out instancing.
    pub can_use_instancing: bool,
    /// Reusable (key, index) scratch for the stable sort.
    pub(crate) sort_scratch: Vec<(u64, u32)>,
}

impl DrawCallsList {
    /// Resets counts; backing capacity is retained.
    pub fn clear(&mut self) {
        self.indices.clear();
        self.pre_batched.clear();
        self.batches.clear();
        self.sort_scratch.clear();
        self.can_use_instancing = true;
    }

    /// True when the stage has nothing to render.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.pre_batched.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_data_layout_is_tightly_packed() {
        // 14 floats, no padding; the backend uploads this verbatim.
        assert_eq!(std::mem::size_of::<InstanceData>(), 56);
    }

    #[test]
    fn instance_data_extracts_world_rows() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let call = DrawCall::new(GeometryHandle(1), MaterialHandle(1), world);
        let data = InstanceData::from_draw_call(&call);
        assert_eq!(data.origin, [1.0, 2.0, 3.0]);
        assert_eq!(data.rotation_x, [1.0, 0.0, 0.0]);
        assert_eq!(data.rotation_z, [0.0, 0.0, 1.0]);
    }
}
