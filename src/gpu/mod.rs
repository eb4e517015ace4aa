//! GPU Backend Boundary
//!
//! The orchestrator never talks to a graphics API directly. Everything below
//! this module is expressed through two object-safe traits:
//!
//! - [`GpuDevice`]: resource factory (textures, shader programs) plus
//!   capability queries. Takes `&self`; thread-safety and interior mutability
//!   are the backend's concern.
//! - [`GpuContext`]: a command-recording context for one frame. Target and
//!   viewport binding, resource binding, draw submission. Strictly single
//!   threaded, `&mut self`.
//!
//! The core holds only [`TextureHandle`] / [`ProgramHandle`] values and
//! descriptor structs; it never observes GPU memory. Content references
//! ([`GeometryHandle`], [`MaterialHandle`]) are opaque identifiers owned by
//! the embedding engine's asset layer; binding one may fail when the asset is
//! not resident yet, which the caller treats as "skip this draw call".
//!
//! A headless command-recording implementation lives in [`null`]; it backs
//! the test suite and servers without a GPU.

pub mod null;

use bitflags::bitflags;

use crate::error::Result;
use crate::list::draw_call::InstanceData;

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Opaque handle to a backend texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// Returns the default (full resource) view of this texture.
    #[must_use]
    #[inline]
    pub const fn view(self) -> TextureView {
        TextureView { texture: self }
    }
}

/// A bindable view over a [`TextureHandle`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureView {
    /// The viewed texture.
    pub texture: TextureHandle,
}

/// Opaque handle to a compiled shader program owned by the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProgramHandle(pub u32);

/// Opaque reference to a geometry asset owned by the embedding engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeometryHandle(pub u64);

/// Opaque reference to a material asset owned by the embedding engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MaterialHandle(pub u64);

// ─── Descriptors ──────────────────────────────────────────────────────────────

/// Texture pixel formats used by the pipeline's intermediate targets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureFormat {
    /// 8-bit RGBA, normalized.
    Rgba8Unorm,
    /// 16-bit float RGBA, the HDR working format.
    Rgba16Float,
    /// Packed 11/11/10 float RGB.
    R11G11B10Float,
    /// 10-bit RGB with 2-bit alpha (encoded normals).
    Rgb10A2Unorm,
    /// Two-channel 16-bit float (motion vectors).
    Rg16Float,
    /// Single-channel 8-bit (ambient occlusion).
    R8Unorm,
    /// 32-bit float depth.
    Depth32Float,
}

bitflags! {
    /// Allowed usages of a texture, part of the pool-recycling key.
    ///
    /// Usage-agnostic pool matching is intentionally avoided: handing a
    /// texture to a stage that binds it differently than it was created for
    /// is a backend validation error.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct TextureUsage: u8 {
        /// Bindable as a color render target.
        const RENDER_TARGET = 1 << 0;
        /// Bindable as a sampled shader resource.
        const SHADER_RESOURCE = 1 << 1;
        /// Bindable as a depth-stencil target.
        const DEPTH_STENCIL = 1 << 2;
        /// Bindable for unordered (compute) access.
        const UNORDERED_ACCESS = 1 << 3;
    }
}

/// Full description of a 2D texture. Doubles as the pool-recycling key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub mip_levels: u32,
}

impl TextureDesc {
    /// Descriptor for a single-mip render target that can also be sampled.
    #[must_use]
    pub const fn render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            usage: TextureUsage::RENDER_TARGET.union(TextureUsage::SHADER_RESOURCE),
            mip_levels: 1,
        }
    }

    /// Descriptor for a sampleable depth buffer.
    #[must_use]
    pub const fn depth_buffer(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::DEPTH_STENCIL.union(TextureUsage::SHADER_RESOURCE),
            mip_levels: 1,
        }
    }
}

/// Viewport rectangle in output pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Viewport covering `width` x `height` pixels at the origin.
    #[must_use]
    pub const fn sized(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// Static capabilities of a device, queried once at startup.
#[derive(Clone, Copy, Debug)]
pub struct DeviceLimits {
    /// Whether hardware instancing is available. When false every batch is
    /// submitted as individual draws and stage lists report
    /// `can_use_instancing == false`.
    pub supports_instancing: bool,
    /// Maximum edge length of a 2D texture.
    pub max_texture_size: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            supports_instancing: true,
            max_texture_size: 16384,
        }
    }
}

// ─── Device Trait ─────────────────────────────────────────────────────────────

/// Resource factory side of the backend.
pub trait GpuDevice {
    /// Creates a texture matching `desc`. The label is used for debugging
    /// and error reporting only.
    fn create_texture(&self, desc: &TextureDesc, label: &'static str) -> Result<TextureHandle>;

    /// Destroys a texture previously created by this device.
    fn destroy_texture(&self, texture: TextureHandle);

    /// Creates (or begins async compilation of) a named shader program.
    ///
    /// A returned handle does not imply the program is usable yet; poll
    /// [`is_program_ready`](Self::is_program_ready). Outright rejection is an
    /// error and fatal to pass initialization.
    fn create_program(&self, name: &'static str) -> Result<ProgramHandle>;

    /// True once an asynchronously compiled program can be bound.
    fn is_program_ready(&self, program: ProgramHandle) -> bool;

    /// Static device capabilities.
    fn limits(&self) -> DeviceLimits;
}

// ─── Context Trait ────────────────────────────────────────────────────────────

/// Command-recording side of the backend. One logical thread per frame.
pub trait GpuContext {
    /// Resets all cached binding state at a frame boundary.
    fn clear_state(&mut self);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Binds color targets and an optional depth target.
    fn set_render_targets(&mut self, color: &[TextureView], depth: Option<TextureView>);

    /// Unbinds all render targets.
    fn reset_render_targets(&mut self);

    /// Clears a color target to a constant value.
    fn clear(&mut self, target: TextureView, color: [f32; 4]);

    /// Clears a depth target to a constant value.
    fn clear_depth(&mut self, target: TextureView, depth: f32);

    /// Binds a texture as a shader resource.
    fn bind_texture(&mut self, slot: u32, view: TextureView);

    /// Unbinds all shader resources (textures).
    fn reset_textures(&mut self);

    /// Binds a shader program for subsequent fullscreen / instanced draws.
    fn bind_program(&mut self, program: ProgramHandle);

    /// Uploads the bound program's parameter block (a `bytemuck`-cast
    /// `#[repr(C)]` struct).
    fn set_uniforms(&mut self, data: &[u8]);

    /// Binds a material's GPU state. Returns false when the material is not
    /// resident; the caller must skip the affected draw calls.
    fn bind_material(&mut self, material: MaterialHandle) -> bool;

    /// Binds a geometry's vertex/index streams. Returns false when the
    /// geometry is not resident.
    fn bind_geometry(&mut self, geometry: GeometryHandle) -> bool;

    /// Submits the bound geometry `instance_count` times.
    fn draw_instanced(&mut self, instance_count: u32);

    /// Submits the bound geometry once per element of `instances`, with the
    /// per-instance stream uploaded by the backend.
    fn draw_instances(&mut self, instances: &[InstanceData]);

    /// Draws a fullscreen triangle with the bound program.
    fn draw_fullscreen(&mut self);

    /// Copies (blits) `src` into `dst`, stretching to the bound viewport.
    fn copy(&mut self, dst: TextureView, src: TextureView);

    /// Opens a named debug group; stages wrap themselves in one.
    fn push_debug_group(&mut self, name: &'static str);

    /// Closes the innermost debug group.
    fn pop_debug_group(&mut self);
}
