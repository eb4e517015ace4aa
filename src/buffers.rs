//! Frame Buffers
//!
//! [`RenderBuffers`] owns the persistent intermediate targets of one render
//! task: depth, the geometry buffer, motion vectors, ambient occlusion and
//! the two HDR color buffers forming the post-process ping-pong pair.
//! They live as long as the task and are recreated on resolution changes;
//! short-lived targets go through the `RenderTargetPool` instead.

use crate::error::Result;
use crate::gpu::{GpuDevice, TextureDesc, TextureFormat, TextureHandle, TextureView};

/// The two ping-pong roles. A stage reads `front` and writes `back`; after
/// each stage that produced new color data the roles are exchanged by
/// value, so no stage ever reads and writes one resource.
#[derive(Clone, Copy, Debug)]
pub struct PingPong {
    pub front: TextureView,
    pub back: TextureView,
}

impl PingPong {
    /// Exchanges the front/back roles.
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Persistent per-task intermediate textures.
pub struct RenderBuffers {
    width: u32,
    height: u32,
    /// Scene depth (sampleable).
    pub depth: TextureHandle,
    /// Geometry buffer: albedo, encoded normals, material params, emissive.
    pub gbuffer: [TextureHandle; 4],
    /// Per-pixel motion vectors.
    pub motion_vectors: TextureHandle,
    /// Ambient occlusion term.
    pub ambient_occlusion: TextureHandle,
    /// First HDR color buffer of the ping-pong pair.
    pub rt1: TextureHandle,
    /// Second HDR color buffer of the ping-pong pair.
    pub rt2: TextureHandle,
}

impl RenderBuffers {
    /// Working format of the HDR color chain and the pooled light buffer.
    pub const OUTPUT_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

    pub fn new(device: &dyn GpuDevice, width: u32, height: u32) -> Result<Self> {
        let color = |format| TextureDesc::render_target(width, height, format);
        Ok(Self {
            width,
            height,
            depth: device.create_texture(&TextureDesc::depth_buffer(width, height), "Depth")?,
            gbuffer: [
                device.create_texture(&color(TextureFormat::Rgba8Unorm), "GBuffer0")?,
                device.create_texture(&color(TextureFormat::Rgb10A2Unorm), "GBuffer1")?,
                device.create_texture(&color(TextureFormat::Rgba8Unorm), "GBuffer2")?,
                device.create_texture(&color(TextureFormat::Rgba8Unorm), "GBuffer3")?,
            ],
            motion_vectors: device
                .create_texture(&color(TextureFormat::Rg16Float), "Motion Vectors")?,
            ambient_occlusion: device
                .create_texture(&color(TextureFormat::R8Unorm), "Ambient Occlusion")?,
            rt1: device.create_texture(&color(Self::OUTPUT_FORMAT), "RT1_FloatRGB")?,
            rt2: device.create_texture(&color(Self::OUTPUT_FORMAT), "RT2_FloatRGB")?,
        })
    }

    /// Recreates the buffers when the internal resolution changed.
    pub fn ensure_size(&mut self, device: &dyn GpuDevice, width: u32, height: u32) -> Result<()> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        self.dispose(device);
        *self = Self::new(device, width, height)?;
        Ok(())
    }

    /// Destroys all owned textures.
    pub fn dispose(&mut self, device: &dyn GpuDevice) {
        device.destroy_texture(self.depth);
        for texture in self.gbuffer {
            device.destroy_texture(texture);
        }
        device.destroy_texture(self.motion_vectors);
        device.destroy_texture(self.ambient_occlusion);
        device.destroy_texture(self.rt1);
        device.destroy_texture(self.rt2);
    }

    #[must_use]
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The ping-pong pair in its start-of-frame orientation.
    #[must_use]
    pub fn ping_pong(&self) -> PingPong {
        PingPong {
            front: self.rt1.view(),
            back: self.rt2.view(),
        }
    }

    /// All four geometry-buffer views plus depth, in bind order.
    #[must_use]
    pub fn gbuffer_views(&self) -> [TextureView; 5] {
        [
            self.gbuffer[0].view(),
            self.gbuffer[1].view(),
            self.gbuffer[2].view(),
            self.gbuffer[3].view(),
            self.depth.view(),
        ]
    }
}
