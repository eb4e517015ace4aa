//! Ambient Occlusion
//!
//! Screen-space AO over the geometry buffer: raw term at half resolution
//! into a pooled temporary, then a bilateral blur into the persistent AO
//! buffer consumed by lighting. The temporary is released before the pass
//! returns.

use bytemuck::{Pod, Zeroable};

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat};
use crate::settings::PostProcessSettings;
use crate::target_pool::RenderTargetPool;
use crate::view::RenderView;

use super::{create_program, draw_fullscreen, RenderPass};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct OcclusionUniforms {
    intensity: f32,
    radius: f32,
    power: f32,
    _pad: f32,
}

pub struct AmbientOcclusionPass {
    occlusion_program: Option<ProgramHandle>,
    blur_program: Option<ProgramHandle>,
}

impl AmbientOcclusionPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            occlusion_program: None,
            blur_program: None,
        }
    }

    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        view: &RenderView,
        settings: &PostProcessSettings,
        buffers: &RenderBuffers,
    ) -> Result<()> {
        if !settings.ambient_occlusion.enabled {
            return Ok(());
        }
        let (Some(occlusion), Some(blur)) = (self.occlusion_program, self.blur_program) else {
            return Ok(());
        };

        let (width, height) = view.screen_size;
        let desc = TextureDesc::render_target(
            (width / 2).max(1),
            (height / 2).max(1),
            TextureFormat::R8Unorm,
        );
        let raw = pool.get(device, &desc, "AO Raw")?;

        let ao = settings.ambient_occlusion;
        ctx.set_render_targets(&[raw.view()], None);
        ctx.bind_texture(0, buffers.gbuffer[1].view());
        ctx.bind_texture(1, buffers.depth.view());
        ctx.bind_program(occlusion);
        ctx.set_uniforms(bytemuck::bytes_of(&OcclusionUniforms {
            intensity: ao.intensity,
            radius: ao.radius,
            power: ao.power,
            _pad: 0.0,
        }));
        ctx.draw_fullscreen();
        draw_fullscreen(
            ctx,
            blur,
            &[raw.view(), buffers.depth.view()],
            buffers.ambient_occlusion.view(),
        );
        ctx.reset_render_targets();

        pool.release(raw);
        Ok(())
    }
}

impl Default for AmbientOcclusionPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for AmbientOcclusionPass {
    fn name(&self) -> &'static str {
        "AmbientOcclusion"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.occlusion_program = Some(create_program(device, self.name(), "ao/occlusion")?);
        self.blur_program = Some(create_program(device, self.name(), "ao/blur")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.occlusion_program = None;
        self.blur_program = None;
    }
}
