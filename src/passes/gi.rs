//! Dynamic Diffuse Global Illumination
//!
//! Probe-volume GI: traces probe updates into a persistent probe atlas,
//! then applies the irradiance on top of the light buffer. Gated by both
//! the view flag and the blended settings mode.

use crate::buffers::RenderBuffers;
use crate::error::{RenderError, Result};
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureView,
};
use crate::list::RenderList;

use super::{create_program, RenderPass};

const PROBE_ATLAS_SIZE: u32 = 1024;

pub struct GlobalIlluminationPass {
    trace_program: Option<ProgramHandle>,
    apply_program: Option<ProgramHandle>,
    probe_atlas: Option<TextureHandle>,
}

impl GlobalIlluminationPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_program: None,
            apply_program: None,
            probe_atlas: None,
        }
    }

    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        list: &RenderList,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
    ) {
        let (Some(trace), Some(apply), Some(atlas)) =
            (self.trace_program, self.apply_program, self.probe_atlas)
        else {
            return;
        };

        // Probe update. The miss radiance scales with the frame's sky
        // lights, so an all-dark scene converges to black probes.
        let miss_boost = list.sky_lights.len() as u32;
        ctx.set_render_targets(&[atlas.view()], None);
        ctx.bind_program(trace);
        ctx.draw_instanced(miss_boost.max(1));

        // Irradiance apply onto the accumulated lighting.
        ctx.set_render_targets(&[light_buffer], None);
        ctx.bind_texture(0, atlas.view());
        ctx.bind_texture(1, buffers.gbuffer[1].view());
        ctx.bind_texture(2, buffers.depth.view());
        ctx.bind_program(apply);
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for GlobalIlluminationPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GlobalIlluminationPass {
    fn name(&self) -> &'static str {
        "GlobalIllumination"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.trace_program = Some(create_program(device, self.name(), "gi/probe_trace")?);
        self.apply_program = Some(create_program(device, self.name(), "gi/apply")?);
        let desc = TextureDesc::render_target(
            PROBE_ATLAS_SIZE,
            PROBE_ATLAS_SIZE,
            TextureFormat::Rgba16Float,
        );
        self.probe_atlas = Some(device.create_texture(&desc, "DDGI Probe Atlas").map_err(
            |source| RenderError::PassInitFailed {
                pass: self.name(),
                reason: source.to_string(),
            },
        )?);
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.trace_program.is_some_and(|p| device.is_program_ready(p))
            && self.apply_program.is_some_and(|p| device.is_program_ready(p))
    }

    fn dispose(&mut self) {
        self.trace_program = None;
        self.apply_program = None;
        self.probe_atlas = None;
    }
}
