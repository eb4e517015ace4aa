//! Upscale
//!
//! Final resolution change when the frame rendered below target
//! resolution and no custom-upscale effect is registered.

use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView, Viewport};

use super::{create_program, draw_fullscreen, RenderPass};

pub struct UpscalePass {
    program: Option<ProgramHandle>,
}

impl UpscalePass {
    #[must_use]
    pub fn new() -> Self {
        Self { program: None }
    }

    /// Filters `input` up to `output` covering `viewport`.
    pub fn upscale(
        &self,
        ctx: &mut dyn GpuContext,
        viewport: Viewport,
        input: TextureView,
        output: TextureView,
    ) {
        ctx.set_viewport(viewport);
        let Some(program) = self.program else {
            ctx.copy(output, input);
            return;
        };
        draw_fullscreen(ctx, program, &[input], output);
        ctx.reset_render_targets();
    }
}

impl Default for UpscalePass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for UpscalePass {
    fn name(&self) -> &'static str {
        "Upscale"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.program = Some(create_program(device, self.name(), "upscale/lanczos")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.program = None;
    }
}
