//! Fast Approximate Anti-Aliasing

use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};

use super::{create_program, draw_fullscreen, RenderPass};

pub struct FxaaPass {
    program: Option<ProgramHandle>,
}

impl FxaaPass {
    #[must_use]
    pub fn new() -> Self {
        Self { program: None }
    }

    pub fn render(&self, ctx: &mut dyn GpuContext, input: TextureView, output: TextureView) {
        let Some(program) = self.program else {
            // Unready AA degrades to a copy rather than a black frame.
            ctx.copy(output, input);
            return;
        };
        draw_fullscreen(ctx, program, &[input], output);
        ctx.reset_render_targets();
    }
}

impl Default for FxaaPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for FxaaPass {
    fn name(&self) -> &'static str {
        "FXAA"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.program = Some(create_program(device, self.name(), "aa/fxaa")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.program = None;
    }
}
