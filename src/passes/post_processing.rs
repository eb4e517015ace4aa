//! Post-Processing Composite
//!
//! Tone mapping and color-grading LUT application in one fullscreen
//! composite from front to back buffer. When the view disables tone
//! mapping and no LUT was produced, the stage degrades to a plain copy so
//! the color chain stays intact.

use crate::buffers::PingPong;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::view::{RenderView, ViewFlags};

use super::{create_program, RenderPass};

pub struct PostProcessingPass {
    composite_program: Option<ProgramHandle>,
}

impl PostProcessingPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            composite_program: None,
        }
    }

    /// Composites `front` into `back`; the caller swaps afterwards.
    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        view: &RenderView,
        ping_pong: &PingPong,
        lut: Option<TextureView>,
    ) {
        let Some(program) = self.composite_program else {
            return;
        };

        let tone_map = view.flags.contains(ViewFlags::TONE_MAPPING);
        if !tone_map && lut.is_none() {
            ctx.copy(ping_pong.back, ping_pong.front);
            return;
        }

        ctx.set_render_targets(&[ping_pong.back], None);
        ctx.bind_texture(0, ping_pong.front);
        if let Some(lut) = lut {
            ctx.bind_texture(1, lut);
        }
        ctx.bind_program(program);
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for PostProcessingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for PostProcessingPass {
    fn name(&self) -> &'static str {
        "PostProcessing"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.composite_program =
            Some(create_program(device, self.name(), "post/composite")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.composite_program = None;
    }
}
