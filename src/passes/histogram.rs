//! Luminance Histogram
//!
//! Reduces the scene color into a small luminance histogram texture
//! consumed by eye adaptation. The result is pooled and released by the
//! caller once adaptation sampled it.

use crate::error::Result;
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureView,
};
use crate::target_pool::RenderTargetPool;

use super::{create_program, draw_fullscreen, RenderPass};

const BUCKET_COUNT: u32 = 64;

pub struct HistogramPass {
    program: Option<ProgramHandle>,
}

impl HistogramPass {
    #[must_use]
    pub fn new() -> Self {
        Self { program: None }
    }

    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        input: TextureView,
    ) -> Result<Option<TextureHandle>> {
        let Some(program) = self.program else {
            return Ok(None);
        };
        let desc = TextureDesc::render_target(BUCKET_COUNT, 1, TextureFormat::Rgba16Float);
        let histogram = pool.get(device, &desc, "Luminance Histogram")?;
        draw_fullscreen(ctx, program, &[input], histogram.view());
        ctx.reset_render_targets();
        Ok(Some(histogram))
    }
}

impl Default for HistogramPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for HistogramPass {
    fn name(&self) -> &'static str {
        "Histogram"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.program = Some(create_program(device, self.name(), "histogram/reduce")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.program = None;
    }
}
