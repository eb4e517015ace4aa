//! Subpixel Morphological Anti-Aliasing
//!
//! Three-step SMAA: edge detection, blending-weight calculation, neighbor
//! blend. The two intermediate targets are pooled and released before the
//! pass returns.

use crate::error::Result;
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureView,
};
use crate::target_pool::RenderTargetPool;
use crate::view::RenderView;

use super::{create_program, draw_fullscreen, RenderPass};

pub struct SmaaPass {
    edges_program: Option<ProgramHandle>,
    weights_program: Option<ProgramHandle>,
    blend_program: Option<ProgramHandle>,
}

impl SmaaPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges_program: None,
            weights_program: None,
            blend_program: None,
        }
    }

    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        view: &RenderView,
        input: TextureView,
        output: TextureView,
    ) -> Result<()> {
        let (Some(edges), Some(weights), Some(blend)) =
            (self.edges_program, self.weights_program, self.blend_program)
        else {
            ctx.copy(output, input);
            return Ok(());
        };

        let (width, height) = view.screen_size;
        let desc = TextureDesc::render_target(width, height, TextureFormat::Rgba8Unorm);
        let edges_target = pool.get(device, &desc, "SMAA Edges")?;
        let weights_target = pool.get(device, &desc, "SMAA Weights")?;

        draw_fullscreen(ctx, edges, &[input], edges_target.view());
        draw_fullscreen(ctx, weights, &[edges_target.view()], weights_target.view());
        draw_fullscreen(ctx, blend, &[input, weights_target.view()], output);
        ctx.reset_render_targets();
        ctx.reset_textures();

        pool.release(edges_target);
        pool.release(weights_target);
        Ok(())
    }
}

impl Default for SmaaPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for SmaaPass {
    fn name(&self) -> &'static str {
        "SMAA"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.edges_program = Some(create_program(device, self.name(), "aa/smaa_edges")?);
        self.weights_program = Some(create_program(device, self.name(), "aa/smaa_weights")?);
        self.blend_program = Some(create_program(device, self.name(), "aa/smaa_blend")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.edges_program = None;
        self.weights_program = None;
        self.blend_program = None;
    }
}
