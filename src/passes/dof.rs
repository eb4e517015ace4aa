//! Depth of Field
//!
//! Circle-of-confusion from depth, half-resolution bokeh gather, composite
//! back to full resolution into the ping-pong back buffer. The two
//! intermediate targets are pooled and released before the pass returns.

use crate::buffers::{PingPong, RenderBuffers};
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat};
use crate::settings::PostProcessSettings;
use crate::target_pool::RenderTargetPool;
use crate::view::RenderView;

use super::{create_program, draw_fullscreen, RenderPass};

pub struct DepthOfFieldPass {
    coc_program: Option<ProgramHandle>,
    bokeh_program: Option<ProgramHandle>,
    composite_program: Option<ProgramHandle>,
}

impl DepthOfFieldPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            coc_program: None,
            bokeh_program: None,
            composite_program: None,
        }
    }

    /// Composites `front` into `back`. Returns true when output was
    /// produced (the caller then swaps the ping-pong).
    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        view: &RenderView,
        settings: &PostProcessSettings,
        buffers: &RenderBuffers,
        ping_pong: &PingPong,
    ) -> Result<bool> {
        if !settings.depth_of_field.enabled {
            return Ok(false);
        }
        let (Some(coc), Some(bokeh), Some(composite)) =
            (self.coc_program, self.bokeh_program, self.composite_program)
        else {
            return Ok(false);
        };

        let (width, height) = view.screen_size;
        let coc_desc = TextureDesc::render_target(width, height, TextureFormat::R8Unorm);
        let half_desc = TextureDesc::render_target(
            (width / 2).max(1),
            (height / 2).max(1),
            RenderBuffers::OUTPUT_FORMAT,
        );
        let coc_target = pool.get(device, &coc_desc, "DoF CoC")?;
        let bokeh_target = pool.get(device, &half_desc, "DoF Bokeh")?;

        draw_fullscreen(ctx, coc, &[buffers.depth.view()], coc_target.view());
        draw_fullscreen(
            ctx,
            bokeh,
            &[ping_pong.front, coc_target.view()],
            bokeh_target.view(),
        );
        draw_fullscreen(
            ctx,
            composite,
            &[ping_pong.front, bokeh_target.view(), coc_target.view()],
            ping_pong.back,
        );
        ctx.reset_render_targets();
        ctx.reset_textures();

        pool.release(coc_target);
        pool.release(bokeh_target);
        Ok(true)
    }
}

impl Default for DepthOfFieldPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for DepthOfFieldPass {
    fn name(&self) -> &'static str {
        "DepthOfField"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.coc_program = Some(create_program(device, self.name(), "dof/coc")?);
        self.bokeh_program = Some(create_program(device, self.name(), "dof/bokeh")?);
        self.composite_program = Some(create_program(device, self.name(), "dof/composite")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.coc_program = None;
        self.bokeh_program = None;
        self.composite_program = None;
    }
}
