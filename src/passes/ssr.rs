//! Screen-Space Reflections
//!
//! Ray-marches the depth buffer to produce a reflections color texture for
//! the reflections combine stage. The result is a pooled target owned by
//! the caller, which must release it once the combine consumed it.

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureHandle, TextureView,
};
use crate::settings::PostProcessSettings;
use crate::target_pool::RenderTargetPool;
use crate::view::{RenderView, ViewFlags};

use super::{create_program, draw_fullscreen, RenderPass};

pub struct ScreenSpaceReflectionsPass {
    trace_program: Option<ProgramHandle>,
    resolve_program: Option<ProgramHandle>,
}

impl ScreenSpaceReflectionsPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace_program: None,
            resolve_program: None,
        }
    }

    /// SSR reprojects last frame's color, so it needs motion vectors.
    #[must_use]
    pub fn needs_motion_vectors(view: &RenderView) -> bool {
        view.flags.contains(ViewFlags::SSR) && view.flags.contains(ViewFlags::REFLECTIONS)
    }

    /// Traces and resolves reflections; returns the pooled result texture.
    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        view: &RenderView,
        settings: &PostProcessSettings,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
    ) -> Result<Option<TextureHandle>> {
        let (Some(trace), Some(resolve)) = (self.trace_program, self.resolve_program) else {
            return Ok(None);
        };
        if settings.screen_space_reflections.intensity <= f32::EPSILON {
            return Ok(None);
        }

        let (width, height) = view.screen_size;
        let desc = TextureDesc::render_target(width, height, RenderBuffers::OUTPUT_FORMAT);
        let rays = pool.get(device, &desc, "SSR Rays")?;
        let result = pool.get(device, &desc, "SSR Resolve")?;

        draw_fullscreen(
            ctx,
            trace,
            &[
                buffers.depth.view(),
                buffers.gbuffer[1].view(),
                buffers.motion_vectors.view(),
                light_buffer,
            ],
            rays.view(),
        );
        draw_fullscreen(
            ctx,
            resolve,
            &[rays.view(), buffers.gbuffer[2].view()],
            result.view(),
        );
        ctx.reset_render_targets();
        ctx.reset_textures();

        pool.release(rays);
        Ok(Some(result))
    }
}

impl Default for ScreenSpaceReflectionsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ScreenSpaceReflectionsPass {
    fn name(&self) -> &'static str {
        "ScreenSpaceReflections"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.trace_program = Some(create_program(device, self.name(), "ssr/trace")?);
        self.resolve_program = Some(create_program(device, self.name(), "ssr/resolve")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.trace_program = None;
        self.resolve_program = None;
    }
}
