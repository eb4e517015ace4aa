//! Geometry Buffer Pass
//!
//! Fills the geometry buffer from the sorted opaque stage lists and clears
//! the light accumulation buffer to the view background. Objects that do
//! not receive decals render from the separate `GBufferNoDecals` list after
//! the main fill, so decal projection (applied by the embedding engine
//! between the two) never touches them.
//!
//! Also hosts the geometry-buffer debug visualizations used by the
//! early-exit view modes.

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::list::{DrawListType, RenderList};
use crate::view::{RenderView, ViewMode};

use super::{create_program, draw_fullscreen, RenderPass};

pub struct GBufferPass {
    fill_program: Option<ProgramHandle>,
    debug_program: Option<ProgramHandle>,
}

impl GBufferPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fill_program: None,
            debug_program: None,
        }
    }

    /// True for view modes visualizing raw geometry-buffer channels; these
    /// take the early-exit branch after ambient occlusion.
    #[must_use]
    pub fn is_debug_view(mode: ViewMode) -> bool {
        matches!(
            mode,
            ViewMode::Diffuse | ViewMode::Normals | ViewMode::Depth | ViewMode::AmbientOcclusion
        )
    }

    /// Clears and fills the geometry buffer, and clears the light buffer to
    /// the frame background color.
    pub fn fill(
        &self,
        ctx: &mut dyn GpuContext,
        list: &mut RenderList,
        view: &RenderView,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
    ) {
        let Some(program) = self.fill_program else {
            return;
        };

        let depth = buffers.depth.view();
        let targets = [
            buffers.gbuffer[0].view(),
            buffers.gbuffer[1].view(),
            buffers.gbuffer[2].view(),
            buffers.gbuffer[3].view(),
        ];
        for target in targets {
            ctx.clear(target, [0.0; 4]);
        }
        ctx.clear_depth(depth, 1.0);
        ctx.clear(light_buffer, view.background_color);

        ctx.set_render_targets(&targets, Some(depth));
        ctx.bind_program(program);
        list.execute_draw_calls(ctx, DrawListType::GBuffer, None);
        // Decals project between the two lists; the engine runs them on the
        // same targets, so the no-decals geometry must come after.
        list.execute_draw_calls(ctx, DrawListType::GBufferNoDecals, None);
        ctx.reset_render_targets();
    }

    /// Writes the selected geometry-buffer channel to `output`.
    pub fn render_debug(
        &self,
        ctx: &mut dyn GpuContext,
        buffers: &RenderBuffers,
        output: TextureView,
    ) {
        let Some(program) = self.debug_program else {
            return;
        };
        draw_fullscreen(ctx, program, &buffers.gbuffer_views(), output);
        ctx.reset_render_targets();
    }
}

impl Default for GBufferPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GBufferPass {
    fn name(&self) -> &'static str {
        "GBuffer"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.fill_program = Some(create_program(device, self.name(), "gbuffer/fill")?);
        self.debug_program = Some(create_program(device, self.name(), "gbuffer/debug")?);
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.fill_program
            .is_some_and(|p| device.is_program_ready(p))
    }

    fn dispose(&mut self) {
        self.fill_program = None;
        self.debug_program = None;
    }
}
