//! Global Sign Distance Field
//!
//! Maintains the coarse scene distance field consumed by materials and GI
//! later in the frame. The field lives in a persistent cascade atlas that
//! is rasterized incrementally; a debug visualization backs the GlobalSdf
//! view mode's early exit.

use crate::error::{RenderError, Result};
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureView,
};
use crate::list::RenderList;

use super::{create_program, draw_fullscreen, RenderPass};

// Four cascades of 128^3 voxels, unwrapped slice-by-slice.
const ATLAS_WIDTH: u32 = 128 * 16;
const ATLAS_HEIGHT: u32 = 128 * 8 * 4;

pub struct GlobalDistanceFieldPass {
    rasterize_program: Option<ProgramHandle>,
    debug_program: Option<ProgramHandle>,
    cascades: Option<TextureHandle>,
}

impl GlobalDistanceFieldPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rasterize_program: None,
            debug_program: None,
            cascades: None,
        }
    }

    /// Rasterizes this frame's dirty objects into the cascade atlas.
    pub fn render(&self, ctx: &mut dyn GpuContext, list: &RenderList) {
        let (Some(program), Some(cascades)) = (self.rasterize_program, self.cascades) else {
            return;
        };
        if list.draw_calls.is_empty() {
            return;
        }

        ctx.set_render_targets(&[cascades.view()], None);
        ctx.bind_program(program);
        ctx.draw_instanced(list.draw_calls.len() as u32);
        ctx.reset_render_targets();
    }

    /// Ray-marches the field into `output` for the debug view mode.
    pub fn render_debug(&self, ctx: &mut dyn GpuContext, output: TextureView) {
        let (Some(program), Some(cascades)) = (self.debug_program, self.cascades) else {
            return;
        };
        draw_fullscreen(ctx, program, &[cascades.view()], output);
        ctx.reset_render_targets();
    }
}

impl Default for GlobalDistanceFieldPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GlobalDistanceFieldPass {
    fn name(&self) -> &'static str {
        "GlobalSDF"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.rasterize_program = Some(create_program(device, self.name(), "sdf/rasterize")?);
        self.debug_program = Some(create_program(device, self.name(), "sdf/debug")?);
        let desc = TextureDesc::render_target(ATLAS_WIDTH, ATLAS_HEIGHT, TextureFormat::R8Unorm);
        self.cascades = Some(device.create_texture(&desc, "Global SDF Cascades").map_err(
            |source| RenderError::PassInitFailed {
                pass: self.name(),
                reason: source.to_string(),
            },
        )?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.rasterize_program = None;
        self.debug_program = None;
        self.cascades = None;
    }
}
