//! Forward / Translucency Pass
//!
//! Copies the lit opaque scene into the frame's color chain, accumulates
//! distortion offsets from the Distortion stage into a pooled buffer, then
//! renders the back-to-front sorted Forward stage on top with depth
//! testing against the opaque depth buffer.

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureView};
use crate::list::{DrawListType, RenderList};
use crate::target_pool::RenderTargetPool;
use crate::view::RenderView;

use super::{create_program, RenderPass};

pub struct ForwardPass {
    forward_program: Option<ProgramHandle>,
    distortion_program: Option<ProgramHandle>,
}

impl ForwardPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward_program: None,
            distortion_program: None,
        }
    }

    pub fn render(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        list: &mut RenderList,
        view: &RenderView,
        buffers: &RenderBuffers,
        input: TextureView,
        output: TextureView,
    ) -> Result<()> {
        let Some(forward) = self.forward_program else {
            return Ok(());
        };

        // Base: the lit opaque scene moves into the color chain.
        ctx.copy(output, input);

        // Distortion accumulation feeds refraction offsets for the
        // translucent draws below.
        let mut distortion = None;
        if !list.list(DrawListType::Distortion).is_empty() {
            if let Some(program) = self.distortion_program {
                let (width, height) = view.screen_size;
                let desc =
                    TextureDesc::render_target(width, height, crate::gpu::TextureFormat::Rgba8Unorm);
                let accumulation = pool.get(device, &desc, "Distortion")?;
                ctx.clear(accumulation.view(), [0.0; 4]);
                ctx.set_render_targets(&[accumulation.view()], Some(buffers.depth.view()));
                ctx.bind_program(program);
                list.execute_draw_calls(ctx, DrawListType::Distortion, None);
                distortion = Some(accumulation);
            }
        }

        // Translucency, back-to-front, reading the scene color for
        // transmission.
        ctx.set_render_targets(&[output], Some(buffers.depth.view()));
        if let Some(accumulation) = distortion {
            ctx.bind_texture(1, accumulation.view());
        }
        ctx.bind_program(forward);
        list.execute_draw_calls(ctx, DrawListType::Forward, Some(input));
        ctx.reset_render_targets();
        ctx.reset_textures();

        if let Some(accumulation) = distortion {
            pool.release(accumulation);
        }
        Ok(())
    }
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &'static str {
        "Forward"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.forward_program = Some(create_program(device, self.name(), "forward/translucency")?);
        self.distortion_program =
            Some(create_program(device, self.name(), "forward/distortion")?);
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.forward_program
            .is_some_and(|p| device.is_program_ready(p))
    }

    fn dispose(&mut self) {
        self.forward_program = None;
        self.distortion_program = None;
    }
}
