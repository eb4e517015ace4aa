//! Motion Vectors & Motion Blur
//!
//! Two responsibilities, matching their shared data: rendering the
//! per-pixel motion vectors buffer early in the frame (camera motion
//! fullscreen + the MotionVectors stage list for moving objects), and the
//! post-process blur that consumes it. Also provides the motion-vectors
//! debug visualization used by that view mode's early exit.

use bytemuck::{Pod, Zeroable};

use crate::buffers::{PingPong, RenderBuffers};
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::list::{DrawListType, RenderList};
use crate::settings::PostProcessSettings;

use super::{create_program, draw_fullscreen, RenderPass};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurUniforms {
    scale: f32,
    sample_count: u32,
    _pad: [u32; 2],
}

pub struct MotionBlurPass {
    camera_vectors_program: Option<ProgramHandle>,
    object_vectors_program: Option<ProgramHandle>,
    blur_program: Option<ProgramHandle>,
    debug_program: Option<ProgramHandle>,
}

impl MotionBlurPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            camera_vectors_program: None,
            object_vectors_program: None,
            blur_program: None,
            debug_program: None,
        }
    }

    /// Fills the motion vectors buffer: camera reprojection fullscreen,
    /// then per-object vectors from the MotionVectors stage list.
    pub fn render_motion_vectors(
        &self,
        ctx: &mut dyn GpuContext,
        list: &mut RenderList,
        buffers: &RenderBuffers,
    ) {
        let (Some(camera), Some(object)) =
            (self.camera_vectors_program, self.object_vectors_program)
        else {
            return;
        };

        let target = buffers.motion_vectors.view();
        ctx.clear(target, [0.0; 4]);
        ctx.set_render_targets(&[target], Some(buffers.depth.view()));
        ctx.bind_program(camera);
        ctx.draw_fullscreen();

        if !list.list(DrawListType::MotionVectors).is_empty() {
            ctx.bind_program(object);
            list.execute_draw_calls(ctx, DrawListType::MotionVectors, None);
        }
        ctx.reset_render_targets();
    }

    /// Blurs `front` into `back` along the motion vectors. Returns true
    /// when output was produced (the caller then swaps the ping-pong).
    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        settings: &PostProcessSettings,
        buffers: &RenderBuffers,
        ping_pong: &PingPong,
    ) -> bool {
        let Some(program) = self.blur_program else {
            return false;
        };
        if !settings.motion_blur.enabled || settings.motion_blur.scale <= f32::EPSILON {
            return false;
        }

        ctx.set_render_targets(&[ping_pong.back], None);
        ctx.bind_texture(0, ping_pong.front);
        ctx.bind_texture(1, buffers.motion_vectors.view());
        ctx.bind_texture(2, buffers.depth.view());
        ctx.bind_program(program);
        ctx.set_uniforms(bytemuck::bytes_of(&BlurUniforms {
            scale: settings.motion_blur.scale,
            sample_count: settings.motion_blur.sample_count,
            _pad: [0; 2],
        }));
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        true
    }

    /// Writes the motion-vectors visualization over `scene` into `output`.
    pub fn render_debug(
        &self,
        ctx: &mut dyn GpuContext,
        buffers: &RenderBuffers,
        scene: TextureView,
        output: TextureView,
    ) {
        let Some(program) = self.debug_program else {
            return;
        };
        draw_fullscreen(
            ctx,
            program,
            &[scene, buffers.motion_vectors.view()],
            output,
        );
        ctx.reset_render_targets();
    }
}

impl Default for MotionBlurPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for MotionBlurPass {
    fn name(&self) -> &'static str {
        "MotionBlur"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.camera_vectors_program =
            Some(create_program(device, self.name(), "motion/camera_vectors")?);
        self.object_vectors_program =
            Some(create_program(device, self.name(), "motion/object_vectors")?);
        self.blur_program = Some(create_program(device, self.name(), "motion/blur")?);
        self.debug_program = Some(create_program(device, self.name(), "motion/debug")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.camera_vectors_program = None;
        self.object_vectors_program = None;
        self.blur_program = None;
        self.debug_program = None;
    }
}
