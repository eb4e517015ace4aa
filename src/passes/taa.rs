//! Temporal Anti-Aliasing
//!
//! Resolves the current frame against an exponential history buffer using
//! the motion vectors for reprojection. The history is a persistent
//! texture owned by the pass and recreated on resolution changes; a camera
//! cut drops it so stale history never ghosts across teleports.

use crate::buffers::{PingPong, RenderBuffers};
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureHandle};
use crate::settings::{AntialiasingMode, PostProcessSettings};
use crate::view::{RenderView, ViewFlags};

use super::{create_program, RenderPass};

pub struct TemporalAntiAliasingPass {
    resolve_program: Option<ProgramHandle>,
    history: Option<TextureHandle>,
    history_size: (u32, u32),
    history_valid: bool,
}

impl TemporalAntiAliasingPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolve_program: None,
            history: None,
            history_size: (0, 0),
            history_valid: false,
        }
    }

    /// TAA requires motion vectors whenever it is the active AA mode.
    #[must_use]
    pub fn needs_motion_vectors(view: &RenderView, settings: &PostProcessSettings) -> bool {
        view.flags.contains(ViewFlags::ANTI_ALIASING)
            && settings.anti_aliasing == AntialiasingMode::TemporalAntialiasing
            && !view.is_orthographic
    }

    /// Resolves `front` + history into `back` and refreshes the history.
    /// The caller swaps the ping-pong afterwards.
    pub fn render(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        view: &mut RenderView,
        buffers: &RenderBuffers,
        ping_pong: &PingPong,
        camera_cut: bool,
    ) -> Result<()> {
        let Some(program) = self.resolve_program else {
            return Ok(());
        };

        let size = view.screen_size;
        if self.history_size != size {
            if let Some(old) = self.history.take() {
                device.destroy_texture(old);
            }
            let desc = TextureDesc::render_target(size.0, size.1, RenderBuffers::OUTPUT_FORMAT);
            self.history = Some(device.create_texture(&desc, "TAA History")?);
            self.history_size = size;
            self.history_valid = false;
        }
        let Some(history) = self.history else {
            return Ok(());
        };
        if camera_cut {
            self.history_valid = false;
        }

        if !self.history_valid {
            // First frame after a cut: seed history with the current frame.
            ctx.copy(history.view(), ping_pong.front);
        }

        ctx.set_render_targets(&[ping_pong.back], None);
        ctx.bind_texture(0, ping_pong.front);
        ctx.bind_texture(1, history.view());
        ctx.bind_texture(2, buffers.motion_vectors.view());
        ctx.bind_texture(3, buffers.depth.view());
        ctx.bind_program(program);
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        ctx.reset_textures();

        ctx.copy(history.view(), ping_pong.back);
        self.history_valid = true;
        view.temporal_frame_index = view.temporal_frame_index.wrapping_add(1);
        Ok(())
    }
}

impl Default for TemporalAntiAliasingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for TemporalAntiAliasingPass {
    fn name(&self) -> &'static str {
        "TemporalAntiAliasing"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.resolve_program = Some(create_program(device, self.name(), "taa/resolve")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.resolve_program = None;
        self.history = None;
        self.history_size = (0, 0);
        self.history_valid = false;
    }
}
