//! Rendering Passes
//!
//! Every pipeline stage is a self-contained pass sharing one lifecycle
//! capability set: [`RenderPass`]. The orchestrator owns all passes as
//! concrete fields (a fixed-order registered table, no dynamic
//! subclassing) and drives init/is_ready/dispose through the trait, while
//! calling each pass's own render entry points directly.
//!
//! Lifecycle rules:
//! - `init` failure on any pass is fatal for the whole pipeline; partial
//!   initialization is not a supported state.
//! - `is_ready` aggregates async precomputation (shader compilation, lookup
//!   tables) and never blocks; callers poll before trusting frame output.
//! - Per-frame unreadiness degrades to skipped contributions, never a
//!   failed frame.

pub mod ambient_occlusion;
pub mod color_grading;
pub mod dof;
pub mod eye_adaptation;
pub mod fog;
pub mod forward;
pub mod fxaa;
pub mod gbuffer;
pub mod gi;
pub mod global_sdf;
pub mod histogram;
pub mod light;
pub mod motion_blur;
pub mod post_processing;
pub mod reflections;
pub mod shadows;
pub mod smaa;
pub mod ssr;
pub mod taa;
pub mod upscale;
pub mod volumetric_fog;

use crate::error::{RenderError, Result};
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};

/// Shared lifecycle of a rendering pass.
pub trait RenderPass {
    /// Pass name, used for debug groups and error reporting.
    fn name(&self) -> &'static str;

    /// Creates the pass's GPU programs and persistent resources.
    fn init(&mut self, device: &dyn GpuDevice) -> Result<()>;

    /// True once all async precomputation finished.
    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        let _ = device;
        true
    }

    /// Releases the pass's resources.
    fn dispose(&mut self);
}

/// Creates a program, mapping failure to the fatal pass-init error.
pub(crate) fn create_program(
    device: &dyn GpuDevice,
    pass: &'static str,
    name: &'static str,
) -> Result<ProgramHandle> {
    device
        .create_program(name)
        .map_err(|source| RenderError::PassInitFailed {
            pass,
            reason: source.to_string(),
        })
}

/// Records a fullscreen-triangle pass: bind inputs, bind program, draw into
/// `output`.
pub(crate) fn draw_fullscreen(
    ctx: &mut dyn GpuContext,
    program: ProgramHandle,
    inputs: &[TextureView],
    output: TextureView,
) {
    ctx.set_render_targets(&[output], None);
    for (slot, view) in inputs.iter().enumerate() {
        ctx.bind_texture(slot as u32, *view);
    }
    ctx.bind_program(program);
    ctx.draw_fullscreen();
}
