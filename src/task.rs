//! Render Tasks and External Collaborators
//!
//! [`RenderTask`] is the unit of work handed to `Renderer::render`: the
//! output target, the view describing how to render, the base settings and
//! the registered post effects. [`SceneSource`] is the traversal
//! collaborator contract, and [`PostFxEffect`] the post-effect contract.

use crate::buffers::RenderBuffers;
use crate::error::{RenderError, Result};
use crate::gpu::{GpuContext, GpuDevice, TextureView, Viewport};
use crate::list::RenderList;
use crate::settings::PostProcessSettings;
use crate::view::RenderView;

/// Named insertion points of the frame pipeline. Registered effects run at
/// their location in registration order against the current active buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PostFxLocation {
    /// After lighting/GI, before the reflections stage.
    BeforeReflections,
    /// After reflections and fog, before the forward pass.
    BeforeForward,
    /// After the forward pass, before the built-in post-process chain.
    BeforePostProcessing,
    /// After the built-in post-process chain.
    AfterPostProcessing,
    /// After the final anti-aliasing stage.
    AfterAntiAliasing,
    /// Replaces the built-in upscale when rendering below target
    /// resolution.
    CustomUpscale,
}

/// A registered post effect: consume the current buffer, produce the next.
///
/// Effects are owned by the task and invoked in registration order. An
/// unready effect is skipped for the frame, never an error.
pub trait PostFxEffect {
    /// The insertion point this effect runs at.
    fn location(&self) -> PostFxLocation;

    /// False while async resources (shaders, LUTs) are still loading.
    fn is_ready(&self) -> bool {
        true
    }

    /// Reads `input`, writes `output`. The pipeline handles the ping-pong
    /// around the call.
    fn render(&mut self, ctx: &mut dyn GpuContext, input: TextureView, output: TextureView);
}

/// Scene/traversal collaborator. Invoked once per frame; implementations
/// call back into the [`RenderList`] collection API once per visible
/// renderable.
pub trait SceneSource {
    /// Collects draw calls and light snapshots for the view. `view.pass`
    /// carries the stage mask to collect for.
    fn collect_draw_calls(&mut self, view: &RenderView, list: &mut RenderList);

    /// Collects overlapping post-effect volumes via
    /// `RenderList::add_settings_blend`.
    fn collect_post_fx_volumes(&mut self, view: &RenderView, list: &mut RenderList) {
        let _ = (view, list);
    }

    /// Dispatches one blendable contribution to the provider registered
    /// under `provider` (see `settings::PostFxSettingsProvider`).
    fn blend_post_fx(&self, provider: usize, settings: &mut PostProcessSettings, weight: f32) {
        let _ = (provider, settings, weight);
    }
}

/// One viewport/output rendering job.
pub struct RenderTask {
    /// View state; the orchestrator mutates the pass mask and temporal
    /// counters during rendering.
    pub view: RenderView,
    /// Final output target.
    pub output: TextureView,
    /// Output size in pixels.
    pub output_size: (u32, u32),
    /// Internal resolution as a fraction of the output (1.0 = native).
    /// Values below one enable the upscale stage at the end of the frame.
    pub rendering_percentage: f32,
    /// True on teleports/cuts; temporal effects drop their history.
    pub is_camera_cut: bool,
    /// Base settings, before post-effect volume blending.
    pub settings: PostProcessSettings,
    /// Registered post effects; the frame aggregate refers to these by
    /// index.
    pub post_fx: Vec<Box<dyn PostFxEffect>>,
    /// Persistent intermediate buffers at internal resolution.
    pub buffers: RenderBuffers,
}

impl RenderTask {
    /// Creates a task rendering at native resolution into `output`.
    pub fn new(
        device: &dyn GpuDevice,
        output: TextureView,
        output_size: (u32, u32),
    ) -> Result<Self> {
        if output_size.0 == 0 || output_size.1 == 0 {
            return Err(RenderError::InvalidTask("zero-sized output".into()));
        }
        Ok(Self {
            view: RenderView::default(),
            output,
            output_size,
            rendering_percentage: 1.0,
            is_camera_cut: false,
            settings: PostProcessSettings::default(),
            post_fx: Vec::new(),
            buffers: RenderBuffers::new(device, output_size.0, output_size.1)?,
        })
    }

    /// Registers a post effect; it keeps its registration order within its
    /// location.
    pub fn add_post_fx(&mut self, effect: Box<dyn PostFxEffect>) {
        self.post_fx.push(effect);
    }

    /// Internal rendering resolution for the current frame.
    #[must_use]
    pub fn internal_size(&self) -> (u32, u32) {
        let scale = self.rendering_percentage.clamp(0.05, 1.0);
        (
            ((self.output_size.0 as f32 * scale) as u32).max(1),
            ((self.output_size.1 as f32 * scale) as u32).max(1),
        )
    }

    /// True when the frame renders at native resolution.
    #[must_use]
    pub fn is_full_resolution(&self) -> bool {
        self.rendering_percentage >= 1.0
    }

    /// Viewport covering the whole output.
    #[must_use]
    pub fn output_viewport(&self) -> Viewport {
        Viewport::sized(self.output_size.0 as f32, self.output_size.1 as f32)
    }

    /// Viewport covering the internal resolution.
    #[must_use]
    pub fn internal_viewport(&self) -> Viewport {
        let (width, height) = self.internal_size();
        Viewport::sized(width as f32, height as f32)
    }
}
