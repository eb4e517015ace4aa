//! Eye Adaptation
//!
//! Applies automatic exposure to the scene color in place, driven by the
//! luminance histogram. Adaptation speed is time-based; the smoothed
//! exposure lives in a tiny persistent texture so it survives across
//! frames.

use crate::error::{RenderError, Result};
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureView,
};
use crate::settings::PostProcessSettings;

use super::{create_program, RenderPass};

pub struct EyeAdaptationPass {
    adapt_program: Option<ProgramHandle>,
    apply_program: Option<ProgramHandle>,
    /// 1x1 smoothed exposure state.
    exposure_state: Option<TextureHandle>,
}

impl EyeAdaptationPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapt_program: None,
            apply_program: None,
            exposure_state: None,
        }
    }

    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        settings: &PostProcessSettings,
        histogram: TextureView,
        target: TextureView,
    ) {
        let (Some(adapt), Some(apply), Some(state)) =
            (self.adapt_program, self.apply_program, self.exposure_state)
        else {
            return;
        };
        if !settings.eye_adaptation.enabled {
            return;
        }

        // Advance the smoothed exposure from the histogram.
        ctx.set_render_targets(&[state.view()], None);
        ctx.bind_texture(0, histogram);
        ctx.bind_program(adapt);
        ctx.draw_fullscreen();

        // Apply exposure onto the scene color in place.
        ctx.set_render_targets(&[target], None);
        ctx.bind_texture(0, state.view());
        ctx.bind_program(apply);
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for EyeAdaptationPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for EyeAdaptationPass {
    fn name(&self) -> &'static str {
        "EyeAdaptation"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.adapt_program = Some(create_program(device, self.name(), "eye_adaptation/adapt")?);
        self.apply_program = Some(create_program(device, self.name(), "eye_adaptation/apply")?);
        let desc = TextureDesc::render_target(1, 1, TextureFormat::Rgba16Float);
        self.exposure_state = Some(device.create_texture(&desc, "Exposure State").map_err(
            |source| RenderError::PassInitFailed {
                pass: self.name(),
                reason: source.to_string(),
            },
        )?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.adapt_program = None;
        self.apply_program = None;
        self.exposure_state = None;
    }
}
