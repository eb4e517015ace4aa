//! Color Grading LUT
//!
//! Bakes the frame's grading parameters (exposure, saturation, contrast,
//! tone curve) into a lookup table consumed by the tone mapping composite.
//! The LUT is a 32^3 volume unwrapped into a 1024x32 strip, pooled per
//! frame. LUT program compilation is asynchronous; until it finishes the
//! pass reports unready and bakes a neutral table.

use bytemuck::{Pod, Zeroable};

use crate::error::Result;
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle,
};
use crate::settings::{PostProcessSettings, ToneMappingMode};
use crate::target_pool::RenderTargetPool;

use super::{create_program, draw_fullscreen, RenderPass};

const LUT_SIZE: u32 = 32;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GradingUniforms {
    exposure: f32,
    saturation: f32,
    contrast: f32,
    // 0: none, 1: neutral, 2: ACES filmic
    tone_mapping_mode: u32,
}

impl GradingUniforms {
    fn new(settings: &PostProcessSettings) -> Self {
        let grading = settings.color_grading;
        Self {
            exposure: grading.exposure,
            saturation: grading.saturation,
            contrast: grading.contrast,
            tone_mapping_mode: match grading.tone_mapping {
                ToneMappingMode::None => 0,
                ToneMappingMode::Neutral => 1,
                ToneMappingMode::AcesFilmic => 2,
            },
        }
    }
}

pub struct ColorGradingPass {
    bake_program: Option<ProgramHandle>,
}

impl ColorGradingPass {
    #[must_use]
    pub fn new() -> Self {
        Self { bake_program: None }
    }

    /// Bakes the LUT for this frame's settings into a pooled texture. The
    /// caller releases it after the composite.
    pub fn render_lut(
        &self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        pool: &mut RenderTargetPool,
        settings: &PostProcessSettings,
    ) -> Result<Option<TextureHandle>> {
        let Some(program) = self.bake_program else {
            return Ok(None);
        };
        let desc = TextureDesc::render_target(
            LUT_SIZE * LUT_SIZE,
            LUT_SIZE,
            TextureFormat::Rgba8Unorm,
        );
        let lut = pool.get(device, &desc, "Color Grading LUT")?;

        if device.is_program_ready(program) {
            let uniforms = GradingUniforms::new(settings);
            ctx.set_uniforms(bytemuck::bytes_of(&uniforms));
            draw_fullscreen(ctx, program, &[], lut.view());
            ctx.reset_render_targets();
        } else {
            // Not ready yet: neutral gray keeps the composite stable for
            // this frame.
            ctx.clear(lut.view(), [0.5, 0.5, 0.5, 1.0]);
        }
        Ok(Some(lut))
    }
}

impl Default for ColorGradingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ColorGradingPass {
    fn name(&self) -> &'static str {
        "ColorGrading"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.bake_program = Some(create_program(device, self.name(), "color_grading/bake")?);
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.bake_program.is_some_and(|p| device.is_program_ready(p))
    }

    fn dispose(&mut self) {
        self.bake_program = None;
    }
}
