//! Volumetric Fog
//!
//! Froxel-grid scattering: light injection into a persistent 3D-sliced
//! volume (stored as a 2D slice atlas), then front-to-back integration.
//! Runs before the analytic fog draw, which samples the integrated volume.

use crate::error::{RenderError, Result};
use crate::gpu::{
    GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureFormat, TextureHandle, TextureView,
};
use crate::list::RenderList;

use super::{create_program, RenderPass};

// 160x88 froxels x 64 depth slices, laid out as an 8x8 slice atlas.
const VOLUME_WIDTH: u32 = 160 * 8;
const VOLUME_HEIGHT: u32 = 88 * 8;

pub struct VolumetricFogPass {
    inject_program: Option<ProgramHandle>,
    integrate_program: Option<ProgramHandle>,
    volume: Option<TextureHandle>,
}

impl VolumetricFogPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inject_program: None,
            integrate_program: None,
            volume: None,
        }
    }

    /// The integrated scattering volume for the fog draw.
    #[must_use]
    pub fn volume_view(&self) -> Option<TextureView> {
        self.volume.map(TextureHandle::view)
    }

    pub fn render(&self, ctx: &mut dyn GpuContext, list: &RenderList) {
        let (Some(inject), Some(integrate), Some(volume)) =
            (self.inject_program, self.integrate_program, self.volume)
        else {
            return;
        };
        let volumetric = list.fog.is_some_and(|fog| fog.volumetric);
        if !volumetric {
            return;
        }

        // Inject per-light scattering, then integrate along depth.
        ctx.set_render_targets(&[volume.view()], None);
        ctx.bind_program(inject);
        let scattering_lights = list
            .point_lights
            .iter()
            .filter(|l| l.volumetric_scattering_intensity > 0.0)
            .count()
            + list
                .spot_lights
                .iter()
                .filter(|l| l.volumetric_scattering_intensity > 0.0)
                .count()
            + list.directional_lights.len();
        ctx.draw_instanced(scattering_lights.max(1) as u32);
        ctx.bind_program(integrate);
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
    }
}

impl Default for VolumetricFogPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for VolumetricFogPass {
    fn name(&self) -> &'static str {
        "VolumetricFog"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.inject_program = Some(create_program(device, self.name(), "fog/volumetric_inject")?);
        self.integrate_program =
            Some(create_program(device, self.name(), "fog/volumetric_integrate")?);
        let desc =
            TextureDesc::render_target(VOLUME_WIDTH, VOLUME_HEIGHT, TextureFormat::Rgba16Float);
        self.volume = Some(device.create_texture(&desc, "Volumetric Fog Volume").map_err(
            |source| RenderError::PassInitFailed {
                pass: self.name(),
                reason: source.to_string(),
            },
        )?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.inject_program = None;
        self.integrate_program = None;
        self.volume = None;
    }
}
