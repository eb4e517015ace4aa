//! Atmospheric Fog
//!
//! Analytic exponential-height fog applied fullscreen over the light
//! buffer. Runs only when the frame registered fog parameters; the
//! volumetric froxel stage (when enabled) has already run and its
//! scattering volume is folded in here.

use bytemuck::{Pod, Zeroable};

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::list::RenderList;

use super::{create_program, RenderPass};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FogUniforms {
    color: [f32; 3],
    density: f32,
    height_falloff: f32,
    start_distance: f32,
    _pad: [f32; 2],
}

pub struct FogPass {
    program: Option<ProgramHandle>,
}

impl FogPass {
    #[must_use]
    pub fn new() -> Self {
        Self { program: None }
    }

    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        list: &RenderList,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
    ) {
        let Some(program) = self.program else {
            return;
        };
        let Some(fog) = list.fog else {
            return;
        };

        ctx.set_render_targets(&[light_buffer], None);
        ctx.bind_texture(0, buffers.depth.view());
        ctx.bind_program(program);
        ctx.set_uniforms(bytemuck::bytes_of(&FogUniforms {
            color: fog.color.to_array(),
            density: fog.density,
            height_falloff: fog.height_falloff,
            start_distance: fog.start_distance,
            _pad: [0.0; 2],
        }));
        ctx.draw_fullscreen();
        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for FogPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for FogPass {
    fn name(&self) -> &'static str {
        "Fog"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.program = Some(create_program(device, self.name(), "fog/exponential_height")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.program = None;
    }
}
