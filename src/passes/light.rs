//! Lighting Accumulation
//!
//! Accumulates every light snapshot into the HDR light buffer, reading the
//! geometry buffer. Zero lights is a legal no-op: the buffer keeps the
//! background color cleared by the GBuffer stage.

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::list::RenderList;
use crate::view::{RenderView, ViewFlags};

use super::{create_program, RenderPass};

pub struct LightPass {
    directional_program: Option<ProgramHandle>,
    local_program: Option<ProgramHandle>,
    sky_program: Option<ProgramHandle>,
}

impl LightPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            directional_program: None,
            local_program: None,
            sky_program: None,
        }
    }

    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        list: &RenderList,
        view: &RenderView,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
        shadow_atlas: Option<TextureView>,
    ) {
        let no_lights = list.directional_lights.is_empty()
            && list.point_lights.is_empty()
            && list.spot_lights.is_empty()
            && list.sky_lights.is_empty();
        if no_lights {
            return;
        }
        let (Some(directional), Some(local), Some(sky)) = (
            self.directional_program,
            self.local_program,
            self.sky_program,
        ) else {
            return;
        };

        ctx.set_render_targets(&[light_buffer], None);
        for (slot, input) in buffers.gbuffer_views().into_iter().enumerate() {
            ctx.bind_texture(slot as u32, input);
        }
        let use_shadows = view.flags.contains(ViewFlags::SHADOWS);
        if use_shadows {
            if let Some(atlas) = shadow_atlas {
                ctx.bind_texture(5, atlas);
            }
        }
        ctx.bind_texture(6, buffers.ambient_occlusion.view());

        // Fullscreen accumulation per directional light, light volumes for
        // the local ones.
        ctx.bind_program(directional);
        for _ in &list.directional_lights {
            ctx.draw_fullscreen();
        }

        ctx.bind_program(local);
        let local_count = list.point_lights.len() + list.spot_lights.len();
        if local_count > 0 {
            ctx.draw_instanced(local_count as u32);
        }

        ctx.bind_program(sky);
        for _ in &list.sky_lights {
            ctx.draw_fullscreen();
        }

        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for LightPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for LightPass {
    fn name(&self) -> &'static str {
        "Light"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.directional_program =
            Some(create_program(device, self.name(), "light/directional")?);
        self.local_program = Some(create_program(device, self.name(), "light/local")?);
        self.sky_program = Some(create_program(device, self.name(), "light/sky")?);
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        [self.directional_program, self.local_program, self.sky_program]
            .iter()
            .all(|p| p.is_some_and(|p| device.is_program_ready(p)))
    }

    fn dispose(&mut self) {
        self.directional_program = None;
        self.local_program = None;
        self.sky_program = None;
    }
}
