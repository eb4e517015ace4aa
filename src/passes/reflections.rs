//! Reflections Combine
//!
//! Applies reflection sources onto the light buffer: the sky light as the
//! environment fallback and, when available, the screen-space reflections
//! result layered on top.

use crate::buffers::RenderBuffers;
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureView};
use crate::list::RenderList;

use super::{create_program, RenderPass};

pub struct ReflectionsPass {
    environment_program: Option<ProgramHandle>,
    combine_program: Option<ProgramHandle>,
}

impl ReflectionsPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            environment_program: None,
            combine_program: None,
        }
    }

    pub fn render(
        &self,
        ctx: &mut dyn GpuContext,
        list: &RenderList,
        buffers: &RenderBuffers,
        light_buffer: TextureView,
        ssr: Option<TextureView>,
    ) {
        let (Some(environment), Some(combine)) = (self.environment_program, self.combine_program)
        else {
            return;
        };
        // Nothing reflects into an environment-less frame.
        if list.sky_lights.is_empty() && ssr.is_none() {
            return;
        }

        ctx.set_render_targets(&[light_buffer], None);
        for (slot, input) in buffers.gbuffer_views().into_iter().enumerate() {
            ctx.bind_texture(slot as u32, input);
        }

        if !list.sky_lights.is_empty() {
            ctx.bind_program(environment);
            ctx.draw_fullscreen();
        }
        if let Some(ssr) = ssr {
            ctx.bind_texture(5, ssr);
            ctx.bind_program(combine);
            ctx.draw_fullscreen();
        }
        ctx.reset_render_targets();
        ctx.reset_textures();
    }
}

impl Default for ReflectionsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ReflectionsPass {
    fn name(&self) -> &'static str {
        "Reflections"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.environment_program =
            Some(create_program(device, self.name(), "reflections/environment")?);
        self.combine_program = Some(create_program(device, self.name(), "reflections/combine")?);
        Ok(())
    }

    fn dispose(&mut self) {
        self.environment_program = None;
        self.combine_program = None;
    }
}
