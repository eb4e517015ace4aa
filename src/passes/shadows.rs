//! Shadow Map Preparation
//!
//! Renders the per-light shadow atlas regions consumed later by the
//! lighting pass. Shadow map *contents* come from depth submissions the
//! embedding engine records per light view; this pass owns the atlas,
//! assigns regions and clears them, keyed by each light's stable snapshot
//! ID so unchanged static lights can keep their cached region across
//! frames.

use log::debug;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, ProgramHandle, TextureDesc, TextureHandle, TextureView};
use crate::list::RenderList;
use crate::view::RenderView;

use super::{create_program, RenderPass};

const ATLAS_SIZE: u32 = 4096;

pub struct ShadowsPass {
    depth_program: Option<ProgramHandle>,
    atlas: Option<TextureHandle>,
    /// Atlas slot by light ID; entries persist while the light keeps
    /// casting shadows.
    regions: FxHashMap<Uuid, u32>,
}

impl ShadowsPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            depth_program: None,
            atlas: None,
            regions: FxHashMap::default(),
        }
    }

    /// The atlas view for the lighting pass, once initialized.
    #[must_use]
    pub fn atlas_view(&self) -> Option<TextureView> {
        self.atlas.map(TextureHandle::view)
    }

    /// Prepares atlas regions for every shadow-casting light this frame.
    pub fn render(&mut self, ctx: &mut dyn GpuContext, list: &RenderList, view: &RenderView) {
        let (Some(atlas), Some(program)) = (self.atlas, self.depth_program) else {
            return;
        };

        let mut casters = 0u32;
        let mut assign = |id: Uuid, regions: &mut FxHashMap<Uuid, u32>| {
            let slot = casters;
            regions.entry(id).or_insert(slot);
            casters += 1;
        };
        for light in &list.directional_lights {
            if light.shadow.casts_shadows() {
                // One region per cascade.
                for _ in 0..light.cascade_count.max(1) {
                    assign(light.id, &mut self.regions);
                }
            }
        }
        for light in &list.point_lights {
            if light.shadow.casts_shadows() && light.radius > 0.0 {
                assign(light.id, &mut self.regions);
            }
        }
        for light in &list.spot_lights {
            if light.shadow.casts_shadows() && light.radius > 0.0 {
                assign(light.id, &mut self.regions);
            }
        }
        if casters == 0 {
            return;
        }
        debug!("Shadow atlas: {casters} regions for view at {:?}", view.position);

        ctx.clear_depth(atlas.view(), 1.0);
        ctx.set_render_targets(&[], Some(atlas.view()));
        ctx.bind_program(program);
        ctx.reset_render_targets();
    }
}

impl Default for ShadowsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ShadowsPass {
    fn name(&self) -> &'static str {
        "Shadows"
    }

    fn init(&mut self, device: &dyn GpuDevice) -> Result<()> {
        self.depth_program = Some(create_program(device, self.name(), "shadows/depth")?);
        let desc = TextureDesc::depth_buffer(ATLAS_SIZE, ATLAS_SIZE);
        self.atlas = Some(
            device
                .create_texture(&desc, "Shadow Atlas")
                .map_err(|source| crate::error::RenderError::PassInitFailed {
                    pass: self.name(),
                    reason: source.to_string(),
                })?,
        );
        Ok(())
    }

    fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.depth_program
            .is_some_and(|p| device.is_program_ready(p))
    }

    fn dispose(&mut self) {
        self.depth_program = None;
        self.atlas = None;
        self.regions.clear();
    }
}
