//! Frame Aggregate
//!
//! [`RenderList`] is the per-frame render list: it owns the master draw-call
//! array, the per-stage index lists, the light snapshots, post-effect
//! registrations and the blended settings. Its lifetime is exactly one
//! frame: acquired from the pool at frame start, populated by traversal,
//! consumed by sort and execution, cleared and returned at frame end.
//!
//! Clearing resets counts but keeps every backing allocation, so a warm
//! renderer reaches a zero-allocation steady state.

use glam::Vec3;
use log::warn;

use crate::gpu::{DeviceLimits, GpuContext, TextureView};
use crate::sort::BatchPolicy;
use crate::list::draw_call::{
    BatchedDrawCall, DrawCall, DrawCallsList, DrawListType, InstanceData,
};
use crate::list::lights::{
    DirectionalLightSnapshot, FogParams, PointLightSnapshot, SkyLightSnapshot, SpotLightSnapshot,
};
use crate::settings::PostProcessSettings;
use crate::view::{DrawPass, RenderView, StaticFlags};

/// One post-effect volume's contribution to the frame's blended settings.
///
/// `provider` is an index into the scene collaborator's provider table; the
/// frame aggregate never stores references into the scene.
#[derive(Clone, Copy, Debug)]
pub struct BlendableSettings {
    pub provider: usize,
    /// Blend weight in 0..1 (distance-based falloff inside the volume).
    pub weight: f32,
    pub priority: i32,
    /// Squared size of the contributing volume; smaller volumes are "more
    /// local" and win priority ties.
    pub volume_size_sqr: f32,
}

/// Rendering cache container for draw-call collecting, sorting and
/// executing.
#[derive(Default)]
pub struct RenderList {
    /// Master draw-call array for all passes.
    pub draw_calls: Vec<DrawCall>,
    /// Draw calls with producer-assembled instance streams.
    pub batched_draw_calls: Vec<BatchedDrawCall>,
    /// One list per rendering stage.
    lists: [DrawCallsList; DrawListType::COUNT],

    pub directional_lights: Vec<DirectionalLightSnapshot>,
    pub point_lights: Vec<PointLightSnapshot>,
    pub spot_lights: Vec<SpotLightSnapshot>,
    pub sky_lights: Vec<SkyLightSnapshot>,

    /// Fog registration; at most one per frame.
    pub fog: Option<FogParams>,

    /// Per-frame post-effect registrations as indices into the task's
    /// effect table.
    pub post_fx: Vec<usize>,
    /// Blendable volume contributions gathered during collection.
    pub blendable: Vec<BlendableSettings>,
    /// The blended per-frame settings, produced by
    /// [`blend_settings`](Self::blend_settings).
    pub settings: PostProcessSettings,

    /// Camera frustum corners in world space.
    pub frustum_corners_ws: [Vec3; 8],
    /// Camera frustum corners in view space.
    pub frustum_corners_vs: [Vec3; 8],

    /// Reused instance stream for merged batch submission.
    instance_scratch: Vec<InstanceData>,
}

impl RenderList {
    /// Initializes per-frame view-derived data. Call after
    /// `RenderView::prepare` and before collection.
    pub fn init(&mut self, view: &RenderView) {
        self.frustum_corners_ws = view.frustum_corners_world();
        self.frustum_corners_vs = view.frustum_corners_view();
    }

    /// Stage list accessor.
    #[must_use]
    #[inline]
    pub fn list(&self, list_type: DrawListType) -> &DrawCallsList {
        &self.lists[list_type.index()]
    }

    /// Mutable stage list accessor.
    #[inline]
    pub fn list_mut(&mut self, list_type: DrawListType) -> &mut DrawCallsList {
        &mut self.lists[list_type.index()]
    }

    /// Sorts one stage list and rebuilds its batches; `reverse_distance`
    /// selects back-to-front ordering for translucency. See
    /// [`crate::sort::sort_draw_calls`].
    pub fn sort_draw_calls(
        &mut self,
        view: &RenderView,
        reverse_distance: bool,
        list_type: DrawListType,
        policy: &dyn BatchPolicy,
        limits: &DeviceLimits,
    ) {
        crate::sort::sort_draw_calls(
            view,
            reverse_distance,
            &mut self.lists[list_type.index()],
            &self.draw_calls,
            policy,
            limits,
        );
    }

    /// Resets every count to zero; backing capacity is retained.
    pub fn clear(&mut self) {
        self.draw_calls.clear();
        self.batched_draw_calls.clear();
        for list in &mut self.lists {
            list.clear();
        }
        self.directional_lights.clear();
        self.point_lights.clear();
        self.spot_lights.clear();
        self.sky_lights.clear();
        self.fog = None;
        self.post_fx.clear();
        self.blendable.clear();
        self.settings = PostProcessSettings::default();
        self.frustum_corners_ws = [Vec3::ZERO; 8];
        self.frustum_corners_vs = [Vec3::ZERO; 8];
        self.instance_scratch.clear();
    }

    /// True when nothing was collected this frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draw_calls.is_empty() && self.batched_draw_calls.is_empty()
    }

    // ── Collection ─────────────────────────────────────────────────────────

    /// Adds a draw call to every stage list whose bit intersects
    /// `pass_mask`. The GBuffer stage is split by `receives_decals`.
    ///
    /// No deduplication happens; the same object may legitimately appear in
    /// several stage lists. Callers on multiple threads must merge into one
    /// list before sorting starts.
    pub fn add_draw_call(
        &mut self,
        pass_mask: DrawPass,
        static_flags: StaticFlags,
        mut draw_call: DrawCall,
        receives_decals: bool,
    ) {
        draw_call.static_flags = static_flags;
        let index = self.draw_calls.len() as u32;
        self.draw_calls.push(draw_call);
        for list_type in Self::route_stages(pass_mask, receives_decals) {
            self.lists[list_type.index()].indices.push(index);
        }
    }

    /// Adds a pre-batched draw call; it bypasses sorting and is submitted
    /// verbatim after the stage's sorted batches.
    pub fn add_batched_draw_call(
        &mut self,
        pass_mask: DrawPass,
        static_flags: StaticFlags,
        mut batched: BatchedDrawCall,
        receives_decals: bool,
    ) {
        batched.draw_call.static_flags = static_flags;
        let index = self.batched_draw_calls.len() as u32;
        self.batched_draw_calls.push(batched);
        for list_type in Self::route_stages(pass_mask, receives_decals) {
            self.lists[list_type.index()].pre_batched.push(index);
        }
    }

    fn route_stages(
        pass_mask: DrawPass,
        receives_decals: bool,
    ) -> impl Iterator<Item = DrawListType> {
        let mut stages = [None; 5];
        if pass_mask.contains(DrawPass::DEPTH) {
            stages[0] = Some(DrawListType::Depth);
        }
        if pass_mask.contains(DrawPass::GBUFFER) {
            stages[1] = Some(if receives_decals {
                DrawListType::GBuffer
            } else {
                DrawListType::GBufferNoDecals
            });
        }
        if pass_mask.contains(DrawPass::FORWARD) {
            stages[2] = Some(DrawListType::Forward);
        }
        if pass_mask.contains(DrawPass::DISTORTION) {
            stages[3] = Some(DrawListType::Distortion);
        }
        if pass_mask.contains(DrawPass::MOTION_VECTORS) {
            stages[4] = Some(DrawListType::MotionVectors);
        }
        stages.into_iter().flatten()
    }

    // ── Blendable settings ─────────────────────────────────────────────────

    /// Registers one post-effect volume contribution.
    pub fn add_settings_blend(
        &mut self,
        provider: usize,
        weight: f32,
        priority: i32,
        volume_size_sqr: f32,
    ) {
        self.blendable.push(BlendableSettings {
            provider,
            weight,
            priority,
            volume_size_sqr,
        });
    }

    /// Blends the gathered volume contributions over `base` into
    /// [`settings`](Self::settings).
    ///
    /// Contributions apply in ascending priority so the highest priority
    /// lands last; priority ties apply larger volumes first, letting the
    /// smallest enclosing volume win.
    pub fn blend_settings(
        &mut self,
        base: &PostProcessSettings,
        mut blend: impl FnMut(usize, &mut PostProcessSettings, f32),
    ) {
        self.settings = *base;
        self.blendable.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| {
                b.volume_size_sqr.total_cmp(&a.volume_size_sqr)
            })
        });
        for blendable in &self.blendable {
            if blendable.weight > f32::EPSILON {
                blend(blendable.provider, &mut self.settings, blendable.weight);
            }
        }
    }

    // ── Execution ──────────────────────────────────────────────────────────

    /// Submits a stage's batches (and pre-batched calls) to the context.
    ///
    /// Within a batch all draw calls share identical GPU state; submission
    /// order equals sorted order. An empty stage is a legal no-op. Draw
    /// calls whose material or geometry is not resident are skipped with a
    /// warning, never a frame failure.
    pub fn execute_draw_calls(
        &mut self,
        ctx: &mut dyn GpuContext,
        list_type: DrawListType,
        input: Option<TextureView>,
    ) {
        let Self {
            lists,
            draw_calls,
            batched_draw_calls,
            instance_scratch,
            ..
        } = self;
        let list = &lists[list_type.index()];
        if list.is_empty() {
            return;
        }

        if let Some(input) = input {
            ctx.bind_texture(0, input);
        }

        for batch in &list.batches {
            let first = &draw_calls[list.indices[batch.start as usize] as usize];
            if !ctx.bind_material(first.material) {
                warn!(
                    "Skipping {} batch: material {:?} not resident",
                    list_type.name(),
                    first.material
                );
                continue;
            }
            if !ctx.bind_geometry(first.geometry) {
                warn!(
                    "Skipping {} batch: geometry {:?} not resident",
                    list_type.name(),
                    first.geometry
                );
                continue;
            }

            let range = batch.start as usize..(batch.start + batch.len) as usize;
            if list.can_use_instancing && batch.len > 1 {
                instance_scratch.clear();
                for &index in &list.indices[range] {
                    let call = &draw_calls[index as usize];
                    for _ in 0..call.instance_count {
                        instance_scratch.push(InstanceData::from_draw_call(call));
                    }
                }
                ctx.draw_instances(instance_scratch);
            } else {
                for &index in &list.indices[range] {
                    ctx.draw_instanced(draw_calls[index as usize].instance_count);
                }
            }
        }

        for &index in &list.pre_batched {
            let batched = &batched_draw_calls[index as usize];
            if !ctx.bind_material(batched.draw_call.material) {
                warn!(
                    "Skipping pre-batched call: material {:?} not resident",
                    batched.draw_call.material
                );
                continue;
            }
            if !ctx.bind_geometry(batched.draw_call.geometry) {
                warn!(
                    "Skipping pre-batched call: geometry {:?} not resident",
                    batched.draw_call.geometry
                );
                continue;
            }
            if batched.instances.is_empty() {
                ctx.draw_instanced(batched.draw_call.instance_count);
            } else {
                ctx.draw_instances(&batched.instances);
            }
        }
    }
}
