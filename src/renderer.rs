//! Frame Pipeline Orchestrator
//!
//! [`Renderer`] owns every rendering pass (a fixed-order registered table),
//! the frame-aggregate pool and the render-target pool, and drives the
//! canonical stage sequence for each [`RenderTask`]:
//!
//! shadow/global-distance-field preparation, opaque geometry-buffer fill,
//! ambient occlusion, lighting accumulation, optional global illumination,
//! optional reflections, fog, forward/translucency, the post-process chain
//! (temporal AA, depth of field, motion blur, color grading, eye
//! adaptation, tone mapping), final anti-aliasing or upscale.
//!
//! Stages are unconditional, gated by a view flag, or early-exit branches
//! writing a debug visualization straight to the output. Every early exit
//! releases the pooled resources acquired earlier in the frame; a leak
//! here is a correctness defect, and the tests assert pool balance.
//!
//! Intermediate color threads through two named ping-pong slots exchanged
//! by value after each stage producing new color data, so no stage ever
//! reads and writes one resource and no redundant copies are introduced.

use log::{debug, error};

use crate::buffers::{PingPong, RenderBuffers};
use crate::error::Result;
use crate::gpu::{GpuContext, GpuDevice, MaterialHandle, TextureDesc, TextureView};
use crate::list::{DrawListType, RenderList, RenderListPool};
use crate::passes::ambient_occlusion::AmbientOcclusionPass;
use crate::passes::color_grading::ColorGradingPass;
use crate::passes::dof::DepthOfFieldPass;
use crate::passes::eye_adaptation::EyeAdaptationPass;
use crate::passes::fog::FogPass;
use crate::passes::forward::ForwardPass;
use crate::passes::fxaa::FxaaPass;
use crate::passes::gbuffer::GBufferPass;
use crate::passes::gi::GlobalIlluminationPass;
use crate::passes::global_sdf::GlobalDistanceFieldPass;
use crate::passes::histogram::HistogramPass;
use crate::passes::light::LightPass;
use crate::passes::motion_blur::MotionBlurPass;
use crate::passes::post_processing::PostProcessingPass;
use crate::passes::reflections::ReflectionsPass;
use crate::passes::shadows::ShadowsPass;
use crate::passes::smaa::SmaaPass;
use crate::passes::ssr::ScreenSpaceReflectionsPass;
use crate::passes::taa::TemporalAntiAliasingPass;
use crate::passes::upscale::UpscalePass;
use crate::passes::volumetric_fog::VolumetricFogPass;
use crate::passes::RenderPass;
use crate::settings::{AntialiasingMode, GlobalIlluminationMode, PostProcessSettings};
use crate::sort::SurfacePolicy;
use crate::target_pool::RenderTargetPool;
use crate::task::{PostFxLocation, RenderTask, SceneSource};
use crate::view::{DrawPass, RenderView, ViewFlags, ViewMode};

/// Free-set entries older than this many frames get destroyed.
const POOL_TRIM_FRAMES: u32 = 240;

/// The frame rendering orchestrator.
pub struct Renderer {
    global_sdf: GlobalDistanceFieldPass,
    shadows: ShadowsPass,
    gbuffer: GBufferPass,
    ambient_occlusion: AmbientOcclusionPass,
    light: LightPass,
    gi: GlobalIlluminationPass,
    ssr: ScreenSpaceReflectionsPass,
    reflections: ReflectionsPass,
    volumetric_fog: VolumetricFogPass,
    fog: FogPass,
    forward: ForwardPass,
    motion_blur: MotionBlurPass,
    taa: TemporalAntiAliasingPass,
    dof: DepthOfFieldPass,
    histogram: HistogramPass,
    eye_adaptation: EyeAdaptationPass,
    color_grading: ColorGradingPass,
    post_processing: PostProcessingPass,
    fxaa: FxaaPass,
    smaa: SmaaPass,
    upscale: UpscalePass,

    batch_policy: SurfacePolicy,
    list_pool: RenderListPool,
    rt_pool: RenderTargetPool,
}

impl Renderer {
    /// Builds the pipeline and initializes every pass.
    ///
    /// Initialization failure of any pass is fatal: the error is returned
    /// and no partially initialized renderer exists.
    pub fn new(device: &dyn GpuDevice) -> Result<Self> {
        let mut renderer = Self {
            global_sdf: GlobalDistanceFieldPass::new(),
            shadows: ShadowsPass::new(),
            gbuffer: GBufferPass::new(),
            ambient_occlusion: AmbientOcclusionPass::new(),
            light: LightPass::new(),
            gi: GlobalIlluminationPass::new(),
            ssr: ScreenSpaceReflectionsPass::new(),
            reflections: ReflectionsPass::new(),
            volumetric_fog: VolumetricFogPass::new(),
            fog: FogPass::new(),
            forward: ForwardPass::new(),
            motion_blur: MotionBlurPass::new(),
            taa: TemporalAntiAliasingPass::new(),
            dof: DepthOfFieldPass::new(),
            histogram: HistogramPass::new(),
            eye_adaptation: EyeAdaptationPass::new(),
            color_grading: ColorGradingPass::new(),
            post_processing: PostProcessingPass::new(),
            fxaa: FxaaPass::new(),
            smaa: SmaaPass::new(),
            upscale: UpscalePass::new(),
            batch_policy: SurfacePolicy,
            list_pool: RenderListPool::new(),
            rt_pool: RenderTargetPool::new(),
        };
        for pass in renderer.passes_mut() {
            if let Err(err) = pass.init(device) {
                error!("Renderer startup aborted: {err}");
                return Err(err);
            }
        }
        Ok(renderer)
    }

    /// The fixed-order pass table.
    fn passes_mut(&mut self) -> [&mut dyn RenderPass; 21] {
        [
            &mut self.global_sdf,
            &mut self.shadows,
            &mut self.gbuffer,
            &mut self.ambient_occlusion,
            &mut self.light,
            &mut self.gi,
            &mut self.ssr,
            &mut self.reflections,
            &mut self.volumetric_fog,
            &mut self.fog,
            &mut self.forward,
            &mut self.motion_blur,
            &mut self.taa,
            &mut self.dof,
            &mut self.histogram,
            &mut self.eye_adaptation,
            &mut self.color_grading,
            &mut self.post_processing,
            &mut self.fxaa,
            &mut self.smaa,
            &mut self.upscale,
        ]
    }

    fn passes(&self) -> [&dyn RenderPass; 21] {
        [
            &self.global_sdf,
            &self.shadows,
            &self.gbuffer,
            &self.ambient_occlusion,
            &self.light,
            &self.gi,
            &self.ssr,
            &self.reflections,
            &self.volumetric_fog,
            &self.fog,
            &self.forward,
            &self.motion_blur,
            &self.taa,
            &self.dof,
            &self.histogram,
            &self.eye_adaptation,
            &self.color_grading,
            &self.post_processing,
            &self.fxaa,
            &self.smaa,
            &self.upscale,
        ]
    }

    /// True once every pass finished its async precomputation. Never
    /// blocks; poll before trusting frame output.
    #[must_use]
    pub fn is_ready(&self, device: &dyn GpuDevice) -> bool {
        self.passes().iter().all(|pass| pass.is_ready(device))
    }

    /// Releases all pass resources and cached pool entries.
    pub fn dispose(&mut self) {
        for pass in self.passes_mut() {
            pass.dispose();
        }
        self.list_pool.cleanup();
    }

    /// Pool of GPU-backed intermediate targets, exposed for balance
    /// inspection.
    #[must_use]
    pub fn target_pool(&self) -> &RenderTargetPool {
        &self.rt_pool
    }

    /// Whether this frame must produce the motion vectors buffer.
    #[must_use]
    pub fn needs_motion_vectors(
        view: &RenderView,
        settings: &PostProcessSettings,
        is_camera_cut: bool,
    ) -> bool {
        let (width, height) = view.screen_size;
        if width < 16 || height < 16 || is_camera_cut {
            return false;
        }
        (view.flags.contains(ViewFlags::MOTION_BLUR)
            && settings.motion_blur.enabled
            && settings.motion_blur.scale > f32::EPSILON)
            || view.mode == ViewMode::MotionVectors
            || ScreenSpaceReflectionsPass::needs_motion_vectors(view)
            || TemporalAntiAliasingPass::needs_motion_vectors(view, settings)
    }

    // ── Entry points ───────────────────────────────────────────────────────

    /// Renders a full frame for `task`, writing pixels to the task output.
    pub fn render(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        task: &mut RenderTask,
        scene: &mut dyn SceneSource,
    ) -> Result<()> {
        ctx.clear_state();
        let (width, height) = task.internal_size();
        task.buffers.ensure_size(device, width, height)?;
        ctx.set_viewport(task.internal_viewport());

        let mut list = self.list_pool.acquire();
        let result = self.render_inner(device, ctx, task, scene, &mut list);
        self.list_pool.release(list);
        self.rt_pool.trim(device, POOL_TRIM_FRAMES);
        result
    }

    /// Depth-only rendering of the scene into `output`, reusing the same
    /// collect/sort/execute primitives as the full frame.
    pub fn draw_scene_depth(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        task: &RenderTask,
        output: TextureView,
        scene: &mut dyn SceneSource,
    ) -> Result<()> {
        ctx.clear_state();
        let mut list = self.list_pool.acquire();

        let mut view = task.view.clone();
        view.pass = DrawPass::DEPTH;
        view.prepare(task.internal_size());
        scene.collect_draw_calls(&view, &mut list);

        let limits = device.limits();
        list.sort_draw_calls(&view, false, DrawListType::Depth, &self.batch_policy, &limits);

        ctx.set_viewport(task.internal_viewport());
        ctx.clear_depth(output, 1.0);
        ctx.set_render_targets(&[], Some(output));
        list.execute_draw_calls(ctx, DrawListType::Depth, None);
        ctx.reset_render_targets();

        self.list_pool.release(list);
        Ok(())
    }

    /// Renders a single post-effect material fullscreen into `output`.
    pub fn draw_post_fx_material(
        ctx: &mut dyn GpuContext,
        material: MaterialHandle,
        output: TextureView,
        input: Option<TextureView>,
    ) {
        ctx.reset_textures();
        ctx.set_render_targets(&[output], None);
        if let Some(input) = input {
            ctx.bind_texture(0, input);
        }
        if ctx.bind_material(material) {
            ctx.draw_fullscreen();
        } else {
            log::warn!("Post-fx material {material:?} not resident, skipping");
        }
        ctx.reset_render_targets();
    }

    // ── Frame internals ────────────────────────────────────────────────────

    fn sort_stage_lists(&self, device: &dyn GpuDevice, view: &RenderView, list: &mut RenderList) {
        let limits = device.limits();
        let plan = [
            (DrawListType::GBuffer, false),
            (DrawListType::GBufferNoDecals, false),
            (DrawListType::Forward, true),
            (DrawListType::Distortion, false),
            (DrawListType::MotionVectors, false),
        ];
        for (list_type, reverse) in plan {
            list.sort_draw_calls(view, reverse, list_type, &self.batch_policy, &limits);
        }
    }

    fn blit_to_output(ctx: &mut dyn GpuContext, task: &RenderTask, source: TextureView) {
        ctx.reset_render_targets();
        ctx.set_viewport(task.output_viewport());
        ctx.copy(task.output, source);
    }

    fn has_any_post_fx(task: &RenderTask, list: &RenderList, location: PostFxLocation) -> bool {
        if !task.view.flags.contains(ViewFlags::CUSTOM_POST_PROCESS) {
            return false;
        }
        list.post_fx.iter().any(|&index| {
            let effect = &task.post_fx[index];
            effect.location() == location && effect.is_ready()
        })
    }

    /// Runs the effects registered at `location` over the front/back pair,
    /// swapping after each one.
    fn run_post_fx_chain(
        ctx: &mut dyn GpuContext,
        task: &mut RenderTask,
        list: &RenderList,
        location: PostFxLocation,
        ping_pong: &mut PingPong,
    ) {
        if !task.view.flags.contains(ViewFlags::CUSTOM_POST_PROCESS) {
            return;
        }
        for &index in &list.post_fx {
            let effect = &mut task.post_fx[index];
            if effect.location() != location || !effect.is_ready() {
                continue;
            }
            effect.render(ctx, ping_pong.front, ping_pong.back);
            ping_pong.swap();
        }
    }

    /// Runs the effects registered at `location` in-place over `target`,
    /// ping-ponging through a pooled temporary. The result always lands
    /// back in `target`.
    fn run_post_fx_inout(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        task: &mut RenderTask,
        list: &RenderList,
        location: PostFxLocation,
        target: TextureView,
    ) -> Result<()> {
        if !Self::has_any_post_fx(task, list, location) {
            return Ok(());
        }

        let (width, height) = task.view.screen_size;
        let desc = TextureDesc::render_target(width, height, RenderBuffers::OUTPUT_FORMAT);
        let temp = self.rt_pool.get(device, &desc, "PostFx Temp")?;

        let mut ping_pong = PingPong {
            front: target,
            back: temp.view(),
        };
        Self::run_post_fx_chain(ctx, task, list, location, &mut ping_pong);
        if ping_pong.front != target {
            ctx.copy(target, ping_pong.front);
        }

        self.rt_pool.release(temp);
        Ok(())
    }

    fn render_anti_aliasing(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        task: &RenderTask,
        aa_mode: AntialiasingMode,
        input: TextureView,
        output: TextureView,
    ) -> Result<()> {
        match aa_mode {
            AntialiasingMode::Fxaa => {
                ctx.push_debug_group("FXAA");
                self.fxaa.render(ctx, input, output);
                ctx.pop_debug_group();
            }
            AntialiasingMode::Smaa => {
                ctx.push_debug_group("SMAA");
                self.smaa
                    .render(device, ctx, &mut self.rt_pool, &task.view, input, output)?;
                ctx.pop_debug_group();
            }
            // TAA already ran inside the post chain; nothing (or None)
            // here is a plain frame copy.
            AntialiasingMode::None | AntialiasingMode::TemporalAntialiasing => {
                ctx.copy(output, input);
            }
        }
        Ok(())
    }

    fn render_inner(
        &mut self,
        device: &dyn GpuDevice,
        ctx: &mut dyn GpuContext,
        task: &mut RenderTask,
        scene: &mut dyn SceneSource,
        list: &mut RenderList,
    ) -> Result<()> {
        // Post-effect volumes blend before anything renders.
        scene.collect_post_fx_volumes(&task.view, list);
        for index in 0..task.post_fx.len() {
            list.post_fx.push(index);
        }
        let base_settings = task.settings;
        list.blend_settings(&base_settings, |provider, settings, weight| {
            scene.blend_post_fx(provider, settings, weight);
        });

        // Resolve the AA mode once; orthographic projections cannot jitter.
        let mut aa_mode = if task.view.flags.contains(ViewFlags::ANTI_ALIASING) {
            list.settings.anti_aliasing
        } else {
            AntialiasingMode::None
        };
        if aa_mode == AntialiasingMode::TemporalAntialiasing && task.view.is_orthographic {
            aa_mode = AntialiasingMode::None;
        }
        list.settings.anti_aliasing = aa_mode;

        // Prepare the view and collect draw calls. Parallel collectors
        // must have merged into `list` by the time collect returns; the
        // sorter below never observes a partially populated stage list.
        task.view.prepare(task.internal_size());
        list.init(&task.view);
        let needs_mv =
            Self::needs_motion_vectors(&task.view, &list.settings, task.is_camera_cut);
        task.view.pass = DrawPass::GBUFFER | DrawPass::FORWARD | DrawPass::DISTORTION;
        if needs_mv {
            task.view.pass |= DrawPass::MOTION_VECTORS;
        }
        scene.collect_draw_calls(&task.view, list);

        self.sort_stage_lists(device, &task.view, list);
        debug!(
            "Frame: {} draw calls, {} batched, {} lights",
            list.draw_calls.len(),
            list.batched_draw_calls.len(),
            list.directional_lights.len()
                + list.point_lights.len()
                + list.spot_lights.len()
                + list.sky_lights.len()
        );

        // The light accumulation buffer lives in the pool; every exit from
        // here on owes its release.
        let (width, height) = task.view.screen_size;
        let light_desc = TextureDesc::render_target(width, height, RenderBuffers::OUTPUT_FORMAT);
        let light_buffer = self.rt_pool.get(device, &light_desc, "Light Buffer")?;
        let light_view = light_buffer.view();
        let output = task.output;

        // Shadow / global distance field preparation.
        if task.view.flags.contains(ViewFlags::SHADOWS) {
            ctx.push_debug_group("Shadows");
            self.shadows.render(ctx, list, &task.view);
            ctx.pop_debug_group();
        }
        if task.view.flags.contains(ViewFlags::GLOBAL_SDF) {
            ctx.push_debug_group("GlobalSDF");
            self.global_sdf.render(ctx, list);
            ctx.pop_debug_group();
        }

        // Opaque geometry-buffer fill.
        ctx.push_debug_group("GBuffer");
        self.gbuffer
            .fill(ctx, list, &task.view, &task.buffers, light_view);
        ctx.pop_debug_group();

        if task.view.mode == ViewMode::GlobalSdf {
            ctx.push_debug_group("GlobalSDFDebug");
            self.global_sdf.render_debug(ctx, light_view);
            ctx.pop_debug_group();
            Self::blit_to_output(ctx, task, light_view);
            self.rt_pool.release(light_buffer);
            return Ok(());
        }

        // Motion vectors.
        if needs_mv {
            ctx.push_debug_group("MotionVectors");
            self.motion_blur
                .render_motion_vectors(ctx, list, &task.buffers);
            ctx.pop_debug_group();
        }

        // Ambient occlusion.
        if task.view.flags.contains(ViewFlags::AO) {
            ctx.push_debug_group("AmbientOcclusion");
            self.ambient_occlusion.render(
                device,
                ctx,
                &mut self.rt_pool,
                &task.view,
                &list.settings,
                &task.buffers,
            )?;
            ctx.pop_debug_group();
        }

        if GBufferPass::is_debug_view(task.view.mode) {
            ctx.push_debug_group("GBufferDebug");
            ctx.reset_render_targets();
            ctx.set_viewport(task.output_viewport());
            self.gbuffer.render_debug(ctx, &task.buffers, output);
            ctx.pop_debug_group();
            self.rt_pool.release(light_buffer);
            return Ok(());
        }

        // Lighting accumulation; zero lights is a legal no-op.
        ctx.push_debug_group("Lights");
        self.light.render(
            ctx,
            list,
            &task.view,
            &task.buffers,
            light_view,
            self.shadows.atlas_view(),
        );
        ctx.pop_debug_group();

        // Optional global illumination.
        if task.view.flags.contains(ViewFlags::GI)
            && list.settings.global_illumination.mode != GlobalIlluminationMode::None
        {
            ctx.push_debug_group("GI");
            self.gi.render(ctx, list, &task.buffers, light_view);
            ctx.pop_debug_group();
        }

        if task.view.mode == ViewMode::LightBuffer {
            Self::blit_to_output(ctx, task, light_view);
            self.rt_pool.release(light_buffer);
            return Ok(());
        }

        self.run_post_fx_inout(
            device,
            ctx,
            task,
            list,
            PostFxLocation::BeforeReflections,
            light_view,
        )?;

        // Reflections.
        if task.view.flags.contains(ViewFlags::REFLECTIONS) {
            let ssr_result = if task.view.flags.contains(ViewFlags::SSR) {
                ctx.push_debug_group("SSR");
                let result = self.ssr.render(
                    device,
                    ctx,
                    &mut self.rt_pool,
                    &task.view,
                    &list.settings,
                    &task.buffers,
                    light_view,
                )?;
                ctx.pop_debug_group();
                result
            } else {
                None
            };
            ctx.push_debug_group("Reflections");
            self.reflections.render(
                ctx,
                list,
                &task.buffers,
                light_view,
                ssr_result.map(crate::gpu::TextureHandle::view),
            );
            ctx.pop_debug_group();
            if let Some(ssr_texture) = ssr_result {
                self.rt_pool.release(ssr_texture);
            }
        }

        if task.view.mode == ViewMode::Reflections {
            Self::blit_to_output(ctx, task, light_view);
            self.rt_pool.release(light_buffer);
            return Ok(());
        }

        self.run_post_fx_inout(
            device,
            ctx,
            task,
            list,
            PostFxLocation::BeforeForward,
            light_view,
        )?;

        // Fog: volumetric scattering first, then the analytic draw.
        if task.view.flags.contains(ViewFlags::FOG) && list.fog.is_some() {
            ctx.reset_textures();
            if list.fog.is_some_and(|fog| fog.volumetric) {
                ctx.push_debug_group("VolumetricFog");
                self.volumetric_fog.render(ctx, list);
                ctx.pop_debug_group();
            }
            ctx.push_debug_group("Fog");
            self.fog.render(ctx, list, &task.buffers, light_view);
            ctx.pop_debug_group();
        }

        // Forward/translucency into the color chain.
        let mut ping_pong = task.buffers.ping_pong();
        ctx.push_debug_group("Forward");
        self.forward.render(
            device,
            ctx,
            &mut self.rt_pool,
            list,
            &task.view,
            &task.buffers,
            light_view,
            ping_pong.front,
        )?;
        ctx.pop_debug_group();
        ctx.reset_render_targets();
        ctx.reset_textures();
        self.rt_pool.release(light_buffer);

        if task.view.mode == ViewMode::NoPostFx {
            Self::blit_to_output(ctx, task, ping_pong.front);
            return Ok(());
        }

        Self::run_post_fx_chain(
            ctx,
            task,
            list,
            PostFxLocation::BeforePostProcessing,
            &mut ping_pong,
        );

        // Temporal anti-aliasing goes before the rest of the post chain.
        if aa_mode == AntialiasingMode::TemporalAntialiasing {
            ctx.push_debug_group("TAA");
            self.taa.render(
                device,
                ctx,
                &mut task.view,
                &task.buffers,
                &ping_pong,
                task.is_camera_cut,
            )?;
            ctx.pop_debug_group();
            ping_pong.swap();
        }

        // Depth of field.
        if task.view.flags.contains(ViewFlags::DEPTH_OF_FIELD) {
            ctx.push_debug_group("DepthOfField");
            let produced = self.dof.render(
                device,
                ctx,
                &mut self.rt_pool,
                &task.view,
                &list.settings,
                &task.buffers,
                &ping_pong,
            )?;
            ctx.pop_debug_group();
            if produced {
                ping_pong.swap();
            }
        }

        // Motion blur.
        if task.view.flags.contains(ViewFlags::MOTION_BLUR) && needs_mv {
            ctx.push_debug_group("MotionBlur");
            let produced = self
                .motion_blur
                .render(ctx, &list.settings, &task.buffers, &ping_pong);
            ctx.pop_debug_group();
            if produced {
                ping_pong.swap();
            }
        }

        // Color grading LUT generation.
        let lut = if task.view.flags.contains(ViewFlags::TONE_MAPPING) {
            ctx.push_debug_group("ColorGradingLUT");
            let lut = self
                .color_grading
                .render_lut(device, ctx, &mut self.rt_pool, &list.settings)?;
            ctx.pop_debug_group();
            lut
        } else {
            None
        };

        // Eye adaptation applies exposure in place on the front buffer.
        if task.view.flags.contains(ViewFlags::EYE_ADAPTATION)
            && list.settings.eye_adaptation.enabled
        {
            ctx.push_debug_group("EyeAdaptation");
            if let Some(histogram) =
                self.histogram
                    .render(device, ctx, &mut self.rt_pool, ping_pong.front)?
            {
                self.eye_adaptation
                    .render(ctx, &list.settings, histogram.view(), ping_pong.front);
                self.rt_pool.release(histogram);
            }
            ctx.pop_debug_group();
        }

        // Tone mapping / LUT application.
        ctx.push_debug_group("PostProcessing");
        self.post_processing.render(
            ctx,
            &task.view,
            &ping_pong,
            lut.map(crate::gpu::TextureHandle::view),
        );
        ctx.pop_debug_group();
        ping_pong.swap();
        if let Some(lut_texture) = lut {
            self.rt_pool.release(lut_texture);
        }

        Self::run_post_fx_chain(
            ctx,
            task,
            list,
            PostFxLocation::AfterPostProcessing,
            &mut ping_pong,
        );

        // Motion vectors debug view.
        if task.view.mode == ViewMode::MotionVectors {
            ctx.push_debug_group("MotionVectorsDebug");
            ctx.reset_render_targets();
            ctx.set_viewport(task.output_viewport());
            self.motion_blur
                .render_debug(ctx, &task.buffers, ping_pong.front, output);
            ctx.pop_debug_group();
            return Ok(());
        }

        // Final anti-aliasing, after-AA hooks and upscale.
        let has_after_aa = Self::has_any_post_fx(task, list, PostFxLocation::AfterAntiAliasing);
        if !has_after_aa && task.is_full_resolution() {
            // Straight to the back buffer; no intermediate copy.
            ctx.set_viewport(task.output_viewport());
            self.render_anti_aliasing(device, ctx, task, aa_mode, ping_pong.front, output)?;
        } else {
            self.render_anti_aliasing(
                device,
                ctx,
                task,
                aa_mode,
                ping_pong.front,
                ping_pong.back,
            )?;
            ctx.reset_render_targets();
            ping_pong.swap();
            Self::run_post_fx_chain(
                ctx,
                task,
                list,
                PostFxLocation::AfterAntiAliasing,
                &mut ping_pong,
            );

            if task.is_full_resolution() {
                ctx.set_viewport(task.output_viewport());
                ctx.copy(output, ping_pong.front);
            } else if Self::has_any_post_fx(task, list, PostFxLocation::CustomUpscale) {
                ctx.set_viewport(task.output_viewport());
                let front = ping_pong.front;
                for &index in &list.post_fx {
                    let effect = &mut task.post_fx[index];
                    if effect.location() == PostFxLocation::CustomUpscale && effect.is_ready() {
                        effect.render(ctx, front, output);
                    }
                }
            } else {
                ctx.push_debug_group("Upscale");
                self.upscale
                    .upscale(ctx, task.output_viewport(), ping_pong.front, output);
                ctx.pop_debug_group();
            }
        }

        Ok(())
    }
}
