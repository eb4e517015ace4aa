//! Frame Pipeline Tests
//!
//! End-to-end tests over the Null backend:
//! - Fatal pass initialization and readiness polling
//! - Empty scene produces the configured background at the output
//! - Feature flags gate exactly their stage (command-log observation)
//! - Final AA bypass writes the pre-AA buffer straight to the output
//! - Early-exit view modes release every pooled target
//! - Post-effect hooks run in registration order through the ping-pong
//! - Upscale paths below native resolution
//! - Narrow depth-only entry point

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use uuid::Uuid;

use ember::gpu::null::{Command, NullContext, NullDevice, TextureContent};
use ember::gpu::{GeometryHandle, GpuDevice, MaterialHandle, TextureDesc, TextureFormat, TextureView};
use ember::list::{DirectionalLightSnapshot, DrawCall, FogParams, RenderList, SkyLightSnapshot};
use ember::renderer::Renderer;
use ember::settings::{AntialiasingMode, GlobalIlluminationMode};
use ember::task::{PostFxEffect, PostFxLocation, RenderTask, SceneSource};
use ember::view::{DrawPass, RenderView, StaticFlags, ViewFlags, ViewMode};

const SIZE: (u32, u32) = (64, 64);
const BACKGROUND: [f32; 4] = [0.1, 0.2, 0.3, 1.0];

// ============================================================================
// Test Scaffolding
// ============================================================================

#[derive(Default)]
struct TestScene {
    draw_calls: Vec<(DrawPass, DrawCall, bool)>,
    directional_lights: Vec<DirectionalLightSnapshot>,
    sky_lights: Vec<SkyLightSnapshot>,
    fog: Option<FogParams>,
}

impl TestScene {
    fn empty() -> Self {
        Self::default()
    }

    /// A scene exercising every stage: opaque + translucent geometry,
    /// lights and fog.
    fn busy() -> Self {
        let mut scene = Self::default();
        for i in 0..8u64 {
            scene.draw_calls.push((
                DrawPass::GBUFFER | DrawPass::MOTION_VECTORS,
                call_at(i % 3, i % 2, 2.0 + i as f32),
                i % 2 == 0,
            ));
        }
        scene
            .draw_calls
            .push((DrawPass::FORWARD | DrawPass::DISTORTION, call_at(9, 9, 4.0), true));
        scene
            .directional_lights
            .push(DirectionalLightSnapshot::new(
                Uuid::new_v4(),
                Vec3::ONE,
                Vec3::new(0.3, -1.0, 0.2).normalize(),
            ));
        scene.sky_lights.push(SkyLightSnapshot::new(
            Uuid::new_v4(),
            Vec3::new(0.4, 0.5, 0.8),
        ));
        scene.fog = Some(FogParams {
            volumetric: true,
            ..Default::default()
        });
        scene
    }
}

impl SceneSource for TestScene {
    fn collect_draw_calls(&mut self, view: &RenderView, list: &mut RenderList) {
        for (mask, call, receives_decals) in &self.draw_calls {
            if view.pass.intersects(*mask) {
                list.add_draw_call(*mask, StaticFlags::empty(), call.clone(), *receives_decals);
            }
        }
        list.directional_lights.extend(self.directional_lights.iter().copied());
        list.sky_lights.extend(self.sky_lights.iter().copied());
        list.fog = self.fog;
    }
}

fn call_at(geometry: u64, material: u64, distance: f32) -> DrawCall {
    let mut call = DrawCall::new(
        GeometryHandle(geometry),
        MaterialHandle(material),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -distance)),
    );
    call.bounds_center = Vec3::new(0.0, 0.0, -distance);
    call
}

struct Rig {
    device: Arc<NullDevice>,
    renderer: Renderer,
    backbuffer: TextureView,
    task: RenderTask,
}

fn make_rig() -> Rig {
    let device = NullDevice::new();
    let renderer = Renderer::new(device.as_ref()).expect("pass init");
    let backbuffer = device
        .create_texture(
            &TextureDesc::render_target(SIZE.0, SIZE.1, TextureFormat::Rgba8Unorm),
            "Backbuffer",
        )
        .expect("backbuffer")
        .view();
    let mut task = RenderTask::new(device.as_ref(), backbuffer, SIZE).expect("task");
    task.view.view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, Vec3::Y);
    task.view.projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 1000.0);
    task.view.background_color = BACKGROUND;
    Rig {
        device,
        renderer,
        backbuffer,
        task,
    }
}

fn render(rig: &mut Rig, scene: &mut TestScene) -> NullContext {
    let mut ctx = NullContext::new(rig.device.clone());
    rig.renderer
        .render(rig.device.as_ref(), &mut ctx, &mut rig.task, scene)
        .expect("frame");
    ctx
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn pass_init_failure_is_fatal() {
    let device = NullDevice::new();
    device.fail_program("gbuffer/fill");
    let result = Renderer::new(device.as_ref());
    assert!(matches!(
        result,
        Err(ember::RenderError::PassInitFailed { pass: "GBuffer", .. })
    ));
}

#[test]
fn readiness_polls_async_program_compilation() {
    let device = NullDevice::new();
    let renderer = Renderer::new(device.as_ref()).unwrap();
    assert!(renderer.is_ready(device.as_ref()));

    let lut_program = device.find_program("color_grading/bake").unwrap();
    device.stall_program(lut_program);
    assert!(!renderer.is_ready(device.as_ref()));

    device.finish_program(lut_program);
    assert!(renderer.is_ready(device.as_ref()));
}

// ============================================================================
// Empty Scene
// ============================================================================

#[test]
fn empty_scene_outputs_the_background_color() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::empty();

    let ctx = render(&mut rig, &mut TestScene::empty());

    assert_eq!(
        ctx.content(rig.backbuffer),
        TextureContent::Uniform(BACKGROUND)
    );
    assert_eq!(rig.renderer.target_pool().live_count(), 0);
    assert_eq!(ctx.draw_count(), 0, "nothing to draw in an empty scene");
}

// ============================================================================
// Feature Flag Gating
// ============================================================================

#[test]
fn gi_flag_toggles_exactly_the_gi_stage() {
    let mut rig = make_rig();
    rig.task.settings.global_illumination.mode = GlobalIlluminationMode::Ddgi;
    rig.task.settings.anti_aliasing = AntialiasingMode::None;
    let base_flags = ViewFlags::SHADOWS | ViewFlags::AO | ViewFlags::TONE_MAPPING;

    rig.task.view.flags = base_flags | ViewFlags::GI;
    let with_gi = render(&mut rig, &mut TestScene::busy()).group_trace();

    rig.task.view.flags = base_flags;
    let without_gi = render(&mut rig, &mut TestScene::busy()).group_trace();

    assert!(with_gi.contains(&"GI"));
    let with_gi_filtered: Vec<_> = with_gi.into_iter().filter(|name| *name != "GI").collect();
    assert_eq!(
        with_gi_filtered, without_gi,
        "toggling GI must not disturb the other stages"
    );
}

#[test]
fn shadows_flag_toggles_exactly_the_shadow_stage() {
    let mut rig = make_rig();
    rig.task.settings.anti_aliasing = AntialiasingMode::None;
    let base_flags = ViewFlags::AO | ViewFlags::FOG;

    rig.task.view.flags = base_flags | ViewFlags::SHADOWS;
    let with_shadows = render(&mut rig, &mut TestScene::busy()).group_trace();

    rig.task.view.flags = base_flags;
    let without_shadows = render(&mut rig, &mut TestScene::busy()).group_trace();

    assert!(with_shadows.contains(&"Shadows"));
    let filtered: Vec<_> = with_shadows
        .into_iter()
        .filter(|name| *name != "Shadows")
        .collect();
    assert_eq!(filtered, without_shadows);
}

// ============================================================================
// Final Anti-Aliasing
// ============================================================================

#[test]
fn disabled_aa_writes_pre_aa_buffer_directly_to_output() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::empty();
    rig.task.settings.anti_aliasing = AntialiasingMode::None;

    let ctx = render(&mut rig, &mut TestScene::busy());

    let copies_to_output: Vec<_> = ctx
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::Copy { dst, src } if *dst == rig.backbuffer => Some(*src),
            _ => None,
        })
        .collect();
    assert_eq!(copies_to_output.len(), 1, "exactly one write to the output");
    let source = copies_to_output[0].texture;
    assert!(
        source == rig.task.buffers.rt1 || source == rig.task.buffers.rt2,
        "output must come straight from the ping-pong chain"
    );
    let trace = ctx.group_trace();
    assert!(!trace.contains(&"FXAA"));
    assert!(!trace.contains(&"SMAA"));
    assert!(!trace.contains(&"Upscale"));
}

#[test]
fn fxaa_runs_when_enabled() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::ANTI_ALIASING;
    rig.task.settings.anti_aliasing = AntialiasingMode::Fxaa;

    let ctx = render(&mut rig, &mut TestScene::busy());
    assert!(ctx.group_trace().contains(&"FXAA"));
}

// ============================================================================
// Early-Exit View Modes
// ============================================================================

#[test]
fn early_exit_view_modes_release_every_pooled_target() {
    let modes = [
        ViewMode::Default,
        ViewMode::GlobalSdf,
        ViewMode::Normals,
        ViewMode::LightBuffer,
        ViewMode::Reflections,
        ViewMode::MotionVectors,
        ViewMode::NoPostFx,
    ];
    for mode in modes {
        let mut rig = make_rig();
        rig.task.view.flags = ViewFlags::all();
        rig.task.view.mode = mode;
        rig.task.settings.depth_of_field.enabled = true;
        rig.task.settings.global_illumination.mode = GlobalIlluminationMode::Ddgi;

        let _ctx = render(&mut rig, &mut TestScene::busy());
        assert_eq!(
            rig.renderer.target_pool().live_count(),
            0,
            "pooled targets leaked in {mode:?}"
        );
    }
}

#[test]
fn light_buffer_mode_writes_the_light_buffer_to_output() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::empty();
    rig.task.view.mode = ViewMode::LightBuffer;

    let ctx = render(&mut rig, &mut TestScene::empty());
    // No lights: the light buffer still carries the cleared background.
    assert_eq!(
        ctx.content(rig.backbuffer),
        TextureContent::Uniform(BACKGROUND)
    );
    let trace = ctx.group_trace();
    assert!(!trace.contains(&"Forward"), "aborted before the forward pass");
}

// ============================================================================
// Post-Effect Hooks
// ============================================================================

struct RecordingEffect {
    name: &'static str,
    location: PostFxLocation,
    log: Rc<RefCell<Vec<(&'static str, TextureView, TextureView)>>>,
}

impl PostFxEffect for RecordingEffect {
    fn location(&self) -> PostFxLocation {
        self.location
    }

    fn render(&mut self, _ctx: &mut dyn ember::gpu::GpuContext, input: TextureView, output: TextureView) {
        self.log.borrow_mut().push((self.name, input, output));
    }
}

#[test]
fn post_fx_hooks_run_in_registration_order_through_the_ping_pong() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::CUSTOM_POST_PROCESS;
    rig.task.settings.anti_aliasing = AntialiasingMode::None;

    let log = Rc::new(RefCell::new(Vec::new()));
    rig.task.add_post_fx(Box::new(RecordingEffect {
        name: "first",
        location: PostFxLocation::BeforePostProcessing,
        log: log.clone(),
    }));
    rig.task.add_post_fx(Box::new(RecordingEffect {
        name: "second",
        location: PostFxLocation::BeforePostProcessing,
        log: log.clone(),
    }));

    let _ctx = render(&mut rig, &mut TestScene::busy());

    let entries = log.borrow();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "first");
    assert_eq!(entries[1].0, "second");
    // The second effect consumes what the first produced.
    assert_eq!(entries[1].1, entries[0].2);
    assert_eq!(entries[1].2, entries[0].1);
}

// ============================================================================
// Resolution Scaling
// ============================================================================

#[test]
fn below_native_resolution_runs_the_upscale_stage() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::empty();
    rig.task.rendering_percentage = 0.5;

    let ctx = render(&mut rig, &mut TestScene::busy());
    assert!(ctx.group_trace().contains(&"Upscale"));
    assert_eq!(rig.renderer.target_pool().live_count(), 0);
}

#[test]
fn custom_upscale_hook_replaces_the_builtin_stage() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::CUSTOM_POST_PROCESS;
    rig.task.rendering_percentage = 0.5;

    let log = Rc::new(RefCell::new(Vec::new()));
    rig.task.add_post_fx(Box::new(RecordingEffect {
        name: "upscaler",
        location: PostFxLocation::CustomUpscale,
        log: log.clone(),
    }));

    let ctx = render(&mut rig, &mut TestScene::busy());
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].2, rig.backbuffer, "hook writes the output");
    assert!(!ctx.group_trace().contains(&"Upscale"));
}

// ============================================================================
// Instanced Submission
// ============================================================================

#[test]
fn identical_opaque_draw_calls_submit_as_one_instanced_batch() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::empty();

    let mut scene = TestScene::empty();
    for _ in 0..1000 {
        scene
            .draw_calls
            .push((DrawPass::GBUFFER, call_at(7, 7, 10.0), true));
    }

    let ctx = render(&mut rig, &mut scene);
    assert!(ctx
        .commands()
        .contains(&Command::DrawInstances { count: 1000 }));
}

// ============================================================================
// Motion Vectors Gating
// ============================================================================

#[test]
fn camera_cut_suppresses_motion_vectors() {
    let mut rig = make_rig();
    rig.task.view.flags = ViewFlags::MOTION_BLUR;

    let ctx = render(&mut rig, &mut TestScene::busy());
    assert!(ctx.group_trace().contains(&"MotionVectors"));

    rig.task.is_camera_cut = true;
    let ctx = render(&mut rig, &mut TestScene::busy());
    assert!(!ctx.group_trace().contains(&"MotionVectors"));
}

// ============================================================================
// Depth-Only Entry Point
// ============================================================================

#[test]
fn draw_scene_depth_reuses_the_collect_sort_execute_primitives() {
    let mut rig = make_rig();
    let depth_target = rig
        .device
        .create_texture(&TextureDesc::depth_buffer(SIZE.0, SIZE.1), "Depth Probe")
        .unwrap()
        .view();

    let mut scene = TestScene::empty();
    scene
        .draw_calls
        .push((DrawPass::DEPTH, call_at(1, 1, 3.0), true));
    scene
        .draw_calls
        .push((DrawPass::GBUFFER, call_at(2, 2, 3.0), true));

    let mut ctx = NullContext::new(rig.device.clone());
    rig.renderer
        .draw_scene_depth(rig.device.as_ref(), &mut ctx, &rig.task, depth_target, &mut scene)
        .unwrap();

    assert!(ctx.commands().contains(&Command::ClearDepth {
        target: depth_target,
        depth: 1.0
    }));
    // Only the depth-masked call renders.
    assert_eq!(ctx.draw_count(), 1);
    assert_eq!(rig.renderer.target_pool().live_count(), 0);
}
