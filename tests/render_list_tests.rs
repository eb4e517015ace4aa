//! Frame Aggregate Tests
//!
//! Tests for:
//! - Draw-call routing into stage lists (pass mask, decals split)
//! - Pool recycling: released-and-reacquired aggregates are fully reset
//! - Blendable settings ordering (priority, then smallest volume wins)
//! - Draw-call execution: empty no-ops, instanced batches, missing
//!   content skipping, pre-batched submission

use glam::{Mat4, Vec3};

use ember::gpu::null::{Command, NullContext, NullDevice};
use ember::gpu::{DeviceLimits, GeometryHandle, MaterialHandle};
use ember::list::{
    BatchedDrawCall, DrawCall, DrawListType, InstanceData, RenderList, RenderListPool,
};
use ember::settings::PostProcessSettings;
use ember::sort::SurfacePolicy;
use ember::view::{DrawPass, RenderView, StaticFlags};

fn make_view() -> RenderView {
    let mut view = RenderView {
        view: Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
        projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 1000.0),
        ..Default::default()
    };
    view.prepare((64, 64));
    view
}

fn make_call(geometry: u64, material: u64) -> DrawCall {
    DrawCall::new(
        GeometryHandle(geometry),
        MaterialHandle(material),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
    )
}

// ============================================================================
// Collection Routing
// ============================================================================

#[test]
fn gbuffer_split_follows_receives_decals() {
    let mut list = RenderList::default();
    list.add_draw_call(DrawPass::GBUFFER, StaticFlags::empty(), make_call(1, 1), true);
    list.add_draw_call(DrawPass::GBUFFER, StaticFlags::empty(), make_call(2, 2), false);

    assert_eq!(list.list(DrawListType::GBuffer).indices.as_slice(), &[0]);
    assert_eq!(
        list.list(DrawListType::GBufferNoDecals).indices.as_slice(),
        &[1]
    );
}

#[test]
fn pass_mask_routes_into_every_matching_stage() {
    let mut list = RenderList::default();
    let mask = DrawPass::DEPTH | DrawPass::GBUFFER | DrawPass::MOTION_VECTORS;
    list.add_draw_call(mask, StaticFlags::empty(), make_call(1, 1), true);

    assert_eq!(list.list(DrawListType::Depth).indices.len(), 1);
    assert_eq!(list.list(DrawListType::GBuffer).indices.len(), 1);
    assert_eq!(list.list(DrawListType::MotionVectors).indices.len(), 1);
    assert!(list.list(DrawListType::Forward).indices.is_empty());
    assert_eq!(list.draw_calls.len(), 1, "one master entry, many stage refs");
}

#[test]
fn forward_and_distortion_share_the_master_entry() {
    let mut list = RenderList::default();
    list.add_draw_call(
        DrawPass::FORWARD | DrawPass::DISTORTION,
        StaticFlags::empty(),
        make_call(3, 4),
        true,
    );
    assert_eq!(list.list(DrawListType::Forward).indices.as_slice(), &[0]);
    assert_eq!(list.list(DrawListType::Distortion).indices.as_slice(), &[0]);
}

// ============================================================================
// Pool Recycling
// ============================================================================

#[test]
fn reacquired_aggregate_has_every_count_reset() {
    let pool = RenderListPool::new();
    let mut list = pool.acquire();

    list.add_draw_call(
        DrawPass::GBUFFER | DrawPass::FORWARD,
        StaticFlags::empty(),
        make_call(1, 1),
        true,
    );
    list.add_settings_blend(0, 1.0, 0, 100.0);
    list.post_fx.push(0);
    list.blend_settings(&PostProcessSettings::default(), |_, _, _| {});
    assert!(!list.is_empty());

    pool.release(list);
    assert_eq!(pool.cached_count(), 1);

    let list = pool.acquire();
    assert!(list.is_empty());
    assert!(list.draw_calls.is_empty());
    assert!(list.blendable.is_empty());
    assert!(list.post_fx.is_empty());
    for list_type in DrawListType::ALL {
        assert!(list.list(list_type).is_empty(), "{} not reset", list_type.name());
        assert!(list.list(list_type).batches.is_empty());
    }
}

// ============================================================================
// Blendable Settings
// ============================================================================

#[test]
fn blending_orders_by_priority_then_smallest_volume() {
    let mut list = RenderList::default();
    // provider, weight, priority, volume size
    list.add_settings_blend(0, 1.0, 0, 100.0);
    list.add_settings_blend(1, 1.0, 10, 50.0);
    list.add_settings_blend(2, 1.0, 0, 1.0);

    let mut applied = Vec::new();
    list.blend_settings(&PostProcessSettings::default(), |provider, _, _| {
        applied.push(provider);
    });

    // Ascending priority; the priority tie applies the big volume first so
    // the most local volume lands last and wins.
    assert_eq!(applied, vec![0, 2, 1]);
}

#[test]
fn zero_weight_contributions_are_skipped() {
    let mut list = RenderList::default();
    list.add_settings_blend(0, 0.0, 0, 1.0);
    list.add_settings_blend(1, 0.7, 0, 1.0);

    let mut applied = Vec::new();
    list.blend_settings(&PostProcessSettings::default(), |provider, _, weight| {
        applied.push((provider, weight));
    });
    assert_eq!(applied, vec![(1, 0.7)]);
}

#[test]
fn blend_starts_from_the_base_settings() {
    let mut list = RenderList::default();
    let base = PostProcessSettings {
        depth_of_field: ember::settings::DepthOfFieldSettings {
            enabled: true,
            focal_distance: 42.0,
            blur_strength: 1.0,
        },
        ..Default::default()
    };
    list.blend_settings(&base, |_, _, _| {});
    assert!(list.settings.depth_of_field.enabled);
    assert!((list.settings.depth_of_field.focal_distance - 42.0).abs() < f32::EPSILON);
}

// ============================================================================
// Execution
// ============================================================================

fn sorted_list(calls: Vec<DrawCall>) -> RenderList {
    let mut list = RenderList::default();
    for call in calls {
        list.add_draw_call(DrawPass::GBUFFER, StaticFlags::empty(), call, true);
    }
    list.sort_draw_calls(
        &make_view(),
        false,
        DrawListType::GBuffer,
        &SurfacePolicy,
        &DeviceLimits::default(),
    );
    list
}

#[test]
fn executing_an_empty_stage_records_nothing() {
    let device = NullDevice::new();
    let mut ctx = NullContext::new(device);
    let mut list = RenderList::default();
    list.execute_draw_calls(&mut ctx, DrawListType::GBuffer, None);
    assert!(ctx.commands().is_empty());
}

#[test]
fn merged_batch_submits_one_instanced_draw() {
    let device = NullDevice::new();
    let mut ctx = NullContext::new(device);
    let mut list = sorted_list(vec![make_call(1, 1); 4]);

    list.execute_draw_calls(&mut ctx, DrawListType::GBuffer, None);
    assert_eq!(ctx.draw_count(), 1);
    assert!(ctx
        .commands()
        .contains(&Command::DrawInstances { count: 4 }));
}

#[test]
fn missing_material_skips_only_its_batch() {
    let device = NullDevice::new();
    device.set_material_missing(MaterialHandle(9), true);

    let mut ctx = NullContext::new(device);
    let mut list = sorted_list(vec![make_call(1, 9), make_call(2, 2)]);

    list.execute_draw_calls(&mut ctx, DrawListType::GBuffer, None);
    // The resident batch still renders; the missing one is skipped.
    assert_eq!(ctx.draw_count(), 1);
    assert!(ctx.commands().contains(&Command::BindMaterial(MaterialHandle(2))));
    assert!(!ctx.commands().contains(&Command::BindMaterial(MaterialHandle(9))));
}

#[test]
fn pre_batched_calls_submit_their_instance_stream() {
    let device = NullDevice::new();
    let mut ctx = NullContext::new(device);

    let mut list = RenderList::default();
    let call = make_call(5, 5);
    let instances = vec![InstanceData::from_draw_call(&call); 12];
    list.add_batched_draw_call(
        DrawPass::GBUFFER,
        StaticFlags::empty(),
        BatchedDrawCall {
            draw_call: call,
            instances,
        },
        true,
    );

    list.execute_draw_calls(&mut ctx, DrawListType::GBuffer, None);
    assert!(ctx
        .commands()
        .contains(&Command::DrawInstances { count: 12 }));
}
