//! Batch Sorter Tests
//!
//! Tests for:
//! - Batch partition invariant (sum of lengths, no gaps, no overlap)
//! - Sort idempotence and stable tie ordering
//! - Front-to-back vs back-to-front distance policies
//! - Instancing eligibility (per-call opt-out and device limits)
//! - Empty and pre-batched-only stage lists

use glam::{Mat4, Vec3};

use ember::gpu::{DeviceLimits, GeometryHandle, MaterialHandle};
use ember::list::{BatchedDrawCall, DrawCall, DrawListType, RenderList};
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

fn call_at(geometry: u64, material: u64, distance: f32) -> DrawCall {
    let mut call = DrawCall::new(
        GeometryHandle(geometry),
        MaterialHandle(material),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -distance)),
    );
    call.bounds_center = Vec3::new(0.0, 0.0, -distance);
    call
}

fn add(list: &mut RenderList, call: DrawCall) {
    list.add_draw_call(DrawPass::GBUFFER, StaticFlags::empty(), call, true);
}

fn sort(list: &mut RenderList, reverse: bool) {
    let view = make_view();
    list.sort_draw_calls(
        &view,
        reverse,
        DrawListType::GBuffer,
        &SurfacePolicy,
        &DeviceLimits::default(),
    );
}

/// Asserts that batches exactly partition the stage list's index range.
fn assert_partition(list: &RenderList) {
    let stage = list.list(DrawListType::GBuffer);
    let total: u32 = stage.batches.iter().map(|b| b.len).sum();
    assert_eq!(
        total as usize,
        stage.indices.len(),
        "sum(batch.len) must equal the index count"
    );
    let mut expected_start = 0;
    for batch in &stage.batches {
        assert_eq!(
            batch.start, expected_start,
            "batches must be contiguous without gaps or overlap"
        );
        assert!(batch.len > 0, "empty batches are not allowed");
        expected_start += batch.len;
    }
}

// ============================================================================
// Partition Invariant
// ============================================================================

#[test]
fn batches_partition_mixed_materials() {
    let mut list = RenderList::default();
    for i in 0..37 {
        add(&mut list, call_at(i % 5, i % 3, 1.0 + i as f32));
    }
    sort(&mut list, false);
    assert_partition(&list);
}

#[test]
fn thousand_identical_draw_calls_form_one_batch() {
    let mut list = RenderList::default();
    for _ in 0..1000 {
        add(&mut list, call_at(7, 7, 10.0));
    }
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert!(stage.can_use_instancing);
    assert_eq!(stage.batches.len(), 1);
    assert_eq!(stage.batches[0].instance_count, 1000);
    assert_eq!(stage.batches[0].len, 1000);
}

#[test]
fn incompatible_neighbors_split_batches() {
    let mut list = RenderList::default();
    add(&mut list, call_at(1, 1, 5.0));
    add(&mut list, call_at(1, 1, 5.0));
    let mut skinned = call_at(1, 1, 5.0);
    skinned.allow_instancing = false;
    add(&mut list, skinned);
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert_partition(&list);
    // The non-instancable call cannot merge with its neighbors.
    assert!(stage.batches.len() >= 2);
    assert!(!stage.can_use_instancing);
}

// ============================================================================
// Ordering Policies
// ============================================================================

#[test]
fn forward_order_places_near_before_far() {
    let mut list = RenderList::default();
    add(&mut list, call_at(1, 1, 50.0)); // index 0, far
    add(&mut list, call_at(1, 1, 2.0)); // index 1, near
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert_eq!(stage.indices.as_slice(), &[1, 0]);
}

#[test]
fn reverse_order_places_far_before_near() {
    let mut list = RenderList::default();
    add(&mut list, call_at(1, 1, 2.0)); // index 0, near
    add(&mut list, call_at(1, 1, 50.0)); // index 1, far
    sort(&mut list, true);

    let stage = list.list(DrawListType::GBuffer);
    assert_eq!(stage.indices.as_slice(), &[1, 0]);
}

#[test]
fn equal_keys_preserve_insertion_order() {
    let mut list = RenderList::default();
    for _ in 0..6 {
        add(&mut list, call_at(3, 3, 8.0));
    }
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert_eq!(stage.indices.as_slice(), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn sorting_is_idempotent() {
    let mut list = RenderList::default();
    for i in 0..24 {
        add(&mut list, call_at(i % 4, i % 2, 1.0 + (i * 7 % 13) as f32));
    }
    sort(&mut list, false);
    let first_indices = list.list(DrawListType::GBuffer).indices.clone();
    let first_batches = list.list(DrawListType::GBuffer).batches.clone();

    sort(&mut list, false);
    let stage = list.list(DrawListType::GBuffer);
    assert_eq!(stage.indices, first_indices);
    assert_eq!(stage.batches, first_batches);
}

#[test]
fn sort_order_hint_wins_within_a_family() {
    let mut list = RenderList::default();
    let mut late = call_at(1, 1, 1.0);
    late.sort_order = 5;
    add(&mut list, late); // index 0: near but biased late
    add(&mut list, call_at(1, 1, 90.0)); // index 1: far, neutral order
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert_eq!(stage.indices.as_slice(), &[1, 0]);
}

// ============================================================================
// Instancing Eligibility
// ============================================================================

#[test]
fn device_without_instancing_disables_it() {
    let mut list = RenderList::default();
    add(&mut list, call_at(1, 1, 5.0));
    add(&mut list, call_at(1, 1, 5.0));

    let view = make_view();
    let limits = DeviceLimits {
        supports_instancing: false,
        ..Default::default()
    };
    list.sort_draw_calls(&view, false, DrawListType::GBuffer, &SurfacePolicy, &limits);

    assert!(!list.list(DrawListType::GBuffer).can_use_instancing);
    assert_partition(&list);
}

// ============================================================================
// Degenerate Lists
// ============================================================================

#[test]
fn sorting_an_empty_list_is_a_no_op() {
    let mut list = RenderList::default();
    sort(&mut list, false);
    let stage = list.list(DrawListType::GBuffer);
    assert!(stage.batches.is_empty());
    assert!(stage.is_empty());
}

#[test]
fn pre_batched_only_lists_skip_sorting() {
    let mut list = RenderList::default();
    list.add_batched_draw_call(
        DrawPass::GBUFFER,
        StaticFlags::empty(),
        BatchedDrawCall {
            draw_call: call_at(1, 1, 5.0),
            instances: Vec::new(),
        },
        true,
    );
    sort(&mut list, false);

    let stage = list.list(DrawListType::GBuffer);
    assert!(stage.batches.is_empty(), "pre-batched calls bypass the sorter");
    assert_eq!(stage.pre_batched.len(), 1);
    assert!(!stage.is_empty());
}
