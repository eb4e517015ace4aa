//! Batch sorter benchmark: key computation + stable sort + batch grouping
//! over a synthetic frame of mixed materials.

use criterion::{criterion_group, criterion_main, Criterion};
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ember::gpu::{DeviceLimits, GeometryHandle, MaterialHandle};
use ember::list::{DrawCall, DrawListType, RenderList};
use ember::sort::SurfacePolicy;
use ember::view::{DrawPass, RenderView, StaticFlags};

fn make_view() -> RenderView {
    let mut view = RenderView {
        view: Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
        projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 10000.0),
        ..Default::default()
    };
    view.prepare((1920, 1080));
    view
}

fn make_list(count: usize, families: u64) -> RenderList {
    let mut rng = StdRng::seed_from_u64(0x00E0_17EB);
    let mut list = RenderList::default();
    for _ in 0..count {
        let family = rng.random_range(0..families);
        let distance: f32 = rng.random_range(0.5..5000.0);
        let mut call = DrawCall::new(
            GeometryHandle(family),
            MaterialHandle(family / 2),
            Mat4::from_translation(Vec3::new(0.0, 0.0, -distance)),
        );
        call.bounds_center = Vec3::new(0.0, 0.0, -distance);
        list.add_draw_call(DrawPass::GBUFFER, StaticFlags::empty(), call, true);
    }
    list
}

fn bench_sort(c: &mut Criterion) {
    let view = make_view();
    let limits = DeviceLimits::default();

    let mut group = c.benchmark_group("batch_sort");
    for &count in &[256usize, 4096] {
        let mut list = make_list(count, 64);
        group.bench_function(format!("opaque_{count}"), |b| {
            b.iter(|| {
                list.sort_draw_calls(
                    &view,
                    false,
                    DrawListType::GBuffer,
                    &SurfacePolicy,
                    &limits,
                );
            });
        });

        let mut list = make_list(count, 64);
        group.bench_function(format!("translucent_{count}"), |b| {
            b.iter(|| {
                list.sort_draw_calls(
                    &view,
                    true,
                    DrawListType::GBuffer,
                    &SurfacePolicy,
                    &limits,
                );
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort);
criterion_main!(benches);
