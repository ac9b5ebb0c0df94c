//! Classification Benchmarks
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --package posecap-core --bench classification
//! ```
//!
//! # Metrics Measured
//! - Circumscribed circle throughput
//! - Policy evaluation per observation
//! - Full registry fill for 4-, 8- and 12-way layouts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use posecap_core::geometry::{angle_degrees, circumscribed_circle};
use posecap_core::{
    face_with_center, CaptureConfig, CaptureRegistry, DetectedFace, Direction, DirectionLayout,
    DirectionPolicy, FaceObservation, FaceRect, Frame, FrameSize, ImageHandle, Point2D,
};

const FRAME: FrameSize = FrameSize::new(640, 480);
const FRONT: Point2D = Point2D::new(320.0, 240.0);

fn config(layout: DirectionLayout) -> CaptureConfig {
    CaptureConfig {
        layout,
        min_bounding_box_area: 10_000.0,
        max_center_distance: 100.0,
        ..Default::default()
    }
}

fn face_towards(degrees: f64, reach: f64) -> DetectedFace {
    let radians = degrees.to_radians();
    let center = Point2D::new(
        FRONT.x + reach * radians.cos(),
        FRONT.y + reach * radians.sin(),
    );
    face_with_center(
        center,
        40.0,
        FaceRect::new(center.x - 80.0, center.y - 80.0, 160.0, 160.0),
    )
}

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");
    group.throughput(Throughput::Elements(1));

    let a = Point2D::new(360.0, 240.0);
    let b = Point2D::new(280.0, 240.0);
    let m = Point2D::new(320.0, 280.0);

    group.bench_function("circumscribed_circle", |bench| {
        bench.iter(|| circumscribed_circle(black_box(a), black_box(b), black_box(m)))
    });
    group.bench_function("angle_degrees", |bench| {
        bench.iter(|| angle_degrees(black_box(a), black_box(FRONT)))
    });
    group.finish();
}

fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");
    let policy = DirectionPolicy::new(&config(DirectionLayout::EIGHT_WAY)).unwrap();
    let frame = Frame::new(0, ImageHandle::blank(FRAME));
    let front = FaceObservation::from_detection(&face_towards(0.0, 0.0), &frame);
    let side = FaceObservation::from_detection(&face_towards(135.0, 60.0), &frame);

    group.bench_function("front", |bench| {
        bench.iter(|| policy.is_front_eligible(black_box(&front)))
    });
    group.bench_function("all_peripherals", |bench| {
        bench.iter(|| {
            policy
                .layout()
                .peripherals()
                .filter(|&d| policy.is_peripheral_eligible(d, black_box(&side), &front))
                .count()
        })
    });
    group.finish();
}

fn bench_registry_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_fill");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for count in [5usize, 9, 13] {
        let layout = DirectionLayout::new(count).unwrap();
        let step = layout.angle_step();
        let frame = Frame::new(0, ImageHandle::blank(FRAME));
        let observations: Vec<_> = std::iter::once(face_towards(0.0, 0.0))
            .chain((0..layout.peripheral_count()).map(|k| face_towards(k as f64 * step, 60.0)))
            .map(|face| FaceObservation::from_detection(&face, &frame))
            .collect();

        group.throughput(Throughput::Elements(observations.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &observations, |bench, obs| {
            bench.iter(|| {
                let mut registry = CaptureRegistry::new(&config(layout)).unwrap();
                for observation in obs {
                    black_box(registry.capture(observation.clone()));
                }
                assert!(registry.slot(Direction::Front).unwrap().is_some());
                registry.is_complete()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_geometry, bench_policy, bench_registry_fill);
criterion_main!(benches);
