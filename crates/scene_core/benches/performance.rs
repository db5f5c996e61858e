use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scene_core::occlusion::{occlusions, OcclusionConfig};
use scene_core::oracle::PathOracle;
use scene_core::prediction::Predictor;
use scene_core::rules::{standard_priority, standard_registry};
use scene_core::stepper::SceneStepper;
use scene_core::test_helpers::{obstacle, pedestrian, scene, vehicle};
use scene_core::{EntityId, Scene};

fn crossing_scene() -> Scene {
    scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 8.0),
        vehicle(2, 30.0, 30.0, 270.0, 6.0),
        pedestrian(3, 10.0, -6.0, 90.0, 2.0),
        obstacle(4, 12.0, 8.0, 2.0, 10.0, 2.5),
    ])
}

fn bench_prediction(c: &mut Criterion) {
    let scene = crossing_scene();
    c.bench_function("predict_trajectory_uncached", |b| {
        b.iter(|| {
            let predictor = Predictor::default();
            black_box(predictor.predict(&scene, EntityId(1)))
        })
    });

    let predictor = Predictor::default();
    predictor.predict(&scene, EntityId(1));
    c.bench_function("predict_trajectory_cached", |b| {
        b.iter(|| black_box(predictor.predict(&scene, EntityId(1))))
    });
}

fn bench_oracle(c: &mut Criterion) {
    let scene = crossing_scene();
    c.bench_function("path_crossing_uncached", |b| {
        b.iter(|| {
            let predictor = Predictor::default();
            let oracle = PathOracle::default();
            black_box(oracle.crossing(&scene, &predictor, EntityId(1), EntityId(3)))
        })
    });
}

fn bench_occlusion(c: &mut Criterion) {
    let scene = crossing_scene();
    let config = OcclusionConfig::default();
    c.bench_function("occlusions_from_ego", |b| {
        b.iter(|| black_box(occlusions(&scene, EntityId(1), &config)))
    });
}

fn bench_stepping(c: &mut Criterion) {
    let scene = crossing_scene();
    let stepper = SceneStepper::new(standard_registry()).with_priority(standard_priority());
    c.bench_function("step_crossing_scene", |b| {
        b.iter(|| black_box(stepper.step(&scene, 0.5)))
    });
}

criterion_group!(
    benches,
    bench_prediction,
    bench_oracle,
    bench_occlusion,
    bench_stepping
);
criterion_main!(benches);
