//! Benchmarks for the proximity solvers.
//!
//! Run with: cargo bench -p arbor-collision

#![allow(missing_docs, clippy::unwrap_used)]

use arbor_collision::{Geometry, choose_solver, collide};
use arbor_spatial::transform::{Transform, rotzyx, transl};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::Vector3;

fn bench_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("collide");

    let sphere = Geometry::sphere(0.3).unwrap();
    let plane = Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap();
    let cuboid = Geometry::cuboid(Vector3::new(0.5, 1.0, 1.5)).unwrap();
    let box_pose = transl(0.1, 0.2, -0.3) * rotzyx(0.3, 0.2, 0.1);
    let near = transl(0.4, 0.9, 1.2);

    let cases: [(&str, &Geometry, Transform, &Geometry, Transform); 4] = [
        ("sphere_sphere", &sphere, Transform::identity(), &sphere, near),
        ("plane_sphere", &plane, Transform::identity(), &sphere, near),
        ("box_sphere_outside", &cuboid, box_pose, &sphere, transl(2.0, 3.0, 1.0)),
        ("box_sphere_inside", &cuboid, box_pose, &sphere, near),
    ];

    for (name, a, a_pose, b, b_pose) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |bench, _| {
            bench.iter(|| collide(black_box(a), black_box(a_pose), black_box(b), black_box(b_pose)));
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let sphere = Geometry::sphere(0.3).unwrap();
    let plane = Geometry::plane([0.0, 1.0, 0.0, 0.0]).unwrap();
    c.bench_function("choose_solver", |bench| {
        bench.iter(|| choose_solver(black_box(sphere.kind()), black_box(plane.kind())));
    });
}

criterion_group!(benches, bench_pairs, bench_dispatch);
criterion_main!(benches);
