//! Benchmarks for the CCD IK solver
//!
//! The solver runs once per arm per control cycle, so a solve must fit
//! comfortably inside the cycle period with room for everything else.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;

use teleop_lib::chain_ik::{solve, ChainGeom, ChainModel, IkParams};

/// Seven-joint chain with 0.1 m links, matching the shipped arm layout.
fn arm_model() -> ChainModel {
    ChainModel::new(&ChainGeom {
        base_pos_m: [0.0; 3],
        base_rot_deg: [0.0; 3],
        joint_pos_m: (0..7).map(|i| [0.1 * i as f64, 0.0, 0.0]).collect(),
        joint_axis: vec![
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        joint_min_deg: vec![-175.0; 7],
        joint_max_deg: vec![175.0; 7],
        effector_pos_m: [0.7, 0.0, 0.0],
    })
    .unwrap()
}

fn bench_solve(c: &mut Criterion) {
    let model = arm_model();
    let params = IkParams::default();
    let target = Vector3::new(0.4, 0.15, 0.1);
    let seed = [0.0; 7];

    c.bench_function("ccd_solve_cold", |b| {
        b.iter(|| solve(&model, black_box(&target), black_box(&seed), &params))
    });

    // Warm-started solve, as happens every cycle after the first
    let warm = solve(&model, &target, &seed, &params);
    c.bench_function("ccd_solve_warm", |b| {
        b.iter(|| {
            solve(
                &model,
                black_box(&target),
                black_box(&warm.angles_deg),
                &params,
            )
        })
    });

    c.bench_function("fk_effector_position", |b| {
        b.iter(|| model.effector_position(black_box(&warm.angles_deg)))
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
