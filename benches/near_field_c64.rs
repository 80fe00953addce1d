use criterion::{criterion_group, criterion_main, Criterion};

extern crate blas_src;
extern crate lapack_src;

use rlst::prelude::*;

use near_field_kernels::geometry::{FlatTriangleGeometry, NeighborIndex};
use near_field_kernels::modified_helmholtz_3d::ModifiedHelmholtz3dKernel;
use near_field_kernels::near_field::NearFieldEvaluator;

use rand::{Rng, SeedableRng};

const NELEMENTS: usize = 2000;
const NNEIGHBORS: usize = 12;

// Six point Gauss rule on the reference triangle.
const REFERENCE_POINTS: [f64; 12] = [
    0.445948490915965,
    0.445948490915965,
    0.108103018168070,
    0.445948490915965,
    0.445948490915965,
    0.108103018168070,
    0.091576213509771,
    0.091576213509771,
    0.816847572980459,
    0.091576213509771,
    0.091576213509771,
    0.816847572980459,
];

pub fn near_field_c64_test_standard(c: &mut Criterion) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
    let npoints = REFERENCE_POINTS.len() / 2;

    let coordinates: Vec<f64> = (0..9 * NELEMENTS).map(|_| rng.gen::<f64>()).collect();
    let indices: Vec<usize> = (0..NELEMENTS * NNEIGHBORS)
        .map(|_| rng.gen_range(0..NELEMENTS))
        .collect();
    let offsets: Vec<usize> = (0..=NELEMENTS).map(|e| e * NNEIGHBORS).collect();

    let mut coefficients = rlst_dynamic_array1!(c64, [NELEMENTS * npoints]);
    let mut result = rlst_dynamic_array1!(c64, [4 * NELEMENTS * npoints]);
    coefficients.fill_from_standard_normal(&mut rng);

    let geometry = FlatTriangleGeometry::new(&coordinates);
    let neighbors = NeighborIndex::new(&indices, &offsets);
    let evaluator = NearFieldEvaluator::new(
        ModifiedHelmholtz3dKernel::<c64>::new(2.0, 0.5),
        REFERENCE_POINTS.to_vec(),
    );

    c.bench_function("Near field evaluate c64", |b| {
        b.iter(|| {
            evaluator.evaluate_st(&geometry, &neighbors, coefficients.data(), result.data_mut());
        })
    });

    c.bench_function("Near field evaluate multithreaded c64", |b| {
        b.iter(|| {
            evaluator.evaluate_mt(&geometry, &neighbors, coefficients.data(), result.data_mut());
        })
    });
}

criterion_group!(benches, near_field_c64_test_standard,);
criterion_main!(benches);
