use criterion::{criterion_group, criterion_main, Criterion};

extern crate blas_src;
extern crate lapack_src;

use rlst::prelude::*;

use near_field_kernels::modified_helmholtz_3d::ModifiedHelmholtz3dKernel;
use near_field_kernels::traits::Kernel;
use near_field_kernels::types::EvalType;

use rand::SeedableRng;

const NPOINTS: usize = 1000;

pub fn modified_helmholtz_c32_test_standard(c: &mut Criterion) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);

    let mut sources = rlst_dynamic_array2!(f32, [3, NPOINTS]);
    let mut targets = rlst_dynamic_array2!(f32, [3, NPOINTS]);

    let mut charges = rlst_dynamic_array1!(c32, [NPOINTS]);

    let mut result = rlst_dynamic_array1!(c32, [4 * NPOINTS]);

    sources.fill_from_equally_distributed(&mut rng);
    targets.fill_from(sources.r());

    charges.fill_from_standard_normal(&mut rng);

    let kernel = ModifiedHelmholtz3dKernel::<c32>::new(1.0, 0.5);

    c.bench_function("Modified Helmholtz evaluate c32", |b| {
        b.iter(|| {
            kernel.evaluate_st(
                EvalType::Value,
                sources.data(),
                targets.data(),
                charges.data(),
                &mut result.data_mut()[..NPOINTS],
            );
        })
    });

    c.bench_function("Modified Helmholtz evaluate with derivatives c32", |b| {
        b.iter(|| {
            kernel.evaluate_st(
                EvalType::ValueDeriv,
                sources.data(),
                targets.data(),
                charges.data(),
                result.data_mut(),
            );
        })
    });
}

criterion_group!(benches, modified_helmholtz_c32_test_standard,);
criterion_main!(benches);
