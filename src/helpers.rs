//! Dimension checks and SIMD helpers

use crate::geometry::NeighborIndex;
use crate::traits::Kernel;
use crate::types::EvalType;
use rlst::{RlstScalar, RlstSimd};
use std::marker::PhantomData;

/// Check array dimensions for evaluation
pub fn check_dimensions_evaluate<K: Kernel, T: RlstScalar>(
    kernel: &K,
    eval_type: EvalType,
    sources: &[T::Real],
    targets: &[T::Real],
    charges: &[T],
    result: &[T],
) {
    let dim = kernel.space_dimension();

    assert!(
        sources.len() % dim == 0,
        "Length of sources {} is not a multiple of the space dimension {}.",
        sources.len(),
        dim
    );
    assert!(
        targets.len() % dim == 0,
        "Length of targets {} is not a multiple of the space dimension {}.",
        targets.len(),
        dim
    );

    let nsources = sources.len() / dim;
    let ntargets = targets.len() / dim;

    assert_eq!(
        charges.len(),
        nsources,
        "Wrong dimension for charges. {} != {}",
        charges.len(),
        nsources
    );

    let range_count = kernel.range_component_count(eval_type);

    assert_eq!(
        result.len(),
        range_count * ntargets,
        "Wrong dimension for result. {} != {}",
        result.len(),
        range_count * ntargets
    );
}

/// Check array dimensions for a near-field pass over all elements
pub fn check_dimensions_near_field<T>(
    nelements: usize,
    npoints: usize,
    neighbors: &NeighborIndex<'_>,
    coefficients: &[T],
    result: &[T],
) {
    assert_eq!(
        neighbors.element_count(),
        nelements,
        "Neighbor index describes {} elements, geometry has {}.",
        neighbors.element_count(),
        nelements
    );
    assert_eq!(
        coefficients.len(),
        nelements * npoints,
        "Wrong dimension for coefficients. {} != {}",
        coefficients.len(),
        nelements * npoints
    );
    assert_eq!(
        result.len(),
        4 * nelements * npoints,
        "Wrong dimension for result. {} != {}",
        result.len(),
        4 * nelements * npoints
    );
}

/// Number of lanes in one SIMD register of `T::Real` on the dispatched architecture.
pub fn simd_lane_count<T: RlstScalar>() -> usize {
    struct Impl<R: RlstSimd> {
        _phantom_r: PhantomData<R>,
    }

    impl<R: RlstSimd> pulp::WithSimd for Impl<R> {
        type Output = usize;

        #[inline(always)]
        fn with_simd<S: pulp::Simd>(self, _simd: S) -> Self::Output {
            std::mem::size_of::<R::Scalars<S>>() / std::mem::size_of::<R>()
        }
    }

    if coe::is_same::<T::Real, f32>() {
        pulp::Arch::new().dispatch(Impl::<f32> {
            _phantom_r: PhantomData,
        })
    } else if coe::is_same::<T::Real, f64>() {
        pulp::Arch::new().dispatch(Impl::<f64> {
            _phantom_r: PhantomData,
        })
    } else {
        panic!("Type not implemented.")
    }
}
