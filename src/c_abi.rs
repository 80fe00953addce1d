//! C Interface

use rlst::prelude::*;
use rlst::RlstScalar;
use std::ffi::c_void;

use crate::geometry::{FlatTriangleGeometry, NeighborIndex};
use crate::modified_helmholtz_3d::ModifiedHelmholtz3dKernel;
use crate::near_field::NearFieldEvaluator;

/// Evaluate the near field from flat buffers.
///
/// Returns `false` and leaves `result` untouched if the input fails validation.
///
/// # Safety
/// All pointers must be valid for the lengths implied by `nelements` and `npoints`:
/// `9 * nelements` reals in `geometry`, `nelements + 1` offsets in `neighbor_offsets`,
/// `neighbor_offsets[nelements]` indices in `neighbor_indices`, `2 * npoints` reals in
/// `local_points`, `nelements * npoints` values in `coefficients`, two reals in
/// `kernel_parameters` and `4 * nelements * npoints` values in `result`.
#[allow(clippy::too_many_arguments)]
unsafe fn near_field_evaluate_impl<T: RlstScalar<Complex = T> + Send + Sync>(
    nelements: usize,
    npoints: usize,
    geometry: *const c_void,
    neighbor_indices: *const usize,
    neighbor_offsets: *const usize,
    local_points: *const c_void,
    coefficients: *const c_void,
    kernel_parameters: *const c_void,
    max_points: usize,
    result: *mut c_void,
    multithreaded: bool,
) -> bool
where
    T::Real: Send + Sync,
{
    assert!(!geometry.is_null());
    assert!(!neighbor_offsets.is_null());
    assert!(!local_points.is_null() || npoints == 0);
    assert!(!kernel_parameters.is_null());

    let offsets = std::slice::from_raw_parts(neighbor_offsets, nelements + 1);
    let nindices = offsets[nelements];
    let indices: &[usize] = if nindices == 0 {
        &[]
    } else {
        assert!(!neighbor_indices.is_null());
        std::slice::from_raw_parts(neighbor_indices, nindices)
    };

    let coordinates = std::slice::from_raw_parts(geometry as *const T::Real, 9 * nelements);
    let reference_points = if npoints == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(local_points as *const T::Real, 2 * npoints).to_vec()
    };
    let parameters = std::slice::from_raw_parts(kernel_parameters as *const T::Real, 2);

    let kernel = match ModifiedHelmholtz3dKernel::<T>::from_parameters(parameters) {
        Ok(kernel) => kernel,
        Err(err) => {
            tracing::error!("{}", err);
            return false;
        }
    };

    let nvalues = nelements * npoints;
    let (coefficients, result): (&[T], &mut [T]) = if nvalues == 0 {
        (&[], &mut [])
    } else {
        assert!(!coefficients.is_null());
        assert!(!result.is_null());
        (
            std::slice::from_raw_parts(coefficients as *const T, nvalues),
            std::slice::from_raw_parts_mut(result as *mut T, 4 * nvalues),
        )
    };

    let geometry = FlatTriangleGeometry::new(coordinates);
    let neighbors = NeighborIndex::new(indices, offsets);
    let evaluator = NearFieldEvaluator::new(kernel, reference_points).with_max_points(max_points);

    if let Err(err) = evaluator.validate(&geometry, &neighbors, coefficients, result.len()) {
        tracing::error!("{}", err);
        return false;
    }

    if multithreaded {
        evaluator.evaluate_mt(&geometry, &neighbors, coefficients, result);
    } else {
        evaluator.evaluate_st(&geometry, &neighbors, coefficients, result);
    }

    true
}

/// Near-field evaluation in single precision.
///
/// Geometry, local points and kernel parameters are `f32`, coefficients and result are
/// interleaved `c32`.
///
/// # Safety
/// Pointers must be valid, see [near_field_evaluate_c64].
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn near_field_evaluate_c32(
    nelements: usize,
    npoints: usize,
    geometry: *const c_void,
    neighbor_indices: *const usize,
    neighbor_offsets: *const usize,
    local_points: *const c_void,
    coefficients: *const c_void,
    kernel_parameters: *const c_void,
    max_points: usize,
    result: *mut c_void,
    multithreaded: bool,
) -> bool {
    near_field_evaluate_impl::<c32>(
        nelements,
        npoints,
        geometry,
        neighbor_indices,
        neighbor_offsets,
        local_points,
        coefficients,
        kernel_parameters,
        max_points,
        result,
        multithreaded,
    )
}

/// Near-field evaluation in double precision.
///
/// - `geometry`: `9 * nelements` reals, the three corners of each element.
/// - `neighbor_indices`, `neighbor_offsets`: CSR neighbor lists, `nelements + 1` offsets.
/// - `local_points`: `2 * npoints` reference coordinates shared by all elements.
/// - `coefficients`: `nelements * npoints` complex density values.
/// - `kernel_parameters`: `[wavenumber, absorption]`.
/// - `max_points`: capacity of the per-element gather buffer.
/// - `result`: `4 * nelements * npoints` complex values, overwritten.
///
/// Returns `false` if the input fails validation. The reason is logged through `tracing`.
///
/// # Safety
/// All pointers must be valid for the lengths above. `neighbor_indices` must hold
/// `neighbor_offsets[nelements]` entries.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn near_field_evaluate_c64(
    nelements: usize,
    npoints: usize,
    geometry: *const c_void,
    neighbor_indices: *const usize,
    neighbor_offsets: *const usize,
    local_points: *const c_void,
    coefficients: *const c_void,
    kernel_parameters: *const c_void,
    max_points: usize,
    result: *mut c_void,
    multithreaded: bool,
) -> bool {
    near_field_evaluate_impl::<c64>(
        nelements,
        npoints,
        geometry,
        neighbor_indices,
        neighbor_offsets,
        local_points,
        coefficients,
        kernel_parameters,
        max_points,
        result,
        multithreaded,
    )
}

#[cfg(test)]
mod test {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evaluate_c64() {
        let geometry: [f64; 18] = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0,
        ];
        let indices: [usize; 2] = [1, 0];
        let offsets: [usize; 3] = [0, 1, 2];
        let local_points: [f64; 2] = [1.0 / 3.0, 1.0 / 3.0];
        let coefficients = [c64::new(1.0, 0.0), c64::new(0.0, 2.0)];
        let parameters: [f64; 2] = [1.5, 0.5];
        let mut result = vec![c64::new(0.0, 0.0); 8];

        let ok = unsafe {
            near_field_evaluate_c64(
                2,
                1,
                geometry.as_ptr() as *const c_void,
                indices.as_ptr(),
                offsets.as_ptr(),
                local_points.as_ptr() as *const c_void,
                coefficients.as_ptr() as *const c_void,
                parameters.as_ptr() as *const c_void,
                16,
                result.as_mut_ptr() as *mut c_void,
                false,
            )
        };
        assert!(ok);

        // Centroids are one unit apart along z.
        let green = |r: f64| {
            c64::new(0.0, 1.5 * r).exp() * (-0.5 * r).exp() / (4.0 * std::f64::consts::PI * r)
        };
        let deriv = green(1.0) * c64::new(-1.5, 1.5);

        assert_relative_eq!(result[0], coefficients[1] * green(1.0), epsilon = 1E-14);
        assert_relative_eq!(result[3], -coefficients[1] * deriv, epsilon = 1E-14);
        assert_relative_eq!(result[4], coefficients[0] * green(1.0), epsilon = 1E-14);
        assert_relative_eq!(result[7], coefficients[0] * deriv, epsilon = 1E-14);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let geometry = [0.0_f32; 9];
        let indices: [usize; 1] = [3];
        let offsets: [usize; 2] = [0, 1];
        let local_points = [0.0_f32; 2];
        let coefficients = [c32::new(1.0, 0.0)];
        let mut result = vec![c32::new(7.0, 7.0); 4];

        let mut call = |parameters: [f32; 2]| unsafe {
            near_field_evaluate_c32(
                1,
                1,
                geometry.as_ptr() as *const c_void,
                indices.as_ptr(),
                offsets.as_ptr(),
                local_points.as_ptr() as *const c_void,
                coefficients.as_ptr() as *const c_void,
                parameters.as_ptr() as *const c_void,
                16,
                result.as_mut_ptr() as *mut c_void,
                true,
            )
        };

        // Negative absorption, then a neighbor index out of range.
        assert!(!call([1.0, -1.0]));
        assert!(!call([1.0, 0.0]));
        assert!(result.iter().all(|&value| value == c32::new(7.0, 7.0)));
    }
}
