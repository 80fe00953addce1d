//! Implementation of the modified Helmholtz kernel
//!
//! The kernel is `exp(i k r) exp(-η r) / (4 π r)` with wavenumber `k` and absorption `η`.
//! For `η = 0` it is the Helmholtz kernel and for `k = η = 0` the Laplace kernel.
use crate::error::NearFieldError;
use crate::helpers::check_dimensions_evaluate;
use crate::traits::Kernel;
use crate::types::{EvalPath, EvalType};
use num::traits::FloatConst;
use num::{One, Zero};
use pulp::Simd;
use rayon::prelude::*;
use rlst::{c32, c64, RlstScalar, RlstSimd, SimdFor};
use std::marker::PhantomData;

/// Accumulated `[re, im]` pairs of the potential and of the three gradient components.
pub type PartialSums<R> = [[R; 2]; 4];

/// Kernel for modified Helmholtz in 3D
#[derive(Clone, Copy, Debug, Default)]
pub struct ModifiedHelmholtz3dKernel<T: RlstScalar> {
    /// Wavenumber
    pub wavenumber: T::Real,
    /// Absorption
    pub absorption: T::Real,
    _phantom_t: PhantomData<T>,
}

impl<T: RlstScalar> ModifiedHelmholtz3dKernel<T> {
    /// Create new
    pub fn new(wavenumber: T::Real, absorption: T::Real) -> Self {
        Self {
            wavenumber,
            absorption,
            _phantom_t: PhantomData,
        }
    }

    /// Create from the flat kernel parameter buffer `[wavenumber, absorption]`.
    pub fn from_parameters(parameters: &[T::Real]) -> Result<Self, NearFieldError> {
        let &[wavenumber, absorption] = parameters else {
            return Err(NearFieldError::KernelParameterCount {
                len: parameters.len(),
            });
        };

        let kernel = Self::new(wavenumber, absorption);
        kernel.check_parameters()?;
        Ok(kernel)
    }

    /// Check that wavenumber and absorption are finite and not negative.
    pub fn check_parameters(&self) -> Result<(), NearFieldError> {
        let as_f64 = |value: T::Real| num::cast::<T::Real, f64>(value).unwrap_or(f64::NAN);
        let (k, eta) = (as_f64(self.wavenumber), as_f64(self.absorption));
        if !(k.is_finite() && eta.is_finite() && k >= 0.0 && eta >= 0.0) {
            return Err(NearFieldError::InvalidKernelParameters {
                wavenumber: k,
                absorption: eta,
            });
        }
        Ok(())
    }
}

impl<T: RlstScalar<Complex = T> + Send + Sync> Kernel for ModifiedHelmholtz3dKernel<T>
where
    <T as RlstScalar>::Real: Send + Sync,
{
    type T = T;

    fn domain_component_count(&self) -> usize {
        1
    }

    fn space_dimension(&self) -> usize {
        3
    }

    fn evaluate_st(
        &self,
        eval_type: EvalType,
        sources: &[<Self::T as RlstScalar>::Real],
        targets: &[<Self::T as RlstScalar>::Real],
        charges: &[Self::T],
        result: &mut [Self::T],
    ) {
        check_dimensions_evaluate(self, eval_type, sources, targets, charges, result);
        let range_dim = self.range_component_count(eval_type);

        result
            .chunks_exact_mut(range_dim)
            .enumerate()
            .for_each(|(target_index, my_chunk)| {
                let target = [
                    targets[3 * target_index],
                    targets[3 * target_index + 1],
                    targets[3 * target_index + 2],
                ];

                let values = evaluate_modified_helmholtz_one_target(
                    eval_type,
                    EvalPath::Vectorized,
                    &target,
                    sources,
                    charges,
                    self.wavenumber,
                    self.absorption,
                );

                for (r, v) in my_chunk.iter_mut().zip(values) {
                    *r += v;
                }
            });
    }

    fn evaluate_mt(
        &self,
        eval_type: EvalType,
        sources: &[<Self::T as RlstScalar>::Real],
        targets: &[<Self::T as RlstScalar>::Real],
        charges: &[Self::T],
        result: &mut [Self::T],
    ) {
        check_dimensions_evaluate(self, eval_type, sources, targets, charges, result);
        let range_dim = self.range_component_count(eval_type);

        result
            .par_chunks_exact_mut(range_dim)
            .enumerate()
            .for_each(|(target_index, my_chunk)| {
                let target = [
                    targets[3 * target_index],
                    targets[3 * target_index + 1],
                    targets[3 * target_index + 2],
                ];

                let values = evaluate_modified_helmholtz_one_target(
                    eval_type,
                    EvalPath::Vectorized,
                    &target,
                    sources,
                    charges,
                    self.wavenumber,
                    self.absorption,
                );

                for (r, v) in my_chunk.iter_mut().zip(values) {
                    *r += v;
                }
            });
    }

    fn greens_fct(
        &self,
        eval_type: EvalType,
        source: &[<Self::T as RlstScalar>::Real],
        target: &[<Self::T as RlstScalar>::Real],
        result: &mut [Self::T],
    ) {
        assert_eq!(source.len(), 3);
        assert_eq!(target.len(), 3);

        let zero_real = <T::Real as Zero>::zero();
        let one_real = <T::Real as One>::one();
        let m_inv_4pi = num::cast::<f64, T::Real>(0.25 * f64::FRAC_1_PI()).unwrap();

        let diff0 = target[0] - source[0];
        let diff1 = target[1] - source[1];
        let diff2 = target[2] - source[2];
        let diff_norm = (diff0 * diff0 + diff1 * diff1 + diff2 * diff2).sqrt();

        // Also zero for distinct points whose squared distance underflows.
        let inv_diff_norm = {
            if diff_norm == zero_real {
                zero_real
            } else {
                one_real / diff_norm
            }
        };

        let radial = if self.absorption == zero_real {
            inv_diff_norm
        } else {
            (-self.absorption * diff_norm).exp() * inv_diff_norm
        };

        let kr: T::Real = diff_norm * self.wavenumber;
        let green = T::complex(kr.cos(), kr.sin()).mul_real(radial * m_inv_4pi);

        match eval_type {
            EvalType::Value => result[0] = green,
            EvalType::ValueDeriv => {
                let green_diff = green.mul_real(inv_diff_norm * inv_diff_norm)
                    * T::complex(-(one_real + self.absorption * diff_norm), kr);

                result[0] = green;
                result[1] = green_diff.mul_real(diff0);
                result[2] = green_diff.mul_real(diff1);
                result[3] = green_diff.mul_real(diff2);
            }
        }
    }

    fn range_component_count(&self, eval_type: EvalType) -> usize {
        modified_helmholtz_component_count(eval_type)
    }
}

/// Evaluate the modified Helmholtz kernel for one target against all sources.
///
/// Returns the charge weighted potential and, for [EvalType::ValueDeriv], the three
/// components of its gradient with respect to the target. Unused entries are zero.
pub fn evaluate_modified_helmholtz_one_target<T: RlstScalar<Complex = T>>(
    eval_type: EvalType,
    eval_path: EvalPath,
    target: &[T::Real],
    sources: &[T::Real],
    charges: &[T],
    wavenumber: T::Real,
    absorption: T::Real,
) -> [T; 4] {
    let (head, tail) = modified_helmholtz_partial_sums::<T>(
        eval_type, eval_path, target, sources, charges, wavenumber, absorption,
    );
    combine_partial_sums::<T>(&head, &tail)
}

/// Sum the lane-group and remainder partial sums and apply the `1 / 4π` factor.
pub fn combine_partial_sums<T: RlstScalar<Complex = T>>(
    head: &PartialSums<T::Real>,
    tail: &PartialSums<T::Real>,
) -> [T; 4] {
    let m_inv_4pi = num::cast::<f64, T::Real>(0.25 * f64::FRAC_1_PI()).unwrap();

    std::array::from_fn(|component| {
        T::complex(
            head[component][0] + tail[component][0],
            head[component][1] + tail[component][1],
        )
        .mul_real(m_inv_4pi)
    })
}

/// Unscaled partial sums of one target against all sources.
///
/// The first entry holds the sums over the complete SIMD lane groups, the second entry the
/// sums over the remaining sources at lane width one. With [EvalPath::Scalar] every source
/// is treated as remainder and the first entry is zero.
pub fn modified_helmholtz_partial_sums<T: RlstScalar<Complex = T>>(
    eval_type: EvalType,
    eval_path: EvalPath,
    target: &[T::Real],
    sources: &[T::Real],
    charges: &[T],
    wavenumber: T::Real,
    absorption: T::Real,
) -> (PartialSums<T::Real>, PartialSums<T::Real>) {
    assert_eq!(target.len(), 3);
    assert_eq!(sources.len(), 3 * charges.len());

    struct Impl<'a, T: RlstScalar<Complex = T>>
    where
        T::Real: RlstSimd,
    {
        eval_type: EvalType,
        eval_path: EvalPath,
        wavenumber: T::Real,
        absorption: T::Real,
        t0: T::Real,
        t1: T::Real,
        t2: T::Real,

        sources: &'a [T::Real],
        charges: &'a [T],
    }

    impl<T: RlstScalar<Complex = T>> pulp::WithSimd for Impl<'_, T>
    where
        T::Real: RlstSimd,
    {
        type Output = (PartialSums<T::Real>, PartialSums<T::Real>);

        #[inline(always)]
        fn with_simd<S: pulp::Simd>(self, simd: S) -> Self::Output {
            use coe::Coerce;

            let Self {
                eval_type,
                eval_path,
                wavenumber,
                absorption,
                t0,
                t1,
                t2,
                sources,
                charges,
            } = self;

            let target = [t0, t1, t2];
            let (sources, _) = pulp::as_arrays::<3, T::Real>(sources);
            let charges: &[[T::Real; 2]] = bytemuck::cast_slice(charges);

            match eval_path {
                EvalPath::Vectorized => {
                    let (sources_head, sources_tail) = <T::Real>::as_simd_slice_from_vec(sources);
                    let (charges_head, charges_tail) = <T::Real>::as_simd_slice_from_vec(charges);

                    let head = accumulate_slice::<T, S>(
                        simd,
                        eval_type,
                        wavenumber,
                        absorption,
                        target,
                        sources_head,
                        charges_head,
                    );
                    let tail = accumulate_slice::<T, pulp::Scalar>(
                        pulp::Scalar::new(),
                        eval_type,
                        wavenumber,
                        absorption,
                        target,
                        sources_tail.coerce(),
                        charges_tail.coerce(),
                    );
                    (head, tail)
                }
                EvalPath::Scalar => {
                    let tail = accumulate_slice::<T, pulp::Scalar>(
                        pulp::Scalar::new(),
                        eval_type,
                        wavenumber,
                        absorption,
                        target,
                        sources.coerce(),
                        charges.coerce(),
                    );
                    ([[<T::Real as Zero>::zero(); 2]; 4], tail)
                }
            }
        }
    }

    use coe::coerce_static as to;
    use coe::Coerce;
    if coe::is_same::<T, c32>() {
        let (head, tail) = pulp::Arch::new().dispatch(Impl::<'_, c32> {
            eval_type,
            eval_path,
            wavenumber: to(wavenumber),
            absorption: to(absorption),
            t0: to(target[0]),
            t1: to(target[1]),
            t2: to(target[2]),
            sources: sources.coerce(),
            charges: charges.coerce(),
        });
        (to(head), to(tail))
    } else if coe::is_same::<T, c64>() {
        let (head, tail) = pulp::Arch::new().dispatch(Impl::<'_, c64> {
            eval_type,
            eval_path,
            wavenumber: to(wavenumber),
            absorption: to(absorption),
            t0: to(target[0]),
            t1: to(target[1]),
            t2: to(target[2]),
            sources: sources.coerce(),
            charges: charges.coerce(),
        });
        (to(head), to(tail))
    } else {
        panic!("Type not implemented.")
    }
}

/// Accumulate the charge weighted kernel and its gradient over lane groups.
///
/// With `S = pulp::Scalar` every group is a single source point.
///
/// A pair counts as coincident when the computed distance is zero. Distinct points whose squared
/// distance underflows, below about `1e-23` apart in `f32` and `1e-162` in `f64`, are treated
/// the same way and contribute zero instead of an overflowing value.
#[inline(always)]
fn accumulate_slice<T: RlstScalar<Complex = T>, S: Simd>(
    simd: S,
    eval_type: EvalType,
    wavenumber: T::Real,
    absorption: T::Real,
    target: [T::Real; 3],
    sources: &[[<T::Real as RlstSimd>::Scalars<S>; 3]],
    charges: &[[<T::Real as RlstSimd>::Scalars<S>; 2]],
) -> PartialSums<T::Real>
where
    T::Real: RlstSimd,
{
    let with_decay = absorption != <T::Real as Zero>::zero();
    let with_deriv = eval_type == EvalType::ValueDeriv;

    let simd = SimdFor::<T::Real, S>::new(simd);

    let t0 = simd.splat(target[0]);
    let t1 = simd.splat(target[1]);
    let t2 = simd.splat(target[2]);
    let zero = simd.splat(<T::Real as Zero>::zero());
    let one = simd.splat(<T::Real as One>::one());
    let wavenumber = simd.splat(wavenumber);
    let absorption = simd.splat(absorption);

    let mut acc0_re = simd.splat(<T::Real as Zero>::zero());
    let mut acc0_im = simd.splat(<T::Real as Zero>::zero());
    let mut acc1_re = simd.splat(<T::Real as Zero>::zero());
    let mut acc1_im = simd.splat(<T::Real as Zero>::zero());
    let mut acc2_re = simd.splat(<T::Real as Zero>::zero());
    let mut acc2_im = simd.splat(<T::Real as Zero>::zero());
    let mut acc3_re = simd.splat(<T::Real as Zero>::zero());
    let mut acc3_im = simd.splat(<T::Real as Zero>::zero());

    for (&s, &c) in itertools::izip!(sources, charges) {
        let [sx, sy, sz] = simd.deinterleave(s);
        let [c_re, c_im] = simd.deinterleave(c);

        let diff0 = simd.sub(t0, sx);
        let diff1 = simd.sub(t1, sy);
        let diff2 = simd.sub(t2, sz);

        let diff_norm = simd.sqrt(simd.mul_add(
            diff0,
            diff0,
            simd.mul_add(diff1, diff1, simd.mul(diff2, diff2)),
        ));

        // Coincident points contribute nothing.
        let is_zero = simd.cmp_eq(diff_norm, zero);
        let inv_diff_norm = simd.select(is_zero, zero, simd.div(one, diff_norm));
        let kr = simd.mul(wavenumber, diff_norm);

        let radial = if with_decay {
            simd.mul(
                simd.exp(simd.neg(simd.mul(absorption, diff_norm))),
                inv_diff_norm,
            )
        } else {
            inv_diff_norm
        };

        let (g_re, g_im) = {
            let (s, c) = simd.sin_cos(kr);
            (simd.mul(c, radial), simd.mul(s, radial))
        };

        // Charge weighted value, reused by the derivatives.
        let (g_re, g_im) = (
            simd.mul_add(simd.neg(g_im), c_im, simd.mul(g_re, c_re)),
            simd.mul_add(g_im, c_re, simd.mul(g_re, c_im)),
        );

        acc0_re = simd.add(acc0_re, g_re);
        acc0_im = simd.add(acc0_im, g_im);

        if with_deriv {
            // Radial derivative factor (-1 - η r) + i k r.
            let f_re = simd.neg(simd.mul_add(absorption, diff_norm, one));
            let f_im = kr;

            let inv_diff_norm_squared = simd.mul(inv_diff_norm, inv_diff_norm);

            let (g_deriv_re, g_deriv_im) = (
                simd.mul(
                    simd.mul_add(g_re, f_re, simd.mul(simd.neg(g_im), f_im)),
                    inv_diff_norm_squared,
                ),
                simd.mul(
                    simd.mul_add(g_re, f_im, simd.mul(g_im, f_re)),
                    inv_diff_norm_squared,
                ),
            );

            acc1_re = simd.mul_add(g_deriv_re, diff0, acc1_re);
            acc1_im = simd.mul_add(g_deriv_im, diff0, acc1_im);

            acc2_re = simd.mul_add(g_deriv_re, diff1, acc2_re);
            acc2_im = simd.mul_add(g_deriv_im, diff1, acc2_im);

            acc3_re = simd.mul_add(g_deriv_re, diff2, acc3_re);
            acc3_im = simd.mul_add(g_deriv_im, diff2, acc3_im);
        }
    }

    [
        [simd.reduce_add(acc0_re), simd.reduce_add(acc0_im)],
        [simd.reduce_add(acc1_re), simd.reduce_add(acc1_im)],
        [simd.reduce_add(acc2_re), simd.reduce_add(acc2_im)],
        [simd.reduce_add(acc3_re), simd.reduce_add(acc3_im)],
    ]
}

fn modified_helmholtz_component_count(eval_type: EvalType) -> usize {
    match eval_type {
        EvalType::Value => 1,
        EvalType::ValueDeriv => 4,
    }
}
