//! Traits for Green's function kernels and the mesh collaborators of the near-field pass

use crate::types::EvalType;
use rlst::RlstScalar;

/// Interface to evaluating Green's functions for given sources and targets.
pub trait Kernel: Sync {
    /// The scalar type
    type T: RlstScalar;

    /// Evaluate the Green's fct. for a single source and single target.
    ///
    /// For [EvalType::ValueDeriv] the derivative is taken with respect to the target.
    fn greens_fct(
        &self,
        eval_type: EvalType,
        source: &[<Self::T as RlstScalar>::Real],
        target: &[<Self::T as RlstScalar>::Real],
        result: &mut [Self::T],
    );

    /// Single threaded evaluation of Green's functions.
    ///
    /// - `eval_type`: Either [EvalType::Value] to only return Green's function values
    ///              or [EvalType::ValueDeriv] to return values and derivatives.
    /// - `sources`: A slice defining the source points. The points must be given in the form
    ///            `[x_1, y_1, z_1, x_2, y_2, z_2, ...]`, that is the three coordinates of each
    ///            point are consecutive in memory.
    /// - `targets`: A slice defining the targets. The memory layout is the same as for sources.
    /// - `charges`: A slice defining the charges. For each source point there needs to be one charge.
    /// - `result`: The result array. For [EvalType::Value] it has one entry per target. For
    ///           [EvalType::ValueDeriv] it contains for each target in consecutive order the value
    ///           of the potential and the three components of its gradient.
    ///
    /// Contributions are added to `result`.
    fn evaluate_st(
        &self,
        eval_type: EvalType,
        sources: &[<Self::T as RlstScalar>::Real],
        targets: &[<Self::T as RlstScalar>::Real],
        charges: &[Self::T],
        result: &mut [Self::T],
    );

    /// Multi-threaded evaluation of a Green's function kernel.
    ///
    /// The method parallelizes over the given targets on the current Rayon thread pool.
    fn evaluate_mt(
        &self,
        eval_type: EvalType,
        sources: &[<Self::T as RlstScalar>::Real],
        targets: &[<Self::T as RlstScalar>::Real],
        charges: &[Self::T],
        result: &mut [Self::T],
    );

    /// Return the domain component count of the Green's fct.
    fn domain_component_count(&self) -> usize;

    /// Return the space dimension.
    fn space_dimension(&self) -> usize;

    /// Return the range component count of the Green's fct.
    ///
    /// This is `1` if [EvalType::Value] is given, and `4` if [EvalType::ValueDeriv] is given.
    fn range_component_count(&self, eval_type: EvalType) -> usize;
}

/// Access to the corner points of flat triangular elements.
pub trait ElementGeometry: Sync {
    /// Real scalar type of the coordinates
    type T: RlstScalar<Real = Self::T>;

    /// Number of elements
    fn element_count(&self) -> usize;

    /// The three corners of `element`.
    fn corners(&self, element: usize) -> [[Self::T; 3]; 3];
}

/// Map from the unit reference triangle to a physical element.
pub trait ReferenceMap: Sync {
    /// Real scalar type of the coordinates
    type T: RlstScalar<Real = Self::T>;

    /// Global point of the reference coordinate `local` on the element with `corners`.
    fn local_to_global(&self, corners: &[[Self::T; 3]; 3], local: &[Self::T; 2]) -> [Self::T; 3];
}
