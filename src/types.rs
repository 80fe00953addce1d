//! Type definitions

/// Evaluation Mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub enum EvalType {
    /// Only values required
    Value,
    /// Both values and derivatives required
    ValueDeriv,
}

/// Path taken through the pairwise evaluator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvalPath {
    /// Full SIMD lane groups followed by the scalar remainder.
    #[default]
    Vectorized,
    /// Every source point at lane width one.
    Scalar,
}
