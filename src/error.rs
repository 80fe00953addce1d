//! Errors reported by upstream validation of near-field input.
//!
//! The evaluation routines themselves never return these. A driver calls
//! [crate::near_field::NearFieldEvaluator::validate] before dispatch and only
//! evaluates input that passed.

use thiserror::Error;

/// Malformed near-field input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NearFieldError {
    /// The kernel parameter buffer is not `[wavenumber, absorption]`.
    #[error("expected 2 kernel parameters, got {len}")]
    KernelParameterCount {
        /// Number of values supplied
        len: usize,
    },

    /// Wavenumber or absorption is negative or not finite.
    #[error("invalid kernel parameters: wavenumber {wavenumber}, absorption {absorption}")]
    InvalidKernelParameters {
        /// Supplied wavenumber
        wavenumber: f64,
        /// Supplied absorption
        absorption: f64,
    },

    /// The reference points are not stored as `(ξ, η)` pairs.
    #[error("reference point buffer has odd length {len}")]
    OddReferencePoints {
        /// Length of the buffer
        len: usize,
    },

    /// Offsets array length does not match the element count.
    #[error("neighbor offsets have length {len}, expected {expected}")]
    OffsetLength {
        /// Length of the offsets array
        len: usize,
        /// `elements + 1`
        expected: usize,
    },

    /// Offsets do not start at zero, decrease, or overrun the index array.
    #[error("neighbor offsets are not a valid row pointer at element {element}")]
    InvalidOffsets {
        /// First element whose neighbor range is malformed
        element: usize,
    },

    /// A neighbor entry names an element that does not exist.
    #[error("element {element} lists neighbor {neighbor}, but there are only {nelements} elements")]
    NeighborOutOfRange {
        /// Target element
        element: usize,
        /// Offending neighbor index
        neighbor: usize,
        /// Number of elements
        nelements: usize,
    },

    /// Gathering the neighbors of an element would overflow the working buffer.
    #[error("element {element} needs {required} gathered points, capacity is {capacity}")]
    CapacityExceeded {
        /// Target element
        element: usize,
        /// Gathered point count
        required: usize,
        /// Working buffer capacity
        capacity: usize,
    },

    /// A flat buffer has the wrong number of entries.
    #[error("{name} has length {len}, expected {expected}")]
    LengthMismatch {
        /// Buffer name
        name: &'static str,
        /// Actual length
        len: usize,
        /// Required length
        expected: usize,
    },
}
