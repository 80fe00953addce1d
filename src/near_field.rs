//! Near-field evaluation of the modified Helmholtz kernel between mesh elements
//!
//! For every target element the quadrature points of all its neighbors are gathered into a
//! contiguous [GatherBuffer]. Every quadrature point of the target element is then evaluated
//! against the gathered points, and the potential and its gradient are written to the result
//! at `4 * (npoints * element + point) + component`, component `0` being the potential and
//! `1, 2, 3` the derivatives in `x, y, z`.
//!
//! Elements are independent of each other. [NearFieldEvaluator::evaluate_mt] runs them on the
//! Rayon thread pool, every task owning its own buffer and writing a disjoint chunk of the result.
use crate::error::NearFieldError;
use crate::geometry::{AffineTriangleMap, NeighborIndex};
use crate::helpers::check_dimensions_near_field;
use crate::modified_helmholtz_3d::{
    combine_partial_sums, modified_helmholtz_partial_sums, ModifiedHelmholtz3dKernel,
};
use crate::traits::{ElementGeometry, ReferenceMap};
use crate::types::{EvalPath, EvalType};
use rayon::prelude::*;
use rlst::RlstScalar;

/// Default capacity of the gathered point buffer.
pub const DEFAULT_MAX_POINTS: usize = 4096;

/// Working buffer of gathered source points and their density coefficients.
///
/// Storage is allocated once with a fixed capacity. [GatherBuffer::gather] resets the length
/// before filling, so a buffer can serve one element after another without carrying data over.
pub struct GatherBuffer<T: RlstScalar> {
    points: Vec<T::Real>,
    charges: Vec<T>,
    len: usize,
}

impl<T: RlstScalar> GatherBuffer<T> {
    /// Create a buffer holding up to `capacity` points.
    pub fn new(capacity: usize) -> Self {
        Self {
            points: vec![<T::Real as num::Zero>::zero(); 3 * capacity],
            charges: vec![T::zero(); capacity],
            len: 0,
        }
    }

    /// Maximum number of points.
    pub fn capacity(&self) -> usize {
        self.charges.len()
    }

    /// Number of gathered points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no point is gathered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop all gathered points.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Gathered points as `[x_1, y_1, z_1, x_2, ...]`.
    pub fn points(&self) -> &[T::Real] {
        &self.points[..3 * self.len]
    }

    /// Gathered density coefficients, one per point.
    pub fn charges(&self) -> &[T] {
        &self.charges[..self.len]
    }

    /// Gather the quadrature points and coefficients of all neighbors of `element`.
    ///
    /// Points are ordered by neighbor, then by reference point. Panics if they do not fit
    /// into the buffer.
    pub fn gather<G, M>(
        &mut self,
        element: usize,
        neighbors: &NeighborIndex<'_>,
        geometry: &G,
        map: &M,
        reference_points: &[T::Real],
        coefficients: &[T],
    ) where
        G: ElementGeometry<T = T::Real>,
        M: ReferenceMap<T = T::Real>,
    {
        let npoints = reference_points.len() / 2;
        let required = neighbors.neighbor_count(element) * npoints;
        assert!(
            required <= self.capacity(),
            "Element {} needs {} gathered points, buffer capacity is {}.",
            element,
            required,
            self.capacity()
        );

        self.clear();

        for &neighbor in neighbors.neighbors(element) {
            let corners = geometry.corners(neighbor);
            let neighbor_coefficients = &coefficients[npoints * neighbor..npoints * (neighbor + 1)];

            for (local, &charge) in reference_points
                .chunks_exact(2)
                .zip(neighbor_coefficients)
            {
                let point = map.local_to_global(&corners, &[local[0], local[1]]);
                self.points[3 * self.len..3 * self.len + 3].copy_from_slice(&point);
                self.charges[self.len] = charge;
                self.len += 1;
            }
        }
    }
}

/// Near-field evaluator for the modified Helmholtz kernel on triangular elements.
#[derive(Clone, Debug)]
pub struct NearFieldEvaluator<T: RlstScalar<Complex = T>, M: ReferenceMap<T = T::Real>> {
    kernel: ModifiedHelmholtz3dKernel<T>,
    map: M,
    reference_points: Vec<T::Real>,
    max_points: usize,
    eval_path: EvalPath,
}

impl<T: RlstScalar<Complex = T> + Send + Sync> NearFieldEvaluator<T, AffineTriangleMap<T::Real>>
where
    T::Real: Send + Sync,
{
    /// Create new
    ///
    /// `reference_points` holds the `(ξ, η)` coordinates of the quadrature points on the
    /// reference triangle, shared by all elements.
    pub fn new(kernel: ModifiedHelmholtz3dKernel<T>, reference_points: Vec<T::Real>) -> Self {
        Self::with_map(kernel, AffineTriangleMap::new(), reference_points)
    }
}

impl<T: RlstScalar<Complex = T> + Send + Sync, M: ReferenceMap<T = T::Real>>
    NearFieldEvaluator<T, M>
where
    T::Real: Send + Sync,
{
    /// Create new with a custom reference map.
    pub fn with_map(
        kernel: ModifiedHelmholtz3dKernel<T>,
        map: M,
        reference_points: Vec<T::Real>,
    ) -> Self {
        Self {
            kernel,
            map,
            reference_points,
            max_points: DEFAULT_MAX_POINTS,
            eval_path: EvalPath::default(),
        }
    }

    /// Set the capacity of the per-element working buffer.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Set the path taken through the pairwise evaluator.
    pub fn with_eval_path(mut self, eval_path: EvalPath) -> Self {
        self.eval_path = eval_path;
        self
    }

    /// The kernel
    pub fn kernel(&self) -> &ModifiedHelmholtz3dKernel<T> {
        &self.kernel
    }

    /// Capacity of the per-element working buffer.
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Number of quadrature points per element.
    pub fn number_of_reference_points(&self) -> usize {
        self.reference_points.len() / 2
    }

    /// Create a working buffer sized for this evaluator.
    pub fn gather_buffer(&self) -> GatherBuffer<T> {
        GatherBuffer::new(self.max_points)
    }

    /// Check the input of a near-field pass.
    ///
    /// The evaluation routines assume valid input and panic or produce garbage otherwise.
    pub fn validate<G: ElementGeometry<T = T::Real>>(
        &self,
        geometry: &G,
        neighbors: &NeighborIndex<'_>,
        coefficients: &[T],
        result_len: usize,
    ) -> Result<(), NearFieldError> {
        self.kernel.check_parameters()?;

        if self.reference_points.len() % 2 != 0 {
            return Err(NearFieldError::OddReferencePoints {
                len: self.reference_points.len(),
            });
        }

        let nelements = geometry.element_count();
        let npoints = self.number_of_reference_points();
        let offsets = neighbors.offsets();
        let indices = neighbors.indices();

        if offsets.len() != nelements + 1 {
            return Err(NearFieldError::OffsetLength {
                len: offsets.len(),
                expected: nelements + 1,
            });
        }
        if offsets[0] != 0 {
            return Err(NearFieldError::InvalidOffsets { element: 0 });
        }

        for element in 0..nelements {
            let (start, end) = (offsets[element], offsets[element + 1]);
            if end < start || end > indices.len() {
                return Err(NearFieldError::InvalidOffsets { element });
            }

            if let Some(&neighbor) = indices[start..end].iter().find(|&&n| n >= nelements) {
                return Err(NearFieldError::NeighborOutOfRange {
                    element,
                    neighbor,
                    nelements,
                });
            }

            let required = (end - start) * npoints;
            if required > self.max_points {
                return Err(NearFieldError::CapacityExceeded {
                    element,
                    required,
                    capacity: self.max_points,
                });
            }
        }

        if coefficients.len() != nelements * npoints {
            return Err(NearFieldError::LengthMismatch {
                name: "coefficients",
                len: coefficients.len(),
                expected: nelements * npoints,
            });
        }
        if result_len != 4 * nelements * npoints {
            return Err(NearFieldError::LengthMismatch {
                name: "result",
                len: result_len,
                expected: 4 * nelements * npoints,
            });
        }

        Ok(())
    }

    /// Evaluate the near field of one target element.
    ///
    /// `result` receives `4 * npoints` values, the potential and the three gradient components
    /// for each quadrature point of the element. `buffer` is overwritten.
    pub fn evaluate_element<G: ElementGeometry<T = T::Real>>(
        &self,
        element: usize,
        geometry: &G,
        neighbors: &NeighborIndex<'_>,
        coefficients: &[T],
        buffer: &mut GatherBuffer<T>,
        result: &mut [T],
    ) {
        assert_eq!(
            result.len(),
            4 * self.number_of_reference_points(),
            "Wrong dimension for element result. {} != {}",
            result.len(),
            4 * self.number_of_reference_points()
        );

        buffer.gather(
            element,
            neighbors,
            geometry,
            &self.map,
            &self.reference_points,
            coefficients,
        );

        let corners = geometry.corners(element);

        for (local, values) in self
            .reference_points
            .chunks_exact(2)
            .zip(result.chunks_exact_mut(4))
        {
            let target = self.map.local_to_global(&corners, &[local[0], local[1]]);

            let (head, tail) = modified_helmholtz_partial_sums::<T>(
                EvalType::ValueDeriv,
                self.eval_path,
                &target,
                buffer.points(),
                buffer.charges(),
                self.kernel.wavenumber,
                self.kernel.absorption,
            );

            values.copy_from_slice(&combine_partial_sums::<T>(&head, &tail));
        }
    }

    /// Single threaded near-field evaluation of all elements.
    pub fn evaluate_st<G: ElementGeometry<T = T::Real>>(
        &self,
        geometry: &G,
        neighbors: &NeighborIndex<'_>,
        coefficients: &[T],
        result: &mut [T],
    ) {
        let nelements = geometry.element_count();
        let npoints = self.number_of_reference_points();
        check_dimensions_near_field(nelements, npoints, neighbors, coefficients, result);

        let _span = tracing::debug_span!("near_field_evaluate_st", nelements, npoints).entered();

        if npoints == 0 {
            return;
        }

        let mut buffer = self.gather_buffer();

        result
            .chunks_exact_mut(4 * npoints)
            .enumerate()
            .for_each(|(element, my_chunk)| {
                self.evaluate_element(
                    element,
                    geometry,
                    neighbors,
                    coefficients,
                    &mut buffer,
                    my_chunk,
                )
            });

        tracing::debug!(nelements, "near-field pass finished");
    }

    /// Multi-threaded near-field evaluation of all elements.
    ///
    /// The method parallelizes over the target elements on the current Rayon thread pool.
    pub fn evaluate_mt<G: ElementGeometry<T = T::Real>>(
        &self,
        geometry: &G,
        neighbors: &NeighborIndex<'_>,
        coefficients: &[T],
        result: &mut [T],
    ) {
        let nelements = geometry.element_count();
        let npoints = self.number_of_reference_points();
        check_dimensions_near_field(nelements, npoints, neighbors, coefficients, result);

        let _span = tracing::debug_span!(
            "near_field_evaluate_mt",
            nelements,
            npoints,
            nthreads = rayon::current_num_threads()
        )
        .entered();

        if npoints == 0 {
            return;
        }

        result
            .par_chunks_exact_mut(4 * npoints)
            .enumerate()
            .for_each_init(
                || self.gather_buffer(),
                |buffer, (element, my_chunk)| {
                    self.evaluate_element(
                        element,
                        geometry,
                        neighbors,
                        coefficients,
                        buffer,
                        my_chunk,
                    )
                },
            );

        tracing::debug!(nelements, "near-field pass finished");
    }
}
