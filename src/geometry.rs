//! Flat-buffer views of the mesh collaborators

use crate::traits::{ElementGeometry, ReferenceMap};
use rlst::RlstScalar;
use std::marker::PhantomData;

/// Compressed sparse row view of the element neighbor lists.
///
/// The neighbors of element `e` are `indices[offsets[e]..offsets[e + 1]]`.
#[derive(Clone, Copy, Debug)]
pub struct NeighborIndex<'a> {
    indices: &'a [usize],
    offsets: &'a [usize],
}

impl<'a> NeighborIndex<'a> {
    /// Create new
    pub fn new(indices: &'a [usize], offsets: &'a [usize]) -> Self {
        assert!(
            !offsets.is_empty(),
            "Neighbor offsets need at least one entry."
        );
        Self { indices, offsets }
    }

    /// Number of target elements described by the offsets.
    pub fn element_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Ordered neighbor list of `element`.
    pub fn neighbors(&self, element: usize) -> &'a [usize] {
        &self.indices[self.offsets[element]..self.offsets[element + 1]]
    }

    /// Number of neighbors of `element`.
    pub fn neighbor_count(&self, element: usize) -> usize {
        self.offsets[element + 1] - self.offsets[element]
    }

    /// Flat neighbor index array
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    /// Row pointer array
    pub fn offsets(&self) -> &'a [usize] {
        self.offsets
    }
}

/// Triangle corners stored as `[x0, y0, z0, x1, y1, z1, x2, y2, z2]` per element.
#[derive(Clone, Copy, Debug)]
pub struct FlatTriangleGeometry<'a, T: RlstScalar<Real = T>> {
    coordinates: &'a [T],
}

impl<'a, T: RlstScalar<Real = T>> FlatTriangleGeometry<'a, T> {
    /// Create new
    pub fn new(coordinates: &'a [T]) -> Self {
        assert_eq!(
            coordinates.len() % 9,
            0,
            "Geometry length {} is not a multiple of 9.",
            coordinates.len()
        );
        Self { coordinates }
    }
}

impl<T: RlstScalar<Real = T> + Send + Sync> ElementGeometry for FlatTriangleGeometry<'_, T> {
    type T = T;

    fn element_count(&self) -> usize {
        self.coordinates.len() / 9
    }

    fn corners(&self, element: usize) -> [[T; 3]; 3] {
        let c = &self.coordinates[9 * element..9 * element + 9];
        [[c[0], c[1], c[2]], [c[3], c[4], c[5]], [c[6], c[7], c[8]]]
    }
}

/// Affine map of the reference triangle `(0, 0), (1, 0), (0, 1)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AffineTriangleMap<T: RlstScalar<Real = T>> {
    _phantom_t: PhantomData<T>,
}

impl<T: RlstScalar<Real = T>> AffineTriangleMap<T> {
    /// Create new
    pub fn new() -> Self {
        Self {
            _phantom_t: PhantomData,
        }
    }
}

impl<T: RlstScalar<Real = T> + Send + Sync> ReferenceMap for AffineTriangleMap<T> {
    type T = T;

    #[inline]
    fn local_to_global(&self, corners: &[[T; 3]; 3], local: &[T; 2]) -> [T; 3] {
        let [v0, v1, v2] = corners;
        let [xi, eta] = *local;
        [
            v0[0] + xi * (v1[0] - v0[0]) + eta * (v2[0] - v0[0]),
            v0[1] + xi * (v1[1] - v0[1]) + eta * (v2[1] - v0[1]),
            v0[2] + xi * (v1[2] - v0[2]) + eta * (v2[2] - v0[2]),
        ]
    }
}
