//! Euclidean distance model.

use crate::error::{Error, Result};

/// A point in the plane.
pub type Point = [f64; 2];

/// Euclidean (L2) distance between two points.
pub fn distance(p: Point, q: Point) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    (dx * dx + dy * dy).sqrt()
}

/// Dense, symmetric matrix of pairwise distances.
///
/// Stored row-major in a single allocation. Built once and never mutated,
/// so it can be shared by reference across any number of walkers.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Computes all pairwise distances, O(n²).
    ///
    /// # Errors
    /// Returns [`Error::EmptyProblem`] if `points` is empty.
    pub fn new(points: &[Point]) -> Result<Self> {
        let n = points.len();
        if n == 0 {
            return Err(Error::EmptyProblem);
        }
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(points[i], points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Ok(Self { n, data })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `a` and `b`.
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.data[a * self.n + b]
    }

    /// Total length of the closed cycle visiting `tour` in order, O(n).
    ///
    /// Includes the edge from the last index back to the first.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        let np = tour.len();
        (0..np).map(|i| self.get(tour[i], tour[(i + 1) % np])).sum()
    }
}
