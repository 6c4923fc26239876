//! Segment reversal (2-opt): reverse the tour between two positions.

use crate::problem::DistanceMatrix;

/// Reverses `tour[min(i,j)..=max(i,j)]` in place.
pub fn apply(i: usize, j: usize, tour: &mut [usize]) {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    tour[lo..=hi].reverse();
}

/// Length change caused by [`apply`], without mutating the tour.
///
/// Only the edges entering and leaving the reversed segment change:
/// `(t[lo-1], t[lo])` and `(t[hi], t[hi+1])` become `(t[lo-1], t[hi])` and
/// `(t[lo], t[hi+1])`, indices taken mod n.
pub fn delta(i: usize, j: usize, tour: &[usize], dist: &DistanceMatrix) -> f64 {
    let np = tour.len();
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    // no edge changes: empty reversal, or the whole cycle read backwards
    if lo == hi || (lo == 0 && hi == np - 1) {
        return 0.0;
    }

    let before = tour[(lo + np - 1) % np];
    let first = tour[lo];
    let last = tour[hi];
    let after = tour[(hi + 1) % np];

    // paired so that a segment of n-1 points (before == after) gives exactly 0
    (dist.get(before, last) - dist.get(last, after)) + (dist.get(first, after) - dist.get(before, first))
}
