//! Index swap: exchange the points at two tour positions.

use crate::problem::DistanceMatrix;

/// Swaps `tour[i]` and `tour[j]`.
pub fn apply(i: usize, j: usize, tour: &mut [usize]) {
    tour.swap(i, j);
}

/// Length change caused by [`apply`], without mutating the tour.
///
/// Adjacent positions share an edge that survives the swap, so only two edges
/// change; otherwise the four edges around `i` and `j` are replaced.
pub fn delta(i: usize, j: usize, tour: &[usize], dist: &DistanceMatrix) -> f64 {
    let np = tour.len();
    // every ordering of three or fewer points is the same cycle
    if i == j || np <= 3 {
        return 0.0;
    }

    let prev = |k: usize| tour[(k + np - 1) % np];
    let next = |k: usize| tour[(k + 1) % np];
    let (a, b) = (tour[i], tour[j]);

    if j == (i + np - 1) % np {
        // j immediately before i: ... p, b, a, q ...
        let (p, q) = (prev(j), next(i));
        dist.get(p, a) + dist.get(b, q) - dist.get(p, b) - dist.get(a, q)
    } else if i == (j + np - 1) % np {
        // i immediately before j: ... p, a, b, q ...
        let (p, q) = (prev(i), next(j));
        dist.get(p, b) + dist.get(a, q) - dist.get(p, a) - dist.get(b, q)
    } else {
        let (pi, ni) = (prev(i), next(i));
        let (pj, nj) = (prev(j), next(j));
        dist.get(pi, b) + dist.get(b, ni) + dist.get(pj, a) + dist.get(a, nj)
            - dist.get(pi, a)
            - dist.get(a, ni)
            - dist.get(pj, b)
            - dist.get(b, nj)
    }
}
