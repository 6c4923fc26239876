//! Move classes: neighbourhood operators with O(1) incremental cost.
//!
//! Each move class pairs an in-place perturbation of a tour with a function
//! computing the resulting change in tour length without touching the tour.
//! For every valid pair of positions the two must agree:
//!
//! ```text
//! tour_length(apply(i, j, tour)) == tour_length(tour) + delta(i, j, tour)
//! ```
//!
//! Segment reversal is the stronger neighbourhood on every instance tried so
//! far; index swap is kept as an interchangeable alternative.

pub mod reverse;
pub mod swap;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::problem::DistanceMatrix;

/// Selects the neighbourhood operator used by a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MoveClass {
    /// Reverse the segment between two positions (2-opt).
    #[default]
    Reverse,
    /// Exchange the points at two positions.
    Swap,
}

impl MoveClass {
    /// Applies the move to `tour` in place.
    ///
    /// Both indices must be `< tour.len()`.
    #[inline]
    pub fn apply(self, i: usize, j: usize, tour: &mut [usize]) {
        match self {
            MoveClass::Reverse => reverse::apply(i, j, tour),
            MoveClass::Swap => swap::apply(i, j, tour),
        }
    }

    /// Change in tour length that [`apply`](Self::apply) would cause.
    #[inline]
    pub fn delta(self, i: usize, j: usize, tour: &[usize], dist: &DistanceMatrix) -> f64 {
        match self {
            MoveClass::Reverse => reverse::delta(i, j, tour, dist),
            MoveClass::Swap => swap::delta(i, j, tour, dist),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MoveClass::Reverse => "reverse",
            MoveClass::Swap => "swap",
        }
    }
}

impl fmt::Display for MoveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MoveClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reverse" => Ok(MoveClass::Reverse),
            "swap" => Ok(MoveClass::Swap),
            other => Err(Error::UnknownMoveClass(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn is_permutation(tour: &[usize]) -> bool {
        let mut seen = vec![false; tour.len()];
        for &v in tour {
            if v >= tour.len() || seen[v] {
                return false;
            }
            seen[v] = true;
        }
        true
    }

    fn scattered(n: usize, seed: u64) -> (Problem, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..n)
            .map(|_| [rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)])
            .collect();
        let mut tour: Vec<usize> = (0..n).collect();
        tour.shuffle(&mut rng);
        (Problem::from_points(points).unwrap(), tour)
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("reverse".parse::<MoveClass>().unwrap(), MoveClass::Reverse);
        assert_eq!(" Swap ".parse::<MoveClass>().unwrap(), MoveClass::Swap);
        assert!(matches!(
            "or-opt".parse::<MoveClass>(),
            Err(Error::UnknownMoveClass(_))
        ));
        assert_eq!(MoveClass::default(), MoveClass::Reverse);
        assert_eq!(MoveClass::Swap.to_string(), "swap");
    }

    #[test]
    fn test_exhaustive_pairs_small_tour() {
        let (problem, tour) = scattered(8, 7);
        let dist = problem.distances();
        let before = dist.tour_length(&tour);
        for mc in [MoveClass::Reverse, MoveClass::Swap] {
            for i in 0..8 {
                for j in 0..8 {
                    let d = mc.delta(i, j, &tour, dist);
                    let mut after = tour.clone();
                    mc.apply(i, j, &mut after);
                    let actual = dist.tour_length(&after);
                    assert!(
                        (actual - (before + d)).abs() <= 1e-9 * before,
                        "{mc} ({i},{j}): {actual} vs {}",
                        before + d
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_delta_matches_recomputation(
            n in 2usize..40,
            seed in any::<u64>(),
            pairs in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 1..60),
            swap in any::<bool>(),
        ) {
            let mc = if swap { MoveClass::Swap } else { MoveClass::Reverse };
            let (problem, mut tour) = scattered(n, seed);
            let dist = problem.distances();
            let mut energy = dist.tour_length(&tour);
            for (a, b) in pairs {
                let (i, j) = (a.index(n), b.index(n));
                let d = mc.delta(i, j, &tour, dist);
                let before = dist.tour_length(&tour);
                mc.apply(i, j, &mut tour);
                let after = dist.tour_length(&tour);
                prop_assert!((after - (before + d)).abs() <= 1e-9 * before.max(1.0));
                energy += d;
            }
            // accumulated deltas track the ground truth
            let truth = dist.tour_length(&tour);
            prop_assert!((energy - truth).abs() <= 1e-8 * truth.max(1.0));
        }

        #[test]
        fn prop_moves_preserve_permutation(
            n in 1usize..50,
            moves in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>(), any::<bool>()), 0..100),
        ) {
            let mut tour: Vec<usize> = (0..n).rev().collect();
            for (a, b, swap) in moves {
                let mc = if swap { MoveClass::Swap } else { MoveClass::Reverse };
                mc.apply(a.index(n), b.index(n), &mut tour);
            }
            prop_assert_eq!(tour.len(), n);
            prop_assert!(is_permutation(&tour));
        }
    }
}
