//! Self-test harness for move classes.
//!
//! Checks that incremental deltas agree with full recomputation along a
//! random walk of applied moves, and times the three primitive operations
//! a walker performs per iteration.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::moves::MoveClass;
use crate::problem::Problem;
use crate::sa::random_tour;

/// Outcome of [`check_deltas`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaReport {
    pub trials: usize,
    /// Moves whose delta disagreed with recomputation.
    pub errors: usize,
    /// Largest absolute disagreement observed.
    pub max_error: f64,
}

impl DeltaReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

fn random_pair<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    (rng.random_range(0..n), rng.random_range(0..n))
}

/// Applies `trials` random moves to a random tour, counting those where
/// `|old + delta - new| > tolerance`.
pub fn check_deltas<R: Rng>(
    problem: &Problem,
    moves: MoveClass,
    trials: usize,
    tolerance: f64,
    rng: &mut R,
) -> DeltaReport {
    let n = problem.len();
    let dist = problem.distances();
    let mut report = DeltaReport {
        trials,
        errors: 0,
        max_error: 0.0,
    };
    if n == 0 {
        return report;
    }

    let mut tour = random_tour(n, rng);
    let mut energy = dist.tour_length(&tour);
    for _ in 0..trials {
        let (i, j) = random_pair(n, rng);
        let delta = moves.delta(i, j, &tour, dist);
        moves.apply(i, j, &mut tour);
        let fresh = dist.tour_length(&tour);

        let err = (energy + delta - fresh).abs();
        report.max_error = report.max_error.max(err);
        if err > tolerance {
            report.errors += 1;
        }
        // resync so one bad delta is counted once
        energy = fresh;
    }
    report
}

/// Time to apply `trials` random moves.
pub fn time_moves<R: Rng>(problem: &Problem, moves: MoveClass, trials: usize, rng: &mut R) -> Duration {
    let n = problem.len();
    if n == 0 {
        return Duration::ZERO;
    }
    let mut tour = random_tour(n, rng);
    let pairs: Vec<_> = (0..trials).map(|_| random_pair(n, rng)).collect();

    let start = Instant::now();
    for &(i, j) in &pairs {
        moves.apply(i, j, &mut tour);
    }
    std::hint::black_box(&tour);
    start.elapsed()
}

/// Time to evaluate `trials` random deltas without applying them.
pub fn time_deltas<R: Rng>(problem: &Problem, moves: MoveClass, trials: usize, rng: &mut R) -> Duration {
    let n = problem.len();
    if n == 0 {
        return Duration::ZERO;
    }
    let dist = problem.distances();
    let tour = random_tour(n, rng);
    let pairs: Vec<_> = (0..trials).map(|_| random_pair(n, rng)).collect();

    let start = Instant::now();
    let mut total = 0.0;
    for &(i, j) in &pairs {
        total += moves.delta(i, j, &tour, dist);
    }
    std::hint::black_box(total);
    start.elapsed()
}

/// Time to apply `trials` random moves, recomputing the full tour length
/// after each.
pub fn time_move_and_energy<R: Rng>(
    problem: &Problem,
    moves: MoveClass,
    trials: usize,
    rng: &mut R,
) -> Duration {
    let n = problem.len();
    if n == 0 {
        return Duration::ZERO;
    }
    let dist = problem.distances();
    let mut tour = random_tour(n, rng);
    let pairs: Vec<_> = (0..trials).map(|_| random_pair(n, rng)).collect();

    let start = Instant::now();
    let mut total = 0.0;
    for &(i, j) in &pairs {
        moves.apply(i, j, &mut tour);
        total += dist.tour_length(&tour);
    }
    std::hint::black_box(total);
    start.elapsed()
}

/// Results of the full self-test for one move class.
#[derive(Debug, Clone, Copy)]
pub struct SelfTest {
    pub moves: MoveClass,
    pub deltas: DeltaReport,
    pub move_time: Duration,
    pub delta_time: Duration,
    pub move_and_energy_time: Duration,
}

/// Runs every check and timing for `moves`.
pub fn self_test<R: Rng>(
    problem: &Problem,
    moves: MoveClass,
    trials: usize,
    tolerance: f64,
    rng: &mut R,
) -> SelfTest {
    SelfTest {
        moves,
        deltas: check_deltas(problem, moves, trials, tolerance, rng),
        move_time: time_moves(problem, moves, trials, rng),
        delta_time: time_deltas(problem, moves, trials, rng),
        move_and_energy_time: time_move_and_energy(problem, moves, trials, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_deltas_clean_on_polygon() {
        let problem = Problem::polygon(50).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for moves in [MoveClass::Reverse, MoveClass::Swap] {
            let report = check_deltas(&problem, moves, 5_000, 1e-9, &mut rng);
            assert_eq!(report.trials, 5_000);
            assert!(report.is_clean(), "{moves}: {report:?}");
        }
    }

    #[test]
    fn test_deltas_clean_on_random_points() {
        let mut rng = StdRng::seed_from_u64(21);
        let points = (0..40)
            .map(|_| [rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0)])
            .collect();
        let problem = Problem::from_points(points).unwrap();
        for moves in [MoveClass::Reverse, MoveClass::Swap] {
            assert!(check_deltas(&problem, moves, 2_000, 1e-7, &mut rng).is_clean());
        }
    }

    #[test]
    fn test_negative_tolerance_flags_every_move() {
        // any non-negative error exceeds a negative tolerance
        let problem = Problem::polygon(10).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let report = check_deltas(&problem, MoveClass::Swap, 100, -1.0, &mut rng);
        assert_eq!(report.errors, 100);
    }

    #[test]
    fn test_self_test_runs_all_parts() {
        let problem = Problem::polygon(30).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let result = self_test(&problem, MoveClass::Reverse, 500, 1e-9, &mut rng);
        assert_eq!(result.moves, MoveClass::Reverse);
        assert!(result.deltas.is_clean());
        assert_eq!(result.deltas.trials, 500);
    }
}
