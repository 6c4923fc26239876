//! The annealing walker: one tour, one random source, one parameter copy.
//!
//! Both execution modes share a single iterate-and-cool loop:
//!
//! - [`Walker::run`] (search) repeats periods until the iteration budget is
//!   spent, the countdown rule fires, or the search is cancelled.
//! - [`Walker::explore`] runs a fixed number of stages, each a burn-in
//!   followed by a sampled period, and reports one [`Packet`] per stage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::config::AnnealParams;
use super::schedule::{Countdown, ScheduleState};
use super::types::{ExploreSummary, Packet, Sample, SearchResult, StopReason};
use crate::error::{Error, Result};
use crate::moves::MoveClass;
use crate::problem::Problem;

/// Metropolis acceptance rule.
///
/// Improvements are always accepted; otherwise the move is accepted with
/// probability `exp(-delta / temperature)`. At zero temperature only strict
/// improvements pass.
#[inline]
pub fn metropolis<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta < 0.0 {
        true
    } else if temperature > 0.0 {
        rng.random::<f64>() < (-delta / temperature).exp()
    } else {
        false
    }
}

/// A uniformly random permutation of `0..n`.
pub fn random_tour<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut tour: Vec<usize> = (0..n).collect();
    tour.shuffle(rng);
    tour
}

/// A single simulated-annealing walker over a borrowed [`Problem`].
#[derive(Debug)]
pub struct Walker<'a> {
    id: usize,
    problem: &'a Problem,
    params: AnnealParams,
    moves: MoveClass,
    rng: StdRng,
    tour: Vec<usize>,
    energy: f64,
    best_energy: f64,
    best_tour: Vec<usize>,
    temperature: f64,
    schedule: ScheduleState,
    iterations: usize,
    period_iterations: usize,
    period_accepted: usize,
    accepted: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Walker<'a> {
    /// Creates a walker starting from a random tour.
    ///
    /// The random source is seeded from `params.seed`, or from entropy when
    /// no seed is set.
    pub fn new(
        id: usize,
        problem: &'a Problem,
        params: AnnealParams,
        moves: MoveClass,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(params.seed.unwrap_or_else(rand::random));
        let tour = random_tour(problem.len(), &mut rng);
        Self::build(id, problem, params, moves, rng, tour)
    }

    /// Creates a walker starting from `tour`.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if `tour` is not a permutation of the
    /// problem's point indices or the parameters are invalid.
    pub fn with_tour(
        id: usize,
        problem: &'a Problem,
        params: AnnealParams,
        moves: MoveClass,
        tour: Vec<usize>,
    ) -> Result<Self> {
        if !is_permutation(&tour, problem.len()) {
            return Err(Error::InvalidConfig(format!(
                "initial tour is not a permutation of 0..{}",
                problem.len()
            )));
        }
        let rng = StdRng::seed_from_u64(params.seed.unwrap_or_else(rand::random));
        Self::build(id, problem, params, moves, rng, tour)
    }

    fn build(
        id: usize,
        problem: &'a Problem,
        params: AnnealParams,
        moves: MoveClass,
        rng: StdRng,
        tour: Vec<usize>,
    ) -> Result<Self> {
        params.validate().map_err(Error::InvalidConfig)?;
        if problem.is_empty() {
            return Err(Error::EmptyProblem);
        }

        let energy = problem.tour_length(&tour);
        Ok(Self {
            id,
            problem,
            temperature: params.temperature,
            schedule: ScheduleState::new(params.schedule, params.cooling),
            params,
            moves,
            rng,
            best_tour: tour.clone(),
            tour,
            energy,
            best_energy: energy,
            iterations: 0,
            period_iterations: 0,
            period_accepted: 0,
            accepted: 0,
            cancel: None,
        })
    }

    /// Attaches a cancellation flag, checked at every period boundary.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn params(&self) -> &AnnealParams {
        &self.params
    }

    pub fn move_class(&self) -> MoveClass {
        self.moves
    }

    /// Current working tour.
    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    /// Running (incrementally updated) energy of the working tour.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn best_energy(&self) -> f64 {
        self.best_energy
    }

    pub fn best_tour(&self) -> &[usize] {
        &self.best_tour
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Iterations executed since creation.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// One Metropolis iteration: propose, accept or reject, update the best.
    #[inline]
    fn step(&mut self) {
        let n = self.tour.len();
        let i = self.rng.random_range(0..n);
        let j = self.rng.random_range(0..n);
        let delta = self.moves.delta(i, j, &self.tour, self.problem.distances());

        if metropolis(delta, self.temperature, &mut self.rng) {
            self.moves.apply(i, j, &mut self.tour);
            self.energy += delta;
            self.period_accepted += 1;
            if self.energy < self.best_energy {
                self.best_energy = self.energy;
                self.best_tour.copy_from_slice(&self.tour);
            }
        }

        self.schedule.record(self.energy);
        self.iterations += 1;
        self.period_iterations += 1;
    }

    /// Runs `n` iterations, handing each iteration's index and post-move
    /// energy to `observe`.
    fn sweep(&mut self, n: usize, mut observe: impl FnMut(usize, f64)) {
        for k in 0..n {
            self.step();
            observe(k, self.energy);
        }
    }

    /// Period boundary: log progress and let the schedule pick the next
    /// temperature.
    fn end_period(&mut self) {
        debug!(
            walker = self.id,
            iteration = self.iterations,
            temperature = self.temperature,
            acceptance = self.period_accepted as f64 / self.period_iterations.max(1) as f64,
            best = self.best_energy,
            "period complete"
        );
        self.accepted += self.period_accepted;
        self.period_accepted = 0;
        self.period_iterations = 0;
        self.temperature = self.schedule.end_bin(self.temperature);
    }

    /// Search mode.
    ///
    /// Runs up to `max_iterations` iterations. At every full period boundary
    /// the countdown rule is checked first, then the cooling schedule fires.
    pub fn run(&mut self) -> SearchResult {
        let start = Instant::now();
        let period = self.params.period;
        let budget = self.params.max_iterations;
        let accepted_before = self.accepted + self.period_accepted;
        let mut countdown = Countdown::new(
            self.params.countdown,
            self.params.stall_tolerance,
            self.best_energy,
        );
        let mut done = 0usize;
        let mut periods = 0usize;

        let stop = loop {
            if self.is_cancelled() {
                break StopReason::Cancelled;
            }
            let n = period.min(budget - done);
            if n == 0 {
                break StopReason::MaxIterations;
            }
            self.sweep(n, |_, _| {});
            done += n;
            if n < period {
                break StopReason::MaxIterations;
            }
            periods += 1;
            if countdown.check(self.best_energy) {
                break StopReason::Converged;
            }
            self.end_period();
        };

        let best_energy = self.problem.tour_length(&self.best_tour);
        let elapsed = start.elapsed();
        info!(
            walker = self.id,
            ?stop,
            iterations = done,
            "found distance {best_energy} in time {elapsed:?}"
        );

        SearchResult {
            best_tour: self.best_tour.clone(),
            best_energy,
            final_temperature: self.temperature,
            iterations: done,
            periods,
            accepted_moves: self.accepted + self.period_accepted - accepted_before,
            stop,
            elapsed,
        }
    }

    /// Explore mode.
    ///
    /// Runs `num_jobs` stages. Each stage burns in for `burnin` iterations,
    /// then runs `period` iterations recording the energy every
    /// `sample_stride`-th one. The stage's [`Packet`] goes to `emit` before
    /// the cooling schedule fires. `emit` returns `false` to stop early.
    pub fn explore(&mut self, num_jobs: usize, mut emit: impl FnMut(Packet) -> bool) -> ExploreSummary {
        let start = Instant::now();
        let burnin = self.params.burnin;
        let period = self.params.period;
        let stride = self.params.sample_stride;
        let mut stages = 0usize;
        let mut cancelled = false;

        for stage in 0..num_jobs {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            self.sweep(burnin, |_, _| {});

            let base = self.iterations;
            let mut samples = Vec::with_capacity(self.params.samples_per_stage());
            self.sweep(period, |k, energy| {
                if k % stride == 0 {
                    samples.push(Sample {
                        iteration: base + k,
                        energy,
                    });
                }
            });

            let packet = Packet {
                walker: self.id,
                stage,
                temperature: self.temperature,
                samples,
                best_energy: self.best_energy,
                best_tour: self.best_tour.clone(),
            };
            stages += 1;
            let keep_going = emit(packet);
            self.end_period();
            if !keep_going {
                break;
            }
        }

        let best_energy = self.problem.tour_length(&self.best_tour);
        let elapsed = start.elapsed();
        info!(walker = self.id, stages, "found distance {best_energy} in time {elapsed:?}");

        ExploreSummary {
            stages,
            best_energy,
            final_temperature: self.temperature,
            cancelled,
            elapsed,
        }
    }
}

fn is_permutation(tour: &[usize], n: usize) -> bool {
    if tour.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    tour.iter().all(|&v| v < n && !std::mem::replace(&mut seen[v], true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sa::CoolingSchedule;

    fn params() -> AnnealParams {
        AnnealParams::default()
            .with_temperature(1.0)
            .with_cooling(0.9)
            .with_period(500)
            .with_max_iterations(50_000)
            .with_countdown(20)
            .with_seed(42)
    }

    #[test]
    fn test_metropolis_rule() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(metropolis(-1.0, 0.0, &mut rng));
        assert!(!metropolis(0.0, 0.0, &mut rng));
        assert!(!metropolis(1.0, 0.0, &mut rng));
        // exp(-1000) is zero in f64
        assert!(!metropolis(1000.0, 1.0, &mut rng));

        let accepted = (0..10_000).filter(|_| metropolis(1.0, 1.0, &mut rng)).count();
        let ratio = accepted as f64 / 10_000.0;
        assert!((ratio - (-1.0f64).exp()).abs() < 0.03, "ratio {ratio}");
    }

    #[test]
    fn test_square_from_optimum_at_zero_temperature() {
        let problem = Problem::polygon(4).unwrap();
        let params = params().with_temperature(0.0).with_max_iterations(5_000);
        let mut w = Walker::with_tour(0, &problem, params, MoveClass::Reverse, vec![0, 1, 2, 3]).unwrap();
        let result = w.run();
        assert!((result.best_energy - 4.0 * 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(w.tour(), &[0, 1, 2, 3]);
        assert_eq!(result.best_tour, vec![0, 1, 2, 3]);
        assert_eq!(result.accepted_moves, 0);
    }

    #[test]
    fn test_with_tour_rejects_non_permutation() {
        let problem = Problem::polygon(4).unwrap();
        for bad in [vec![0, 1, 2], vec![0, 1, 1, 3], vec![0, 1, 2, 4]] {
            assert!(matches!(
                Walker::with_tour(0, &problem, params(), MoveClass::Reverse, bad),
                Err(Error::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let problem = Problem::polygon(5).unwrap();
        let bad = params().with_cooling(1.5);
        assert!(matches!(
            Walker::new(0, &problem, bad, MoveClass::Reverse),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_running_energy_tracks_tour_length() {
        let problem = Problem::polygon(60).unwrap();
        for moves in [MoveClass::Reverse, MoveClass::Swap] {
            let mut w = Walker::new(0, &problem, params().with_countdown(0), moves).unwrap();
            w.run();
            let truth = problem.tour_length(w.tour());
            assert!((w.energy() - truth).abs() < 1e-8 * truth, "{moves}");
            assert!(is_permutation(w.tour(), 60));
            assert!(is_permutation(w.best_tour(), 60));
        }
    }

    #[test]
    fn test_search_finds_polygon_optimum() {
        let n = 30;
        let problem = Problem::polygon(n).unwrap();
        let params = params()
            .with_temperature(0.5)
            .with_cooling(0.9)
            .with_period(2_000)
            .with_max_iterations(400_000)
            .with_countdown(30);
        let mut w = Walker::new(0, &problem, params, MoveClass::Reverse).unwrap();
        let result = w.run();
        let optimum = 2.0 * n as f64 * (std::f64::consts::PI / n as f64).sin();
        assert!(
            result.best_energy < optimum * 1.02,
            "best {} vs optimum {optimum}",
            result.best_energy
        );
        assert!(result.best_energy >= optimum - 1e-9);
    }

    #[test]
    fn test_max_iterations_limit() {
        let problem = Problem::polygon(20).unwrap();
        let params = params().with_period(300).with_max_iterations(1_000).with_countdown(0);
        let mut w = Walker::new(0, &problem, params, MoveClass::Swap).unwrap();
        let result = w.run();
        assert_eq!(result.stop, StopReason::MaxIterations);
        assert_eq!(result.iterations, 1_000);
        assert_eq!(result.periods, 3);
        assert_eq!(w.iterations(), 1_000);
    }

    #[test]
    fn test_countdown_terminates_when_best_is_frozen() {
        // at zero temperature from the optimum the best never changes
        let problem = Problem::polygon(8).unwrap();
        let tour: Vec<usize> = (0..8).collect();
        let params = params()
            .with_temperature(0.0)
            .with_period(100)
            .with_countdown(5)
            .with_max_iterations(1_000_000);
        let mut w = Walker::with_tour(0, &problem, params, MoveClass::Reverse, tour).unwrap();
        let result = w.run();
        assert_eq!(result.stop, StopReason::Converged);
        assert_eq!(result.periods, 5);
        assert_eq!(result.iterations, 500);
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = Problem::polygon(10).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let mut w = Walker::new(0, &problem, params(), MoveClass::Reverse)
            .unwrap()
            .with_cancel(flag.clone());
        let result = w.run();
        assert_eq!(result.stop, StopReason::Cancelled);
        assert_eq!(result.iterations, 0);

        let summary = w.explore(3, |_| true);
        assert!(summary.cancelled);
        assert_eq!(summary.stages, 0);
    }

    #[test]
    fn test_temperature_monotone_across_stages() {
        let problem = Problem::polygon(40).unwrap();
        for schedule in [CoolingSchedule::Standard, CoolingSchedule::adaptive()] {
            let params = params()
                .with_schedule(schedule)
                .with_period(200)
                .with_countdown(0);
            let mut w = Walker::new(0, &problem, params, MoveClass::Reverse).unwrap();
            let mut last = w.temperature();
            w.explore(25, |p| {
                assert!(p.temperature <= last);
                last = p.temperature;
                true
            });
            assert!(w.temperature() <= last);
        }
    }

    #[test]
    fn test_adaptive_schedule_cools_stationary_walker() {
        // at this temperature every tour is about equally likely, so the
        // energy distribution is the same from one bin to the next
        let problem = Problem::polygon(20).unwrap();
        let params = params()
            .with_temperature(100.0)
            .with_schedule(CoolingSchedule::adaptive())
            .with_period(500)
            .with_max_iterations(10_000)
            .with_countdown(0);
        let mut w = Walker::new(0, &problem, params, MoveClass::Reverse).unwrap();
        let result = w.run();
        assert_eq!(result.periods, 20);
        assert!(
            result.final_temperature < 100.0,
            "adaptive schedule never cooled: {}",
            result.final_temperature
        );
    }

    #[test]
    fn test_explore_sample_counts() {
        let problem = Problem::polygon(25).unwrap();
        let params = params()
            .with_burnin(50)
            .with_period(1_001)
            .with_sample_stride(100);
        let mut w = Walker::new(3, &problem, params, MoveClass::Reverse).unwrap();
        let mut packets = Vec::new();
        let summary = w.explore(4, |p| {
            packets.push(p);
            true
        });

        assert_eq!(summary.stages, 4);
        assert_eq!(packets.len(), 4);
        for (stage, p) in packets.iter().enumerate() {
            assert_eq!(p.walker, 3);
            assert_eq!(p.stage, stage);
            assert_eq!(p.samples.len(), 11);
            // sampling starts after this stage's burn-in
            let stage_start = stage * (50 + 1_001) + 50;
            assert_eq!(p.samples[0].iteration, stage_start);
            assert_eq!(p.samples[1].iteration, stage_start + 100);
            assert!(is_permutation(&p.best_tour, 25));
            assert!((problem.tour_length(&p.best_tour) - p.best_energy).abs() < 1e-8);
        }
        // standard schedule cools once per stage
        assert!((packets[1].temperature - 0.9).abs() < 1e-12);
        assert!((packets[3].temperature - 0.9f64.powi(3)).abs() < 1e-12);
    }

    #[test]
    fn test_explore_emit_can_stop() {
        let problem = Problem::polygon(10).unwrap();
        let mut w = Walker::new(0, &problem, params().with_period(100), MoveClass::Swap).unwrap();
        let summary = w.explore(10, |p| p.stage < 1);
        assert_eq!(summary.stages, 2);
    }

    #[test]
    fn test_seeded_walkers_are_reproducible() {
        let problem = Problem::polygon(30).unwrap();
        let run = || {
            let mut w = Walker::new(0, &problem, params().with_max_iterations(5_000), MoveClass::Reverse).unwrap();
            w.run().best_tour
        };
        assert_eq!(run(), run());
    }
}
