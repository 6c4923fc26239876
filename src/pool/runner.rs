//! Fan-out side of the walker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;

use tracing::{info, warn};

use super::aggregator::{Aggregate, Aggregator};
use super::config::PoolConfig;
use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::sa::{Packet, Walker};

/// Runs independent walkers concurrently and merges their reports.
///
/// Each walker gets its own random initial tour, random source and parameter
/// copy; the only shared data is the read-only [`Problem`]. Walkers run on a
/// dedicated rayon pool with one thread per walker and report through a
/// bounded channel sized for every packet of the run, so no walker ever
/// blocks on a slow consumer. The calling thread aggregates, and returns only
/// after every walker task has been joined.
pub struct WalkerPool;

impl WalkerPool {
    /// Explore mode: every walker runs `num_jobs` stages, one packet each.
    pub fn explore(problem: &Problem, config: &PoolConfig) -> Result<Aggregate> {
        Self::explore_with_cancel(problem, config, None)
    }

    /// Explore mode with an optional cancellation flag.
    ///
    /// Once the flag is raised, walkers stop at their next stage boundary and
    /// the returned aggregate is marked `cancelled`.
    pub fn explore_with_cancel(
        problem: &Problem,
        config: &PoolConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Aggregate> {
        let num_jobs = config.num_jobs;
        fan_out(problem, config, cancel, num_jobs, |walker, tx| {
            walker.explore(num_jobs, |packet| tx.send(packet).is_ok());
        })
    }

    /// Search mode: every walker runs one full search and reports its best.
    pub fn search(problem: &Problem, config: &PoolConfig) -> Result<Aggregate> {
        Self::search_with_cancel(problem, config, None)
    }

    /// Search mode with an optional cancellation flag.
    ///
    /// Cancelled walkers still report the best tour they reached.
    pub fn search_with_cancel(
        problem: &Problem,
        config: &PoolConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Aggregate> {
        fan_out(problem, config, cancel, 1, |walker, tx| {
            let result = walker.run();
            // receiver only disappears if the aggregator is gone
            let _ = tx.send(Packet {
                walker: walker.id(),
                stage: 0,
                temperature: result.final_temperature,
                samples: Vec::new(),
                best_energy: result.best_energy,
                best_tour: result.best_tour,
            });
        })
    }
}

fn fan_out<F>(
    problem: &Problem,
    config: &PoolConfig,
    cancel: Option<Arc<AtomicBool>>,
    packets_per_walker: usize,
    drive: F,
) -> Result<Aggregate>
where
    F: Fn(&mut Walker<'_>, &SyncSender<Packet>) + Sync,
{
    config.validate().map_err(Error::InvalidConfig)?;
    let expected = config.num_walkers * packets_per_walker;

    let walkers = (0..config.num_walkers)
        .map(|id| {
            let walker = Walker::new(id, problem, config.walker_params(id), config.moves)?;
            Ok(match &cancel {
                Some(flag) => walker.with_cancel(Arc::clone(flag)),
                None => walker,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_walkers)
        .thread_name(|i| format!("walker-{i}"))
        .build()?;

    info!(
        walkers = config.num_walkers,
        expected,
        moves = %config.moves,
        schedule = %config.params.schedule,
        "launching walkers"
    );

    let (tx, rx) = mpsc::sync_channel::<Packet>(expected);
    let mut aggregator = Aggregator::new(expected);
    let drive = &drive;

    pool.in_place_scope(|scope| {
        for mut walker in walkers {
            let tx = tx.clone();
            scope.spawn(move |_| drive(&mut walker, &tx));
        }
        // only walkers hold senders now, so recv fails once they are all gone
        drop(tx);

        while !aggregator.is_complete() {
            match rx.recv() {
                Ok(packet) => aggregator.absorb(packet),
                Err(_) => break,
            }
        }
    });

    let cancelled = cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
    if !aggregator.is_complete() {
        if !cancelled {
            return Err(Error::WalkerLost {
                expected,
                received: aggregator.received(),
            });
        }
        warn!(
            received = aggregator.received(),
            expected, "walkers cancelled before completing"
        );
    }

    info!(best = aggregator.best_energy(), packets = aggregator.received(), "walkers joined");
    Ok(aggregator.finish(cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveClass;
    use crate::sa::{AnnealParams, CoolingSchedule};

    fn config(walkers: usize, jobs: usize) -> PoolConfig {
        PoolConfig::default()
            .with_walkers(walkers)
            .with_jobs(jobs)
            .with_params(
                AnnealParams::default()
                    .with_temperature(1.0)
                    .with_period(400)
                    .with_burnin(100)
                    .with_sample_stride(50)
                    .with_max_iterations(20_000)
                    .with_countdown(10)
                    .with_seed(2024),
            )
    }

    #[test]
    fn test_explore_receives_every_packet() {
        let problem = Problem::polygon(20).unwrap();
        let result = WalkerPool::explore(&problem, &config(3, 4)).unwrap();
        assert_eq!(result.expected, 12);
        assert_eq!(result.packets, 12);
        assert!(!result.cancelled);
        // 3 walkers x 4 stages x ceil(400 / 50) samples
        assert_eq!(result.records.len(), 3 * 4 * 8);
        for walker in 0..3 {
            let n = result.records.iter().filter(|r| r.walker == walker).count();
            assert_eq!(n, 32);
        }
    }

    #[test]
    fn test_explore_best_is_consistent() {
        let problem = Problem::polygon(15).unwrap();
        let result = WalkerPool::explore(&problem, &config(2, 3)).unwrap();
        let mut sorted = result.best_tour.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..15).collect::<Vec<_>>());
        assert!((problem.tour_length(&result.best_tour) - result.best_energy).abs() < 1e-8);
        let min_sample = result
            .records
            .iter()
            .map(|r| r.energy)
            .fold(f64::INFINITY, f64::min);
        assert!(result.best_energy <= min_sample + 1e-9);
    }

    #[test]
    fn test_walkers_keep_private_temperatures() {
        let problem = Problem::polygon(12).unwrap();
        let cfg = config(4, 5);
        assert_eq!(cfg.params.schedule, CoolingSchedule::Standard);
        let result = WalkerPool::explore(&problem, &cfg).unwrap();
        // each walker cools its own copy once per stage
        for walker in 0..4 {
            let mut temps: Vec<f64> = result
                .records
                .iter()
                .filter(|r| r.walker == walker)
                .map(|r| r.temperature)
                .collect();
            temps.dedup();
            assert_eq!(temps.len(), 5, "walker {walker}");
            assert!((temps[0] - 1.0).abs() < 1e-12);
            assert!((temps[4] - 0.9f64.powi(4)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_search_picks_best_walker() {
        let problem = Problem::polygon(25).unwrap();
        let result = WalkerPool::search(&problem, &config(3, 1).with_moves(MoveClass::Reverse)).unwrap();
        assert_eq!(result.packets, 3);
        assert!(result.records.is_empty());
        assert!(result.best_walker.is_some());
        assert!((problem.tour_length(&result.best_tour) - result.best_energy).abs() < 1e-8);
    }

    #[test]
    fn test_seeded_pool_is_reproducible() {
        let problem = Problem::polygon(60).unwrap();
        let mut cfg = config(2, 1);
        cfg.params.max_iterations = 3_000;
        let a = WalkerPool::search(&problem, &cfg).unwrap();
        let b = WalkerPool::search(&problem, &cfg).unwrap();
        assert_eq!(a.best_energy, b.best_energy);
        assert_eq!(a.best_tour, b.best_tour);
    }

    #[test]
    fn test_cancelled_explore_returns_partial() {
        let problem = Problem::polygon(10).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let result = WalkerPool::explore_with_cancel(&problem, &config(2, 3), Some(flag)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.packets, 0);
        assert_eq!(result.expected, 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = Problem::polygon(10).unwrap();
        assert!(matches!(
            WalkerPool::explore(&problem, &config(0, 3)),
            Err(Error::InvalidConfig(_))
        ));
    }
}
