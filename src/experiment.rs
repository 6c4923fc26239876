//! Batch experiment collector.
//!
//! Runs many independent searches on regular polygons of random size with
//! randomised annealing parameters and records one table row per run, for
//! comparing cooling schedules offline. The optimum of an `n`-gon is known
//! (`2n·sin(π/n)`), so each row can be scored after the fact.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::moves::MoveClass;
use crate::problem::Problem;
use crate::report::{self, EXPERIMENT_HEADER};
use crate::sa::{AnnealParams, CoolingSchedule, Walker};

/// Configuration of an experiment batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    /// Number of experiments.
    pub runs: usize,
    /// Smallest polygon size.
    pub min_points: usize,
    /// Polygon sizes are drawn as `min_points + 100k` below this bound.
    pub max_points: usize,
    /// Iteration budget per experiment.
    pub max_iterations: usize,
    pub moves: MoveClass,
    pub schedule: CoolingSchedule,
    /// Countdown threshold used by every run.
    pub countdown: usize,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            min_points: 100,
            max_points: 5_000,
            max_iterations: 100_000_000,
            moves: MoveClass::default(),
            schedule: CoolingSchedule::default(),
            countdown: 40,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn with_runs(mut self, n: usize) -> Self {
        self.runs = n;
        self
    }

    pub fn with_points(mut self, min: usize, max: usize) -> Self {
        self.min_points = min;
        self.max_points = max;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_moves(mut self, moves: MoveClass) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_schedule(mut self, schedule: CoolingSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_points == 0 {
            return Err("min_points must be positive".into());
        }
        if self.max_points < self.min_points + 100 {
            return Err(format!(
                "max_points ({}) must exceed min_points ({}) by at least 100",
                self.max_points, self.min_points
            ));
        }
        Ok(())
    }
}

/// One row of the experiment table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentRow {
    pub npoints: usize,
    /// Best tour length found.
    pub energy: f64,
    /// Wall-clock seconds for the search.
    pub seconds: f64,
    /// Initial temperature.
    pub temperature: f64,
    pub cooling: f64,
    pub period: usize,
    pub schedule: CoolingSchedule,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
}

const MAX_COOLING: f64 = 1.0 - f64::EPSILON;

/// Draws randomised annealing parameters.
///
/// Temperature in [1, 4], cooling in [0.8, 1), period `20·(50 + k)` with
/// `k` in `0..949`.
pub fn random_params<R: Rng>(
    rng: &mut R,
    max_iterations: usize,
    schedule: CoolingSchedule,
    countdown: usize,
) -> AnnealParams {
    let temperature = rng.random_range(1.0..4.0);
    // a cooling factor of exactly 1 fails validation
    let cooling = f64::min(rng.random_range(0.8..1.0), MAX_COOLING);
    let period = 20 * (50 + rng.random_range(0..949));

    AnnealParams::default()
        .with_temperature(temperature)
        .with_cooling(cooling)
        .with_period(period)
        .with_max_iterations(max_iterations)
        .with_countdown(countdown)
        .with_schedule(schedule)
}

/// Runs a single search on an `n`-gon.
pub fn run_experiment(npoints: usize, params: AnnealParams, moves: MoveClass) -> Result<ExperimentRow> {
    let problem = Problem::polygon(npoints)?;
    let mut walker = Walker::new(0, &problem, params.clone(), moves)?;

    let start = Instant::now();
    let result = walker.run();
    let seconds = start.elapsed().as_secs_f64();

    Ok(ExperimentRow {
        npoints,
        energy: result.best_energy,
        seconds,
        temperature: params.temperature,
        cooling: params.cooling,
        period: params.period,
        schedule: params.schedule,
    })
}

/// Runs the whole batch, writing the header and one row per successful run
/// to `out`.
///
/// A failing experiment is logged and skipped; only configuration and
/// output errors abort the batch.
pub fn run_batch<W: Write>(config: &ExperimentConfig, mut out: W) -> Result<BatchSummary> {
    config.validate().map_err(Error::InvalidConfig)?;
    let out_err = |e| Error::io("<experiment output>", e);

    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
    let steps = (config.max_points - config.min_points) / 100;
    let mut summary = BatchSummary::default();

    writeln!(out, "{EXPERIMENT_HEADER}").map_err(out_err)?;
    for run in 0..config.runs {
        let npoints = config.min_points + 100 * rng.random_range(0..steps);
        let params = random_params(&mut rng, config.max_iterations, config.schedule, config.countdown)
            .with_seed(rng.random());

        match run_experiment(npoints, params, config.moves) {
            Ok(row) => {
                info!(run, npoints, energy = row.energy, seconds = row.seconds, "experiment done");
                report::write_experiment_row_to(&mut out, &row).map_err(out_err)?;
                out.flush().map_err(out_err)?;
                summary.completed += 1;
            }
            Err(e) => {
                warn!(run, npoints, error = %e, "experiment failed, continuing");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// [`run_batch`] into a file at `path`.
pub fn run_batch_to_path(config: &ExperimentConfig, path: impl AsRef<Path>) -> Result<BatchSummary> {
    let path = path.as_ref();
    let file = report::create(path)?;
    run_batch(config, file).map_err(|e| match e {
        Error::Io { source, .. } => Error::io(path, source),
        other => other,
    })
}
