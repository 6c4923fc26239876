//! Parallel simulated annealing for the Euclidean travelling salesman problem.
//!
//! The crate is organised bottom-up:
//!
//! - [`problem`]: point sets, labels and the precomputed distance matrix.
//! - [`moves`]: neighbourhood operators (segment reversal, index swap) with
//!   O(1) incremental cost deltas.
//! - [`sa`]: the annealing walker, its cooling schedules and the countdown
//!   convergence rule.
//! - [`pool`]: runs independent walkers concurrently and merges their reports
//!   into a global best and a diagnostic stream.
//! - [`report`], [`experiment`], [`harness`]: output writers, the batch
//!   experiment collector and the move self-test.
//!
//! # Example
//!
//! ```
//! use tsp_anneal::pool::{PoolConfig, WalkerPool};
//! use tsp_anneal::problem::Problem;
//! use tsp_anneal::sa::AnnealParams;
//!
//! let problem = Problem::polygon(20).unwrap();
//! let config = PoolConfig::default()
//!     .with_walkers(2)
//!     .with_params(AnnealParams::default().with_max_iterations(20_000).with_seed(1));
//! let result = WalkerPool::search(&problem, &config).unwrap();
//! assert_eq!(result.best_tour.len(), 20);
//! ```

pub mod config;
pub mod error;
pub mod experiment;
pub mod harness;
pub mod moves;
pub mod pool;
pub mod problem;
pub mod report;
pub mod sa;

pub use error::{Error, Result};
