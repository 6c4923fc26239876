//! Concurrent walker pool.
//!
//! [`WalkerPool`] fans a [`PoolConfig`] out to independent walkers and fans
//! their [`Packet`](crate::sa::Packet)s back in through an [`Aggregator`],
//! producing the global best tour and a stream of [`DiagnosticRecord`]s.

mod aggregator;
mod config;
mod runner;

pub use aggregator::{Aggregate, Aggregator, DiagnosticRecord};
pub use config::PoolConfig;
pub use runner::WalkerPool;
