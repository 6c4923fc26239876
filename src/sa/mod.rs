//! Simulated Annealing engine for tours.
//!
//! A [`Walker`] owns one tour and runs the Metropolis loop over it using a
//! [`MoveClass`](crate::moves::MoveClass) for O(1) incremental energy
//! updates. Temperature is lowered at period boundaries by the configured
//! [`CoolingSchedule`]; search mode additionally stops once the best energy
//! stalls for `countdown` periods.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"

mod config;
mod schedule;
mod types;
mod walker;

pub use config::{AnnealParams, CoolingSchedule};
pub use schedule::{Countdown, ScheduleState};
pub use types::{ExploreSummary, Packet, Sample, SearchResult, StopReason};
pub use walker::{metropolis, random_tour, Walker};
