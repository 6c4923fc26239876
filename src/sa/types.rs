//! Walker outputs: explore packets and search results.

use std::time::Duration;

/// One sampled energy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Walker iteration (0-based, counted from walker creation) at which the
    /// energy was read.
    pub iteration: usize,
    /// Tour length after that iteration's move.
    pub energy: f64,
}

/// Report emitted by a walker at the end of each explore stage.
///
/// All data is copied out of the walker, so the walker keeps mutating its
/// working tour while the packet is in flight.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    /// Id of the emitting walker.
    pub walker: usize,
    /// Stage index within the walker, starting at 0.
    pub stage: usize,
    /// Temperature the stage ran at.
    pub temperature: f64,
    /// Energies sampled during the stage, in order.
    pub samples: Vec<Sample>,
    /// Best energy the walker has seen so far.
    pub best_energy: f64,
    /// Snapshot of the tour achieving `best_energy`.
    pub best_tour: Vec<usize>,
}

impl Packet {
    /// Consumes the packet's samples.
    pub fn take_samples(&mut self) -> std::vec::IntoIter<Sample> {
        std::mem::take(&mut self.samples).into_iter()
    }
}

/// Why a search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The iteration budget was used up.
    MaxIterations,
    /// The best energy stalled for `countdown` periods.
    Converged,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Outcome of [`Walker::run`](super::Walker::run).
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best tour found.
    pub best_tour: Vec<usize>,
    /// Length of `best_tour`, recomputed from scratch.
    pub best_energy: f64,
    /// Temperature when the loop stopped.
    pub final_temperature: f64,
    /// Iterations executed by this run.
    pub iterations: usize,
    /// Completed periods.
    pub periods: usize,
    /// Accepted proposals (including improvements).
    pub accepted_moves: usize,
    pub stop: StopReason,
    pub elapsed: Duration,
}

/// Outcome of [`Walker::explore`](super::Walker::explore).
#[derive(Debug, Clone)]
pub struct ExploreSummary {
    /// Stages whose packet was emitted.
    pub stages: usize,
    pub best_energy: f64,
    pub final_temperature: f64,
    pub cancelled: bool,
    pub elapsed: Duration,
}
