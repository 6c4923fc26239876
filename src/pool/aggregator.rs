//! Fan-in side of the walker pool.

use crate::sa::Packet;

/// One sampled energy, tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticRecord {
    pub walker: usize,
    pub temperature: f64,
    pub iteration: usize,
    pub energy: f64,
}

/// Merges packets into a global best and a diagnostic stream.
///
/// Packets may arrive in any walker/stage interleaving.
#[derive(Debug, Clone)]
pub struct Aggregator {
    expected: usize,
    received: usize,
    best_energy: f64,
    best_tour: Vec<usize>,
    best_walker: Option<usize>,
    records: Vec<DiagnosticRecord>,
}

impl Aggregator {
    /// An aggregator waiting for `expected` packets.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            received: 0,
            best_energy: f64::INFINITY,
            best_tour: Vec::new(),
            best_walker: None,
            records: Vec::new(),
        }
    }

    /// Consumes one packet.
    pub fn absorb(&mut self, mut packet: Packet) {
        self.received += 1;

        let (walker, temperature) = (packet.walker, packet.temperature);
        self.records
            .extend(packet.take_samples().map(|s| DiagnosticRecord {
                walker,
                temperature,
                iteration: s.iteration,
                energy: s.energy,
            }));

        if packet.best_energy < self.best_energy {
            self.best_energy = packet.best_energy;
            self.best_tour = packet.best_tour;
            self.best_walker = Some(walker);
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn is_complete(&self) -> bool {
        self.received >= self.expected
    }

    /// Best energy seen so far (infinite before the first packet).
    pub fn best_energy(&self) -> f64 {
        self.best_energy
    }

    /// Finalises the aggregate.
    pub fn finish(self, cancelled: bool) -> Aggregate {
        Aggregate {
            best_energy: self.best_energy,
            best_tour: self.best_tour,
            best_walker: self.best_walker,
            records: self.records,
            packets: self.received,
            expected: self.expected,
            cancelled,
        }
    }
}

/// Result of a pool run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aggregate {
    /// Lowest best energy reported by any walker.
    pub best_energy: f64,
    /// Tour achieving `best_energy`.
    pub best_tour: Vec<usize>,
    /// Walker that reported `best_tour`.
    pub best_walker: Option<usize>,
    /// Every sampled energy, in arrival order.
    pub records: Vec<DiagnosticRecord>,
    /// Packets received.
    pub packets: usize,
    /// Packets a complete run produces.
    pub expected: usize,
    /// Whether the cancellation flag was raised. Cancelled explore runs may
    /// hold fewer than `expected` packets.
    pub cancelled: bool,
}
