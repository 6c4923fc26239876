//! Per-walker cooling state machine.

use super::config::CoolingSchedule;

/// Running mean and variance of the energies seen in one bin (Welford).
#[derive(Debug, Clone, Copy, Default)]
struct BinStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl BinStats {
    #[inline]
    fn push(&mut self, x: f64) {
        self.count += 1;
        let d = x - self.mean;
        self.mean += d / self.count as f64;
        self.m2 += d * (x - self.mean);
    }

    fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

/// Tracks bin statistics and decides, at each period boundary, whether the
/// temperature is lowered.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    schedule: CoolingSchedule,
    cooling: f64,
    current: BinStats,
    previous: Option<(f64, f64)>,
    stable_bins: usize,
}

impl ScheduleState {
    pub fn new(schedule: CoolingSchedule, cooling: f64) -> Self {
        Self {
            schedule,
            cooling,
            current: BinStats::default(),
            previous: None,
            stable_bins: 0,
        }
    }

    /// Records the post-move energy of one iteration.
    ///
    /// A no-op under the standard schedule.
    #[inline]
    pub fn record(&mut self, energy: f64) {
        if let CoolingSchedule::Adaptive { .. } = self.schedule {
            self.current.push(energy);
        }
    }

    /// Closes the current bin and returns the temperature for the next one.
    pub fn end_bin(&mut self, temperature: f64) -> f64 {
        match self.schedule {
            CoolingSchedule::Standard => temperature * self.cooling,
            CoolingSchedule::Adaptive {
                wait,
                variance_multiple,
            } => {
                let bin = std::mem::take(&mut self.current);
                if bin.count == 0 {
                    return temperature;
                }
                let (mean, variance) = (bin.mean, bin.variance());

                let stable = match self.previous {
                    Some((prev_mean, prev_var)) => {
                        let shift = mean - prev_mean;
                        shift * shift < variance_multiple * prev_var
                    }
                    None => false,
                };
                self.stable_bins = if stable { self.stable_bins + 1 } else { 0 };
                self.previous = Some((mean, variance));

                if self.stable_bins >= wait {
                    temperature * self.cooling
                } else {
                    temperature
                }
            }
        }
    }

    /// Consecutive stable bins seen so far (always 0 for the standard schedule).
    pub fn stable_bins(&self) -> usize {
        self.stable_bins
    }

    /// Mean and variance of the last closed bin, if any.
    pub fn last_bin(&self) -> Option<(f64, f64)> {
        self.previous
    }
}

/// Stall counter behind the countdown stopping rule.
#[derive(Debug, Clone)]
pub struct Countdown {
    threshold: usize,
    tolerance: f64,
    last_best: f64,
    stalled: usize,
}

impl Countdown {
    /// Starts counting from `initial_best`, the best energy before the
    /// first period. `threshold = 0` disables the rule.
    pub fn new(threshold: usize, tolerance: f64, initial_best: f64) -> Self {
        Self {
            threshold,
            tolerance,
            last_best: initial_best,
            stalled: 0,
        }
    }

    /// Feeds the best energy at a period boundary; returns `true` once the
    /// best has failed to improve for `threshold` consecutive boundaries.
    pub fn check(&mut self, best: f64) -> bool {
        let margin = if self.last_best.is_finite() {
            self.tolerance * self.last_best.abs()
        } else {
            0.0
        };
        if best < self.last_best - margin {
            self.last_best = best;
            self.stalled = 0;
        } else {
            self.stalled += 1;
        }
        self.threshold > 0 && self.stalled >= self.threshold
    }

    pub fn stalled(&self) -> usize {
        self.stalled
    }
}
