//! Annealing parameters and cooling schedules.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Policy deciding when the temperature is lowered.
///
/// Both policies act only at period boundaries and only ever multiply the
/// temperature by the cooling factor, so temperature never increases.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric cooling: `T_{k+1} = cooling * T_k` at every period boundary.
    Standard,

    /// Variance-gated cooling.
    ///
    /// The post-move energy is averaged over each period (bin). A bin is
    /// *stable* when `(mean_t - mean_{t-1})^2 < variance_multiple * var_{t-1}`.
    /// The temperature is lowered only while at least `wait` consecutive bins
    /// have been stable, so the walker is not cooled while its energy
    /// distribution is still drifting.
    Adaptive {
        /// Consecutive stable bins required before cooling.
        wait: usize,
        /// Multiple of the previous bin variance that bounds the squared
        /// shift of the mean.
        variance_multiple: f64,
    },
}

impl CoolingSchedule {
    /// Adaptive schedule with the default gate (2 stable bins, 2 variances).
    pub const fn adaptive() -> Self {
        CoolingSchedule::Adaptive {
            wait: 2,
            variance_multiple: 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoolingSchedule::Standard => "standard",
            CoolingSchedule::Adaptive { .. } => "adaptive",
        }
    }
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Standard
    }
}

impl fmt::Display for CoolingSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoolingSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "std" => Ok(CoolingSchedule::Standard),
            "adaptive" | "sigmage" => Ok(CoolingSchedule::adaptive()),
            other => Err(Error::UnknownSchedule(other.to_string())),
        }
    }
}

/// Parameters of one annealing walker.
///
/// Every walker holds its own copy; the temperature field is the *initial*
/// temperature and the walker mutates only its private copy.
///
/// # Examples
///
/// ```
/// use tsp_anneal::sa::{AnnealParams, CoolingSchedule};
///
/// let params = AnnealParams::default()
///     .with_temperature(2.0)
///     .with_cooling(0.95)
///     .with_period(5_000)
///     .with_schedule(CoolingSchedule::adaptive())
///     .with_seed(42);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealParams {
    /// Initial temperature. Zero gives a pure descent.
    pub temperature: f64,

    /// Geometric cooling factor in (0, 1).
    pub cooling: f64,

    /// Iterations per temperature stage; also the statistics bin length.
    pub period: usize,

    /// Unsampled iterations at the start of each explore stage.
    pub burnin: usize,

    /// Explore mode records the energy every `sample_stride` iterations.
    pub sample_stride: usize,

    /// Hard iteration budget for search mode.
    pub max_iterations: usize,

    /// Stagnant periods tolerated before search mode stops. 0 = never.
    pub countdown: usize,

    /// Cooling policy.
    pub schedule: CoolingSchedule,

    /// Relative improvement of the best energy below which a period counts
    /// as stagnant.
    pub stall_tolerance: f64,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            temperature: 4.0,
            cooling: 0.9,
            period: 10_000,
            burnin: 0,
            sample_stride: 100,
            max_iterations: 1_000_000,
            countdown: 400,
            schedule: CoolingSchedule::default(),
            stall_tolerance: 1e-12,
            seed: None,
        }
    }
}

impl AnnealParams {
    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: f64) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_period(mut self, n: usize) -> Self {
        self.period = n;
        self
    }

    pub fn with_burnin(mut self, n: usize) -> Self {
        self.burnin = n;
        self
    }

    pub fn with_sample_stride(mut self, n: usize) -> Self {
        self.sample_stride = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_countdown(mut self, n: usize) -> Self {
        self.countdown = n;
        self
    }

    pub fn with_schedule(mut self, schedule: CoolingSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_stall_tolerance(mut self, tol: f64) -> Self {
        self.stall_tolerance = tol;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(format!(
                "temperature must be finite and non-negative, got {}",
                self.temperature
            ));
        }
        if self.cooling <= 0.0 || self.cooling >= 1.0 {
            return Err(format!("cooling factor must be in (0, 1), got {}", self.cooling));
        }
        if self.period == 0 {
            return Err("period must be positive".into());
        }
        if self.sample_stride == 0 {
            return Err("sample stride must be positive".into());
        }
        if !(self.stall_tolerance >= 0.0) {
            return Err(format!(
                "stall tolerance must be non-negative, got {}",
                self.stall_tolerance
            ));
        }
        if let CoolingSchedule::Adaptive {
            wait,
            variance_multiple,
        } = self.schedule
        {
            if wait == 0 {
                return Err("adaptive wait must be at least 1 bin".into());
            }
            if variance_multiple <= 0.0 {
                return Err(format!(
                    "adaptive variance multiple must be positive, got {variance_multiple}"
                ));
            }
        }
        Ok(())
    }

    /// Number of samples one explore stage records: `ceil(period / sample_stride)`.
    pub fn samples_per_stage(&self) -> usize {
        self.period.div_ceil(self.sample_stride)
    }
}
