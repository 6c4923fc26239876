//! Walker pool configuration.

use crate::moves::MoveClass;
use crate::sa::AnnealParams;

/// Configuration for a pool of independent walkers.
///
/// # Examples
///
/// ```
/// use tsp_anneal::moves::MoveClass;
/// use tsp_anneal::pool::PoolConfig;
/// use tsp_anneal::sa::AnnealParams;
///
/// let config = PoolConfig::default()
///     .with_walkers(4)
///     .with_jobs(10)
///     .with_moves(MoveClass::Reverse)
///     .with_params(AnnealParams::default().with_period(1_000).with_seed(7));
/// assert_eq!(config.expected_packets(), 40);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Number of concurrent walkers.
    pub num_walkers: usize,

    /// Explore stages per walker. Search mode ignores it.
    pub num_jobs: usize,

    /// Neighbourhood operator shared by all walkers.
    pub moves: MoveClass,

    /// Template parameters. Each walker receives its own copy with a
    /// walker-specific seed.
    pub params: AnnealParams,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_walkers: 2,
            num_jobs: 1,
            moves: MoveClass::default(),
            params: AnnealParams::default(),
        }
    }
}

impl PoolConfig {
    pub fn with_walkers(mut self, n: usize) -> Self {
        self.num_walkers = n;
        self
    }

    pub fn with_jobs(mut self, n: usize) -> Self {
        self.num_jobs = n;
        self
    }

    pub fn with_moves(mut self, moves: MoveClass) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_params(mut self, params: AnnealParams) -> Self {
        self.params = params;
        self
    }

    /// Packets an explore run produces: one per walker per stage.
    pub fn expected_packets(&self) -> usize {
        self.num_walkers * self.num_jobs
    }

    /// Parameters for walker `id`.
    ///
    /// With a base seed, walker seeds are spread deterministically so that
    /// a pool run is reproducible; without one every walker draws its own.
    pub fn walker_params(&self, id: usize) -> AnnealParams {
        let mut params = self.params.clone();
        params.seed = self
            .params
            .seed
            .map(|base| base.wrapping_add((id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)));
        params
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_walkers == 0 {
            return Err("num_walkers must be at least 1".into());
        }
        if self.num_jobs == 0 {
            return Err("num_jobs must be at least 1".into());
        }
        self.params.validate()
    }
}
