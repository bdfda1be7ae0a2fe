//! Simulator configuration.

use crate::branch::BranchPolicy;
use crate::scripts::{ScriptLibrary, catalog};

/// Tunables for one simulator instance.
///
/// # Examples
///
/// ```rust
/// use claimsim::branch::BranchPolicy;
/// use claimsim::sim::SimConfig;
///
/// let config = SimConfig::new()
///     .with_policy(BranchPolicy::AlwaysNigoOnce)
///     .with_seed(42)
///     .with_speed(4.0);
/// assert_eq!(config.speed, 4.0);
/// ```
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Gate policy for the validation branch.
    pub policy: BranchPolicy,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Dwell-time multiplier. `2.0` halves every stage dwell; script line
    /// delays are not scaled.
    pub speed: f64,
    /// Narration scripts; defaults to the built-in catalog.
    pub library: ScriptLibrary,
}

impl SimConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BranchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Clamped to [`Self::MIN_SPEED`]..=[`Self::MAX_SPEED`].
    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED);
        self
    }

    #[must_use]
    pub fn with_library(mut self, library: ScriptLibrary) -> Self {
        self.library = library;
        self
    }

    pub const MIN_SPEED: f64 = 0.1;
    pub const MAX_SPEED: f64 = 16.0;
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: BranchPolicy::default(),
            seed: None,
            speed: 1.0,
            library: catalog::builtin(),
        }
    }
}
