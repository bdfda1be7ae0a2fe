//! Branch policies and the validation-gate resolver.
//!
//! The resolver is consulted only when the stepper leaves the designated
//! gate stage. Whatever the policy, a run takes the NIGO edge at most once:
//! after one NIGO traversal the claim cannot loop again, so every run
//! terminates. Only the first-visit choice under [`BranchPolicy::RandomNigo`]
//! is nondeterministic, and even that is seedable for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::BranchCondition;

/// Default NIGO probability for [`BranchPolicy::RandomNigo`].
pub const DEFAULT_NIGO_PROBABILITY: f64 = 0.2;

/// Rule governing which outgoing path is taken at the validation gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum BranchPolicy {
    /// Always choose IGO.
    AlwaysIgo,
    /// Choose NIGO exactly once (first gate visit), IGO ever after.
    AlwaysNigoOnce,
    /// Choose NIGO with probability `p` on the first visit only.
    RandomNigo { p: f64 },
}

impl Default for BranchPolicy {
    fn default() -> Self {
        Self::RandomNigo {
            p: DEFAULT_NIGO_PROBABILITY,
        }
    }
}

/// Outcome of one gate decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub condition: BranchCondition,
    /// Short human-readable selection reason, recorded in the event log.
    pub reason: String,
}

/// Stateful per-run resolver for the validation gate.
///
/// Tracks gate visits and whether NIGO has already been taken this run.
/// [`reset`](Self::reset) must be called when the simulation resets or
/// replays; the RNG is deliberately not re-seeded on reset so consecutive
/// runs under a fixed seed stay reproducible as a sequence.
///
/// # Examples
///
/// ```rust
/// use claimsim::branch::{BranchPolicy, BranchResolver};
/// use claimsim::types::BranchCondition;
///
/// let mut resolver = BranchResolver::seeded(BranchPolicy::AlwaysNigoOnce, 7);
/// assert_eq!(resolver.decide().condition, BranchCondition::Nigo);
/// assert_eq!(resolver.decide().condition, BranchCondition::Igo);
/// assert_eq!(resolver.decide().condition, BranchCondition::Igo);
/// ```
#[derive(Debug)]
pub struct BranchResolver {
    policy: BranchPolicy,
    rng: StdRng,
    visits: u32,
    nigo_taken: bool,
}

impl BranchResolver {
    /// Resolver with an OS-entropy RNG.
    #[must_use]
    pub fn new(policy: BranchPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_os_rng())
    }

    /// Resolver with a fixed seed, for deterministic tests and replays.
    #[must_use]
    pub fn seeded(policy: BranchPolicy, seed: u64) -> Self {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(policy: BranchPolicy, rng: StdRng) -> Self {
        Self {
            policy,
            rng,
            visits: 0,
            nigo_taken: false,
        }
    }

    #[must_use]
    pub fn policy(&self) -> BranchPolicy {
        self.policy
    }

    /// Gate visits decided so far in the current run.
    #[must_use]
    pub fn visits(&self) -> u32 {
        self.visits
    }

    /// Clear per-run state for a fresh run of the same simulation.
    pub fn reset(&mut self) {
        self.visits = 0;
        self.nigo_taken = false;
    }

    /// Decide the outgoing condition for the current gate visit.
    pub fn decide(&mut self) -> Decision {
        self.visits += 1;
        let first_visit = self.visits == 1;

        let condition = match self.policy {
            BranchPolicy::AlwaysIgo => BranchCondition::Igo,
            BranchPolicy::AlwaysNigoOnce if first_visit && !self.nigo_taken => {
                BranchCondition::Nigo
            }
            BranchPolicy::AlwaysNigoOnce => BranchCondition::Igo,
            BranchPolicy::RandomNigo { p } => {
                if first_visit && !self.nigo_taken && self.rng.random_bool(p.clamp(0.0, 1.0)) {
                    BranchCondition::Nigo
                } else {
                    BranchCondition::Igo
                }
            }
        };

        if condition == BranchCondition::Nigo {
            self.nigo_taken = true;
        }

        Decision {
            condition,
            reason: self.reason_for(condition, first_visit),
        }
    }

    fn reason_for(&self, condition: BranchCondition, first_visit: bool) -> String {
        match (condition, first_visit) {
            (BranchCondition::Igo, true) => {
                "Validation passed: claim is in good order.".to_string()
            }
            (BranchCondition::Igo, false) => {
                "Validation passed after remediation: claim is now in good order.".to_string()
            }
            (BranchCondition::Nigo, _) => {
                "Validation failed: claim is not in good order, routing to pend review."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_igo_never_selects_nigo() {
        let mut r = BranchResolver::seeded(BranchPolicy::AlwaysIgo, 1);
        for _ in 0..10 {
            assert_eq!(r.decide().condition, BranchCondition::Igo);
        }
    }

    #[test]
    fn nigo_once_resets_with_run() {
        let mut r = BranchResolver::seeded(BranchPolicy::AlwaysNigoOnce, 1);
        assert_eq!(r.decide().condition, BranchCondition::Nigo);
        assert_eq!(r.decide().condition, BranchCondition::Igo);
        r.reset();
        assert_eq!(r.decide().condition, BranchCondition::Nigo);
    }

    #[test]
    fn random_nigo_only_samples_on_first_visit() {
        // p = 1.0 makes the first visit certainly NIGO; later visits must
        // still be IGO because the loop guard blocks a second NIGO.
        let mut r = BranchResolver::seeded(BranchPolicy::RandomNigo { p: 1.0 }, 42);
        assert_eq!(r.decide().condition, BranchCondition::Nigo);
        for _ in 0..5 {
            assert_eq!(r.decide().condition, BranchCondition::Igo);
        }
    }

    #[test]
    fn reasons_are_nonempty() {
        let mut r = BranchResolver::seeded(BranchPolicy::AlwaysNigoOnce, 1);
        assert!(!r.decide().reason.is_empty());
        assert!(!r.decide().reason.is_empty());
    }
}
