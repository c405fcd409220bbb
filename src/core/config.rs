//! Engine configuration with documented constants
//!
//! Every tunable that is not a combat-balance constant lives here:
//! session timeouts, AI pacing, and trial-runner budgets.

/// Configuration for session, agent, and trial-runner timing
///
/// Combat balance constants live in `battle::constants`; this struct only
/// carries the knobs an operator might want to change per deployment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === SESSION ===
    /// How long the session waits for both controllers to join (ms)
    ///
    /// Expiry produces a no-winner GameEnd before any action is applied.
    pub join_timeout_ms: u64,

    /// Capacity of the inbound action queue per battle
    ///
    /// Actions beyond this bound apply backpressure to the submitter,
    /// never reordering: the actor applies strictly one at a time.
    pub action_queue_depth: usize,

    // === AI AGENT ===
    /// How long the agent waits for an explicit rejection after submitting
    /// an action before assuming it was accepted (ms)
    pub rejection_wait_ms: u64,

    /// Grace delay between an agent-internal failure being reported as chat
    /// and the forfeit disconnect (ms)
    pub forfeit_grace_ms: u64,

    // === TRIAL RUNNER ===
    /// Linear per-trial component of the self-play wall-clock budget (ms)
    ///
    /// Total budget is `trial_linear_ms * n + trial_quadratic_ms * n^2`.
    /// The shape matters (near-linear with a small quadratic tail for
    /// scheduler contention); the coefficients are tuning values.
    pub trial_linear_ms: u64,

    /// Quadratic component of the self-play wall-clock budget (ms)
    pub trial_quadratic_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: 30_000,
            action_queue_depth: 64,
            rejection_wait_ms: 250,
            forfeit_grace_ms: 1_000,
            trial_linear_ms: 20_000,
            trial_quadratic_ms: 400,
        }
    }
}

impl EngineConfig {
    /// Wall-clock budget for a batch of `n` self-play trials (ms)
    pub fn trial_budget_ms(&self, n: u64) -> u64 {
        self.trial_linear_ms * n + self.trial_quadratic_ms * n * n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_budget_shape() {
        let config = EngineConfig::default();
        // Near-linear for small n, quadratic term visible at scale
        assert_eq!(config.trial_budget_ms(1), 20_400);
        assert_eq!(config.trial_budget_ms(10), 240_000);
        let single = config.trial_budget_ms(1);
        assert!(config.trial_budget_ms(10) > 10 * single / 2);
    }

    #[test]
    fn test_default_timeouts_positive() {
        let config = EngineConfig::default();
        assert!(config.join_timeout_ms > 0);
        assert!(config.rejection_wait_ms > 0);
        assert!(config.action_queue_depth > 0);
    }
}
