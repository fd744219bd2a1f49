// src/config.rs
//
// Central configuration for the dialog simulator and the learning stack.
// This is the single source of truth for the protocol constants (slot count,
// confirmation split), the handcrafted user policy, the tabular solvers, the
// apprenticeship-learning loop, and the candidate mixtures.

/// Root configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Protocol-level constants shared by agent and user.
    pub dialog: DialogConfig,
    /// User-policy construction constants.
    pub policy: PolicyConfig,
    /// Tabular MDP solver (Q-learning / SARSA) constants.
    pub solver: SolverConfig,
    /// Apprenticeship-learning loop constants.
    pub irl: IrlConfig,
    /// Candidate selector / mixture constants.
    pub mixture: MixtureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialog: DialogConfig::default(),
            policy: PolicyConfig::default(),
            solver: SolverConfig::default(),
            irl: IrlConfig::default(),
            mixture: MixtureConfig::default(),
        }
    }
}

impl Config {
    /// Low-iteration preset for tests and quick CLI runs.
    ///
    /// Keeps all protocol constants at their defaults but shrinks episode and
    /// rollout counts so a full IRL run finishes in seconds.
    pub fn fast() -> Self {
        let mut cfg = Self::default();
        cfg.solver.episodes = 2_000;
        cfg.irl.num_sessions = 200;
        cfg.irl.max_iterations = 8;
        cfg
    }
}

/// Protocol-level constants.
#[derive(Debug, Clone)]
pub struct DialogConfig {
    /// Number of slots the dialog must fill.
    pub num_slots: usize,
    /// Fraction of agent confirmations that are explicit rather than
    /// implicit (Bernoulli parameter of the per-confirmation draw).
    pub explicit_confirm_prob: f64,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            num_slots: 3,
            explicit_confirm_prob: 0.8,
        }
    }
}

/// User-policy construction constants.
///
/// The handcrafted row splits are tunables, not structural contracts; each
/// row must still sum to 1.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// P(silent | greet); the rest of the row goes to provide-all-slots.
    pub greet_silent: f64,
    /// P(provide-one-slot | ask_slot); the rest goes to provide-all-slots.
    pub ask_one_slot: f64,
    /// P(provide-one-slot | confirm_and_ask); the rest goes to negate.
    pub confirm_ask_one_slot: f64,
    /// Symmetric Dirichlet concentration for random policy rows.
    pub dirichlet_alpha: f64,
    /// Exploration mass used when deriving epsilon-greedy policies.
    pub epsilon: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            greet_silent: 0.7,
            ask_one_slot: 0.95,
            confirm_ask_one_slot: 0.9,
            dirichlet_alpha: 1.0,
            epsilon: 0.1,
        }
    }
}

/// Tabular MDP solver constants.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Discount factor.
    pub gamma: f64,
    /// Initial TD learning rate.
    pub learning_rate: f64,
    /// Per-episode multiplicative decay of the learning rate.
    pub learning_rate_decay: f64,
    /// Per-episode multiplicative decay of the exploration rate.
    pub epsilon_decay: f64,
    /// Number of training episodes per solve.
    pub episodes: usize,
    /// Initial Q-value for non-terminal states (Q-learning). The terminal
    /// state starts at zero; SARSA starts everything at zero.
    pub initial_q_value: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            learning_rate: 0.1,
            learning_rate_decay: 0.999,
            epsilon_decay: 0.999,
            episodes: 10_000,
            initial_q_value: 0.5,
        }
    }
}

/// Apprenticeship-learning (projection IRL) constants.
#[derive(Debug, Clone)]
pub struct IrlConfig {
    /// Rollout sessions averaged per feature-expectation estimate.
    pub num_sessions: usize,
    /// Margin below which the projection loop stops.
    pub threshold: f64,
    /// Hard cap on projection iterations.
    pub max_iterations: usize,
    /// Persist the candidate list every this many iterations.
    pub checkpoint_every: usize,
}

impl Default for IrlConfig {
    fn default() -> Self {
        Self {
            num_sessions: 10_000,
            threshold: 0.001,
            max_iterations: 50,
            checkpoint_every: 10,
        }
    }
}

/// Candidate selector / mixture constants.
#[derive(Debug, Clone)]
pub struct MixtureConfig {
    /// Gibbs/softmax temperature over distance-to-expert.
    pub tau: f64,
    /// Iteration cap for the simplex-constrained QP solver.
    pub qp_max_iterations: usize,
    /// Duality-gap tolerance for the QP solver.
    pub qp_tolerance: f64,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            tau: 0.05,
            qp_max_iterations: 50_000,
            qp_tolerance: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_canonical() {
        let cfg = Config::default();
        assert_eq!(cfg.dialog.num_slots, 3);
        assert_eq!(cfg.dialog.explicit_confirm_prob, 0.8);
        assert_eq!(cfg.solver.gamma, 0.95);
        assert_eq!(cfg.solver.episodes, 10_000);
        assert_eq!(cfg.irl.threshold, 0.001);
    }

    #[test]
    fn fast_preset_only_shrinks_iteration_counts() {
        let fast = Config::fast();
        let dflt = Config::default();
        assert!(fast.solver.episodes < dflt.solver.episodes);
        assert!(fast.irl.num_sessions < dflt.irl.num_sessions);
        assert_eq!(fast.dialog.num_slots, dflt.dialog.num_slots);
        assert_eq!(fast.policy.epsilon, dflt.policy.epsilon);
    }
}
