// src/stats.rs
//
// Empirical action statistics for user simulations.
//
// Counts, per agent action kind, how often each user action kind occurred
// across a batch of rollout sessions. Used to compare a learned simulation
// (or a mixture) against the handcrafted expert.

use std::fmt;

use rand_chacha::ChaCha8Rng;

use crate::actions::{AgentActionKind, UserActionKind, NUM_AGENT_KINDS, NUM_USER_KINDS};
use crate::agent::{Agent, DialogError};
use crate::irl::Mixture;
use crate::session::{run_session, DialogTrace};
use crate::user::User;

/// Per-state user action counts accumulated over rollouts.
#[derive(Debug, Clone, Default)]
pub struct ActionStatistics {
    counts: [[u64; NUM_USER_KINDS]; NUM_AGENT_KINDS],
    sessions: usize,
}

impl ActionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trace into the counts.
    pub fn record_trace(&mut self, trace: &DialogTrace) {
        for (state, action) in trace {
            self.counts[state.index()][action.index()] += 1;
        }
        self.sessions += 1;
    }

    /// Number of sessions recorded.
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    pub fn count(&self, state: AgentActionKind, action: UserActionKind) -> u64 {
        self.counts[state.index()][action.index()]
    }

    /// Total user turns observed in `state`.
    pub fn total(&self, state: AgentActionKind) -> u64 {
        self.counts[state.index()].iter().sum()
    }

    /// Empirical distribution over user action kinds in `state`.
    ///
    /// All zeros when the state was never visited.
    pub fn frequencies(&self, state: AgentActionKind) -> [f64; NUM_USER_KINDS] {
        let total = self.total(state);
        let mut out = [0.0; NUM_USER_KINDS];
        if total == 0 {
            return out;
        }
        for (ix, count) in self.counts[state.index()].iter().enumerate() {
            out[ix] = *count as f64 / total as f64;
        }
        out
    }

    /// Roll out `sessions` dialogs with one user and accumulate statistics.
    pub fn collect_user(
        user: &mut User,
        agent: &mut Agent,
        sessions: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self, DialogError> {
        let mut stats = Self::new();
        for _ in 0..sessions {
            let trace = run_session(user, agent, rng)?;
            stats.record_trace(&trace);
        }
        Ok(stats)
    }

    /// Roll out `sessions` dialogs with a candidate mixture, drawing one
    /// member per session.
    pub fn collect_mixture(
        mixture: &mut Mixture,
        agent: &mut Agent,
        sessions: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self, DialogError> {
        let mut stats = Self::new();
        for _ in 0..sessions {
            let trace = mixture.sample_session(agent, rng)?;
            stats.record_trace(&trace);
        }
        Ok(stats)
    }
}

impl fmt::Display for ActionStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sessions: {}", self.sessions)?;
        for state in AgentActionKind::ALL {
            let freqs = self.frequencies(state);
            write!(f, "{:>16}:", state.as_str())?;
            for (ix, freq) in freqs.iter().enumerate() {
                write!(f, " {}={:.3}", UserActionKind::ALL[ix].as_str(), freq)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DialogConfig, PolicyConfig};
    use rand::SeedableRng;

    #[test]
    fn expert_frequencies_track_the_policy_rows() {
        let dialog = DialogConfig::default();
        let policy_cfg = PolicyConfig::default();
        let mut user = User::handcrafted(&dialog, &policy_cfg);
        let mut agent = Agent::new(&dialog);
        let mut rng = ChaCha8Rng::seed_from_u64(31);

        let stats =
            ActionStatistics::collect_user(&mut user, &mut agent, 2_000, &mut rng).unwrap();

        assert_eq!(stats.sessions(), 2_000);

        // Greet happens exactly once per session.
        assert_eq!(stats.total(AgentActionKind::Greet), 2_000);
        let greet = stats.frequencies(AgentActionKind::Greet);
        assert!((greet[UserActionKind::Silent.index()] - policy_cfg.greet_silent).abs() < 0.05);

        // The expert always answers an explicit confirmation with a confirm.
        let confirm = stats.frequencies(AgentActionKind::ExplicitConfirm);
        assert_eq!(confirm[UserActionKind::Confirm.index()], 1.0);
    }

    #[test]
    fn unvisited_states_report_zero_frequencies() {
        let stats = ActionStatistics::new();
        let freqs = stats.frequencies(AgentActionKind::AskSlot);
        assert!(freqs.iter().all(|f| *f == 0.0));
    }
}
