// src/policy.rs
//
// Tabular user policies and value functions.
//
// A policy is a small dense table: one probability row per agent action kind,
// one column per user action kind, in the fixed enumeration order from
// `actions.rs`. Value tables share the same shape with Q-values instead of
// probabilities.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Dirichlet;
use serde::{Deserialize, Serialize};

use crate::actions::{AgentActionKind, UserActionKind, NUM_AGENT_KINDS, NUM_USER_KINDS};
use crate::config::PolicyConfig;

/// Tolerance for the row-sums-to-one invariant.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Stochastic user policy: a distribution over user action kinds per
/// agent action kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    rows: [[f64; NUM_USER_KINDS]; NUM_AGENT_KINDS],
}

impl PolicyTable {
    /// The handcrafted expert policy.
    ///
    /// Rows not named by the config are deterministic: explicit confirmation
    /// is always answered with a confirm, close with a close.
    pub fn handcrafted(cfg: &PolicyConfig) -> Self {
        let mut rows = [[0.0; NUM_USER_KINDS]; NUM_AGENT_KINDS];

        let silent = UserActionKind::Silent.index();
        let all_slots = UserActionKind::AllSlots.index();
        let one_slot = UserActionKind::OneSlot.index();
        let confirm = UserActionKind::Confirm.index();
        let negate = UserActionKind::Negate.index();
        let close = UserActionKind::Close.index();

        rows[AgentActionKind::Greet.index()][silent] = cfg.greet_silent;
        rows[AgentActionKind::Greet.index()][all_slots] = 1.0 - cfg.greet_silent;

        rows[AgentActionKind::AskSlot.index()][one_slot] = cfg.ask_one_slot;
        rows[AgentActionKind::AskSlot.index()][all_slots] = 1.0 - cfg.ask_one_slot;

        rows[AgentActionKind::ExplicitConfirm.index()][confirm] = 1.0;

        rows[AgentActionKind::ConfirmAsk.index()][one_slot] = cfg.confirm_ask_one_slot;
        rows[AgentActionKind::ConfirmAsk.index()][negate] = 1.0 - cfg.confirm_ask_one_slot;

        rows[AgentActionKind::Close.index()][close] = 1.0;

        let table = Self { rows };
        debug_assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        table
    }

    /// A random policy: each row drawn from a symmetric Dirichlet with the
    /// given concentration.
    pub fn random(alpha: f64, rng: &mut ChaCha8Rng) -> Self {
        let dirichlet = Dirichlet::new_with_size(alpha, NUM_USER_KINDS)
            .expect("Dirichlet concentration must be positive");
        let mut rows = [[0.0; NUM_USER_KINDS]; NUM_AGENT_KINDS];
        for row in rows.iter_mut() {
            let sample = dirichlet.sample(rng);
            row.copy_from_slice(&sample);
        }
        let table = Self { rows };
        debug_assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        table
    }

    /// Epsilon-greedy policy over a value table.
    ///
    /// Every action gets `epsilon` mass; the remaining `1 - n*epsilon` goes
    /// to the argmax of the row (ties broken by a uniform draw). Any
    /// floating-point residual is redistributed onto random entries until the
    /// row sums exactly to 1.
    pub fn from_q_values(values: &ValueTable, epsilon: f64, rng: &mut ChaCha8Rng) -> Self {
        let mut rows = [[0.0; NUM_USER_KINDS]; NUM_AGENT_KINDS];
        for (state_ix, row) in rows.iter_mut().enumerate() {
            for p in row.iter_mut() {
                *p = epsilon;
            }
            let greedy = argmax_random_tiebreak(&values.rows[state_ix], rng);
            row[greedy] += 1.0 - NUM_USER_KINDS as f64 * epsilon;
            redistribute_residual(row, rng);
        }
        let table = Self { rows };
        debug_assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        table
    }

    /// Probability row for one agent action kind.
    pub fn row(&self, state: AgentActionKind) -> &[f64; NUM_USER_KINDS] {
        &self.rows[state.index()]
    }

    /// Probability of taking `action` in `state`.
    pub fn prob(&self, state: AgentActionKind, action: UserActionKind) -> f64 {
        self.rows[state.index()][action.index()]
    }

    /// Sample a user action kind for the given state.
    pub fn sample(&self, state: AgentActionKind, rng: &mut ChaCha8Rng) -> UserActionKind {
        let row = &self.rows[state.index()];
        let dist = WeightedIndex::new(row.iter()).expect("policy row must be a valid distribution");
        UserActionKind::ALL[dist.sample(rng)]
    }

    /// Strip residual exploration mass from every row and renormalize.
    ///
    /// Used after SARSA training to turn the final epsilon-greedy behavior
    /// policy into a near-deterministic greedy one.
    pub fn strip_exploration(&mut self, epsilon: f64) {
        for row in self.rows.iter_mut() {
            for p in row.iter_mut() {
                *p = (*p - epsilon).max(0.0);
            }
            let sum: f64 = row.iter().sum();
            debug_assert!(sum > 0.0, "stripping removed all probability mass");
            for p in row.iter_mut() {
                *p /= sum;
            }
        }
        debug_assert!(self.is_normalized(ROW_SUM_TOLERANCE));
    }

    /// True when every row sums to 1 within `tol`.
    pub fn is_normalized(&self, tol: f64) -> bool {
        self.rows.iter().all(|row| {
            let sum: f64 = row.iter().sum();
            (sum - 1.0).abs() <= tol && row.iter().all(|p| *p >= 0.0)
        })
    }
}

/// Tabular Q-value function, same shape as [`PolicyTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    rows: [[f64; NUM_USER_KINDS]; NUM_AGENT_KINDS],
}

impl ValueTable {
    /// All entries set to `value`.
    pub fn filled(value: f64) -> Self {
        Self {
            rows: [[value; NUM_USER_KINDS]; NUM_AGENT_KINDS],
        }
    }

    /// All entries zero.
    pub fn zeros() -> Self {
        Self::filled(0.0)
    }

    pub fn get(&self, state: AgentActionKind, action: UserActionKind) -> f64 {
        self.rows[state.index()][action.index()]
    }

    pub fn set(&mut self, state: AgentActionKind, action: UserActionKind, value: f64) {
        self.rows[state.index()][action.index()] = value;
    }

    /// Set every entry of one state's row.
    pub fn fill_row(&mut self, state: AgentActionKind, value: f64) {
        for v in self.rows[state.index()].iter_mut() {
            *v = value;
        }
    }

    pub fn row(&self, state: AgentActionKind) -> &[f64; NUM_USER_KINDS] {
        &self.rows[state.index()]
    }

    /// Maximum Q-value in one state's row.
    pub fn max_value(&self, state: AgentActionKind) -> f64 {
        self.rows[state.index()]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Index of the maximum element, ties broken by a uniform random draw.
pub fn argmax_random_tiebreak(values: &[f64], rng: &mut ChaCha8Rng) -> usize {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == max)
        .map(|(i, _)| i)
        .collect();
    tied[rng.gen_range(0..tied.len())]
}

/// Push a row's sum to exactly 1.0 by dumping the residual onto random
/// entries. Bounded corrective loop, not error recovery.
fn redistribute_residual(row: &mut [f64], rng: &mut ChaCha8Rng) {
    for _ in 0..8 {
        let sum: f64 = row.iter().sum();
        let residual = 1.0 - sum;
        if residual == 0.0 {
            return;
        }
        let ix = rng.gen_range(0..row.len());
        row[ix] += residual;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn handcrafted_rows_sum_to_one() {
        let table = PolicyTable::handcrafted(&PolicyConfig::default());
        assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        assert_eq!(
            table.prob(AgentActionKind::ExplicitConfirm, UserActionKind::Confirm),
            1.0
        );
        assert_eq!(table.prob(AgentActionKind::Close, UserActionKind::Close), 1.0);
    }

    #[test]
    fn random_rows_sum_to_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let table = PolicyTable::random(1.0, &mut rng);
            assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        }
    }

    #[test]
    fn epsilon_greedy_puts_bulk_on_argmax() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut values = ValueTable::zeros();
        values.set(AgentActionKind::AskSlot, UserActionKind::OneSlot, 5.0);

        let epsilon = 0.1;
        let table = PolicyTable::from_q_values(&values, epsilon, &mut rng);
        assert!(table.is_normalized(ROW_SUM_TOLERANCE));

        let greedy = table.prob(AgentActionKind::AskSlot, UserActionKind::OneSlot);
        assert!((greedy - (epsilon + 1.0 - NUM_USER_KINDS as f64 * epsilon)).abs() < 1e-6);
    }

    #[test]
    fn strip_exploration_yields_greedy_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut values = ValueTable::zeros();
        values.set(AgentActionKind::Greet, UserActionKind::AllSlots, 1.0);
        values.set(AgentActionKind::AskSlot, UserActionKind::OneSlot, 1.0);
        values.set(AgentActionKind::ExplicitConfirm, UserActionKind::Confirm, 1.0);
        values.set(AgentActionKind::ConfirmAsk, UserActionKind::OneSlot, 1.0);
        values.set(AgentActionKind::Close, UserActionKind::Close, 1.0);

        let epsilon = 0.1;
        let mut table = PolicyTable::from_q_values(&values, epsilon, &mut rng);
        table.strip_exploration(epsilon);

        assert!(table.is_normalized(ROW_SUM_TOLERANCE));
        assert!(table.prob(AgentActionKind::AskSlot, UserActionKind::OneSlot) > 0.999);
        assert!(table.prob(AgentActionKind::AskSlot, UserActionKind::Silent) < 1e-9);
    }

    #[test]
    fn argmax_tiebreak_hits_all_tied_indices() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let values = [1.0, 1.0, 0.0, 1.0];
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[argmax_random_tiebreak(&values, &mut rng)] = true;
        }
        assert!(seen[0] && seen[1] && seen[3]);
        assert!(!seen[2]);
    }

    #[test]
    fn sampling_respects_deterministic_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let table = PolicyTable::handcrafted(&PolicyConfig::default());
        for _ in 0..50 {
            assert_eq!(
                table.sample(AgentActionKind::Close, &mut rng),
                UserActionKind::Close
            );
        }
    }
}
