// src/irl/mod.rs
//
// Apprenticeship learning for dialog user simulations.
//
// The pipeline: estimate the expert's discounted feature expectations, run
// the projection algorithm (solving the user-side MDP with tabular TD
// between projections), persist the candidate simulations it produces, and
// finally pick or mix candidates into a deployable user simulation.
//
// Key components:
// - FeatureMap: one-hot features over (agent-kind, user-kind) pairs
// - Reward / Preference: linear functionals over the feature space
// - MdpSolver: tabular Q-learning / SARSA over dialog episodes
// - ApprenticeshipLearner: the projection-IRL loop
// - CandidateStore: versioned JSON checkpointing of candidate lists
// - Mixture / MixtureBuilder: best, QP, and Gibbs candidate combination

pub mod candidate;
pub mod features;
pub mod learner;
pub mod mixture;
pub mod reward;
pub mod solver;

// Re-exports for convenience
pub use candidate::{CandidateSimulation, CandidateStore, StoreError, CANDIDATE_FORMAT_VERSION};
pub use features::{dot, l2_norm, FeatureMap, FeatureVector};
pub use learner::{feature_expectation, ApprenticeshipLearner, LearnError, LearnOutcome};
pub use mixture::{best_candidate, solve_simplex_qp, Mixture, MixtureBuilder, MixtureError};
pub use reward::{Preference, Reward};
pub use solver::{MdpSolver, SolveOutcome, TdAlgorithm};
