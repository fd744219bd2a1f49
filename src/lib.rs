//! Dialogsim core library.
//!
//! A slot-filling dialog simulator plus an apprenticeship-learning stack for
//! training user simulations against a handcrafted expert. The binary
//! (`src/main.rs`) is a thin CLI harness around these components.
//!
//! # Architecture
//!
//! The codebase separates the dialog protocol from the learning machinery:
//!
//! - **Actions** (`actions`): Agent and user action enums plus their
//!   kind-level views, which form the state/action spaces downstream.
//!
//! - **Agent** (`agent`): The deterministic-structure slot-filling agent
//!   driven by its slot tracker and the user's last action.
//!
//! - **User** (`user`): The stochastic user simulation, parameterized by a
//!   tabular policy (handcrafted, random, or learned).
//!
//! - **Session** (`session`): Turn alternation between one agent and one
//!   user, with full-run and step-wise driving modes.
//!
//! - **IRL** (`irl`): Feature expectations, tabular TD solvers, the
//!   projection loop, candidate persistence, and candidate mixtures.

pub mod actions;
pub mod agent;
pub mod config;
pub mod irl;
pub mod logging;
pub mod policy;
pub mod session;
pub mod state;
pub mod stats;
pub mod user;

// --- Re-exports for ergonomic external use ---------------------------------

pub use actions::{
    AgentAction, AgentActionKind, SlotId, UserAction, UserActionKind, NUM_AGENT_KINDS,
    NUM_USER_KINDS,
};

pub use agent::{Agent, DialogError};

pub use config::{Config, DialogConfig, IrlConfig, MixtureConfig, PolicyConfig, SolverConfig};

pub use logging::{FileSink, IterationRecord, NoopSink, TrainingSink};

pub use policy::{argmax_random_tiebreak, PolicyTable, ValueTable, ROW_SUM_TOLERANCE};

pub use session::{run_session, DialogSession, DialogTrace};

pub use state::{SlotArray, SlotStatus};

pub use stats::ActionStatistics;

pub use user::User;

pub use irl::{
    best_candidate, feature_expectation, ApprenticeshipLearner, CandidateSimulation,
    CandidateStore, FeatureMap, FeatureVector, LearnError, LearnOutcome, MdpSolver, Mixture,
    MixtureBuilder, MixtureError, Preference, Reward, SolveOutcome, StoreError, TdAlgorithm,
    CANDIDATE_FORMAT_VERSION,
};
