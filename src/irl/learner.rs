// src/irl/learner.rs
//
// Apprenticeship learning via the projection algorithm.
//
// Estimate the expert's discounted feature expectations from rollouts, then
// alternate between (a) solving the MDP under the reward implied by the
// remaining expert gap and (b) projecting the running expectation estimate
// onto the line toward the newest candidate. Every full iteration yields one
// candidate simulation; the loop stops when the gap norm falls below the
// configured threshold or the iteration cap is hit.

use std::fmt;

use rand_chacha::ChaCha8Rng;

use super::candidate::{CandidateSimulation, CandidateStore, StoreError};
use super::features::{dot, l2_norm, FeatureMap, FeatureVector};
use super::solver::{MdpSolver, TdAlgorithm};
use crate::agent::{Agent, DialogError};
use crate::config::Config;
use crate::logging::{IterationRecord, TrainingSink};
use crate::session::run_session;
use crate::user::User;

/// Apprenticeship-learning error.
#[derive(Debug)]
pub enum LearnError {
    Dialog(DialogError),
    Store(StoreError),
}

impl fmt::Display for LearnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnError::Dialog(e) => write!(f, "dialog failed during training: {}", e),
            LearnError::Store(e) => write!(f, "candidate checkpoint failed: {}", e),
        }
    }
}

impl std::error::Error for LearnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LearnError::Dialog(e) => Some(e),
            LearnError::Store(e) => Some(e),
        }
    }
}

impl From<DialogError> for LearnError {
    fn from(e: DialogError) -> Self {
        LearnError::Dialog(e)
    }
}

impl From<StoreError> for LearnError {
    fn from(e: StoreError) -> Self {
        LearnError::Store(e)
    }
}

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    /// One candidate per completed projection iteration.
    pub candidates: Vec<CandidateSimulation>,
    /// Gap norm observed at the top of each iteration, in order. When the
    /// threshold stops the run early this carries one final sub-threshold
    /// entry with no matching candidate; on cap-limited runs it is parallel
    /// to `candidates`.
    pub margins: Vec<f64>,
    /// The expert feature expectations the run targeted.
    pub expert_expectations: FeatureVector,
}

/// Monte-Carlo estimate of discounted feature expectations.
///
/// Runs `num_sessions` full dialog sessions and averages, per feature
/// coordinate, the discounted visitation mass of its state-action pair.
pub fn feature_expectation(
    user: &mut User,
    agent: &mut Agent,
    features: &FeatureMap,
    gamma: f64,
    num_sessions: usize,
    rng: &mut ChaCha8Rng,
) -> Result<FeatureVector, DialogError> {
    let mut mu = features.zeros();
    for _ in 0..num_sessions {
        let trace = run_session(user, agent, rng)?;
        let mut discount = 1.0;
        for (state, action) in trace {
            mu[features.index(state, action)] += discount;
            discount *= gamma;
        }
    }
    for v in mu.iter_mut() {
        *v /= num_sessions as f64;
    }
    Ok(mu)
}

/// Projection-IRL driver.
pub struct ApprenticeshipLearner<'a> {
    cfg: &'a Config,
    features: &'a FeatureMap,
    algorithm: TdAlgorithm,
}

impl<'a> ApprenticeshipLearner<'a> {
    pub fn new(cfg: &'a Config, features: &'a FeatureMap, algorithm: TdAlgorithm) -> Self {
        Self {
            cfg,
            features,
            algorithm,
        }
    }

    /// Run the projection loop against the given expert.
    ///
    /// The learner user starts from a Dirichlet-random policy. When `store`
    /// is given, the candidate list is checkpointed every
    /// `irl.checkpoint_every` iterations and once more at the end.
    pub fn run(
        &self,
        expert: &mut User,
        agent: &mut Agent,
        store: Option<&CandidateStore>,
        sink: &mut dyn TrainingSink,
        rng: &mut ChaCha8Rng,
    ) -> Result<LearnOutcome, LearnError> {
        let irl = &self.cfg.irl;
        let gamma = self.cfg.solver.gamma;

        let mu_expert = feature_expectation(
            expert,
            agent,
            self.features,
            gamma,
            irl.num_sessions,
            rng,
        )?;

        let mut learner = User::random(&self.cfg.dialog, &self.cfg.policy, rng);
        let mut mu_bar = feature_expectation(
            &mut learner,
            agent,
            self.features,
            gamma,
            irl.num_sessions,
            rng,
        )?;

        let solver = match self.algorithm {
            TdAlgorithm::QLearning => {
                MdpSolver::q_learning(self.features, &self.cfg.solver, self.cfg.policy.epsilon)
            }
            TdAlgorithm::Sarsa => {
                MdpSolver::sarsa(self.features, &self.cfg.solver, self.cfg.policy.epsilon)
            }
        };

        let mut candidates: Vec<CandidateSimulation> = Vec::new();
        let mut margins = Vec::new();

        for iteration in 1..=irl.max_iterations {
            let weights: FeatureVector = mu_expert
                .iter()
                .zip(mu_bar.iter())
                .map(|(e, b)| e - b)
                .collect();
            let margin = l2_norm(&weights);
            margins.push(margin);
            if margin <= irl.threshold {
                break;
            }

            let outcome = solver.solve(&mut learner, agent, &weights, rng)?;
            let mu_curr = feature_expectation(
                &mut learner,
                agent,
                self.features,
                gamma,
                irl.num_sessions,
                rng,
            )?;

            let distance = l2_norm(
                &mu_expert
                    .iter()
                    .zip(mu_curr.iter())
                    .map(|(e, c)| e - c)
                    .collect::<Vec<f64>>(),
            );
            candidates.push(CandidateSimulation {
                policy: outcome.policy,
                values: outcome.values,
                weights,
                distance_to_expert: distance,
            });
            sink.log_iteration(&IterationRecord {
                iteration,
                margin,
                distance_to_expert: distance,
            });

            // Project mu_bar onto the segment toward the new candidate's
            // expectations: the orthogonal projection of mu_expert onto the
            // line through mu_bar and mu_curr.
            let step: Vec<f64> = mu_curr
                .iter()
                .zip(mu_bar.iter())
                .map(|(c, b)| c - b)
                .collect();
            let gap: Vec<f64> = mu_expert
                .iter()
                .zip(mu_bar.iter())
                .map(|(e, b)| e - b)
                .collect();
            let denom = dot(&step, &step);
            if denom > 0.0 {
                let coeff = dot(&step, &gap) / denom;
                for (b, s) in mu_bar.iter_mut().zip(step.iter()) {
                    *b += coeff * s;
                }
            }

            if let Some(store) = store {
                if iteration % irl.checkpoint_every == 0 {
                    store.store(&candidates)?;
                }
            }
        }

        if let Some(store) = store {
            store.store(&candidates)?;
        }

        Ok(LearnOutcome {
            candidates,
            margins,
            expert_expectations: mu_expert,
        })
    }
}
