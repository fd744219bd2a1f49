// src/irl/mixture.rs
//
// Combining learned candidates into a single user simulation.
//
// Three strategies over a finished candidate list:
//   - best: the single candidate closest to the expert expectations,
//   - qp: distance-minimizing convex combination, found by solving a
//     simplex-constrained quadratic program with Frank-Wolfe,
//   - gibbs: softmax over negative distance at a fixed temperature.
//
// A mixture samples one member per session, so long-run action frequencies
// are the weighted average of the members'.

use std::fmt;

use rand::distributions::{Distribution, WeightedIndex};
use rand_chacha::ChaCha8Rng;

use super::candidate::CandidateSimulation;
use super::features::{dot, FeatureMap, FeatureVector};
use super::learner::feature_expectation;
use crate::agent::{Agent, DialogError};
use crate::config::{Config, MixtureConfig};
use crate::session::{run_session, DialogTrace};
use crate::user::User;

/// Mixture construction error.
#[derive(Debug)]
pub enum MixtureError {
    /// The candidate list was empty.
    NoCandidates,
    /// The QP solver hit its iteration cap before reaching the gap
    /// tolerance.
    QpNotConverged { gap: f64 },
    /// Rolling out a candidate to estimate its expectations failed.
    Dialog(DialogError),
}

impl fmt::Display for MixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixtureError::NoCandidates => write!(f, "no candidates to mix"),
            MixtureError::QpNotConverged { gap } => {
                write!(f, "mixture QP did not converge (gap {})", gap)
            }
            MixtureError::Dialog(e) => write!(f, "candidate rollout failed: {}", e),
        }
    }
}

impl std::error::Error for MixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MixtureError::Dialog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DialogError> for MixtureError {
    fn from(e: DialogError) -> Self {
        MixtureError::Dialog(e)
    }
}

/// The candidate whose feature expectations sit closest to the expert's.
pub fn best_candidate(
    candidates: &[CandidateSimulation],
) -> Result<&CandidateSimulation, MixtureError> {
    candidates
        .iter()
        .min_by(|a, b| {
            a.distance_to_expert
                .partial_cmp(&b.distance_to_expert)
                .expect("candidate distances must not be NaN")
        })
        .ok_or(MixtureError::NoCandidates)
}

/// A weighted collection of candidate users acting as one simulation.
///
/// Each session draws one member according to the weights and lets it play
/// the whole dialog.
#[derive(Debug, Clone)]
pub struct Mixture {
    users: Vec<User>,
    weights: Vec<f64>,
}

impl Mixture {
    fn new(users: Vec<User>, weights: Vec<f64>) -> Self {
        debug_assert_eq!(users.len(), weights.len());
        debug_assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        Self { users, weights }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Draw one member and run a full session with it.
    pub fn sample_session(
        &mut self,
        agent: &mut Agent,
        rng: &mut ChaCha8Rng,
    ) -> Result<DialogTrace, DialogError> {
        let dist = WeightedIndex::new(self.weights.iter())
            .expect("mixture weights must form a valid distribution");
        let member = dist.sample(rng);
        run_session(&mut self.users[member], agent, rng)
    }
}

/// Builds mixtures from a candidate list.
pub struct MixtureBuilder<'a> {
    cfg: &'a Config,
    features: &'a FeatureMap,
}

impl<'a> MixtureBuilder<'a> {
    pub fn new(cfg: &'a Config, features: &'a FeatureMap) -> Self {
        Self { cfg, features }
    }

    fn users_for(&self, candidates: &[CandidateSimulation]) -> Vec<User> {
        candidates
            .iter()
            .map(|c| User::with_policy(c.policy.clone(), &self.cfg.dialog))
            .collect()
    }

    /// Distance-minimizing convex combination.
    ///
    /// Estimates each candidate's feature expectations by rollout, then
    /// minimizes `||mu_expert - sum_i lambda_i mu_i||^2` over the
    /// probability simplex.
    pub fn qp(
        &self,
        candidates: &[CandidateSimulation],
        expert_expectations: &[f64],
        agent: &mut Agent,
        rng: &mut ChaCha8Rng,
    ) -> Result<Mixture, MixtureError> {
        if candidates.is_empty() {
            return Err(MixtureError::NoCandidates);
        }

        let mut users = self.users_for(candidates);
        let mut mus: Vec<FeatureVector> = Vec::with_capacity(users.len());
        for user in users.iter_mut() {
            mus.push(feature_expectation(
                user,
                agent,
                self.features,
                self.cfg.solver.gamma,
                self.cfg.irl.num_sessions,
                rng,
            )?);
        }

        let n = mus.len();
        let mut p = vec![vec![0.0; n]; n];
        let mut q = vec![0.0; n];
        for i in 0..n {
            q[i] = -2.0 * dot(expert_expectations, &mus[i]);
            for j in 0..n {
                p[i][j] = dot(&mus[i], &mus[j]);
            }
        }

        let weights = solve_simplex_qp(&p, &q, &self.cfg.mixture)?;
        Ok(Mixture::new(users, weights))
    }

    /// Gibbs weighting: `w_i` proportional to `exp(-distance_i / tau)`.
    pub fn gibbs(&self, candidates: &[CandidateSimulation]) -> Result<Mixture, MixtureError> {
        if candidates.is_empty() {
            return Err(MixtureError::NoCandidates);
        }

        let tau = self.cfg.mixture.tau;
        // Shift by the minimum distance before exponentiating so small tau
        // never underflows every weight to zero at once.
        let min = candidates
            .iter()
            .map(|c| c.distance_to_expert)
            .fold(f64::INFINITY, f64::min);
        let mut weights: Vec<f64> = candidates
            .iter()
            .map(|c| (-(c.distance_to_expert - min) / tau).exp())
            .collect();
        let sum: f64 = weights.iter().sum();
        for w in weights.iter_mut() {
            *w /= sum;
        }

        Ok(Mixture::new(self.users_for(candidates), weights))
    }
}

/// Minimize `x^T P x + q^T x` over the probability simplex with Frank-Wolfe.
///
/// `P` must be symmetric positive semidefinite (it is a Gram matrix here, so
/// that holds by construction). Iterates stay feasible throughout; stops once
/// the Frank-Wolfe duality gap drops below the configured tolerance.
pub fn solve_simplex_qp(
    p: &[Vec<f64>],
    q: &[f64],
    cfg: &MixtureConfig,
) -> Result<Vec<f64>, MixtureError> {
    let n = q.len();
    if n == 0 {
        return Err(MixtureError::NoCandidates);
    }
    if n == 1 {
        return Ok(vec![1.0]);
    }

    let mut x = vec![1.0 / n as f64; n];
    let mut gap = f64::INFINITY;

    for _ in 0..cfg.qp_max_iterations {
        // gradient of x^T P x + q^T x
        let mut grad = vec![0.0; n];
        for i in 0..n {
            grad[i] = q[i] + 2.0 * dot(&p[i], &x);
        }

        // Linear minimizer over the simplex is a vertex.
        let mut vertex = 0;
        for i in 1..n {
            if grad[i] < grad[vertex] {
                vertex = i;
            }
        }

        gap = dot(&grad, &x) - grad[vertex];
        if gap <= cfg.qp_tolerance {
            return Ok(x);
        }

        // Exact line search toward the vertex: the objective is quadratic
        // along d = e_vertex - x, minimized at gap / (2 d^T P d).
        let d: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, xi)| if i == vertex { 1.0 - xi } else { -xi })
            .collect();
        let mut curvature = 0.0;
        for i in 0..n {
            curvature += d[i] * dot(&p[i], &d);
        }
        let step = if curvature > 0.0 {
            (gap / (2.0 * curvature)).min(1.0)
        } else {
            1.0
        };
        for (xi, di) in x.iter_mut().zip(d.iter()) {
            *xi += step * di;
        }
    }

    Err(MixtureError::QpNotConverged { gap })
}
