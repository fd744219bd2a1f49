// src/irl/reward.rs
//
// Linear reward and preference functionals over the feature map.
//
// Because feature vectors are one-hot, evaluating either functional reduces
// to a single weight lookup.

use super::features::FeatureMap;
use crate::actions::{AgentActionKind, UserActionKind};

/// Reward function for the user-side MDP: `r(s, a) = w . phi(s, a)`.
#[derive(Debug, Clone)]
pub struct Reward<'a> {
    features: &'a FeatureMap,
    weights: Vec<f64>,
}

impl<'a> Reward<'a> {
    /// Panics if `weights` does not match the feature dimension.
    pub fn new(features: &'a FeatureMap, weights: Vec<f64>) -> Self {
        assert_eq!(
            weights.len(),
            features.dim(),
            "reward weights must match the feature dimension"
        );
        Self { features, weights }
    }

    pub fn get(&self, state: AgentActionKind, action: UserActionKind) -> f64 {
        self.weights[self.features.index(state, action)]
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Preference functional: same shape as [`Reward`], used to score actions
/// when deriving a preference-weighted policy instead of a reward-weighted
/// one. Defaults to a flat 0.5 per coordinate.
#[derive(Debug, Clone)]
pub struct Preference<'a> {
    features: &'a FeatureMap,
    theta: Vec<f64>,
}

impl<'a> Preference<'a> {
    pub fn new(features: &'a FeatureMap, theta: Option<Vec<f64>>) -> Self {
        let theta = match theta {
            Some(t) if t.len() == features.dim() => t,
            _ => vec![0.5; features.dim()],
        };
        Self { features, theta }
    }

    pub fn get(&self, state: AgentActionKind, action: UserActionKind) -> f64 {
        self.theta[self.features.index(state, action)]
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }
}
