// src/irl/features.rs
//
// One-hot feature map over the (agent-kind, user-kind) cross product.
//
// The map is a bijection: every distinct state-action pair owns exactly one
// coordinate, so the dot product of two feature vectors is 1 iff the pairs
// are equal. Built explicitly by the caller and shared by reference; no
// hidden global initialization.

use crate::actions::{AgentActionKind, UserActionKind, NUM_AGENT_KINDS, NUM_USER_KINDS};

/// Dense real vector in the feature space.
pub type FeatureVector = Vec<f64>;

/// One-hot encoding of (agent-action-kind, user-action-kind) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMap {
    dim: usize,
}

impl Default for FeatureMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureMap {
    pub fn new() -> Self {
        Self {
            dim: NUM_AGENT_KINDS * NUM_USER_KINDS,
        }
    }

    /// Dimension of the feature space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinate owned by the given state-action pair.
    pub fn index(&self, state: AgentActionKind, action: UserActionKind) -> usize {
        state.index() * NUM_USER_KINDS + action.index()
    }

    /// Full one-hot vector for the given state-action pair.
    pub fn vector(&self, state: AgentActionKind, action: UserActionKind) -> FeatureVector {
        let mut v = vec![0.0; self.dim];
        v[self.index(state, action)] = 1.0;
        v
    }

    /// A zero vector of the right dimension.
    pub fn zeros(&self) -> FeatureVector {
        vec![0.0; self.dim]
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}
