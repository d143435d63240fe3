//! Scoring policy for the score-shaping operators.
//!
//! `~` lowers the scores of records it shares with its operand, `<` and `>`
//! bias one side of a union against the other, and escalated lookups weigh
//! less than exact ones. How much is a policy decision, so the executor only
//! talks to [`ScoringPolicy`].

use serde::{Deserialize, Serialize};

use super::ast::DEFAULT_TERM_WEIGHT;

/// Configurable weights for the default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight every term starts with
    pub term_weight: i32,
    /// How far `<`/`>` move a side, in units of `1 / term_weight`
    pub directional_step: i32,
    /// Multiplier on the penalty `~` subtracts
    pub adjust_factor: i32,
    /// Weight lost per escalation tier
    pub escalation_decay: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            term_weight: DEFAULT_TERM_WEIGHT,
            directional_step: 1,
            adjust_factor: 1,
            escalation_decay: 2,
        }
    }
}

/// Numeric rules behind ADJUST, LT/GT and escalation.
pub trait ScoringPolicy {
    /// New score of a record penalized by `penalty` under `~`.
    fn adjust(&self, score: i32, penalty: i32) -> i32;

    /// Score of the side ranked lower by `<`/`>`.
    fn demote(&self, score: i32) -> i32;

    /// Score of the side ranked higher by `<`/`>`.
    fn promote(&self, score: i32) -> i32;

    /// Term weight after `tier` escalation steps (0 = exact).
    fn escalated_weight(&self, weight: i32, tier: usize) -> i32;
}

/// Default policy built from [`ScoringWeights`].
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// `score + delta * |score| / w` with `w` the base term weight.
    ///
    /// A positive `delta` raises the score whatever its sign.
    fn scale(&self, score: i32, delta: i32) -> i32 {
        let w = self.weights.term_weight.max(1) as i64;
        let score = score as i64;
        let scaled = score + delta as i64 * score.abs() / w;
        scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

impl ScoringPolicy for Scorer {
    fn adjust(&self, score: i32, penalty: i32) -> i32 {
        score.saturating_sub(penalty.saturating_mul(self.weights.adjust_factor))
    }

    fn demote(&self, score: i32) -> i32 {
        self.scale(score, -self.weights.directional_step)
    }

    fn promote(&self, score: i32) -> i32 {
        self.scale(score, self.weights.directional_step)
    }

    fn escalated_weight(&self, weight: i32, tier: usize) -> i32 {
        if weight <= 0 || tier == 0 {
            return weight;
        }
        let decay = (self.weights.escalation_decay as i64).saturating_mul(tier as i64);
        (weight as i64 - decay).clamp(1, weight as i64) as i32
    }
}
