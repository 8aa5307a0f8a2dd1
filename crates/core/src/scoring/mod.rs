//! Match scoring
//!
//! Converts a (plan, profile) pair into six sub-fits and a weighted total.
//! Thresholds live in one [`ScoringConfig`] shared with the label classifier
//! and the price-sort partition so the bands never drift apart.

mod engine;
mod weights;

pub use engine::{Guardrail, MatchScorer, ScoreBreakdown, ScoreResult, ScoreTrace};
pub use weights::{fold_weights, CriterionWeights, WeightAdjustment, WEIGHT_ADJUSTMENTS};

use serde::{Deserialize, Serialize};

/// Score bands used by the label classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub excellent: u8,
    pub good: u8,
    pub fair: u8,
}

/// Post-weighting caps applied when a disqualifying mismatch is detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailCaps {
    /// Price more than double the stated budget.
    pub over_budget: u8,
    /// Roaming needed but EU roaming not included.
    pub roaming_unmet: u8,
    /// Remote worker on a plan that forbids hotspotting.
    pub hotspot_unmet: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub thresholds: MatchThresholds,
    pub caps: GuardrailCaps,
    /// Price sort never ranks a plan below this total above one at or over it.
    pub weak_match_floor: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        DEFAULT_SCORING
    }
}

pub const DEFAULT_THRESHOLDS: MatchThresholds =
    MatchThresholds { excellent: 80, good: 65, fair: 50 };

pub const DEFAULT_GUARDRAIL_CAPS: GuardrailCaps =
    GuardrailCaps { over_budget: 55, roaming_unmet: 45, hotspot_unmet: 40 };

pub const DEFAULT_WEAK_MATCH_FLOOR: u8 = 40;

pub const DEFAULT_SCORING: ScoringConfig = ScoringConfig {
    thresholds: DEFAULT_THRESHOLDS,
    caps: DEFAULT_GUARDRAIL_CAPS,
    weak_match_floor: DEFAULT_WEAK_MATCH_FLOOR,
};

/// Clamp a sub-fit or total into the 0..=100 range.
pub(crate) fn clamp_fit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
