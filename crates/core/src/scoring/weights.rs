//! Lifestyle weight vectors and priority adjustments

use serde::{Deserialize, Serialize};

use crate::domain::{Lifestyle, Priority, UserProfile};

/// Relative importance of each criterion. Components may go negative after
/// adjustment; the total is normalized by the actual sum, never a constant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub price: i32,
    pub data: i32,
    pub roaming: i32,
    pub reliability: i32,
    pub contract: i32,
    pub features: i32,
}

impl CriterionWeights {
    pub const fn new(
        price: i32,
        data: i32,
        roaming: i32,
        reliability: i32,
        contract: i32,
        features: i32,
    ) -> Self {
        Self { price, data, roaming, reliability, contract, features }
    }

    pub fn sum(&self) -> i32 {
        self.price + self.data + self.roaming + self.reliability + self.contract + self.features
    }

    fn plus(self, delta: Self) -> Self {
        Self {
            price: self.price + delta.price,
            data: self.data + delta.data,
            roaming: self.roaming + delta.roaming,
            reliability: self.reliability + delta.reliability,
            contract: self.contract + delta.contract,
            features: self.features + delta.features,
        }
    }

    /// Weighted mean of six fits ordered price, data, roaming, reliability,
    /// contract, features.
    pub fn weighted_mean(&self, fits: [f64; 6]) -> f64 {
        let weights = [
            self.price,
            self.data,
            self.roaming,
            self.reliability,
            self.contract,
            self.features,
        ];
        let total_weight = self.sum();
        if total_weight == 0 {
            return 0.0;
        }
        let weighted_sum: f64 =
            fits.iter().zip(weights).map(|(fit, weight)| fit * f64::from(weight)).sum();
        weighted_sum / f64::from(total_weight)
    }
}

impl Lifestyle {
    pub fn base_weights(&self) -> CriterionWeights {
        match self {
            Self::Everyday => CriterionWeights::new(20, 20, 15, 25, 15, 5),
            Self::Budget => CriterionWeights::new(40, 15, 10, 20, 10, 5),
            Self::Power => CriterionWeights::new(20, 40, 10, 20, 5, 5),
            Self::Remote => CriterionWeights::new(15, 25, 10, 30, 10, 10),
            Self::Travel => CriterionWeights::new(15, 15, 35, 20, 10, 5),
            Self::Streamer => CriterionWeights::new(20, 40, 5, 20, 10, 5),
            Self::Social => CriterionWeights::new(25, 30, 10, 20, 10, 5),
            Self::Other => CriterionWeights::new(25, 25, 15, 20, 10, 5),
        }
    }
}

/// A delta applied once when any of its trigger priorities is present.
#[derive(Clone, Copy, Debug)]
pub struct WeightAdjustment {
    pub triggers: &'static [Priority],
    pub delta: CriterionWeights,
}

impl WeightAdjustment {
    fn applies_to(&self, profile: &UserProfile) -> bool {
        profile.has_any(self.triggers)
    }
}

pub const WEIGHT_ADJUSTMENTS: [WeightAdjustment; 6] = [
    WeightAdjustment {
        triggers: &[Priority::CheapAndSimple],
        delta: CriterionWeights::new(10, -5, -5, 0, 0, 0),
    },
    WeightAdjustment {
        triggers: &[Priority::NeverRunOut, Priority::Unlimited],
        delta: CriterionWeights::new(-5, 10, 0, 0, -5, 0),
    },
    WeightAdjustment {
        triggers: &[Priority::BestCoverage],
        delta: CriterionWeights::new(-5, 0, 0, 10, 0, 0),
    },
    WeightAdjustment {
        triggers: &[Priority::NoContract],
        delta: CriterionWeights::new(0, 0, 0, 0, 10, 0),
    },
    WeightAdjustment {
        triggers: &[Priority::Hotspot],
        delta: CriterionWeights::new(0, 5, 0, 0, 0, 10),
    },
    WeightAdjustment {
        triggers: &[Priority::EuropeTravel],
        delta: CriterionWeights::new(0, 0, 10, 0, 0, 0),
    },
];

/// Fold the matching adjustments over the lifestyle's base vector.
pub fn fold_weights(lifestyle: Lifestyle, profile: &UserProfile) -> CriterionWeights {
    WEIGHT_ADJUSTMENTS
        .iter()
        .filter(|adjustment| adjustment.applies_to(profile))
        .fold(lifestyle.base_weights(), |weights, adjustment| weights.plus(adjustment.delta))
}
