//! Sub-fit rules and the weighted total

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::weights::{fold_weights, CriterionWeights};
use super::{clamp_fit, ScoringConfig};
use crate::domain::{HotspotPolicy, Lifestyle, Plan, Priority, UserProfile};

/// Six canonical sub-fits, each in 0..=100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub price_fit: f64,
    pub data_fit: f64,
    pub roaming_fit: f64,
    pub reliability_fit: f64,
    pub contract_fit: f64,
    pub features_fit: f64,
}

impl ScoreBreakdown {
    pub fn coverage_fit(&self) -> f64 {
        self.reliability_fit
    }

    pub fn hotspot_fit(&self) -> f64 {
        self.features_fit
    }

    pub fn budget_fit(&self) -> f64 {
        self.price_fit
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.price_fit,
            self.data_fit,
            self.roaming_fit,
            self.reliability_fit,
            self.contract_fit,
            self.features_fit,
        ]
    }
}

/// A cap that lowered (or was eligible to lower) the total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guardrail {
    OverBudget,
    RoamingUnmet,
    HotspotUnmet,
}

/// Debug trace of how a total was reached. Never feeds back into scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreTrace {
    pub lifestyle: Lifestyle,
    pub weights: CriterionWeights,
    pub guardrails: Vec<Guardrail>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total: u8,
    pub breakdown: ScoreBreakdown,
    pub trace: ScoreTrace,
}

/// Profile-derived needs shared by the fit rules and guardrails.
struct Needs {
    lifestyle: Lifestyle,
    heavy_data: bool,
    roaming: bool,
    hotspot: bool,
    coverage: bool,
    flexibility: bool,
}

impl Needs {
    fn of(profile: &UserProfile) -> Self {
        let lifestyle = profile.lifestyle.unwrap_or(Lifestyle::Everyday);
        Self {
            lifestyle,
            heavy_data: profile.has(Priority::NeverRunOut)
                || matches!(lifestyle, Lifestyle::Power | Lifestyle::Streamer),
            roaming: profile.has(Priority::EuropeTravel) || lifestyle == Lifestyle::Travel,
            hotspot: profile.has(Priority::Hotspot) || lifestyle == Lifestyle::Remote,
            coverage: profile.has(Priority::BestCoverage),
            flexibility: lifestyle == Lifestyle::Budget || profile.has(Priority::NoContract),
        }
    }
}

/// Deterministic scorer. Holds only configuration, so the same inputs always
/// produce the same result.
#[derive(Clone, Debug, Default)]
pub struct MatchScorer {
    config: ScoringConfig,
}

impl MatchScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, plan: &Plan, profile: &UserProfile) -> ScoreResult {
        let needs = Needs::of(profile);
        let weights = fold_weights(needs.lifestyle, profile);
        let price = plan.monthly_price.max(Decimal::ZERO);
        let budget = profile.budget.filter(|budget| *budget > Decimal::ZERO);

        let breakdown = ScoreBreakdown {
            price_fit: clamp_fit(price_fit(price, budget, needs.lifestyle)),
            data_fit: clamp_fit(data_fit(plan, &needs)),
            roaming_fit: clamp_fit(roaming_fit(plan, &needs)),
            reliability_fit: clamp_fit(reliability_fit(plan, &needs)),
            contract_fit: clamp_fit(contract_fit(plan, &needs)),
            features_fit: clamp_fit(features_fit(plan, &needs)),
        };

        let mut total = weights.weighted_mean(breakdown.as_array());
        let mut guardrails = Vec::new();
        let caps = &self.config.caps;

        if budget.is_some_and(|budget| exceeds_double(price, budget)) {
            total = total.min(f64::from(caps.over_budget));
            guardrails.push(Guardrail::OverBudget);
        }
        if needs.roaming && !plan.eu_roaming_included {
            total = total.min(f64::from(caps.roaming_unmet));
            guardrails.push(Guardrail::RoamingUnmet);
        }
        if needs.lifestyle == Lifestyle::Remote && plan.hotspot_policy == HotspotPolicy::NotAllowed
        {
            total = total.min(f64::from(caps.hotspot_unmet));
            guardrails.push(Guardrail::HotspotUnmet);
        }

        ScoreResult {
            total: clamp_fit(total).round() as u8,
            breakdown,
            trace: ScoreTrace { lifestyle: needs.lifestyle, weights, guardrails },
        }
    }
}

/// A budget too large to double can never be exceeded twice over.
fn exceeds_double(price: Decimal, budget: Decimal) -> bool {
    budget.checked_mul(Decimal::TWO).is_some_and(|double| price > double)
}

fn price_fit(price: Decimal, budget: Option<Decimal>, lifestyle: Lifestyle) -> f64 {
    let mut fit = match budget {
        Some(budget) if price <= budget => {
            let comfortable = budget.checked_mul(Decimal::new(75, 2)).unwrap_or(budget);
            if price <= comfortable {
                110.0
            } else {
                100.0
            }
        }
        Some(budget) => {
            let overage = (price - budget)
                .checked_div(budget)
                .and_then(|ratio| ratio.to_f64())
                .unwrap_or(f64::MAX);
            if overage <= 0.25 {
                100.0 - overage * 160.0
            } else if overage <= 0.5 {
                60.0 - (overage - 0.25) * 80.0
            } else {
                30.0
            }
        }
        None => {
            if price <= Decimal::from(8) {
                100.0
            } else if price <= Decimal::from(15) {
                85.0
            } else if price <= Decimal::from(25) {
                65.0
            } else if price <= Decimal::from(35) {
                45.0
            } else {
                25.0
            }
        }
    };
    if lifestyle == Lifestyle::Budget && price > Decimal::from(25) {
        fit -= 20.0;
    }
    fit
}

fn data_fit(plan: &Plan, needs: &Needs) -> f64 {
    let Some(allowance) = plan.allowance_f64() else {
        return 100.0;
    };
    let fit: f64 = if allowance >= 100.0 {
        90.0
    } else if allowance >= 50.0 {
        80.0
    } else if allowance >= 20.0 {
        70.0
    } else if allowance >= 10.0 {
        60.0
    } else {
        40.0
    };
    if needs.heavy_data && allowance < 50.0 {
        fit.min(50.0)
    } else {
        fit
    }
}

fn roaming_fit(plan: &Plan, needs: &Needs) -> f64 {
    if needs.roaming && !plan.eu_roaming_included {
        return 20.0;
    }
    if plan.global_roaming_included {
        100.0
    } else if plan.eu_roaming_included {
        match plan.eu_roaming_cap_gb {
            Some(cap) if cap < Decimal::from(20) => 75.0,
            _ => 90.0,
        }
    } else {
        30.0
    }
}

fn reliability_fit(plan: &Plan, needs: &Needs) -> f64 {
    let fit = f64::from(plan.reliability_rating) * 20.0;
    if needs.coverage && plan.reliability_rating < 4 {
        fit - 20.0
    } else {
        fit
    }
}

fn contract_fit(plan: &Plan, needs: &Needs) -> f64 {
    let fit = match plan.contract_length_months {
        1 => 100.0,
        12 => 70.0,
        24 => 40.0,
        _ => 50.0,
    };
    if needs.flexibility && plan.contract_length_months >= 24 {
        fit - 30.0
    } else {
        fit
    }
}

fn features_fit(plan: &Plan, needs: &Needs) -> f64 {
    let mut fit = match plan.hotspot_policy {
        HotspotPolicy::Unlimited => 100.0,
        HotspotPolicy::Limited => 80.0,
        HotspotPolicy::NotAllowed => 30.0,
    };
    if plan.includes_5g {
        fit += 5.0;
    }
    if plan.has_data_rollover() {
        fit += 10.0;
    }
    if plan.has_no_credit_check() {
        fit += 5.0;
    }
    if needs.hotspot {
        if plan.hotspot_policy == HotspotPolicy::NotAllowed {
            fit = 10.0;
        } else {
            fit += 10.0;
        }
    }
    fit
}
