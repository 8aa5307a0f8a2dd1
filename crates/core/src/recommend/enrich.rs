use serde::Serialize;

use crate::domain::{Plan, PlanId, UserProfile};
use crate::explanation::{explain, feature_list, pounds, PlanExplanation};
use crate::label::{classify, MatchLabel};
use crate::pipeline::Scored;
use crate::scoring::{MatchScorer, ScoreBreakdown, ScoreResult};

const WEAK_FOOTNOTE_TOTAL: u8 = 50;
const COVERAGE_NETWORK: &str = "EE";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanCategory {
    TopPick,
    BestValue,
    CheapestGoodFit,
}

impl PlanCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TopPick => "Top Pick",
            Self::BestValue => "Best Value",
            Self::CheapestGoodFit => "Cheapest Good Fit",
        }
    }
}

/// Pointer from a lower-ranked plan back to the top match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alternative {
    pub label: &'static str,
    pub target: PlanId,
    pub provider: String,
}

/// A plan with everything the presentation layer shows for it. Built once per
/// profile and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedPlan {
    pub plan: Plan,
    pub score: ScoreResult,
    pub label: MatchLabel,
    pub explanation: PlanExplanation,
    pub features: Vec<String>,
    pub category: PlanCategory,
    pub footnote: String,
    pub alternative: Option<Alternative>,
}

impl Scored for EnrichedPlan {
    fn plan(&self) -> &Plan {
        &self.plan
    }

    fn total(&self) -> u8 {
        self.score.total
    }

    fn breakdown(&self) -> &ScoreBreakdown {
        &self.score.breakdown
    }
}

/// Score, classify and explain every plan, then rank by total (catalog order
/// for ties) and attach the comparative extras.
pub(crate) fn enrich(
    plans: &[Plan],
    profile: &UserProfile,
    scorer: &MatchScorer,
) -> Vec<EnrichedPlan> {
    let mut scored: Vec<(&Plan, ScoreResult)> =
        plans.iter().map(|plan| (plan, scorer.score(plan, profile))).collect();
    scored.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    let Some((top, _)) = scored.first() else {
        return Vec::new();
    };
    let top = *top;
    let cheapest = scored
        .iter()
        .map(|(plan, _)| *plan)
        .reduce(|min, plan| if plan.monthly_price < min.monthly_price { plan } else { min })
        .unwrap_or(top);

    let thresholds = scorer.config().thresholds;
    scored
        .iter()
        .enumerate()
        .map(|(rank, (plan, score))| {
            let is_top = rank == 0;
            let category = if is_top {
                PlanCategory::TopPick
            } else if plan.monthly_price < top.monthly_price {
                PlanCategory::CheapestGoodFit
            } else {
                PlanCategory::BestValue
            };
            EnrichedPlan {
                plan: (*plan).clone(),
                score: score.clone(),
                label: classify(score.total, &thresholds),
                explanation: explain(plan, profile),
                features: feature_list(plan),
                category,
                footnote: footnote(plan, score.total, is_top, top, cheapest),
                alternative: (!is_top).then(|| Alternative {
                    label: "top match",
                    target: top.id.clone(),
                    provider: top.provider.clone(),
                }),
            }
        })
        .collect()
}

fn footnote(plan: &Plan, total: u8, is_top: bool, top: &Plan, cheapest: &Plan) -> String {
    if is_top {
        if cheapest.id != plan.id {
            return format!(
                "Alternative for lower price: {} ({}/mo), but with trade-offs.",
                cheapest.provider,
                pounds(cheapest.monthly_price)
            );
        }
        return "This is your #1 match and best value option.".to_string();
    }

    if total < WEAK_FOOTNOTE_TOTAL {
        return format!(
            "Stronger all-rounder: {} matches your priorities much better.",
            top.provider
        );
    }

    if plan.monthly_price < top.monthly_price {
        let missing = if top.is_unlimited() { "unlimited data" } else { "premium features" };
        return format!("Cheaper than our top pick, but lacks {missing}.");
    }

    if plan.monthly_price > top.monthly_price {
        if plan.network == COVERAGE_NETWORK && top.network != COVERAGE_NETWORK {
            return "Alternative for max coverage: Stick with this if you need the absolute \
                    best signal."
                .to_string();
        }
        return format!(
            "Note: {} offers similar features for {} less.",
            top.provider,
            pounds(plan.monthly_price - top.monthly_price)
        );
    }

    format!("Consider {} for a better overall balance of features.", top.provider)
}
