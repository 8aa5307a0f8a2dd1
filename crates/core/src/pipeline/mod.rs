//! Filter, relax and sort over already-scored plans
//!
//! Nothing here re-scores: the pipeline only narrows and orders what the
//! orchestrator enriched. Relaxation and the per-mode pre-filters are two
//! separate narrowing steps and run in that order.

mod filters;
mod sort;

pub use filters::{
    ContractFilter, DataBand, NetworkFilter, PlanFilters, PriceBand, RoamingFilter,
    SpecialFeature,
};
pub use sort::SortMode;

use serde::{Deserialize, Serialize};

use crate::domain::Plan;
use crate::scoring::ScoreBreakdown;

/// Anything the pipeline can rank.
pub trait Scored {
    fn plan(&self) -> &Plan;
    fn total(&self) -> u8;
    fn breakdown(&self) -> &ScoreBreakdown;
}

/// How far the filters had to be loosened. Price, data and roaming are never
/// relaxed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelaxationStage {
    #[default]
    Strict,
    WithoutSpecialFeatures,
    WithoutNetwork,
    WithoutContract,
}

impl RelaxationStage {
    pub const ORDER: [RelaxationStage; 4] = [
        Self::Strict,
        Self::WithoutSpecialFeatures,
        Self::WithoutNetwork,
        Self::WithoutContract,
    ];

    /// Filters with every constraint up to and including this stage dropped.
    pub fn apply_to(&self, filters: &PlanFilters) -> PlanFilters {
        let mut relaxed = filters.clone();
        if *self >= Self::WithoutSpecialFeatures {
            relaxed.special_features.clear();
        }
        if *self >= Self::WithoutNetwork {
            relaxed.network = NetworkFilter::Any;
        }
        if *self >= Self::WithoutContract {
            relaxed.contract = ContractFilter::Any;
        }
        relaxed
    }
}

#[derive(Debug)]
pub struct PipelineResult<'a, T> {
    pub plans: Vec<&'a T>,
    pub relaxation: RelaxationStage,
}

impl<T> PipelineResult<'_, T> {
    pub fn was_relaxed(&self) -> bool {
        self.relaxation != RelaxationStage::Strict
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

fn filter_with<'a, T: Scored>(items: &'a [T], filters: &PlanFilters) -> Vec<&'a T> {
    items.iter().filter(|item| filters.matches(item.plan())).collect()
}

/// Strict filter, progressive relaxation when empty, then the mode's sort.
pub fn apply<'a, T: Scored>(
    items: &'a [T],
    filters: &PlanFilters,
    mode: SortMode,
    weak_match_floor: u8,
) -> PipelineResult<'a, T> {
    let mut previous: Option<PlanFilters> = None;
    for stage in RelaxationStage::ORDER {
        let stage_filters = stage.apply_to(filters);
        if previous.as_ref() == Some(&stage_filters) {
            continue;
        }
        let matched = filter_with(items, &stage_filters);
        if !matched.is_empty() {
            return PipelineResult {
                plans: sort::sort_plans(matched, mode, weak_match_floor),
                relaxation: stage,
            };
        }
        previous = Some(stage_filters);
    }
    PipelineResult { plans: Vec::new(), relaxation: RelaxationStage::Strict }
}
