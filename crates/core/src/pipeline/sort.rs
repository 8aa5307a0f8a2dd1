use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Scored;
use crate::domain::{Lifestyle, UnknownTag};

/// Plans below this allowance are hidden from Most Data unless nothing else is left.
const MOST_DATA_MIN_GB: i64 = 5;
const COVERAGE_NETWORK_BOOST: f64 = 10.0;
const PREMIUM_NETWORKS: [&str; 2] = ["EE", "Vodafone"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    Recommended,
    Price,
    MostData,
    BestCoverage,
    BestEuRoaming,
    BestBudgetFit,
}

impl SortMode {
    pub const ALL: [SortMode; 6] = [
        Self::Recommended,
        Self::Price,
        Self::MostData,
        Self::BestCoverage,
        Self::BestEuRoaming,
        Self::BestBudgetFit,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Price => "price",
            Self::MostData => "most-data",
            Self::BestCoverage => "best-coverage",
            Self::BestEuRoaming => "best-eu-roaming",
            Self::BestBudgetFit => "best-budget-fit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Recommended => "Recommended",
            Self::Price => "Price",
            Self::MostData => "Most Data",
            Self::BestCoverage => "Best Coverage",
            Self::BestEuRoaming => "Best EU Roaming",
            Self::BestBudgetFit => "Best Budget Fit",
        }
    }

    /// Sort tabs offered to a lifestyle, most relevant first.
    pub fn tabs_for(lifestyle: Option<Lifestyle>) -> &'static [SortMode] {
        use SortMode::*;
        match lifestyle {
            Some(Lifestyle::Remote) => &[Recommended, MostData, BestCoverage, Price, BestBudgetFit],
            Some(Lifestyle::Streamer | Lifestyle::Social) => {
                &[Recommended, MostData, Price, BestBudgetFit, BestEuRoaming]
            }
            Some(Lifestyle::Travel) => &[Recommended, BestEuRoaming, Price, MostData, BestBudgetFit],
            Some(Lifestyle::Budget) => &[BestBudgetFit, Price, Recommended, MostData, BestEuRoaming],
            Some(Lifestyle::Power) => &[MostData, Recommended, BestCoverage, Price, BestBudgetFit],
            Some(Lifestyle::Everyday) => {
                &[Recommended, Price, MostData, BestCoverage, BestEuRoaming]
            }
            Some(Lifestyle::Other) | None => {
                &[Recommended, Price, MostData, BestEuRoaming, BestBudgetFit]
            }
        }
    }

    pub fn default_for(lifestyle: Option<Lifestyle>) -> SortMode {
        Self::tabs_for(lifestyle).first().copied().unwrap_or_default()
    }
}

impl FromStr for SortMode {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|mode| {
                mode.key().eq_ignore_ascii_case(trimmed) || mode.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownTag { kind: "sort mode", value: value.to_string() })
    }
}

fn price<T: Scored>(item: &T) -> Decimal {
    item.plan().monthly_price
}

fn by_price_asc<T: Scored>(a: &T, b: &T) -> Ordering {
    price(a).cmp(&price(b))
}

fn by_total_desc<T: Scored>(a: &T, b: &T) -> Ordering {
    b.total().cmp(&a.total())
}

/// Unlimited sorts above every finite allowance.
fn by_data_desc<T: Scored>(a: &T, b: &T) -> Ordering {
    match (a.plan().data_allowance_gb, b.plan().data_allowance_gb) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => right.cmp(&left),
    }
}

fn coverage_key<T: Scored>(item: &T) -> f64 {
    let boost = if PREMIUM_NETWORKS.iter().any(|network| item.plan().runs_on(network)) {
        COVERAGE_NETWORK_BOOST
    } else {
        0.0
    };
    item.breakdown().reliability_fit + boost
}

/// Keep `narrowed` unless it is empty, in which case fall back to everything.
fn narrow_or_all<'a, T>(items: Vec<&'a T>, keep: impl Fn(&T) -> bool) -> Vec<&'a T> {
    let narrowed: Vec<&'a T> = items.iter().copied().filter(|item| keep(*item)).collect();
    if narrowed.is_empty() {
        items
    } else {
        narrowed
    }
}

/// Order an already-filtered list. All sorts are stable.
pub(crate) fn sort_plans<'a, T: Scored>(
    mut items: Vec<&'a T>,
    mode: SortMode,
    weak_match_floor: u8,
) -> Vec<&'a T> {
    match mode {
        SortMode::Recommended => {
            items.sort_by(|a, b| by_total_desc(*a, *b).then_with(|| by_price_asc(*a, *b)));
            items
        }
        SortMode::Price => {
            let (mut good, mut weak): (Vec<&T>, Vec<&T>) =
                items.into_iter().partition(|item| item.total() >= weak_match_floor);
            let order = |a: &&T, b: &&T| by_price_asc(*a, *b).then_with(|| by_total_desc(*a, *b));
            good.sort_by(order);
            weak.sort_by(order);
            good.extend(weak);
            good
        }
        SortMode::MostData => {
            let min_gb = Decimal::from(MOST_DATA_MIN_GB);
            let mut items = narrow_or_all(items, |item| {
                item.plan().data_allowance_gb.map_or(true, |gb| gb >= min_gb)
            });
            items.sort_by(|a, b| {
                by_data_desc(*a, *b)
                    .then_with(|| by_price_asc(*a, *b))
                    .then_with(|| by_total_desc(*a, *b))
            });
            items
        }
        SortMode::BestCoverage => {
            items.sort_by(|a, b| {
                coverage_key(*b)
                    .total_cmp(&coverage_key(*a))
                    .then_with(|| by_total_desc(*a, *b))
                    .then_with(|| by_price_asc(*a, *b))
            });
            items
        }
        SortMode::BestEuRoaming => {
            let mut items = narrow_or_all(items, |item| {
                item.plan().eu_roaming_included || item.plan().global_roaming_included
            });
            items.sort_by(|a, b| {
                b.breakdown()
                    .roaming_fit
                    .total_cmp(&a.breakdown().roaming_fit)
                    .then_with(|| by_total_desc(*a, *b))
                    .then_with(|| by_price_asc(*a, *b))
            });
            items
        }
        SortMode::BestBudgetFit => {
            items.sort_by(|a, b| b.breakdown().budget_fit().total_cmp(&a.breakdown().budget_fit()));
            items
        }
    }
}
