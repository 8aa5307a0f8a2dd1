use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{HotspotPolicy, Plan, RoamingType, UnknownTag};

/// Allowances above this are "unlimited" for filtering purposes.
const UNLIMITED_FILTER_GB: i64 = 100;

fn parse_choice<T: Copy>(
    value: &str,
    choices: &[T],
    key: fn(&T) -> &'static str,
    label: fn(&T) -> &'static str,
    kind: &'static str,
) -> Result<T, UnknownTag> {
    let trimmed = value.trim();
    choices
        .iter()
        .copied()
        .find(|choice| {
            key(choice).eq_ignore_ascii_case(trimmed) || label(choice).eq_ignore_ascii_case(trimmed)
        })
        .ok_or_else(|| UnknownTag { kind, value: value.to_string() })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceBand {
    #[default]
    Any,
    FiveToTen,
    TenToFifteen,
    FifteenToTwenty,
    TwentyToThirty,
    ThirtyPlus,
}

impl PriceBand {
    pub const ALL: [PriceBand; 6] = [
        Self::Any,
        Self::FiveToTen,
        Self::TenToFifteen,
        Self::FifteenToTwenty,
        Self::TwentyToThirty,
        Self::ThirtyPlus,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::FiveToTen => "5-10",
            Self::TenToFifteen => "10-15",
            Self::FifteenToTwenty => "15-20",
            Self::TwentyToThirty => "20-30",
            Self::ThirtyPlus => "30+",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::FiveToTen => "£5-£10",
            Self::TenToFifteen => "£10-£15",
            Self::FifteenToTwenty => "£15-£20",
            Self::TwentyToThirty => "£20-£30",
            Self::ThirtyPlus => "£30+",
        }
    }

    /// The lowest band is closed at both ends; the rest are `(low, high]`.
    pub fn matches(&self, price: Decimal) -> bool {
        let between = |low: i64, high: i64| price > Decimal::from(low) && price <= Decimal::from(high);
        match self {
            Self::Any => true,
            Self::FiveToTen => price >= Decimal::from(5) && price <= Decimal::from(10),
            Self::TenToFifteen => between(10, 15),
            Self::FifteenToTwenty => between(15, 20),
            Self::TwentyToThirty => between(20, 30),
            Self::ThirtyPlus => price > Decimal::from(30),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataBand {
    #[default]
    Any,
    Light,
    Moderate,
    Heavy,
    Unlimited,
}

impl DataBand {
    pub const ALL: [DataBand; 5] =
        [Self::Any, Self::Light, Self::Moderate, Self::Heavy, Self::Unlimited];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
            Self::Unlimited => "unlimited",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Light => "Light (<15GB)",
            Self::Moderate => "Moderate (15-50GB)",
            Self::Heavy => "Heavy (50-100GB)",
            Self::Unlimited => "Unlimited",
        }
    }

    pub fn matches(&self, allowance_gb: Option<Decimal>) -> bool {
        let ceiling = Decimal::from(UNLIMITED_FILTER_GB);
        match (self, allowance_gb) {
            (Self::Any, _) => true,
            (Self::Unlimited, None) => true,
            (Self::Unlimited, Some(gb)) => gb > ceiling,
            (_, None) => false,
            (Self::Light, Some(gb)) => gb < Decimal::from(15),
            (Self::Moderate, Some(gb)) => gb >= Decimal::from(15) && gb < Decimal::from(50),
            (Self::Heavy, Some(gb)) => gb >= Decimal::from(50) && gb <= ceiling,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractFilter {
    #[default]
    Any,
    OneMonth,
    TwelveMonths,
    TwentyFourMonths,
}

impl ContractFilter {
    pub const ALL: [ContractFilter; 4] =
        [Self::Any, Self::OneMonth, Self::TwelveMonths, Self::TwentyFourMonths];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::OneMonth => "1",
            Self::TwelveMonths => "12",
            Self::TwentyFourMonths => "24",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::OneMonth => "1 month rolling",
            Self::TwelveMonths => "12 months",
            Self::TwentyFourMonths => "24 months",
        }
    }

    pub fn matches(&self, months: u32) -> bool {
        match self {
            Self::Any => true,
            Self::OneMonth => months == 1,
            Self::TwelveMonths => months == 12,
            Self::TwentyFourMonths => months == 24,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoamingFilter {
    #[default]
    Any,
    UkOnly,
    EuIncluded,
    GlobalIncluded,
}

impl RoamingFilter {
    pub const ALL: [RoamingFilter; 4] =
        [Self::Any, Self::UkOnly, Self::EuIncluded, Self::GlobalIncluded];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::UkOnly => "uk-only",
            Self::EuIncluded => "eu",
            Self::GlobalIncluded => "global",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::UkOnly => "UK only",
            Self::EuIncluded => "EU included",
            Self::GlobalIncluded => "Global included",
        }
    }

    pub fn matches(&self, roaming: RoamingType) -> bool {
        match self {
            Self::Any => true,
            Self::UkOnly => roaming == RoamingType::UkOnly,
            Self::EuIncluded => matches!(roaming, RoamingType::Eu | RoamingType::Global),
            Self::GlobalIncluded => roaming == RoamingType::Global,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkFilter {
    #[default]
    Any,
    Vodafone,
    O2,
    Three,
    Ee,
}

impl NetworkFilter {
    pub const ALL: [NetworkFilter; 5] = [Self::Any, Self::Vodafone, Self::O2, Self::Three, Self::Ee];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Vodafone => "vodafone",
            Self::O2 => "o2",
            Self::Three => "three",
            Self::Ee => "ee",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Vodafone => "Vodafone",
            Self::O2 => "O2",
            Self::Three => "Three",
            Self::Ee => "EE",
        }
    }

    pub fn matches(&self, plan: &Plan) -> bool {
        match self {
            Self::Any => true,
            network => plan.runs_on(network.label()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialFeature {
    NoCreditCheck,
    DataRollover,
    FreeEuRoaming,
    FiveG,
    HotspotAllowed,
}

impl SpecialFeature {
    pub const ALL: [SpecialFeature; 5] = [
        Self::NoCreditCheck,
        Self::DataRollover,
        Self::FreeEuRoaming,
        Self::FiveG,
        Self::HotspotAllowed,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::NoCreditCheck => "no-credit-check",
            Self::DataRollover => "data-rollover",
            Self::FreeEuRoaming => "free-eu-roaming",
            Self::FiveG => "5g",
            Self::HotspotAllowed => "hotspot",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoCreditCheck => "No credit check",
            Self::DataRollover => "Data rollover",
            Self::FreeEuRoaming => "Free EU roaming",
            Self::FiveG => "5G included",
            Self::HotspotAllowed => "Hotspot allowed",
        }
    }

    pub fn holds_for(&self, plan: &Plan) -> bool {
        match self {
            Self::NoCreditCheck => plan.has_no_credit_check(),
            Self::DataRollover => plan.has_data_rollover(),
            Self::FreeEuRoaming => plan.eu_roaming_included,
            Self::FiveG => plan.includes_5g,
            Self::HotspotAllowed => plan.hotspot_policy != HotspotPolicy::NotAllowed,
        }
    }
}

impl FromStr for PriceBand {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "price band")
    }
}

impl FromStr for DataBand {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "data band")
    }
}

impl FromStr for ContractFilter {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "contract filter")
    }
}

impl FromStr for RoamingFilter {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "roaming filter")
    }
}

impl FromStr for NetworkFilter {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "network")
    }
}

impl FromStr for SpecialFeature {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_choice(value, &Self::ALL, Self::key, Self::label, "special feature")
    }
}

/// Independent predicates, AND-combined.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFilters {
    pub price: PriceBand,
    pub data: DataBand,
    pub contract: ContractFilter,
    pub roaming: RoamingFilter,
    pub network: NetworkFilter,
    pub special_features: BTreeSet<SpecialFeature>,
}

impl PlanFilters {
    pub fn matches(&self, plan: &Plan) -> bool {
        self.price.matches(plan.monthly_price)
            && self.data.matches(plan.data_allowance_gb)
            && self.contract.matches(plan.contract_length_months)
            && self.roaming.matches(plan.roaming_type)
            && self.network.matches(plan)
            && self.special_features.iter().all(|feature| feature.holds_for(plan))
    }

    /// Comma-separated active filters, or `None`.
    pub fn summary(&self) -> String {
        let mut active: Vec<String> = Vec::new();
        if self.price != PriceBand::Any {
            active.push(self.price.label().to_string());
        }
        if self.data != DataBand::Any {
            active.push(self.data.label().to_string());
        }
        if self.contract != ContractFilter::Any {
            active.push(self.contract.label().to_string());
        }
        if self.roaming != RoamingFilter::Any {
            active.push(self.roaming.label().to_string());
        }
        if self.network != NetworkFilter::Any {
            active.push(self.network.label().to_string());
        }
        if !self.special_features.is_empty() {
            let features: Vec<&str> =
                self.special_features.iter().map(SpecialFeature::label).collect();
            active.push(features.join(", "));
        }
        if active.is_empty() {
            "None".to_string()
        } else {
            active.join(", ")
        }
    }
}
