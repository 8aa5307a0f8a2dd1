use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const GENERIC_DESCRIPTION: &str = "General usage pattern.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownTag {}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Named lifestyle profile. `Other` and an unset lifestyle both mean "custom".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lifestyle {
    Everyday,
    Budget,
    Power,
    Remote,
    Travel,
    Streamer,
    Social,
    Other,
}

impl Lifestyle {
    pub const ALL: [Lifestyle; 8] = [
        Self::Everyday,
        Self::Budget,
        Self::Power,
        Self::Remote,
        Self::Travel,
        Self::Streamer,
        Self::Social,
        Self::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Everyday => "everyday",
            Self::Budget => "budget",
            Self::Power => "power",
            Self::Remote => "remote",
            Self::Travel => "travel",
            Self::Streamer => "streamer",
            Self::Social => "social",
            Self::Other => "other",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Everyday => "Everyday User",
            Self::Budget => "Budget-Focused User",
            Self::Power => "Power User",
            Self::Remote => "Remote Worker",
            Self::Travel => "Frequent Traveller",
            Self::Streamer => "Heavy Streamer",
            Self::Social => "Social Media Fan",
            Self::Other => "Custom Profile",
        }
    }

    /// Description used when the user leaves the free-text field empty.
    pub fn suggested_description(&self) -> Option<&'static str> {
        match self {
            Self::Everyday => Some("A balanced user who wants a reliable plan without overthinking."),
            Self::Budget => Some("I'm a light user and want to keep monthly costs low."),
            Self::Power => Some("I use my phone heavily and want unlimited everything."),
            Self::Remote => {
                Some("I hotspot my laptop often, work on the go, and need reliable tethering.")
            }
            Self::Travel => Some("I travel to Europe often, so strong EU roaming is essential."),
            Self::Streamer => Some("I watch a lot of Netflix/YouTube, so I need plenty of data."),
            Self::Social => Some(
                "I use TikTok/Instagram a lot and need smooth performance for social media.",
            ),
            Self::Other => None,
        }
    }

    /// Priorities the lifestyle card pre-selects.
    pub fn default_priorities(&self) -> &'static [Priority] {
        match self {
            Self::Everyday => &[Priority::BestCoverage, Priority::CustomerService],
            Self::Remote => &[Priority::Hotspot, Priority::BestCoverage],
            Self::Streamer => &[Priority::NeverRunOut, Priority::Unlimited],
            Self::Travel => &[Priority::EuropeTravel, Priority::BestCoverage],
            Self::Budget => &[Priority::CheapAndSimple, Priority::LightUsage],
            Self::Power => &[Priority::Unlimited, Priority::NeverRunOut],
            Self::Social => &[Priority::Unlimited, Priority::NoContract],
            Self::Other => &[],
        }
    }
}

impl FromStr for Lifestyle {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(value);
        Self::ALL
            .into_iter()
            .find(|lifestyle| lifestyle.key() == normalized)
            .ok_or_else(|| UnknownTag { kind: "lifestyle", value: value.to_string() })
    }
}

/// Closed priority vocabulary shared by input collection, scoring and explanations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    NeverRunOut,
    EuropeTravel,
    CheapAndSimple,
    Hotspot,
    Unlimited,
    LightUsage,
    CustomerService,
    NoContract,
    BestCoverage,
}

impl Priority {
    pub const ALL: [Priority; 9] = [
        Self::NeverRunOut,
        Self::EuropeTravel,
        Self::CheapAndSimple,
        Self::Hotspot,
        Self::Unlimited,
        Self::LightUsage,
        Self::CustomerService,
        Self::NoContract,
        Self::BestCoverage,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::NeverRunOut => "never-run-out",
            Self::EuropeTravel => "europe-travel",
            Self::CheapAndSimple => "cheap-and-simple",
            Self::Hotspot => "hotspot",
            Self::Unlimited => "unlimited",
            Self::LightUsage => "light-usage",
            Self::CustomerService => "customer-service",
            Self::NoContract => "no-contract",
            Self::BestCoverage => "best-coverage",
        }
    }

    /// Canonical phrase shown to the user.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::NeverRunOut => "I hate running out of data",
            Self::EuropeTravel => "I travel in Europe often",
            Self::CheapAndSimple => "I want something cheap and simple",
            Self::Hotspot => "I hotspot my laptop",
            Self::Unlimited => "I want unlimited so I never think about it",
            Self::LightUsage => "I barely use data",
            Self::CustomerService => "I care about customer service",
            Self::NoContract => "I want no contract commitment",
            Self::BestCoverage => "I want the best coverage",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = normalize(trimmed);
        Self::ALL
            .into_iter()
            .find(|priority| {
                priority.key() == normalized || priority.phrase().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownTag { kind: "priority", value: value.to_string() })
    }
}

/// Stable machine keys for the optional feature wishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureTag {
    DataRollover,
    #[serde(rename = "STRONG_4G")]
    Strong4g,
    PeakReliability,
    HdStreaming,
    FiveGPriority,
    ZeroRatedSocials,
    EuRoamingBoost,
    GlobalRoaming,
    MultiSim,
    LowCostTier,
    RollingContract,
    NoFees,
    FastUnlimited,
    #[serde(rename = "TOP_TIER_5G")]
    TopTier5g,
    PrioritySpeeds,
    SocialPass,
    UploadSpeed,
    VideoOpt,
}

impl FeatureTag {
    pub const ALL: [FeatureTag; 18] = [
        Self::DataRollover,
        Self::Strong4g,
        Self::PeakReliability,
        Self::HdStreaming,
        Self::FiveGPriority,
        Self::ZeroRatedSocials,
        Self::EuRoamingBoost,
        Self::GlobalRoaming,
        Self::MultiSim,
        Self::LowCostTier,
        Self::RollingContract,
        Self::NoFees,
        Self::FastUnlimited,
        Self::TopTier5g,
        Self::PrioritySpeeds,
        Self::SocialPass,
        Self::UploadSpeed,
        Self::VideoOpt,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::DataRollover => "DATA_ROLLOVER",
            Self::Strong4g => "STRONG_4G",
            Self::PeakReliability => "PEAK_RELIABILITY",
            Self::HdStreaming => "HD_STREAMING",
            Self::FiveGPriority => "FIVE_G_PRIORITY",
            Self::ZeroRatedSocials => "ZERO_RATED_SOCIALS",
            Self::EuRoamingBoost => "EU_ROAMING_BOOST",
            Self::GlobalRoaming => "GLOBAL_ROAMING",
            Self::MultiSim => "MULTI_SIM",
            Self::LowCostTier => "LOW_COST_TIER",
            Self::RollingContract => "ROLLING_CONTRACT",
            Self::NoFees => "NO_FEES",
            Self::FastUnlimited => "FAST_UNLIMITED",
            Self::TopTier5g => "TOP_TIER_5G",
            Self::PrioritySpeeds => "PRIORITY_SPEEDS",
            Self::SocialPass => "SOCIAL_PASS",
            Self::UploadSpeed => "UPLOAD_SPEED",
            Self::VideoOpt => "VIDEO_OPT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DataRollover => "Data Rollover",
            Self::Strong4g => "Strong 4G fallback",
            Self::PeakReliability => "Reliable peak-time speeds",
            Self::HdStreaming => "HD Streaming Support",
            Self::FiveGPriority => "5G Priority",
            Self::ZeroRatedSocials => "Zero-rated Socials",
            Self::EuRoamingBoost => "EU Roaming Boost",
            Self::GlobalRoaming => "Global Roaming",
            Self::MultiSim => "Multi-sim support",
            Self::LowCostTier => "£5-£8 options",
            Self::RollingContract => "Rolling contracts",
            Self::NoFees => "No activation fees",
            Self::FastUnlimited => "Fast unlimited data",
            Self::TopTier5g => "Top-tier 5G coverage",
            Self::PrioritySpeeds => "Priority speeds",
            Self::SocialPass => "Social media data pass",
            Self::UploadSpeed => "Upload speed priority",
            Self::VideoOpt => "Video optimization",
        }
    }
}

impl FromStr for FeatureTag {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let as_key = trimmed.to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|tag| tag.key() == as_key || tag.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownTag { kind: "feature", value: value.to_string() })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreFilterContract {
    #[default]
    Any,
    OneMonth,
    TwelveMonths,
    TwentyFourMonths,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreFilterData {
    #[default]
    Any,
    Light,
    Moderate,
    Heavy,
    Unlimited,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreFilterRoaming {
    #[default]
    Any,
    Eu,
    Global,
}

impl FromStr for PreFilterContract {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "any" => Ok(Self::Any),
            "1" | "1-month" | "one-month" | "rolling" => Ok(Self::OneMonth),
            "12" | "12-months" | "twelve-months" => Ok(Self::TwelveMonths),
            "24" | "24-months" | "twenty-four-months" => Ok(Self::TwentyFourMonths),
            _ => Err(UnknownTag { kind: "contract pre-filter", value: value.to_string() }),
        }
    }
}

impl FromStr for PreFilterData {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "any" => Ok(Self::Any),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "heavy" => Ok(Self::Heavy),
            "unlimited" => Ok(Self::Unlimited),
            _ => Err(UnknownTag { kind: "data pre-filter", value: value.to_string() }),
        }
    }
}

impl FromStr for PreFilterRoaming {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "any" => Ok(Self::Any),
            "eu" => Ok(Self::Eu),
            "global" => Ok(Self::Global),
            _ => Err(UnknownTag { kind: "roaming pre-filter", value: value.to_string() }),
        }
    }
}

/// Structured selections made before analysis. Merged into priorities and
/// features when attached to a profile; never scored on their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreFilter {
    pub contract: PreFilterContract,
    pub data: PreFilterData,
    pub roaming: PreFilterRoaming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataUsage {
    Low,
    Medium,
    High,
    Unlimited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelFrequency {
    Never,
    Sometimes,
    Often,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanFocus {
    Flexibility,
    Savings,
}

/// Follow-up answers collected when the user is unsure of their lifestyle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuickNeeds {
    pub data_usage: DataUsage,
    pub eu_travel: TravelFrequency,
    pub focus: PlanFocus,
}

impl QuickNeeds {
    pub fn implied_priorities(&self) -> Vec<Priority> {
        let mut priorities = Vec::new();
        match self.data_usage {
            DataUsage::High => priorities.push(Priority::NeverRunOut),
            DataUsage::Unlimited => {
                priorities.push(Priority::NeverRunOut);
                priorities.push(Priority::Unlimited);
            }
            DataUsage::Low => priorities.push(Priority::LightUsage),
            DataUsage::Medium => {}
        }
        if self.eu_travel == TravelFrequency::Often {
            priorities.push(Priority::EuropeTravel);
        }
        priorities.push(match self.focus {
            PlanFocus::Flexibility => Priority::NoContract,
            PlanFocus::Savings => Priority::CheapAndSimple,
        });
        priorities
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileFingerprint(pub String);

/// Scoring input, built once per analysis session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub description: String,
    pub budget: Option<Decimal>,
    pub priorities: BTreeSet<Priority>,
    pub lifestyle: Option<Lifestyle>,
    pub features: BTreeSet<FeatureTag>,
    pub pre_filter: Option<PreFilter>,
    pub quick_needs: Option<QuickNeeds>,
}

impl UserProfile {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), ..Self::default() }
    }

    /// Non-positive budgets are dropped.
    pub fn with_budget(mut self, budget: Decimal) -> Self {
        self.budget = (budget > Decimal::ZERO).then_some(budget);
        self
    }

    pub fn with_lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = Some(lifestyle);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priorities.insert(priority);
        self
    }

    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities.extend(priorities);
        self
    }

    pub fn with_feature(mut self, feature: FeatureTag) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn with_pre_filter(mut self, pre_filter: PreFilter) -> Self {
        if pre_filter.contract == PreFilterContract::OneMonth {
            self.priorities.insert(Priority::NoContract);
            self.features.insert(FeatureTag::RollingContract);
        }
        match pre_filter.data {
            PreFilterData::Light => {
                self.priorities.insert(Priority::LightUsage);
            }
            PreFilterData::Heavy => {
                self.priorities.insert(Priority::NeverRunOut);
            }
            PreFilterData::Unlimited => {
                self.priorities.insert(Priority::Unlimited);
            }
            PreFilterData::Any | PreFilterData::Moderate => {}
        }
        match pre_filter.roaming {
            PreFilterRoaming::Eu => {
                self.priorities.insert(Priority::EuropeTravel);
            }
            PreFilterRoaming::Global => {
                self.features.insert(FeatureTag::GlobalRoaming);
            }
            PreFilterRoaming::Any => {}
        }
        self.pre_filter = Some(pre_filter);
        self
    }

    /// Quick-needs answers replace the lifestyle with a custom profile.
    pub fn with_quick_needs(mut self, needs: QuickNeeds) -> Self {
        self.priorities.extend(needs.implied_priorities());
        self.quick_needs = Some(needs);
        self.lifestyle = None;
        self
    }

    pub fn has(&self, priority: Priority) -> bool {
        self.priorities.contains(&priority)
    }

    pub fn has_any(&self, priorities: &[Priority]) -> bool {
        priorities.iter().any(|priority| self.has(*priority))
    }

    pub fn is(&self, lifestyle: Lifestyle) -> bool {
        self.lifestyle == Some(lifestyle)
    }

    pub fn effective_description(&self) -> &str {
        let trimmed = self.description.trim();
        if !trimmed.is_empty() {
            return trimmed;
        }
        self.lifestyle
            .and_then(|lifestyle| lifestyle.suggested_description())
            .unwrap_or(GENERIC_DESCRIPTION)
    }

    pub fn fingerprint(&self) -> ProfileFingerprint {
        let canonical =
            serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        ProfileFingerprint(blake3::hash(&canonical).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        DataUsage, FeatureTag, Lifestyle, PlanFocus, PreFilter, PreFilterContract, PreFilterData,
        PreFilterRoaming, Priority, QuickNeeds, TravelFrequency, UserProfile, GENERIC_DESCRIPTION,
    };

    #[test]
    fn priorities_parse_from_key_or_phrase() {
        assert_eq!("europe-travel".parse::<Priority>(), Ok(Priority::EuropeTravel));
        assert_eq!("I travel in Europe often".parse::<Priority>(), Ok(Priority::EuropeTravel));
        assert_eq!("NO_CONTRACT".parse::<Priority>(), Ok(Priority::NoContract));
        assert!("teleport".parse::<Priority>().is_err());
    }

    #[test]
    fn feature_tags_parse_from_key_or_label() {
        assert_eq!("DATA_ROLLOVER".parse::<FeatureTag>(), Ok(FeatureTag::DataRollover));
        assert_eq!("Strong 4G fallback".parse::<FeatureTag>(), Ok(FeatureTag::Strong4g));
        assert_eq!("top-tier-5g".parse::<FeatureTag>(), Ok(FeatureTag::TopTier5g));
    }

    #[test]
    fn priorities_are_deduplicated() {
        let profile = UserProfile::new("x")
            .with_priority(Priority::Hotspot)
            .with_priority(Priority::Hotspot)
            .with_priorities([Priority::Hotspot, Priority::NoContract]);
        assert_eq!(profile.priorities.len(), 2);
    }

    #[test]
    fn pre_filter_merges_into_priorities_and_features() {
        let profile = UserProfile::new("x").with_pre_filter(PreFilter {
            contract: PreFilterContract::OneMonth,
            data: PreFilterData::Heavy,
            roaming: PreFilterRoaming::Global,
        });
        assert!(profile.has(Priority::NoContract));
        assert!(profile.has(Priority::NeverRunOut));
        assert!(profile.features.contains(&FeatureTag::RollingContract));
        assert!(profile.features.contains(&FeatureTag::GlobalRoaming));
        assert!(!profile.has(Priority::EuropeTravel));
    }

    #[test]
    fn quick_needs_clear_lifestyle_and_add_priorities() {
        let profile = UserProfile::new("x").with_lifestyle(Lifestyle::Other).with_quick_needs(
            QuickNeeds {
                data_usage: DataUsage::Unlimited,
                eu_travel: TravelFrequency::Often,
                focus: PlanFocus::Savings,
            },
        );
        assert_eq!(profile.lifestyle, None);
        assert!(profile.has(Priority::NeverRunOut));
        assert!(profile.has(Priority::Unlimited));
        assert!(profile.has(Priority::EuropeTravel));
        assert!(profile.has(Priority::CheapAndSimple));
    }

    #[test]
    fn non_positive_budget_is_ignored() {
        assert_eq!(UserProfile::new("x").with_budget(Decimal::ZERO).budget, None);
        assert_eq!(
            UserProfile::new("x").with_budget(Decimal::from(10)).budget,
            Some(Decimal::from(10))
        );
    }

    #[test]
    fn description_falls_back_to_lifestyle_then_generic_text() {
        let travel = UserProfile::new("  ").with_lifestyle(Lifestyle::Travel);
        assert!(travel.effective_description().contains("Europe"));
        let custom = UserProfile::new("").with_lifestyle(Lifestyle::Other);
        assert_eq!(custom.effective_description(), GENERIC_DESCRIPTION);
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive_to_changes() {
        let base = UserProfile::new("x").with_priority(Priority::Hotspot);
        let same = UserProfile::new("x").with_priority(Priority::Hotspot);
        let different = base.clone().with_budget(Decimal::from(12));
        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), different.fingerprint());
    }
}
