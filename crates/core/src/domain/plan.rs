use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PERK_NO_CREDIT_CHECK: &str = "No credit check";
pub const PERK_DATA_ROLLOVER: &str = "Data Rollover";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub String);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractType {
    Rolling,
    Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataCategory {
    Light,
    Moderate,
    Heavy,
    Unlimited,
}

impl DataCategory {
    /// Bucket an allowance; `None` is the unlimited sentinel.
    pub fn from_allowance(allowance_gb: Option<Decimal>) -> Self {
        match allowance_gb {
            None => Self::Unlimited,
            Some(gb) if gb < Decimal::from(15) => Self::Light,
            Some(gb) if gb < Decimal::from(50) => Self::Moderate,
            Some(_) => Self::Heavy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoamingType {
    UkOnly,
    Eu,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotspotPolicy {
    NotAllowed,
    Limited,
    Unlimited,
}

/// An immutable catalog record.
///
/// `data_allowance_gb == None` means truly unlimited. A `Some(0)` allowance is a
/// degenerate finite plan and is scored as such.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub provider: String,
    pub network: String,
    pub plan_name: String,

    pub monthly_price: Decimal,
    pub contract_length_months: u32,
    pub contract_type: ContractType,

    pub data_allowance_gb: Option<Decimal>,
    pub data_category: DataCategory,

    pub roaming_type: RoamingType,
    pub eu_roaming_included: bool,
    pub eu_roaming_cap_gb: Option<Decimal>,
    pub global_roaming_included: bool,

    pub hotspot_policy: HotspotPolicy,
    pub includes_5g: bool,
    pub speed_cap_mbps: Option<u32>,

    pub reliability_rating: u8,
    pub raw_rating: Decimal,
    pub customer_service_rating: u8,

    pub key_perks: Vec<String>,
    pub highlight_note: Option<String>,
    pub deal_url: String,
    pub last_updated: String,
}

impl Plan {
    pub fn is_unlimited(&self) -> bool {
        self.data_allowance_gb.is_none()
    }

    pub fn has_perk(&self, perk: &str) -> bool {
        self.key_perks.iter().any(|candidate| candidate.trim().eq_ignore_ascii_case(perk))
    }

    pub fn has_data_rollover(&self) -> bool {
        self.has_perk(PERK_DATA_ROLLOVER)
    }

    pub fn has_no_credit_check(&self) -> bool {
        self.has_perk(PERK_NO_CREDIT_CHECK)
    }

    pub fn is_rolling(&self) -> bool {
        self.contract_type == ContractType::Rolling
    }

    pub fn allowance_f64(&self) -> Option<f64> {
        self.data_allowance_gb.map(|gb| gb.to_f64().unwrap_or(0.0))
    }

    pub fn runs_on(&self, network: &str) -> bool {
        self.network.trim().eq_ignore_ascii_case(network)
    }
}
