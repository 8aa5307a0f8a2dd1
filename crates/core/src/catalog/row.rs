use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    ContractType, DataCategory, HotspotPolicy, Plan, PlanId, RoamingType, PERK_DATA_ROLLOVER,
    PERK_NO_CREDIT_CHECK,
};
use crate::errors::CatalogRowError;

pub const DEFAULT_CUSTOMER_SERVICE_RATING: u8 = 3;
const DEAL_SEARCH_URL: &str = "https://www.google.com/search?q=";

/// A catalog row before normalization. Every field is optional; the mapper
/// substitutes defaults rather than rejecting the row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPlanRow {
    pub id: Option<Value>,
    pub provider: Option<String>,
    pub plan_name: Option<String>,
    pub network: Option<String>,
    pub price: Option<Decimal>,
    pub data_gb: Option<Decimal>,
    pub unlimited: Option<bool>,
    pub contract_months: Option<Decimal>,
    pub rolling: Option<bool>,
    pub roaming: Option<String>,
    pub hotspot_allowed: Option<bool>,
    pub no_credit_check: Option<bool>,
    pub data_rollover: Option<bool>,
    pub notes: Option<String>,
    pub rating: Option<Decimal>,
    pub deal_url: Option<String>,
}

/// Lenient cell coercion shared by every provider.
pub mod coerce {
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;
    use serde_json::Value;

    pub fn text(value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn number(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Decimal::from)
                .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
            Value::String(text) => {
                let cleaned = text.trim().trim_start_matches('£').replace(',', "");
                cleaned.parse::<Decimal>().ok()
            }
            _ => None,
        }
    }

    /// `true`, `"TRUE"`, `"yes"` and `1` are truthy; anything else present is false.
    pub fn flag(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => {
                Some(matches!(text.trim().to_ascii_uppercase().as_str(), "TRUE" | "YES" | "Y" | "1"))
            }
            Value::Number(number) => Some(number.as_f64().is_some_and(|n| n != 0.0)),
            Value::Null => None,
            _ => Some(false),
        }
    }
}

impl RawPlanRow {
    /// Read a gviz row by column position. Null cells are absent values.
    pub fn from_cells(cells: &[Option<Value>]) -> Self {
        let cell = |index: usize| cells.get(index).and_then(Option::as_ref).filter(|v| !v.is_null());
        Self {
            id: cell(0).cloned(),
            provider: cell(1).and_then(coerce::text),
            plan_name: cell(2).and_then(coerce::text),
            network: cell(3).and_then(coerce::text),
            price: cell(4).and_then(coerce::number),
            data_gb: cell(5).and_then(coerce::number),
            unlimited: cell(6).and_then(coerce::flag),
            contract_months: cell(7).and_then(coerce::number),
            rolling: cell(8).and_then(coerce::flag),
            roaming: cell(9).and_then(coerce::text),
            hotspot_allowed: cell(10).and_then(coerce::flag),
            no_credit_check: cell(11).and_then(coerce::flag),
            data_rollover: cell(12).and_then(coerce::flag),
            notes: cell(13).and_then(coerce::text),
            rating: cell(14).and_then(coerce::number),
            deal_url: cell(15).and_then(coerce::text),
        }
    }

    /// Read a keyed object; camelCase and snake_case keys are both accepted.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |keys: &'static [&'static str]| lookup(object, keys).and_then(coerce::text);
        let number = |keys: &'static [&'static str]| lookup(object, keys).and_then(coerce::number);
        let flag = |keys: &'static [&'static str]| lookup(object, keys).and_then(coerce::flag);
        Self {
            id: lookup(object, &["id"]).cloned(),
            provider: text(&["providerName", "provider_name", "provider"]),
            plan_name: text(&["planName", "plan_name"]),
            network: text(&["network"]),
            price: number(&["pricePerMonth", "price_per_month", "monthlyPrice", "price"]),
            data_gb: number(&["dataGb", "data_gb"]),
            unlimited: flag(&["isUnlimitedData", "is_unlimited_data", "unlimited"]),
            contract_months: number(&["contractLengthMonths", "contract_length_months"]),
            rolling: flag(&["isRolling", "is_rolling", "rolling"]),
            roaming: text(&["roamingType", "roaming_type", "roaming"]),
            hotspot_allowed: flag(&["hotspotAllowed", "hotspot_allowed"]),
            no_credit_check: flag(&["noCreditCheck", "no_credit_check"]),
            data_rollover: flag(&["hasDataRollover", "has_data_rollover", "data_rollover"]),
            notes: text(&["notes"]),
            rating: number(&["rating"]),
            deal_url: text(&["affiliateUrl", "affiliate_url", "dealUrl", "deal_url"]),
        }
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key)).filter(|value| !value.is_null())
}

fn plan_id(raw: Option<&Value>) -> Result<PlanId, CatalogRowError> {
    match raw {
        None | Some(Value::Null) => Err(CatalogRowError::MissingId),
        Some(Value::String(text)) if text.trim().is_empty() => Err(CatalogRowError::MissingId),
        Some(Value::String(text)) => Ok(PlanId(text.trim().to_string())),
        Some(Value::Number(number)) => {
            let id = match number.as_f64() {
                Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                    format!("{}", value as i64)
                }
                _ => number.to_string(),
            };
            Ok(PlanId(id))
        }
        Some(other) => Err(CatalogRowError::InvalidField { field: "id", value: other.to_string() }),
    }
}

fn roaming(raw: Option<&str>) -> (RoamingType, bool, bool) {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("eu included") => (RoamingType::Eu, true, false),
        Some("global included") => (RoamingType::Global, true, true),
        _ => (RoamingType::UkOnly, false, false),
    }
}

/// `round(rating / 20)` clamped to 1..=5.
pub fn reliability_from_rating(rating: Decimal) -> u8 {
    let stars = (rating / Decimal::from(20))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0);
    stars.clamp(1, 5) as u8
}

fn contract_months(raw: Option<Decimal>) -> u32 {
    raw.and_then(|months| months.round().to_u32()).filter(|months| *months > 0).unwrap_or(1)
}

pub fn fallback_deal_url(provider: &str, plan_name: &str) -> String {
    let query = format!("{provider} {plan_name} deal");
    format!("{DEAL_SEARCH_URL}{}", urlencoding::encode(&query))
}

/// Normalize one raw row into a canonical plan.
pub fn map_row(row: &RawPlanRow, fetched_on: NaiveDate) -> Result<Plan, CatalogRowError> {
    let id = plan_id(row.id.as_ref())?;
    let provider = row.provider.clone().unwrap_or_default();
    let plan_name = row.plan_name.clone().unwrap_or_default();
    let network = row.network.clone().unwrap_or_default();

    let data_allowance_gb = if row.unlimited.unwrap_or(false) {
        None
    } else {
        Some(row.data_gb.unwrap_or(Decimal::ZERO).max(Decimal::ZERO))
    };
    let (roaming_type, eu_roaming_included, global_roaming_included) =
        roaming(row.roaming.as_deref());
    let raw_rating = row.rating.unwrap_or(Decimal::ZERO);

    let mut key_perks = Vec::new();
    if row.no_credit_check.unwrap_or(false) {
        key_perks.push(PERK_NO_CREDIT_CHECK.to_string());
    }
    if row.data_rollover.unwrap_or(false) {
        key_perks.push(PERK_DATA_ROLLOVER.to_string());
    }

    let deal_url = match row.deal_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => fallback_deal_url(&provider, &plan_name),
    };

    Ok(Plan {
        id,
        monthly_price: row.price.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
        contract_length_months: contract_months(row.contract_months),
        contract_type: if row.rolling.unwrap_or(false) {
            ContractType::Rolling
        } else {
            ContractType::Fixed
        },
        data_allowance_gb,
        data_category: DataCategory::from_allowance(data_allowance_gb),
        roaming_type,
        eu_roaming_included,
        eu_roaming_cap_gb: None,
        global_roaming_included,
        hotspot_policy: if row.hotspot_allowed.unwrap_or(false) {
            HotspotPolicy::Unlimited
        } else {
            HotspotPolicy::NotAllowed
        },
        includes_5g: true,
        speed_cap_mbps: None,
        reliability_rating: reliability_from_rating(raw_rating),
        raw_rating,
        customer_service_rating: DEFAULT_CUSTOMER_SERVICE_RATING,
        key_perks,
        highlight_note: row.notes.clone().filter(|notes| !notes.is_empty()),
        deal_url,
        last_updated: fetched_on.format("%Y-%m-%d").to_string(),
        provider,
        network,
        plan_name,
    })
}
