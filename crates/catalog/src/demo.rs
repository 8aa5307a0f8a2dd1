//! Built-in sample catalog for offline runs.

use async_trait::async_trait;
use serde_json::{json, Value};
use simfit_core::catalog::{CatalogSource, RawPlanRow};
use simfit_core::errors::CatalogError;

#[derive(Clone, Copy, Debug, Default)]
pub struct DemoCatalog;

fn demo_rows() -> Value {
    json!([
        {
            "id": 1, "providerName": "Smarty", "planName": "Unlimited Data", "network": "Three",
            "pricePerMonth": 15, "dataGb": 0, "isUnlimitedData": true, "contractLengthMonths": 1,
            "isRolling": true, "roamingType": "EU Included", "hotspotAllowed": true,
            "noCreditCheck": true, "hasDataRollover": false, "rating": 72,
            "notes": "Half price for the first 6 months"
        },
        {
            "id": 2, "providerName": "giffgaff", "planName": "Golden goodybag 35GB", "network": "O2",
            "pricePerMonth": 10, "dataGb": 35, "isUnlimitedData": false, "contractLengthMonths": 1,
            "isRolling": true, "roamingType": "EU Included", "hotspotAllowed": true,
            "noCreditCheck": true, "hasDataRollover": false, "rating": 78
        },
        {
            "id": 3, "providerName": "Lebara", "planName": "5GB Saver", "network": "Vodafone",
            "pricePerMonth": 5, "dataGb": 5, "isUnlimitedData": false, "contractLengthMonths": 1,
            "isRolling": true, "roamingType": "EU Included", "hotspotAllowed": true,
            "noCreditCheck": true, "hasDataRollover": false, "rating": 70
        },
        {
            "id": 4, "providerName": "EE", "planName": "SIM Only 100GB", "network": "EE",
            "pricePerMonth": 22, "dataGb": 100, "isUnlimitedData": false, "contractLengthMonths": 24,
            "isRolling": false, "roamingType": "Paid", "hotspotAllowed": true,
            "noCreditCheck": false, "hasDataRollover": false, "rating": 92
        },
        {
            "id": 5, "providerName": "Voxi", "planName": "Endless Social 45GB", "network": "Vodafone",
            "pricePerMonth": 12, "dataGb": 45, "isUnlimitedData": false, "contractLengthMonths": 1,
            "isRolling": true, "roamingType": "EU Included", "hotspotAllowed": false,
            "noCreditCheck": true, "hasDataRollover": false, "rating": 80
        },
        {
            "id": 6, "providerName": "Three", "planName": "Unlimited 5G", "network": "Three",
            "pricePerMonth": 20, "dataGb": 0, "isUnlimitedData": true, "contractLengthMonths": 12,
            "isRolling": false, "roamingType": "Global Included", "hotspotAllowed": true,
            "noCreditCheck": false, "hasDataRollover": false, "rating": 75
        },
        {
            "id": 7, "providerName": "Tesco Mobile", "planName": "30GB Clubcard", "network": "O2",
            "pricePerMonth": 11, "dataGb": 30, "isUnlimitedData": false, "contractLengthMonths": 12,
            "isRolling": false, "roamingType": "EU Included", "hotspotAllowed": true,
            "noCreditCheck": false, "hasDataRollover": true, "rating": 82
        },
        {
            "id": 8, "providerName": "iD Mobile", "planName": "Unlimited Rollover", "network": "Three",
            "pricePerMonth": 18, "dataGb": 0, "isUnlimitedData": true, "contractLengthMonths": 1,
            "isRolling": true, "roamingType": "EU Included", "hotspotAllowed": true,
            "noCreditCheck": false, "hasDataRollover": true, "rating": 68,
            "affiliateUrl": "https://www.idmobile.co.uk/sim-only-deals"
        }
    ])
}

impl DemoCatalog {
    pub fn rows(&self) -> Vec<RawPlanRow> {
        match demo_rows() {
            Value::Array(entries) => entries
                .iter()
                .filter_map(Value::as_object)
                .map(RawPlanRow::from_object)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl CatalogSource for DemoCatalog {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn fetch_rows(&self) -> Result<Vec<RawPlanRow>, CatalogError> {
        Ok(self.rows())
    }
}
