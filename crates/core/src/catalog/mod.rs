//! Catalog ingestion
//!
//! A [`CatalogSource`] hands back raw rows; [`load_catalog`] normalizes them
//! into [`Plan`]s. A transport or decode failure fails the whole load, a bad
//! row only costs that row.

mod row;

pub use row::{
    coerce, fallback_deal_url, map_row, reliability_from_rating, RawPlanRow,
    DEFAULT_CUSTOMER_SERVICE_RATING,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::Plan;
use crate::errors::CatalogError;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch_rows(&self) -> Result<Vec<RawPlanRow>, CatalogError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CatalogLoad {
    pub plans: Vec<Plan>,
    pub skipped: Vec<SkippedRow>,
}

impl CatalogLoad {
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Normalize rows in source order, skipping the ones that cannot become a plan.
pub fn normalize_rows(rows: &[RawPlanRow], fetched_on: NaiveDate) -> CatalogLoad {
    let mut load = CatalogLoad::default();
    for (index, row) in rows.iter().enumerate() {
        match map_row(row, fetched_on) {
            Ok(plan) => load.plans.push(plan),
            Err(error) => {
                warn!(
                    event_name = "catalog.row.skipped",
                    row_index = index,
                    reason = %error,
                    "skipping malformed catalog row"
                );
                load.skipped.push(SkippedRow { index, reason: error.to_string() });
            }
        }
    }
    load
}

pub async fn load_catalog(
    source: &dyn CatalogSource,
    fetched_on: NaiveDate,
) -> Result<CatalogLoad, CatalogError> {
    info!(event_name = "catalog.fetch.start", source = source.name(), "fetching plan catalog");
    let rows = match source.fetch_rows().await {
        Ok(rows) => rows,
        Err(error) => {
            error!(
                event_name = "catalog.fetch.failed",
                source = source.name(),
                error = %error,
                "plan catalog fetch failed"
            );
            return Err(error);
        }
    };

    let load = normalize_rows(&rows, fetched_on);
    info!(
        event_name = "catalog.fetch.completed",
        source = source.name(),
        rows = rows.len(),
        plans = load.plans.len(),
        skipped = load.skipped.len(),
        "plan catalog loaded"
    );
    Ok(load)
}


#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::memory::MemorySource;
    use super::{load_catalog, normalize_rows, RawPlanRow};
    use crate::errors::CatalogError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    fn row(id: i64, price: i64) -> RawPlanRow {
        RawPlanRow {
            id: Some(json!(id)),
            provider: Some("Smarty".to_string()),
            plan_name: Some(format!("Plan {id}")),
            network: Some("Three".to_string()),
            price: Some(Decimal::from(price)),
            data_gb: Some(Decimal::from(30)),
            ..RawPlanRow::default()
        }
    }

    #[test]
    fn malformed_rows_are_skipped_in_place() {
        let rows = vec![row(1, 10), RawPlanRow::default(), row(3, 12)];
        let load = normalize_rows(&rows, today());

        let ids: Vec<_> = load.plans.iter().map(|plan| plan.id.0.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].index, 1);
    }

    #[tokio::test]
    async fn source_failure_is_terminal() {
        let source = MemorySource { result: Err(CatalogError::Status { status: 500 }) };
        let error = load_catalog(&source, today()).await.expect_err("load should fail");
        assert_eq!(error, CatalogError::Status { status: 500 });
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_logged_at_error_level() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = MemorySource { result: Err(CatalogError::Transport("reset".to_string())) };
        assert!(load_catalog(&source, today()).await.is_err());

        let output = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf8");
        let failure = output
            .lines()
            .find(|line| line.contains("catalog.fetch.failed"))
            .expect("failure event");
        assert!(failure.contains("ERROR"), "{failure}");
    }

    #[tokio::test]
    async fn empty_source_is_an_empty_catalog() {
        let source = MemorySource { result: Ok(Vec::new()) };
        let load = load_catalog(&source, today()).await.expect("load");
        assert!(load.is_empty());
        assert!(load.skipped.is_empty());
    }
}
