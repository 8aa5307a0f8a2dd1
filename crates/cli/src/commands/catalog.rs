use serde::Serialize;
use simfit_catalog::source_from_config;
use simfit_core::catalog::{load_catalog, SkippedRow};
use simfit_core::chrono::Utc;
use simfit_core::config::{AppConfig, LoadOptions};
use simfit_core::errors::ApplicationError;
use simfit_core::rust_decimal::Decimal;
use uuid::Uuid;

use super::{config_failure, current_thread_runtime, CommandResult};

const COMMAND: &str = "catalog";

#[derive(Debug, Serialize)]
pub struct CatalogReport {
    pub command: &'static str,
    pub status: &'static str,
    pub source: &'static str,
    pub plan_count: usize,
    pub skipped_count: usize,
    pub skipped: Vec<SkippedRow>,
    pub providers: Vec<String>,
    pub cheapest_price: Option<Decimal>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(execute(options)) {
        Ok(report) => CommandResult::report(COMMAND, &report),
        Err(error) => CommandResult::from_application_error(COMMAND, error, &correlation_id),
    }
}

async fn execute(options: &LoadOptions) -> Result<CatalogReport, ApplicationError> {
    let config = AppConfig::load(options.clone()).map_err(config_failure)?;
    let source = source_from_config(&config.catalog)?;
    let load = load_catalog(source.as_ref(), Utc::now().date_naive()).await?;

    let mut providers: Vec<String> = load.plans.iter().map(|plan| plan.provider.clone()).collect();
    providers.sort();
    providers.dedup();

    Ok(CatalogReport {
        command: COMMAND,
        status: "ok",
        source: source.name(),
        plan_count: load.plans.len(),
        skipped_count: load.skipped.len(),
        cheapest_price: load.plans.iter().map(|plan| plan.monthly_price).min(),
        skipped: load.skipped,
        providers,
    })
}
