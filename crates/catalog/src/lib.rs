pub mod demo;
pub mod file;
pub mod sheet;

use std::time::Duration;

use simfit_core::catalog::CatalogSource;
use simfit_core::config::{CatalogConfig, CatalogSourceKind};
use simfit_core::errors::ApplicationError;

pub use demo::DemoCatalog;
pub use file::FileCatalog;
pub use sheet::SheetCatalog;

/// Build the provider named by the `[catalog]` section. A section missing the
/// location its source needs is a configuration failure, not a fetch failure.
pub fn source_from_config(
    config: &CatalogConfig,
) -> Result<Box<dyn CatalogSource>, ApplicationError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.source {
        CatalogSourceKind::Demo => Ok(Box::new(DemoCatalog)),
        CatalogSourceKind::File => {
            let path = config.path.clone().ok_or_else(|| missing_setting("catalog.path"))?;
            Ok(Box::new(FileCatalog::new(path)))
        }
        CatalogSourceKind::Sheet => match (&config.endpoint_url, &config.sheet_id) {
            (Some(url), _) => Ok(Box::new(SheetCatalog::for_endpoint(url.clone(), timeout)?)),
            (None, Some(sheet_id)) if !sheet_id.trim().is_empty() => {
                Ok(Box::new(SheetCatalog::for_sheet(sheet_id, timeout)?))
            }
            (None, _) => Err(missing_setting("catalog.sheet_id")),
        },
    }
}

fn missing_setting(key: &str) -> ApplicationError {
    ApplicationError::Configuration(format!("{key} is not set"))
}
