//! Local JSON catalog: an array of row objects.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use simfit_core::catalog::{CatalogSource, RawPlanRow};
use simfit_core::errors::CatalogError;

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Entries that are not objects become empty rows, which the loader skips.
pub fn parse_rows(raw: &str) -> Result<Vec<RawPlanRow>, CatalogError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|error| CatalogError::Decode(error.to_string()))?;
    let Value::Array(entries) = document else {
        return Err(CatalogError::Decode("catalog file must contain a JSON array".to_string()));
    };
    Ok(entries
        .iter()
        .map(|entry| entry.as_object().map(RawPlanRow::from_object).unwrap_or_default())
        .collect())
}

#[async_trait]
impl CatalogSource for FileCatalog {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch_rows(&self) -> Result<Vec<RawPlanRow>, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|error| CatalogError::Io(format!("{}: {error}", self.path.display())))?;
        parse_rows(&raw)
    }
}
