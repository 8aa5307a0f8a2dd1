//! Spreadsheet-backed catalog over the gviz JSON endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use simfit_core::catalog::{CatalogSource, RawPlanRow};
use simfit_core::errors::CatalogError;
use tracing::debug;

/// Rows shorter than this are header or spacer rows.
pub const MIN_ROW_CELLS: usize = 15;

pub fn gviz_url(sheet_id: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:json",
        urlencoding::encode(sheet_id.trim())
    )
}

pub struct SheetCatalog {
    client: Client,
    url: String,
}

impl SheetCatalog {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    pub fn for_sheet(sheet_id: &str, timeout: Duration) -> Result<Self, CatalogError> {
        Self::for_endpoint(gviz_url(sheet_id), timeout)
    }

    pub fn for_endpoint(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CatalogError::Transport(error.to_string()))?;
        Ok(Self::new(client, url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for SheetCatalog {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn fetch_rows(&self) -> Result<Vec<RawPlanRow>, CatalogError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|error| CatalogError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Status { status: response.status().as_u16() });
        }

        let body =
            response.text().await.map_err(|error| CatalogError::Transport(error.to_string()))?;
        parse_gviz(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GvizEnvelope {
    table: GvizTable,
}

#[derive(Debug, Deserialize)]
struct GvizTable {
    #[serde(default)]
    rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Option<Vec<Option<GvizCell>>>,
}

#[derive(Debug, Deserialize)]
struct GvizCell {
    #[serde(default)]
    v: Option<Value>,
}

/// The endpoint wraps its JSON in a JS callback; keep the outermost object.
pub fn strip_wrapper(body: &str) -> Result<&str, CatalogError> {
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&body[start..=end]),
        _ => Err(CatalogError::Decode("gviz response contains no JSON object".to_string())),
    }
}

/// Decode a gviz response body into positional rows.
pub fn parse_gviz(body: &str) -> Result<Vec<RawPlanRow>, CatalogError> {
    let envelope: GvizEnvelope = serde_json::from_str(strip_wrapper(body)?)
        .map_err(|error| CatalogError::Decode(error.to_string()))?;

    let mut rows = Vec::with_capacity(envelope.table.rows.len());
    for (index, row) in envelope.table.rows.into_iter().enumerate() {
        let Some(cells) = row.c.filter(|cells| cells.len() >= MIN_ROW_CELLS) else {
            debug!(event_name = "catalog.sheet.short_row", row_index = index, "skipping short row");
            continue;
        };
        let values: Vec<Option<Value>> = cells
            .into_iter()
            .map(|cell| cell.and_then(|cell| cell.v).filter(|value| !value.is_null()))
            .collect();
        rows.push(RawPlanRow::from_cells(&values));
    }
    Ok(rows)
}
