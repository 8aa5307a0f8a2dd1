use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use simfit_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, FALLBACK_CONFIG_FILE};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

const COMMAND: &str = "config";

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let config_file_path = options.config_path.clone().or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source_of = |key: &str, env_keys: &[&str]| {
        field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let catalog = &config.catalog;
    let llm = &config.llm;
    let scoring = &config.scoring;
    let api_key = llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let entries = [
        entry("catalog.source", &["SIMFIT_CATALOG_SOURCE"], format!("{:?}", catalog.source)),
        entry("catalog.path", &["SIMFIT_CATALOG_PATH"], display_path(catalog.path.as_deref())),
        entry(
            "catalog.sheet_id",
            &["SIMFIT_CATALOG_SHEET_ID"],
            or_unset(catalog.sheet_id.as_deref()),
        ),
        entry(
            "catalog.endpoint_url",
            &["SIMFIT_CATALOG_ENDPOINT_URL"],
            or_unset(catalog.endpoint_url.as_deref()),
        ),
        entry(
            "catalog.timeout_secs",
            &["SIMFIT_CATALOG_TIMEOUT_SECS"],
            catalog.timeout_secs.to_string(),
        ),
        entry("llm.enabled", &["SIMFIT_LLM_ENABLED"], llm.enabled.to_string()),
        entry("llm.provider", &["SIMFIT_LLM_PROVIDER"], format!("{:?}", llm.provider)),
        entry("llm.model", &["SIMFIT_LLM_MODEL"], llm.model.clone()),
        entry("llm.base_url", &["SIMFIT_LLM_BASE_URL"], or_unset(llm.base_url.as_deref())),
        entry("llm.api_key", &["SIMFIT_LLM_API_KEY"], api_key),
        entry("llm.timeout_secs", &["SIMFIT_LLM_TIMEOUT_SECS"], llm.timeout_secs.to_string()),
        entry("llm.max_retries", &["SIMFIT_LLM_MAX_RETRIES"], llm.max_retries.to_string()),
        entry(
            "scoring.excellent_threshold",
            &["SIMFIT_SCORING_EXCELLENT_THRESHOLD"],
            scoring.excellent_threshold.to_string(),
        ),
        entry(
            "scoring.good_threshold",
            &["SIMFIT_SCORING_GOOD_THRESHOLD"],
            scoring.good_threshold.to_string(),
        ),
        entry(
            "scoring.fair_threshold",
            &["SIMFIT_SCORING_FAIR_THRESHOLD"],
            scoring.fair_threshold.to_string(),
        ),
        entry(
            "scoring.weak_match_floor",
            &["SIMFIT_SCORING_WEAK_MATCH_FLOOR"],
            scoring.weak_match_floor.to_string(),
        ),
        entry(
            "logging.level",
            &["SIMFIT_LOGGING_LEVEL", "SIMFIT_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        entry(
            "logging.format",
            &["SIMFIT_LOGGING_FORMAT", "SIMFIT_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries {
        lines.push(render_line(entry.key, &entry.value, source_of(entry.key, entry.env_keys)));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

struct Entry {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

fn entry(key: &'static str, env_keys: &'static [&'static str], value: String) -> Entry {
    Entry { key, env_keys, value }
}

fn detect_config_path() -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, FALLBACK_CONFIG_FILE]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn or_unset(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<unset>".to_string())
}

/// Keep a recognisable key prefix such as `sk-` and hide the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
