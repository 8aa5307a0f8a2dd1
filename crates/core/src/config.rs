use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{
    MatchThresholds, ScoringConfig, DEFAULT_GUARDRAIL_CAPS, DEFAULT_THRESHOLDS,
    DEFAULT_WEAK_MATCH_FLOOR,
};

pub const DEFAULT_CONFIG_FILE: &str = "simfit.toml";
pub const FALLBACK_CONFIG_FILE: &str = "config/simfit.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub llm: LlmConfig,
    pub scoring: ScoringSection,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    pub path: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub endpoint_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoringSection {
    pub excellent_threshold: u8,
    pub good_threshold: u8,
    pub fair_threshold: u8,
    pub weak_match_floor: u8,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSourceKind {
    Demo,
    File,
    Sheet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_source: Option<CatalogSourceKind>,
    pub catalog_path: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub log_level: Option<String>,
    pub llm_enabled: Option<bool>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                source: CatalogSourceKind::Demo,
                path: None,
                sheet_id: None,
                endpoint_url: None,
                timeout_secs: 15,
            },
            llm: LlmConfig {
                enabled: false,
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            scoring: ScoringSection {
                excellent_threshold: DEFAULT_THRESHOLDS.excellent,
                good_threshold: DEFAULT_THRESHOLDS.good,
                fair_threshold: DEFAULT_THRESHOLDS.fair,
                weak_match_floor: DEFAULT_WEAK_MATCH_FLOOR,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CatalogSourceKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "file" => Ok(Self::File),
            "sheet" => Ok(Self::Sheet),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog source `{other}` (expected demo|file|sheet)"
            ))),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ScoringSection {
    /// The one scoring configuration shared by the scorer, the label
    /// classifier and the price-sort partition.
    pub fn to_scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            thresholds: MatchThresholds {
                excellent: self.excellent_threshold,
                good: self.good_threshold,
                fair: self.fair_threshold,
            },
            caps: DEFAULT_GUARDRAIL_CAPS,
            weak_match_floor: self.weak_match_floor,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        self.scoring.to_scoring_config()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(source) = catalog.source {
                self.catalog.source = source;
            }
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(sheet_id) = catalog.sheet_id {
                self.catalog.sheet_id = Some(sheet_id);
            }
            if let Some(endpoint_url) = catalog.endpoint_url {
                self.catalog.endpoint_url = Some(endpoint_url);
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(enabled) = llm.enabled {
                self.llm.enabled = enabled;
            }
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(scoring) = patch.scoring {
            if let Some(excellent) = scoring.excellent_threshold {
                self.scoring.excellent_threshold = excellent;
            }
            if let Some(good) = scoring.good_threshold {
                self.scoring.good_threshold = good;
            }
            if let Some(fair) = scoring.fair_threshold {
                self.scoring.fair_threshold = fair;
            }
            if let Some(floor) = scoring.weak_match_floor {
                self.scoring.weak_match_floor = floor;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SIMFIT_CATALOG_SOURCE") {
            self.catalog.source = value.parse()?;
        }
        if let Some(value) = read_env("SIMFIT_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("SIMFIT_CATALOG_SHEET_ID") {
            self.catalog.sheet_id = Some(value);
        }
        if let Some(value) = read_env("SIMFIT_CATALOG_ENDPOINT_URL") {
            self.catalog.endpoint_url = Some(value);
        }
        if let Some(value) = read_env("SIMFIT_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("SIMFIT_CATALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SIMFIT_LLM_ENABLED") {
            self.llm.enabled = parse_bool("SIMFIT_LLM_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SIMFIT_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("SIMFIT_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SIMFIT_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("SIMFIT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SIMFIT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SIMFIT_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SIMFIT_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("SIMFIT_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("SIMFIT_SCORING_EXCELLENT_THRESHOLD") {
            self.scoring.excellent_threshold =
                parse_u8("SIMFIT_SCORING_EXCELLENT_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SIMFIT_SCORING_GOOD_THRESHOLD") {
            self.scoring.good_threshold = parse_u8("SIMFIT_SCORING_GOOD_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SIMFIT_SCORING_FAIR_THRESHOLD") {
            self.scoring.fair_threshold = parse_u8("SIMFIT_SCORING_FAIR_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SIMFIT_SCORING_WEAK_MATCH_FLOOR") {
            self.scoring.weak_match_floor = parse_u8("SIMFIT_SCORING_WEAK_MATCH_FLOOR", &value)?;
        }

        let log_level = read_env("SIMFIT_LOGGING_LEVEL").or_else(|| read_env("SIMFIT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SIMFIT_LOGGING_FORMAT").or_else(|| read_env("SIMFIT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(source) = overrides.catalog_source {
            self.catalog.source = source;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(sheet_id) = overrides.sheet_id {
            self.catalog.sheet_id = Some(sheet_id);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.llm_enabled {
            self.llm.enabled = enabled;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_llm(&self.llm)?;
        validate_scoring(&self.scoring)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(FALLBACK_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.timeout_secs == 0 || catalog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match catalog.source {
        CatalogSourceKind::Demo => {}
        CatalogSourceKind::File => {
            if catalog.path.as_ref().map_or(true, |path| path.as_os_str().is_empty()) {
                return Err(ConfigError::Validation(
                    "catalog.path is required when catalog.source = \"file\"".to_string(),
                ));
            }
        }
        CatalogSourceKind::Sheet => {
            let missing =
                catalog.sheet_id.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing && catalog.endpoint_url.is_none() {
                return Err(ConfigError::Validation(
                    "catalog.sheet_id is required when catalog.source = \"sheet\". Copy it from \
                     the spreadsheet URL: https://docs.google.com/spreadsheets/d/<sheet_id>/"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(endpoint_url) = &catalog.endpoint_url {
        if !endpoint_url.starts_with("http://") && !endpoint_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "catalog.endpoint_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !llm.enabled {
        return Ok(());
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_scoring(scoring: &ScoringSection) -> Result<(), ConfigError> {
    let ScoringSection { excellent_threshold, good_threshold, fair_threshold, weak_match_floor } =
        *scoring;
    if excellent_threshold > 100 || weak_match_floor > 100 {
        return Err(ConfigError::Validation(
            "scoring thresholds must be in range 0..=100".to_string(),
        ));
    }
    if !(excellent_threshold > good_threshold && good_threshold > fair_threshold) {
        return Err(ConfigError::Validation(format!(
            "scoring thresholds must be strictly descending \
             (excellent {excellent_threshold} > good {good_threshold} > fair {fair_threshold})"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().to_ascii_lowercase().parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    llm: Option<LlmPatch>,
    scoring: Option<ScoringPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    source: Option<CatalogSourceKind>,
    path: Option<PathBuf>,
    sheet_id: Option<String>,
    endpoint_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    enabled: Option<bool>,
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    excellent_threshold: Option<u8>,
    good_threshold: Option<u8>,
    fair_threshold: Option<u8>,
    weak_match_floor: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, CatalogSourceKind, ConfigError, ConfigOverrides, LlmProvider, LoadOptions,
        LogFormat,
    };
    use crate::scoring::DEFAULT_SCORING;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_and_match_scoring_constants() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| format!("defaults should validate: {err}"))?;
        ensure(config.scoring_config() == DEFAULT_SCORING, "default scoring should round-trip")?;
        ensure(config.catalog.source == CatalogSourceKind::Demo, "demo catalog by default")?;
        ensure(!config.llm.enabled, "narrative generation is opt-in")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SIMFIT_SHEET_ID", "1AbCdEf");
        env::set_var("TEST_SIMFIT_LLM_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("simfit.toml");
            fs::write(
                &path,
                r#"
[catalog]
source = "sheet"
sheet_id = "${TEST_SIMFIT_SHEET_ID}"

[llm]
enabled = true
provider = "open_ai"
model = "gpt-4o-mini"
api_key = "${TEST_SIMFIT_LLM_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.sheet_id.as_deref() == Some("1AbCdEf"),
                "sheet id should be loaded from environment",
            )?;
            ensure(config.llm.provider == LlmProvider::OpenAi, "provider should come from file")?;
            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "sk-from-env")
                    == Some(true),
                "api key should be interpolated",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SIMFIT_SHEET_ID", "TEST_SIMFIT_LLM_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_LOG_LEVEL", "warn");
        env::set_var("SIMFIT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SIMFIT_LOG_LEVEL", "SIMFIT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_SCORING_GOOD_THRESHOLD", "70");
        env::set_var("SIMFIT_CATALOG_PATH", "/tmp/from-env.json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("simfit.toml");
            fs::write(
                &path,
                r#"
[catalog]
source = "file"
path = "/tmp/from-file.json"

[scoring]
excellent_threshold = 85
good_threshold = 60

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some("/tmp/from-override.json".into()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path.as_deref() == Some(std::path::Path::new("/tmp/from-override.json")),
                "override catalog path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.scoring.excellent_threshold == 85, "file threshold beats default")?;
            ensure(config.scoring.good_threshold == 70, "env threshold beats file")?;
            ensure(config.scoring.fair_threshold == 50, "unset threshold keeps default")?;
            ensure(
                config.scoring_config().thresholds.good == 70,
                "scoring config should reflect the merged section",
            )?;
            Ok(())
        })();

        clear_vars(&["SIMFIT_SCORING_GOOD_THRESHOLD", "SIMFIT_CATALOG_PATH"]);
        result
    }

    #[test]
    fn non_descending_thresholds_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_SCORING_FAIR_THRESHOLD", "70");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("strictly descending")
            );
            ensure(has_message, "validation failure should mention threshold ordering")
        })();

        clear_vars(&["SIMFIT_SCORING_FAIR_THRESHOLD"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_CATALOG_SOURCE", "sheet");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("catalog.sheet_id")
            );
            ensure(has_message, "validation failure should mention catalog.sheet_id")
        })();

        clear_vars(&["SIMFIT_CATALOG_SOURCE"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_SCORING_WEAK_MATCH_FLOOR", "lots");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default())
                .err()
                .ok_or_else(|| "expected invalid override".to_string())?;
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. }
                    if key == "SIMFIT_SCORING_WEAK_MATCH_FLOOR"),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["SIMFIT_SCORING_WEAK_MATCH_FLOOR"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SIMFIT_LLM_ENABLED", "true");
        env::set_var("SIMFIT_LLM_PROVIDER", "anthropic");
        env::set_var("SIMFIT_LLM_API_KEY", "sk-ant-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-ant-secret-value"), "debug output should not contain key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["SIMFIT_LLM_ENABLED", "SIMFIT_LLM_PROVIDER", "SIMFIT_LLM_API_KEY"]);
        result
    }

    #[test]
    fn hosted_llm_without_key_is_rejected_only_when_enabled() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::OpenAi;
        ensure(config.validate().is_ok(), "disabled llm is not validated")?;

        config.llm.enabled = true;
        let rejected = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("llm.api_key")
        );
        ensure(rejected, "enabled hosted llm requires an api key")
    }
}
