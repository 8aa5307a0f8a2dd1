use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use simfit_cli::commands::recommend::RecommendArgs;
use simfit_cli::commands::{catalog, config, recommend};
use simfit_core::config::LoadOptions;

#[test]
fn recommend_ranks_the_demo_catalog() {
    with_env(&[], || {
        let result = recommend::run(&LoadOptions::default(), &RecommendArgs::default());
        assert_eq!(result.exit_code, 0, "expected success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["catalog_size"], 8);
        assert_eq!(payload["is_empty"], false);
        assert_eq!(payload["was_relaxed"], false);
        assert_eq!(payload["filters"], "None");
        assert_eq!(payload["sort"], "recommended");
        assert!(payload["narrative"].is_null());

        let plans = payload["plans"].as_array().expect("plans array");
        assert_eq!(plans.len(), 8);
        let totals: Vec<u64> =
            plans.iter().map(|plan| plan["total"].as_u64().expect("total")).collect();
        assert!(totals.windows(2).all(|pair| pair[0] >= pair[1]), "ranked by total: {totals:?}");
        assert!(plans[0]["sub_scores"]["coverage_fit"].is_number());
        assert!(plans[0]["explanation"]["primary"].is_string());
    });
}

#[test]
fn recommend_honours_limit_and_lifestyle_default_sort() {
    with_env(&[], || {
        let args = RecommendArgs {
            lifestyle: Some("budget".to_string()),
            budget: Some("12".to_string()),
            limit: Some(3),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "expected success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["sort"], "best-budget-fit");
        assert_eq!(payload["plans"].as_array().map(Vec::len), Some(3));
        assert_eq!(payload["matched"], 8);
    });
}

#[test]
fn recommend_relaxes_filters_that_match_nothing() {
    with_env(&[], || {
        let args = RecommendArgs {
            network: Some("vodafone".to_string()),
            contract: Some("12".to_string()),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "expected success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["was_relaxed"], true);
        assert_eq!(payload["relaxation"], "without-network");
        assert_eq!(payload["is_empty"], false);
        let plans = payload["plans"].as_array().expect("plans array");
        assert!(plans.iter().all(|plan| plan["network"] != "Vodafone"));
    });
}

#[test]
fn recommend_rejects_unknown_tags_as_invalid_input() {
    with_env(&[], || {
        let args =
            RecommendArgs { sort: Some("fastest".to_string()), ..RecommendArgs::default() };
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 4, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
        assert!(payload["correlation_id"].is_string());
    });
}

#[test]
fn recommend_returns_config_failure_for_file_source_without_path() {
    with_env(&[("SIMFIT_CATALOG_SOURCE", "file")], || {
        let result = recommend::run(&LoadOptions::default(), &RecommendArgs::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn recommend_returns_catalog_failure_for_unreadable_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");
    let missing = missing.to_string_lossy().to_string();

    let vars = [("SIMFIT_CATALOG_SOURCE", "file"), ("SIMFIT_CATALOG_PATH", missing.as_str())];
    with_env(&vars, || {
        let result = recommend::run(&LoadOptions::default(), &RecommendArgs::default());
        assert_eq!(result.exit_code, 3, "expected catalog failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "catalog_unavailable");
    });
}

#[test]
fn recommend_omits_narrative_when_the_model_is_unreachable() {
    with_env(
        &[("SIMFIT_LLM_BASE_URL", "http://127.0.0.1:9"), ("SIMFIT_LLM_MAX_RETRIES", "0")],
        || {
            let args = RecommendArgs {
                description: Some("I work from cafes and tether my laptop".to_string()),
                narrative: true,
                ..RecommendArgs::default()
            };
            let result = recommend::run(&LoadOptions::default(), &args);
            assert_eq!(result.exit_code, 0, "narrative failure is not fatal: {}", result.output);

            let payload = parse_payload(&result.output);
            assert!(payload["narrative"].is_null());
            assert_eq!(payload["catalog_size"], 8);
        },
    );
}

#[test]
fn recommend_rejects_spoken_descriptions_the_model_cannot_hear() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clip = dir.path().join("needs.wav");
    fs::write(&clip, b"RIFF....WAVE").expect("write clip");

    with_env(&[("SIMFIT_LLM_PROVIDER", "anthropic")], || {
        let args = RecommendArgs {
            description_audio: Some(clip.clone()),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 5, "expected transcription failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "transcription_failed");
        assert!(payload["message"]
            .as_str()
            .is_some_and(|message| message.contains("does not accept audio input")));
    });
}

#[test]
fn recommend_reports_missing_audio_as_invalid_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = RecommendArgs {
        description_audio: Some(dir.path().join("missing.mp3")),
        ..RecommendArgs::default()
    };

    with_env(&[], || {
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 4, "expected invalid input code");
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn catalog_reports_loaded_and_skipped_rows_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plans.json");
    fs::write(
        &path,
        r#"[
            {"id": "a1", "providerName": "Smarty", "planName": "30GB", "network": "Three",
             "pricePerMonth": 8, "dataGb": 30, "contractLengthMonths": 1, "isRolling": true,
             "roamingType": "EU Included", "hotspotAllowed": true, "rating": 70},
            {"providerName": "NoId", "planName": "Orphan", "pricePerMonth": 5}
        ]"#,
    )
    .expect("write catalog");
    let path = path.to_string_lossy().to_string();

    let vars = [("SIMFIT_CATALOG_SOURCE", "file"), ("SIMFIT_CATALOG_PATH", path.as_str())];
    with_env(&vars, || {
        let result = catalog::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "catalog");
        assert_eq!(payload["source"], "file");
        assert_eq!(payload["plan_count"], 1);
        assert_eq!(payload["skipped_count"], 1);
        assert_eq!(payload["skipped"][0]["index"], 1);
        assert_eq!(payload["providers"][0], "Smarty");
    });
}

#[test]
fn catalog_reports_demo_rows_by_default() {
    with_env(&[], || {
        let result = catalog::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["source"], "demo");
        assert_eq!(payload["plan_count"], 8);
        assert_eq!(payload["skipped_count"], 0);
    });
}

#[test]
fn config_attributes_sources_and_redacts_secrets() {
    with_env(
        &[
            ("SIMFIT_LLM_PROVIDER", "openai"),
            ("SIMFIT_LLM_API_KEY", "sk-live-supersecret"),
            ("SIMFIT_SCORING_GOOD_THRESHOLD", "65"),
        ],
        || {
            let result = config::run(&LoadOptions::default());
            assert_eq!(result.exit_code, 0);

            let output = result.output;
            assert!(output
                .starts_with("effective config (source precedence: env > file > default):"));
            assert!(output.contains("- llm.api_key = sk-*** (source: env (SIMFIT_LLM_API_KEY))"));
            assert!(output.contains(
                "- scoring.good_threshold = 65 (source: env (SIMFIT_SCORING_GOOD_THRESHOLD))"
            ));
            assert!(output.contains("- catalog.source = Demo (source: default)"));
            assert!(!output.contains("supersecret"));
        },
    );
}

#[test]
fn config_attributes_values_to_an_explicit_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("simfit.toml");
    fs::write(&path, "[scoring]\nweak_match_floor = 35\n\n[logging]\nformat = \"json\"\n")
        .expect("write config");

    with_env(&[], || {
        let options = LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        };
        let result = config::run(&options);
        assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

        let file_source = format!("(source: file ({}))", path.display());
        assert!(result.output.contains(&format!("- scoring.weak_match_floor = 35 {file_source}")));
        assert!(result.output.contains(&format!("- logging.format = Json {file_source}")));
        assert!(result.output.contains("- scoring.fair_threshold = "));
    });
}

#[test]
fn config_rejects_thresholds_out_of_order() {
    with_env(&[("SIMFIT_SCORING_GOOD_THRESHOLD", "95")], || {
        let result = config::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SIMFIT_CATALOG_SOURCE",
        "SIMFIT_CATALOG_PATH",
        "SIMFIT_CATALOG_SHEET_ID",
        "SIMFIT_CATALOG_ENDPOINT_URL",
        "SIMFIT_CATALOG_TIMEOUT_SECS",
        "SIMFIT_LLM_ENABLED",
        "SIMFIT_LLM_PROVIDER",
        "SIMFIT_LLM_API_KEY",
        "SIMFIT_LLM_BASE_URL",
        "SIMFIT_LLM_MODEL",
        "SIMFIT_LLM_TIMEOUT_SECS",
        "SIMFIT_LLM_MAX_RETRIES",
        "SIMFIT_SCORING_EXCELLENT_THRESHOLD",
        "SIMFIT_SCORING_GOOD_THRESHOLD",
        "SIMFIT_SCORING_FAIR_THRESHOLD",
        "SIMFIT_SCORING_WEAK_MATCH_FLOOR",
        "SIMFIT_LOGGING_LEVEL",
        "SIMFIT_LOGGING_FORMAT",
        "SIMFIT_LOG_LEVEL",
        "SIMFIT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
