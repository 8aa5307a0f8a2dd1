pub mod catalog;
pub mod config;
pub mod recommend;

use serde::Serialize;
use simfit_core::config::ConfigError;
use simfit_core::errors::ApplicationError;
use tracing::error;

pub const EXIT_INTERNAL: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_INVALID_INPUT: u8 = 4;
pub const EXIT_TRANSCRIPTION: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    /// Successful command with a structured JSON body.
    pub fn report(command: &str, report: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(report) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(
                command,
                "serialization",
                format!("report serialization failed: {error}"),
                EXIT_INTERNAL,
            ),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            hint: None,
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Map an application failure onto its error class and exit code.
    pub fn from_application_error(
        command: &str,
        failure: ApplicationError,
        correlation_id: &str,
    ) -> Self {
        let (error_class, exit_code) = classify(&failure);
        let message = failure.to_string();
        error!(
            event_name = "cli.command.failed",
            command,
            correlation_id,
            error_class,
            error = %message,
            "command failed"
        );
        let interface = failure.into_interface(correlation_id);
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message,
            hint: Some(interface.user_message().to_string()),
            correlation_id: Some(correlation_id.to_string()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn config_failure(error: ConfigError) -> ApplicationError {
    ApplicationError::Configuration(error.to_string())
}

fn classify(failure: &ApplicationError) -> (&'static str, u8) {
    match failure {
        ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG),
        ApplicationError::Catalog(_) => ("catalog_unavailable", EXIT_CATALOG),
        ApplicationError::InvalidInput(_) => ("invalid_input", EXIT_INVALID_INPUT),
        ApplicationError::Narrative(_) => ("narrative_unavailable", EXIT_INTERNAL),
        ApplicationError::Transcription(_) => ("transcription_failed", EXIT_TRANSCRIPTION),
    }
}

pub(crate) fn current_thread_runtime(
    command: &str,
) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to start async runtime: {error}"),
            EXIT_INTERNAL,
        )
    })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
