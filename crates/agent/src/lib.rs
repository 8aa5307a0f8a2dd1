//! Narrative generation for simfit
//!
//! Wraps a pluggable [`llm::LlmClient`] (OpenAI, Anthropic or Ollama over HTTP)
//! as the core's [`NarrativeGenerator`]. The model only restates the user's
//! needs in prose; every score, ranking and price comes from `simfit-core`.
//! The same client can transcribe a spoken description into profile text.

pub mod guardrails;
pub mod llm;
pub mod narrative;
pub mod transcribe;

use std::path::Path;

use anyhow::Result;
use simfit_core::config::LlmConfig;
use simfit_core::errors::ApplicationError;
use simfit_core::narrative::NarrativeGenerator;

pub use guardrails::{GuardrailDecision, GuardrailPolicy};
pub use llm::{HttpLlmClient, LlmClient};
pub use narrative::LlmNarrativeGenerator;
pub use transcribe::{transcribe_file, AudioClip, AudioFormat, Transcriber};

/// The configured generator, or `None` when narratives are switched off.
pub fn generator_from_config(config: &LlmConfig) -> Result<Option<Box<dyn NarrativeGenerator>>> {
    if !config.enabled {
        return Ok(None);
    }
    let client = HttpLlmClient::from_config(config)?;
    let generator: Box<dyn NarrativeGenerator> = Box::new(LlmNarrativeGenerator::new(client));
    Ok(Some(generator))
}

/// Transcribe a recorded description with the configured model. Unlike
/// narratives this does not depend on `llm.enabled`: asking for it is the opt-in.
pub async fn transcribe_with_config(
    config: &LlmConfig,
    path: &Path,
) -> Result<String, ApplicationError> {
    let client = HttpLlmClient::from_config(config)
        .map_err(|error| ApplicationError::Transcription(format!("{error:#}")))?;
    transcribe_file(&client, path).await
}
