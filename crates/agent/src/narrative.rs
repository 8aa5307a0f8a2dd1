use async_trait::async_trait;
use serde::Deserialize;
use simfit_core::errors::NarrativeError;
use simfit_core::narrative::{NarrativeGenerator, NarrativeRequest};
use tracing::debug;

use crate::guardrails::{GuardrailDecision, GuardrailPolicy};
use crate::llm::LlmClient;

const PROMPT_PREAMBLE: &str = "\
You advise people in the UK on choosing a SIM-only mobile plan.
Read the user's own description of how they use their phone and the priorities they ticked.
Write a personal fit summary of two or three sentences that tells them what kind of plan suits them and why,
for example high data caps for heavy streaming or included EU roaming for frequent trips.
Speak to the user directly in a friendly, expert tone. Do not name providers, plans or prices.
Reply with JSON only: {\"personal_fit_summary\": \"...\"}";

#[derive(Debug, Deserialize)]
struct NarrativePayload {
    #[serde(alias = "personalFitSummary")]
    personal_fit_summary: String,
}

pub fn build_prompt(request: &NarrativeRequest) -> String {
    format!(
        "{PROMPT_PREAMBLE}\n\nUser description:\n\"{}\"\nPriorities: {}",
        request.description.trim(),
        request.priority_list()
    )
}

/// Accept the requested JSON object, a fenced JSON block, or bare prose.
pub fn parse_completion(raw: &str) -> String {
    let unfenced = strip_code_fence(raw.trim());
    match serde_json::from_str::<NarrativePayload>(unfenced) {
        Ok(payload) => payload.personal_fit_summary,
        Err(_) => unfenced.to_string(),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub struct LlmNarrativeGenerator<C> {
    client: C,
    policy: GuardrailPolicy,
}

impl<C: LlmClient> LlmNarrativeGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client, policy: GuardrailPolicy::default() }
    }

    pub fn with_policy(mut self, policy: GuardrailPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl<C: LlmClient> NarrativeGenerator for LlmNarrativeGenerator<C> {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        let raw = self
            .client
            .complete(&build_prompt(request))
            .await
            .map_err(|error| NarrativeError::Generation(format!("{error:#}")))?;

        match self.policy.evaluate(&parse_completion(&raw)) {
            GuardrailDecision::Allow(text) => Ok(text),
            GuardrailDecision::Deny { reason_code } => {
                debug!(event_name = "agent.narrative.denied", reason_code, "narrative rejected");
                Err(NarrativeError::EmptyResponse)
            }
        }
    }
}
