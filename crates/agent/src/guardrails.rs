//! Output policy for generated narratives.
//!
//! The model only paraphrases the user's needs. Prices, scores and plan picks
//! come from the deterministic core, so text that invents them is rejected.

const DEFAULT_MAX_CHARS: usize = 600;
const MIN_CHARS: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow(String),
    Deny { reason_code: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_chars: usize,
    pub allow_prices: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { max_chars: DEFAULT_MAX_CHARS, allow_prices: false }
    }
}

impl GuardrailPolicy {
    /// Normalize whitespace, reject empty or price-quoting text, and cut
    /// overlong text back to its last full sentence.
    pub fn evaluate(&self, text: &str) -> GuardrailDecision {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let trimmed = collapsed.trim_matches(|ch: char| ch == '"' || ch.is_whitespace());
        if trimmed.chars().count() < MIN_CHARS {
            return GuardrailDecision::Deny { reason_code: "narrative_too_short" };
        }
        if !self.allow_prices && (trimmed.contains('£') || trimmed.contains('$')) {
            return GuardrailDecision::Deny { reason_code: "narrative_quotes_prices" };
        }
        GuardrailDecision::Allow(truncate_to_sentence(trimmed, self.max_chars))
    }
}

fn truncate_to_sentence(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    match head.rfind(|ch: char| matches!(ch, '.' | '!' | '?')) {
        Some(end) if end > 0 => head[..=end].to_string(),
        _ => format!("{}…", head.trim_end()),
    }
}

#[cfg(test)]
mod tests {
    use super::{GuardrailDecision, GuardrailPolicy};

    #[test]
    fn whitespace_is_collapsed() {
        let decision = GuardrailPolicy::default()
            .evaluate("  \"Because you   travel often,\n we favoured EU roaming.\"  ");
        assert_eq!(
            decision,
            GuardrailDecision::Allow(
                "Because you travel often, we favoured EU roaming.".to_string()
            )
        );
    }

    #[test]
    fn price_quotes_are_denied() {
        let decision =
            GuardrailPolicy::default().evaluate("You should pick the £10 plan from Smarty today.");
        assert_eq!(decision, GuardrailDecision::Deny { reason_code: "narrative_quotes_prices" });
    }

    #[test]
    fn empty_output_is_denied() {
        let decision = GuardrailPolicy::default().evaluate("   ");
        assert_eq!(decision, GuardrailDecision::Deny { reason_code: "narrative_too_short" });
    }

    #[test]
    fn long_output_is_cut_at_a_sentence_boundary() {
        let policy = GuardrailPolicy { max_chars: 40, allow_prices: false };
        let decision =
            policy.evaluate("You stream a lot on the go. You also travel to Spain every summer.");
        assert_eq!(decision, GuardrailDecision::Allow("You stream a lot on the go.".to_string()));
    }
}
