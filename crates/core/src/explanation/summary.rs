use serde::{Deserialize, Serialize};

use super::pounds;
use crate::domain::{Lifestyle, Plan, Priority, UserProfile};
use crate::label::MatchLevel;
use crate::pipeline::SortMode;

const MAX_SUMMARY_PARTS: usize = 3;
const QUOTE_MIN_CHARS: usize = 5;
const QUOTE_MAX_CHARS: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub title: String,
    pub subtitle: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopAnalysis {
    pub headline: String,
    pub body: String,
}

/// Natural-language focus areas, in display order. Each entry fires once even
/// when several of its priorities are present.
const FOCUS_PHRASES: [(&[Priority], &str); 7] = [
    (&[Priority::CheapAndSimple], "keeping costs down"),
    (&[Priority::NeverRunOut, Priority::Unlimited], "avoiding data caps"),
    (&[Priority::BestCoverage], "network reliability"),
    (&[Priority::NoContract], "flexibility"),
    (&[Priority::Hotspot], "hotspotting"),
    (&[Priority::EuropeTravel], "EU travel"),
    (&[Priority::CustomerService], "good support"),
];

pub fn profile_summary(profile: &UserProfile) -> ProfileSummary {
    let title = match profile.lifestyle {
        Some(lifestyle) => lifestyle.title(),
        None if !profile.priorities.is_empty() => "Custom Preferences",
        None if profile.budget.is_some() => "Budget-Conscious User",
        None => "Your Profile",
    };

    let parts: Vec<&str> = FOCUS_PHRASES
        .iter()
        .filter(|(priorities, _)| profile.has_any(priorities))
        .map(|(_, phrase)| *phrase)
        .take(MAX_SUMMARY_PARTS)
        .collect();

    let description = profile.effective_description();
    let mut subtitle = match parts.as_slice() {
        [] if description.chars().count() > QUOTE_MIN_CHARS => {
            format!("Based on: \"{}\"", truncate(description, QUOTE_MAX_CHARS))
        }
        [] => "We're analysing your inputs to find the best fit.".to_string(),
        [only] => format!("Prioritizing {only}."),
        [init @ .., last] => format!("Prioritizing {} and {last}.", init.join(", ")),
    };

    if let Some(budget) = profile.budget {
        subtitle.push_str(&format!(" Target budget: {}/mo.", pounds(budget)));
    }

    ProfileSummary { title: title.to_string(), subtitle }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn audience_name(lifestyle: Lifestyle) -> Option<&'static str> {
    match lifestyle {
        Lifestyle::Budget => Some("Budget Focused user"),
        Lifestyle::Travel => Some("Frequent Traveller"),
        Lifestyle::Power => Some("Power User"),
        Lifestyle::Streamer => Some("Heavy Streamer"),
        Lifestyle::Remote => Some("Remote Worker"),
        Lifestyle::Social => Some("Social Media fan"),
        Lifestyle::Everyday => Some("Everyday User"),
        Lifestyle::Other => None,
    }
}

/// Copy shown above the result list.
pub fn top_analysis(
    profile: &UserProfile,
    sort_mode: SortMode,
    top_plan: Option<&Plan>,
    band: MatchLevel,
) -> TopAnalysis {
    let headline = if top_plan.is_some_and(|plan| !plan.monthly_price.is_zero()) {
        "We found some strong matches for you."
    } else {
        "Your personalized recommendations"
    };

    let mut sentences = Vec::new();
    let audience = profile
        .lifestyle
        .and_then(|lifestyle| audience_name(lifestyle).map(|name| (lifestyle, name)));
    match audience {
        Some((lifestyle, name)) => {
            let balance = if lifestyle == Lifestyle::Budget {
                "price and flexibility"
            } else {
                "performance and features"
            };
            sentences.push(format!(
                "Because you're a {name}, we prioritized plans that balance {balance}."
            ));
        }
        None => sentences.push(
            "Based on your inputs, we focused on finding a balanced plan with good network \
             reliability."
                .to_string(),
        ),
    }

    if let Some(budget) = profile.budget {
        sentences.push(format!("We aimed to keep costs around {}/mo.", pounds(budget)));
    } else if profile.has(Priority::NoContract) {
        sentences.push("We prioritized 1-month rolling contracts for flexibility.".to_string());
    } else if profile.has(Priority::EuropeTravel) {
        sentences.push("We heavily weighted inclusive EU roaming.".to_string());
    } else if profile.has(Priority::NeverRunOut) {
        sentences.push("We looked for high data caps or unlimited options.".to_string());
    }

    match sort_mode {
        SortMode::Price => sentences.push("Sorting by lowest price first.".to_string()),
        SortMode::MostData => sentences.push("Sorting by maximum data allowance.".to_string()),
        _ => {}
    }

    if band == MatchLevel::Cautious {
        sentences.push(
            "Note: We couldn't find a perfect match for all your filters, so these are the \
             closest available options (some trade-offs apply)."
                .to_string(),
        );
    }

    TopAnalysis { headline: headline.to_string(), body: sentences.join(" ") }
}
