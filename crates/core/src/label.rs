//! Qualitative match bands

use serde::{Deserialize, Serialize};

use crate::scoring::MatchThresholds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Cautious,
    Fair,
    Good,
    Excellent,
}

impl MatchLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent Match",
            Self::Good => "Good Match",
            Self::Fair => "Fair Match",
            Self::Cautious => "Cautious Match",
        }
    }
}

/// Presentation hints. Tones are semantic; renderers map them to colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StyleHints {
    pub tone: &'static str,
    pub emphasize: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchLabel {
    pub label: &'static str,
    pub level: MatchLevel,
    pub style: StyleHints,
}

impl MatchThresholds {
    pub fn level_for(&self, total: u8) -> MatchLevel {
        if total >= self.excellent {
            MatchLevel::Excellent
        } else if total >= self.good {
            MatchLevel::Good
        } else if total >= self.fair {
            MatchLevel::Fair
        } else {
            MatchLevel::Cautious
        }
    }
}

/// Classify a total into its band.
pub fn classify(total: u8, thresholds: &MatchThresholds) -> MatchLabel {
    let level = thresholds.level_for(total);
    let style = match level {
        MatchLevel::Excellent => StyleHints { tone: "positive", emphasize: false },
        MatchLevel::Good => StyleHints { tone: "informative", emphasize: false },
        MatchLevel::Fair => StyleHints { tone: "neutral", emphasize: false },
        MatchLevel::Cautious => StyleHints { tone: "warning", emphasize: true },
    };
    MatchLabel { label: level.label(), level, style }
}

#[cfg(test)]
mod tests {
    use super::{classify, MatchLevel};
    use crate::scoring::{MatchThresholds, DEFAULT_THRESHOLDS};

    #[test]
    fn default_bands() {
        let cases = [
            (100, MatchLevel::Excellent),
            (80, MatchLevel::Excellent),
            (79, MatchLevel::Good),
            (65, MatchLevel::Good),
            (64, MatchLevel::Fair),
            (50, MatchLevel::Fair),
            (49, MatchLevel::Cautious),
            (0, MatchLevel::Cautious),
        ];
        for (total, expected) in cases {
            assert_eq!(classify(total, &DEFAULT_THRESHOLDS).level, expected, "{total}");
        }
    }

    #[test]
    fn labels_follow_configured_thresholds() {
        let strict = MatchThresholds { excellent: 90, good: 75, fair: 60 };
        let label = classify(85, &strict);
        assert_eq!(label.level, MatchLevel::Good);
        assert_eq!(label.label, "Good Match");
    }

    #[test]
    fn cautious_is_emphasized() {
        let label = classify(10, &DEFAULT_THRESHOLDS);
        assert_eq!(label.label, "Cautious Match");
        assert!(label.style.emphasize);
    }
}
