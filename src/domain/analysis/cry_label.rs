//! Cry type labels returned by the classifier

use std::fmt;

use serde::{Deserialize, Serialize};

use super::emotion::EmotionVector;
use super::recommendation;

/// Coarse category reported by the cry classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryLabel {
    Hunger,
    Tiredness,
    Discomfort,
    NeedsAttention,
    Burping,
    Unknown,
}

impl CryLabel {
    pub const ALL: [CryLabel; 6] = [
        Self::Hunger,
        Self::Tiredness,
        Self::Discomfort,
        Self::NeedsAttention,
        Self::Burping,
        Self::Unknown,
    ];

    /// Interpret a raw `cry_type` string.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `_` and `-`
    /// as spaces. Anything unrecognized is [`CryLabel::Unknown`].
    pub fn from_cry_type(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "hunger" | "hungry" => Self::Hunger,
            "tiredness" | "tired" | "sleepy" => Self::Tiredness,
            "pain" | "discomfort" | "belly pain" => Self::Discomfort,
            "needs attention" | "lonely" => Self::NeedsAttention,
            "burping" | "burp" => Self::Burping,
            _ => Self::Unknown,
        }
    }

    /// Emotion breakdown shown for this label
    pub const fn emotions(&self) -> EmotionVector {
        match self {
            Self::Hunger => EmotionVector::new(75, 10, 5, 10),
            Self::Tiredness => EmotionVector::new(10, 70, 10, 10),
            Self::Discomfort => EmotionVector::new(5, 5, 80, 10),
            Self::NeedsAttention => EmotionVector::new(10, 10, 10, 70),
            Self::Burping => EmotionVector::new(15, 5, 70, 10),
            Self::Unknown => EmotionVector::BALANCED,
        }
    }

    /// Advice sentence for this label
    pub const fn recommendation(&self) -> &'static str {
        recommendation::for_label(*self)
    }

    /// Key used by a localization layer to look up the display name
    pub const fn canonical_key(&self) -> &'static str {
        match self {
            Self::Hunger => "hungry",
            Self::Tiredness => "tired",
            Self::Discomfort => "uncomfortable",
            Self::NeedsAttention => "needsAttention",
            Self::Burping => "burping",
            Self::Unknown => "unknown",
        }
    }

    /// Key used by a localization layer to look up the recommendation
    pub const fn recommendation_key(&self) -> &'static str {
        match self {
            Self::Hunger => "recommendation.hungry",
            Self::Tiredness => "recommendation.tired",
            Self::Discomfort => "recommendation.uncomfortable",
            Self::NeedsAttention => "recommendation.needsAttention",
            Self::Burping => "recommendation.burping",
            Self::Unknown => "recommendation.generic",
        }
    }
}

impl fmt::Display for CryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hunger => "hunger",
            Self::Tiredness => "tiredness",
            Self::Discomfort => "discomfort",
            Self::NeedsAttention => "needs attention",
            Self::Burping => "burping",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_labels() {
        assert_eq!(CryLabel::from_cry_type("hunger"), CryLabel::Hunger);
        assert_eq!(CryLabel::from_cry_type("tiredness"), CryLabel::Tiredness);
        assert_eq!(CryLabel::from_cry_type("sleepy"), CryLabel::Tiredness);
        assert_eq!(CryLabel::from_cry_type("pain"), CryLabel::Discomfort);
        assert_eq!(CryLabel::from_cry_type("discomfort"), CryLabel::Discomfort);
        assert_eq!(
            CryLabel::from_cry_type("needs attention"),
            CryLabel::NeedsAttention
        );
        assert_eq!(CryLabel::from_cry_type("lonely"), CryLabel::NeedsAttention);
        assert_eq!(CryLabel::from_cry_type("burping"), CryLabel::Burping);
        assert_eq!(CryLabel::from_cry_type("unknown"), CryLabel::Unknown);
    }

    #[test]
    fn parsing_ignores_case_and_separators() {
        assert_eq!(CryLabel::from_cry_type("  HUNGER "), CryLabel::Hunger);
        assert_eq!(
            CryLabel::from_cry_type("Needs_Attention"),
            CryLabel::NeedsAttention
        );
        assert_eq!(CryLabel::from_cry_type("belly-pain"), CryLabel::Discomfort);
        assert_eq!(CryLabel::from_cry_type("hungry"), CryLabel::Hunger);
        assert_eq!(CryLabel::from_cry_type("tired"), CryLabel::Tiredness);
    }

    #[test]
    fn unrecognized_is_unknown() {
        assert_eq!(CryLabel::from_cry_type(""), CryLabel::Unknown);
        assert_eq!(CryLabel::from_cry_type("scared"), CryLabel::Unknown);
    }

    #[test]
    fn emotion_table() {
        let expect = [
            (CryLabel::Hunger, (75, 10, 5, 10)),
            (CryLabel::Tiredness, (10, 70, 10, 10)),
            (CryLabel::Discomfort, (5, 5, 80, 10)),
            (CryLabel::NeedsAttention, (10, 10, 10, 70)),
            (CryLabel::Burping, (15, 5, 70, 10)),
            (CryLabel::Unknown, (25, 25, 25, 25)),
        ];
        for (label, (h, t, u, n)) in expect {
            assert_eq!(label.emotions(), EmotionVector::new(h, t, u, n), "{label}");
        }
    }

    #[test]
    fn every_label_has_keys_and_advice() {
        for label in CryLabel::ALL {
            assert!(!label.canonical_key().is_empty());
            assert!(label.recommendation_key().starts_with("recommendation."));
            assert!(!label.recommendation().is_empty());
        }
    }
}
