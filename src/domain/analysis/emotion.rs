//! Emotion breakdown value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four categories shown to parents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmotionKind {
    Hungry,
    Tired,
    Uncomfortable,
    NeedsAttention,
}

impl EmotionKind {
    pub const ALL: [EmotionKind; 4] = [
        Self::Hungry,
        Self::Tired,
        Self::Uncomfortable,
        Self::NeedsAttention,
    ];

    pub const fn key(&self) -> &'static str {
        match self {
            Self::Hungry => "hungry",
            Self::Tired => "tired",
            Self::Uncomfortable => "uncomfortable",
            Self::NeedsAttention => "needsAttention",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Hungry => "Hungry",
            Self::Tired => "Tired",
            Self::Uncomfortable => "Uncomfortable",
            Self::NeedsAttention => "Needs attention",
        }
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Integer percentages per emotion.
///
/// Values come from fixed tables and are not normalized; they need not sum
/// to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionVector {
    pub hungry: u8,
    pub tired: u8,
    pub uncomfortable: u8,
    pub needs_attention: u8,
}

impl EmotionVector {
    /// Breakdown used when the label is not recognized
    pub const BALANCED: EmotionVector = EmotionVector::new(25, 25, 25, 25);

    /// Placeholder breakdown of a synthesized demo result
    pub const FALLBACK: EmotionVector = EmotionVector::new(15, 5, 70, 10);

    pub const fn new(hungry: u8, tired: u8, uncomfortable: u8, needs_attention: u8) -> Self {
        Self {
            hungry,
            tired,
            uncomfortable,
            needs_attention,
        }
    }

    pub const fn get(&self, kind: EmotionKind) -> u8 {
        match kind {
            EmotionKind::Hungry => self.hungry,
            EmotionKind::Tired => self.tired,
            EmotionKind::Uncomfortable => self.uncomfortable,
            EmotionKind::NeedsAttention => self.needs_attention,
        }
    }

    /// Categories paired with their values, in display order
    pub fn entries(&self) -> [(EmotionKind, u8); 4] {
        EmotionKind::ALL.map(|kind| (kind, self.get(kind)))
    }

    /// Highest category; the first in display order wins ties
    pub fn dominant(&self) -> EmotionKind {
        let mut best = EmotionKind::Hungry;
        for kind in EmotionKind::ALL {
            if self.get(kind) > self.get(best) {
                best = kind;
            }
        }
        best
    }

    pub fn total(&self) -> u32 {
        self.entries().iter().map(|(_, v)| u32::from(*v)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_vector_matches_reference() {
        let v = EmotionVector::FALLBACK;
        assert_eq!(v.uncomfortable, 70);
        assert_eq!(v.hungry, 15);
        assert_eq!(v.needs_attention, 10);
        assert_eq!(v.tired, 5);
    }

    #[test]
    fn dominant_picks_highest() {
        assert_eq!(
            EmotionVector::new(10, 70, 10, 10).dominant(),
            EmotionKind::Tired
        );
        assert_eq!(EmotionVector::FALLBACK.dominant(), EmotionKind::Uncomfortable);
        assert_eq!(EmotionVector::BALANCED.dominant(), EmotionKind::Hungry);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(EmotionVector::new(75, 10, 5, 10)).unwrap();
        assert_eq!(json["hungry"], 75);
        assert_eq!(json["needsAttention"], 10);
    }

    #[test]
    fn totals_are_not_forced_to_100() {
        assert_eq!(EmotionVector::new(80, 10, 5, 10).total(), 105);
    }
}
