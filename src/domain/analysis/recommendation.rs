//! Recommendation text per cry label

use super::cry_label::CryLabel;

/// Advice when the label carries no specific guidance
pub const GENERIC_RECOMMENDATION: &str =
    "Try the usual checks: offer a feed, look at the diaper and hold your baby close.";

/// Advice attached to a synthesized demo result
pub const FALLBACK_RECOMMENDATION: &str = "Demo result: the cry could not be analyzed, so this \
breakdown is an example and does not describe your recording. Check your connection and \
microphone, then try again.";

pub(super) const fn for_label(label: CryLabel) -> &'static str {
    match label {
        CryLabel::Hunger => {
            "Your baby seems hungry. Try feeding or checking if it's time for the next meal."
        }
        CryLabel::Tiredness => {
            "Your baby appears tired. Consider creating a calm environment for sleep."
        }
        CryLabel::Discomfort => {
            "Your baby seems uncomfortable. Check diaper, clothing, or room temperature."
        }
        CryLabel::NeedsAttention => {
            "Your baby wants attention and comfort. Try gentle interaction or cuddling."
        }
        CryLabel::Burping => {
            "Your baby may need to burp. Hold them upright and gently pat their back."
        }
        CryLabel::Unknown => GENERIC_RECOMMENDATION,
    }
}
