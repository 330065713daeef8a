//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default maximum length of one cry recording
pub const DEFAULT_RECORDING_SECS: u64 = 15;

/// Default timeout for the classifier round trip
pub const DEFAULT_CLASSIFY_TIMEOUT_SECS: u64 = 10;

/// Upper bound accepted for a recording length
pub const MAX_RECORDING_SECS: u64 = 300;

/// Value object representing a non-zero span of time with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    millis: u64,
}

impl Duration {
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            millis: secs * 1000,
        }
    }

    /// Default maximum recording length
    pub const fn default_recording() -> Self {
        Self::from_secs(DEFAULT_RECORDING_SECS)
    }

    /// Default classifier timeout
    pub const fn default_timeout() -> Self {
        Self::from_secs(DEFAULT_CLASSIFY_TIMEOUT_SECS)
    }

    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.millis)
    }

    /// Whether the value is acceptable as a recording length
    pub const fn is_valid_recording_length(&self) -> bool {
        self.millis <= MAX_RECORDING_SECS * 1000
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse strings such as `500ms`, `15s`, `1m` or `1m30s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_ascii_lowercase();
        let mut rest = input.as_str();
        let mut total: u64 = 0;

        if rest.is_empty() {
            return Err(err());
        }

        while !rest.is_empty() {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(err());
            }
            let value: u64 = rest[..digits].parse().map_err(|_| err())?;
            rest = &rest[digits..];

            let (factor, unit_len) = if rest.starts_with("ms") {
                (1, 2)
            } else if rest.starts_with('s') {
                (1000, 1)
            } else if rest.starts_with('m') {
                (60_000, 1)
            } else {
                return Err(err());
            };
            rest = &rest[unit_len..];

            total = value
                .checked_mul(factor)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(err)?;
        }

        if total == 0 {
            return Err(err());
        }

        Ok(Self { millis: total })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 1000 != 0 {
            return write!(f, "{}ms", self.millis);
        }
        let secs = self.millis / 1000;
        match (secs / 60, secs % 60) {
            (0, s) => write!(f, "{}s", s),
            (m, 0) => write!(f, "{}m", m),
            (m, s) => write!(f, "{}m{}s", m, s),
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_recording()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!("250ms".parse::<Duration>().unwrap().as_millis(), 250);
        assert_eq!("15s".parse::<Duration>().unwrap().as_millis(), 15_000);
        assert_eq!("2m".parse::<Duration>().unwrap().as_millis(), 120_000);
    }

    #[test]
    fn parses_compound_values() {
        let d: Duration = "1m30s".parse().unwrap();
        assert_eq!(d.as_millis(), 90_000);

        let d: Duration = " 1S500MS ".parse().unwrap();
        assert_eq!(d.as_millis(), 1_500);
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["", "10", "s", "0s", "5h", "1m-3s", "ms"] {
            assert!(bad.parse::<Duration>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Duration::from_secs(15).to_string(), "15s");
        assert_eq!(Duration::from_secs(120).to_string(), "2m");
        assert_eq!(Duration::from_secs(95).to_string(), "1m35s");
        assert_eq!(Duration::from_millis(1500).to_string(), "1500ms");
    }

    #[test]
    fn defaults() {
        assert_eq!(Duration::default_recording().as_millis(), 15_000);
        assert_eq!(Duration::default_timeout().as_std(), StdDuration::from_secs(10));
    }

    #[test]
    fn recording_length_bound() {
        assert!(Duration::from_secs(MAX_RECORDING_SECS).is_valid_recording_length());
        assert!(!Duration::from_secs(MAX_RECORDING_SECS + 1).is_valid_recording_length());
    }
}
