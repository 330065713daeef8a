//! Patterns derived from the history log

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Timelike, Weekday};
use serde::Serialize;

use crate::domain::analysis::{AnalysisRecord, EmotionKind, EmotionVector};

/// Number of most recent records considered
pub const INSIGHT_WINDOW: usize = 50;

/// Part of the day a cry happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    /// Morning 05-12, afternoon 12-17, evening 17-21, night otherwise
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAverages {
    pub hungry: f64,
    pub tired: f64,
    pub uncomfortable: f64,
    pub needs_attention: f64,
}

impl EmotionAverages {
    pub fn get(&self, kind: EmotionKind) -> f64 {
        match kind {
            EmotionKind::Hungry => self.hungry,
            EmotionKind::Tired => self.tired,
            EmotionKind::Uncomfortable => self.uncomfortable,
            EmotionKind::NeedsAttention => self.needs_attention,
        }
    }

    fn from_vectors(vectors: &[EmotionVector]) -> Self {
        if vectors.is_empty() {
            return Self::default();
        }
        let n = vectors.len() as f64;
        let avg = |f: fn(&EmotionVector) -> u8| -> f64 {
            vectors.iter().map(|v| f64::from(f(v))).sum::<f64>() / n
        };
        Self {
            hungry: avg(|v| v.hungry),
            tired: avg(|v| v.tired),
            uncomfortable: avg(|v| v.uncomfortable),
            needs_attention: avg(|v| v.needs_attention),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeOfDayCounts {
    pub morning: usize,
    pub afternoon: usize,
    pub evening: usize,
    pub night: usize,
}

impl TimeOfDayCounts {
    fn bump(&mut self, period: DayPeriod) {
        match period {
            DayPeriod::Morning => self.morning += 1,
            DayPeriod::Afternoon => self.afternoon += 1,
            DayPeriod::Evening => self.evening += 1,
            DayPeriod::Night => self.night += 1,
        }
    }

    pub fn get(&self, period: DayPeriod) -> usize {
        match period {
            DayPeriod::Morning => self.morning,
            DayPeriod::Afternoon => self.afternoon,
            DayPeriod::Evening => self.evening,
            DayPeriod::Night => self.night,
        }
    }

    /// Busiest period; earlier periods win ties
    pub fn peak(&self) -> DayPeriod {
        let order = [
            DayPeriod::Morning,
            DayPeriod::Afternoon,
            DayPeriod::Evening,
            DayPeriod::Night,
        ];
        let mut best = DayPeriod::Morning;
        for period in order {
            if self.get(period) > self.get(best) {
                best = period;
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

/// Aggregate view over recent classified records.
///
/// Demo results are counted in `fallback_count` but kept out of every
/// average, since their breakdown is a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInsights {
    pub sample_size: usize,
    pub fallback_count: usize,
    pub emotion_averages: EmotionAverages,
    pub primary_emotion: EmotionKind,
    pub time_of_day: TimeOfDayCounts,
    pub peak_period: DayPeriod,
    pub average_confidence: f64,
    pub average_duration_secs: f64,
    pub last_seven_days: Vec<DayCount>,
}

impl HistoryInsights {
    /// Compute insights from records ordered newest first.
    ///
    /// Hours and weekdays are evaluated in the time zone of `now`.
    /// Returns `None` when there is no classified record to learn from.
    pub fn compute<Tz: TimeZone>(records: &[AnalysisRecord], now: DateTime<Tz>) -> Option<Self> {
        let tz = now.timezone();
        let window = &records[..records.len().min(INSIGHT_WINDOW)];
        let fallback_count = window.iter().filter(|r| r.is_fallback()).count();
        let classified: Vec<&AnalysisRecord> = window.iter().filter(|r| !r.is_fallback()).collect();

        if classified.is_empty() {
            return None;
        }

        let n = classified.len() as f64;
        let vectors: Vec<EmotionVector> = classified.iter().map(|r| r.emotions()).collect();
        let emotion_averages = EmotionAverages::from_vectors(&vectors);

        let mut primary_emotion = EmotionKind::Hungry;
        for kind in EmotionKind::ALL {
            if emotion_averages.get(kind) > emotion_averages.get(primary_emotion) {
                primary_emotion = kind;
            }
        }

        let mut time_of_day = TimeOfDayCounts::default();
        for record in &classified {
            let local = record.timestamp().with_timezone(&tz);
            time_of_day.bump(DayPeriod::from_hour(local.hour()));
        }

        let week_start = now.clone() - ChronoDuration::days(7);
        let mut per_day = [0usize; 7];
        for record in &classified {
            let local = record.timestamp().with_timezone(&tz);
            if local > week_start && local <= now {
                per_day[local.weekday().num_days_from_monday() as usize] += 1;
            }
        }
        let last_seven_days = WEEK
            .iter()
            .map(|day| DayCount {
                day: weekday_name(*day).to_string(),
                count: per_day[day.num_days_from_monday() as usize],
            })
            .collect();

        Some(Self {
            sample_size: classified.len(),
            fallback_count,
            emotion_averages,
            primary_emotion,
            peak_period: time_of_day.peak(),
            time_of_day,
            average_confidence: classified.iter().map(|r| r.confidence()).sum::<f64>() / n,
            average_duration_secs: classified.iter().map(|r| r.duration_seconds()).sum::<f64>()
                / n,
            last_seven_days,
        })
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{ClassificationResult, Locale};
    use chrono::Utc;

    fn classified(label: &str, confidence: f64, secs: f64, ts: DateTime<Utc>) -> AnalysisRecord {
        let result = ClassificationResult::new(label, confidence, "t").unwrap();
        AnalysisRecord::classified(&result, secs, Locale::En).with_timestamp(ts)
    }

    #[test]
    fn day_periods() {
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(20), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(21), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(3), DayPeriod::Night);
    }

    #[test]
    fn no_classified_records_yields_none() {
        let now = Utc::now();
        assert!(HistoryInsights::compute(&[], now).is_none());

        let demo = [AnalysisRecord::fallback("offline", 1.0, Locale::En)];
        assert!(HistoryInsights::compute(&demo, now).is_none());
    }

    #[test]
    fn aggregates_classified_records() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 22, 0, 0).unwrap();
        let records = vec![
            classified("hunger", 0.9, 10.0, Utc.with_ymd_and_hms(2024, 5, 15, 19, 0, 0).unwrap()),
            classified("hunger", 0.8, 20.0, Utc.with_ymd_and_hms(2024, 5, 14, 18, 30, 0).unwrap()),
            AnalysisRecord::fallback("offline", 5.0, Locale::En),
            classified("tired", 0.7, 30.0, Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap()),
        ];

        let insights = HistoryInsights::compute(&records, now).unwrap();

        assert_eq!(insights.sample_size, 3);
        assert_eq!(insights.fallback_count, 1);
        assert_eq!(insights.primary_emotion, EmotionKind::Hungry);
        assert!((insights.emotion_averages.hungry - (75.0 + 75.0 + 10.0) / 3.0).abs() < 1e-9);
        assert_eq!(insights.time_of_day.evening, 2);
        assert_eq!(insights.time_of_day.morning, 1);
        assert_eq!(insights.peak_period, DayPeriod::Evening);
        assert!((insights.average_confidence - 0.8).abs() < 1e-9);
        assert!((insights.average_duration_secs - 20.0).abs() < 1e-9);

        let counts: Vec<usize> = insights.last_seven_days.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(insights.last_seven_days[0].day, "Mon");
    }

    #[test]
    fn only_recent_window_is_considered() {
        let now = Utc::now();
        let mut records = Vec::new();
        for _ in 0..INSIGHT_WINDOW {
            records.push(classified("tired", 0.5, 1.0, now));
        }
        for _ in 0..10 {
            records.push(classified("hunger", 0.5, 1.0, now));
        }

        let insights = HistoryInsights::compute(&records, now).unwrap();
        assert_eq!(insights.sample_size, INSIGHT_WINDOW);
        assert_eq!(insights.primary_emotion, EmotionKind::Tired);
    }
}
