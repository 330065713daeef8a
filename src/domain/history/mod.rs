//! History domain module

mod insights;
mod log;

pub use insights::{
    DayCount, DayPeriod, EmotionAverages, HistoryInsights, TimeOfDayCounts, INSIGHT_WINDOW,
};
pub use log::{CryHistoryLog, HISTORY_CAPACITY};
