//! CLI presenter for output formatting

use std::io::{self, Write};

use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::domain::analysis::{AnalysisRecord, EmotionKind};
use crate::domain::history::{DayPeriod, HistoryInsights};

/// Width of emotion and progress bars in cells
const BAR_WIDTH: usize = 20;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Shared handle to the active spinner, for updates from callbacks
    pub fn spinner_handle(&self) -> ProgressBar {
        self.spinner.clone().unwrap_or_else(ProgressBar::hidden)
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a value as pretty JSON on stdout
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => {
                println!("{}", text);
                let _ = io::stdout().flush();
            }
            Err(e) => self.error(&format!("Failed to encode JSON: {}", e)),
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Format recording progress bar
    pub fn format_progress(elapsed_ms: u64, total_ms: u64) -> String {
        let elapsed_secs = elapsed_ms / 1000;
        let total_secs = total_ms / 1000;
        let percent = if total_ms > 0 {
            (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let filled = ((percent / 100.0) * BAR_WIDTH as f64) as usize;
        let empty = BAR_WIDTH - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_secs,
            total_secs
        )
    }

    /// One emotion line: name, bar and percentage
    pub fn format_emotion_bar(kind: EmotionKind, percent: f64) -> String {
        let clamped = percent.clamp(0.0, 100.0);
        let filled = ((clamped / 100.0) * BAR_WIDTH as f64).round() as usize;
        let empty = BAR_WIDTH - filled;

        format!(
            "  {:<16} {}{} {:>3.0}%",
            kind.display_name(),
            "█".repeat(filled).magenta(),
            "░".repeat(empty),
            clamped
        )
    }

    /// Print one analysis to stdout
    pub fn analysis(&self, record: &AnalysisRecord) {
        let emotions = record.emotions();

        if record.is_fallback() {
            println!("{}", " DEMO RESULT ".black().on_yellow().bold());
            if let Some(reason) = record.fallback_reason() {
                println!("{}", format!("Could not analyze the recording: {}", reason).yellow());
            }
        } else {
            let label = record.raw_label().unwrap_or("unknown");
            println!(
                "{} {} {}",
                "Most likely:".bold(),
                emotions.dominant().display_name().cyan().bold(),
                format!("({})", label).dimmed()
            );
        }

        println!();
        for (kind, value) in emotions.entries() {
            println!("{}", Self::format_emotion_bar(kind, f64::from(value)));
        }
        println!();

        println!(
            "{} {:.0}%   {} {:.1}s",
            "Confidence:".bold(),
            record.confidence() * 100.0,
            "Length:".bold(),
            record.duration_seconds()
        );
        println!("{} {}", "→".green(), record.recommendation());
    }

    /// Print history entries, newest first
    pub fn history(&self, records: &[AnalysisRecord]) {
        if records.is_empty() {
            self.info("No analyses recorded yet");
            return;
        }

        for record in records {
            let when = record.timestamp().with_timezone(&Local);
            let mut line = format!(
                "{}  {:<16} {:>4.0}%  {:>5.1}s",
                when.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                record.emotions().dominant().display_name(),
                record.confidence() * 100.0,
                record.duration_seconds()
            );
            if record.is_fallback() {
                line.push_str(&format!("  {}", "demo".yellow()));
            }
            println!("{}", line);
        }
    }

    /// Print insights
    pub fn insights(&self, insights: &HistoryInsights) {
        let mut summary = format!("Based on {} analyses", insights.sample_size);
        if insights.fallback_count > 0 {
            summary.push_str(&format!(
                " ({} demo results left out)",
                insights.fallback_count
            ));
        }
        println!("{}", summary.bold());
        println!();

        println!(
            "{} {}",
            "Most common need:".bold(),
            insights.primary_emotion.display_name().cyan().bold()
        );
        for kind in EmotionKind::ALL {
            println!(
                "{}",
                Self::format_emotion_bar(kind, insights.emotion_averages.get(kind))
            );
        }
        println!();

        let periods = [
            DayPeriod::Morning,
            DayPeriod::Afternoon,
            DayPeriod::Evening,
            DayPeriod::Night,
        ];
        let by_period: Vec<String> = periods
            .iter()
            .map(|p| format!("{} {}", p.as_str(), insights.time_of_day.get(*p)))
            .collect();
        println!(
            "{} {}  ({})",
            "Cries most often in the:".bold(),
            insights.peak_period.as_str(),
            by_period.join(", ")
        );

        let week: Vec<String> = insights
            .last_seven_days
            .iter()
            .map(|d| format!("{} {}", d.day, d.count))
            .collect();
        println!("{} {}", "Last 7 days:".bold(), week.join("  "));

        println!(
            "{} {:.0}%   {} {:.1}s",
            "Average confidence:".bold(),
            insights.average_confidence * 100.0,
            "Average length:".bold(),
            insights.average_duration_secs
        );
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_progress_at_start() {
        let progress = Presenter::format_progress(0, 10000);
        assert!(progress.contains("0s / 10s"));
    }

    #[test]
    fn format_progress_at_half() {
        let progress = Presenter::format_progress(5000, 10000);
        assert!(progress.contains("5s / 10s"));
    }

    #[test]
    fn format_progress_past_end_is_capped() {
        let progress = Presenter::format_progress(12000, 10000);
        assert!(progress.contains("12s / 10s"));
        assert!(!progress.contains('░'));
    }

    #[test]
    fn emotion_bar_shows_percentage() {
        colored::control::set_override(false);
        let line = Presenter::format_emotion_bar(EmotionKind::Hungry, 75.0);
        assert!(line.contains("Hungry"));
        assert!(line.contains("75%"));
        assert_eq!(line.matches('█').count(), 15);
    }

    #[test]
    fn emotion_bar_clamps_out_of_range() {
        let line = Presenter::format_emotion_bar(EmotionKind::Tired, 140.0);
        assert!(line.contains("100%"));
        assert_eq!(line.matches('░').count(), 0);
    }

    #[test]
    fn spinner_handle_without_spinner_is_hidden() {
        let presenter = Presenter::new();
        assert!(presenter.spinner_handle().is_hidden());
    }
}
