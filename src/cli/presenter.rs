//! CLI presenter for output formatting

use std::time::Duration as StdDuration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::identification::MatchResult;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message, replacing any running one
    pub fn start_spinner(&mut self, message: &str) {
        self.stop_spinner();

        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(StdDuration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Finish the spinner with a success mark, or print the message if none is running
    pub fn spinner_success(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✓".green(), message)),
            None => self.success(message),
        }
    }

    pub fn spinner_fail(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(format!("{} {}", "✗".red(), message)),
            None => self.error(message),
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

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Recording progress bar, e.g. `[██████░░░░] 3s / 10s`
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: u64) -> String {
        let elapsed_ms = elapsed_ms.min(total_ms);
        let percent = if total_ms > 0 {
            elapsed_ms as f64 / total_ms as f64
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = (percent * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>2}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_ms / 1000,
            total_ms / 1000
        )
    }

    pub fn update_recording_progress(&self, elapsed_ms: u64, total_ms: u64) {
        let progress = self.format_progress(elapsed_ms, total_ms);
        self.update_spinner(&format!("Listening... {}  (Enter to stop)", progress));
    }

    /// Song title on stdout, match details on stderr
    pub fn show_match(&self, result: &MatchResult) {
        self.output(result.song_label());
        eprintln!("  {} {}", "confidence:".dimmed(), format_confidence(result.confidence()));
        eprintln!("  {} {}", "offset:".dimmed(), format_offset(result.offset_seconds()));
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// `42 matches`
pub fn format_confidence(confidence: u64) -> String {
    if confidence == 1 {
        "1 match".to_string()
    } else {
        format!("{} matches", confidence)
    }
}

/// `3.5s`
pub fn format_offset(offset_seconds: f64) -> String {
    format!("{}s", offset_seconds)
}
