//! Output control for user-facing progress messages
//!
//! Progress and diagnostics go to stderr so that stdout only ever carries the
//! push summary.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct OutputManager {
    pub verbose: bool,
    quiet: bool,
    start_time: Option<Instant>,
}

impl OutputManager {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn error(&self, message: &str) {
        self.print_with_timestamp("ERROR", message, "❌");
    }

    pub fn section(&self, title: &str) {
        if self.quiet || !self.verbose {
            return;
        }
        let separator = "━".repeat(60);
        eprintln!("\n{}", separator);
        eprintln!("📋 {}", title);
        eprintln!("{}", separator);
    }

    pub fn step(&self, step: &str) {
        if self.verbose && !self.quiet {
            eprintln!("    🔸 {}", step);
        }
    }

    pub fn detail(&self, detail: &str) {
        if self.verbose && !self.quiet {
            eprintln!("      📝 {}", detail);
        }
    }

    fn print_with_timestamp(&self, level: &str, message: &str, emoji: &str) {
        if self.verbose {
            let timestamp = self
                .start_time
                .map(|start| format!("[{:8.3}s]", start.elapsed().as_secs_f64()))
                .unwrap_or_default();
            eprintln!("{} {} {} {}", timestamp, emoji, level, message);
        } else {
            eprintln!("{} {}", emoji, message);
        }
    }

    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else if secs < 3600 {
            format!("{}m{:02}s", secs / 60, secs % 60)
        } else {
            format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }

    pub fn elapsed_time(&self) -> String {
        self.start_time
            .map(|start| self.format_duration(start.elapsed()))
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
