// UI layer: everything that touches the terminal. Progress is drawn with
// `indicatif`, text is styled with `crossterm`. The library core never
// calls into this module directly; it only sees the `ProgressSink` trait.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::{style, Color, Stylize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::Config;
use crate::progress::{ProgressSink, SharedSink};
use crate::report::Report;

/// Terminal front end configured from the color toggle and the progress
/// refresh interval.
#[derive(Debug, Clone)]
pub struct Terminal {
    color: bool,
    refresh: Duration,
}

impl Terminal {
    pub fn new(config: &Config) -> Self {
        Terminal {
            color: config.color,
            refresh: config.progress_interval,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Title line printed when a command starts.
    pub fn banner(&self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}\n", self.paint(text, Color::Cyan))?;
        Ok(())
    }

    pub fn info(&self, message: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} {}", self.paint("i", Color::Blue), message)?;
        Ok(())
    }

    pub fn error(&self, message: &str) -> Result<()> {
        let mut err = io::stderr().lock();
        writeln!(err, "{} {}", self.paint("✖", Color::Red), self.paint(message, Color::Red))?;
        Ok(())
    }

    /// Aligned label/value block under a heading.
    pub fn details(&self, heading: &str, rows: &[(String, String)]) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.paint(heading, Color::Cyan))?;
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in rows {
            let label = format!("{label}:");
            writeln!(
                out,
                "  {} {}",
                self.paint(&format!("{label:<w$}", w = width + 1), Color::Grey),
                value
            )?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Render the final report. Failures go to stderr.
    pub fn render(&self, report: &Report) -> Result<()> {
        if !report.success {
            self.error(&report.headline)?;
            if let Some(hint) = &report.hint {
                self.info(hint)?;
            }
            return Ok(());
        }

        self.details(&report.headline, &report.details)?;
        let mut out = io::stdout().lock();
        for note in &report.notes {
            if note.starts_with("  ") {
                writeln!(out, "{}", self.paint(note, Color::Yellow))?;
            } else {
                writeln!(out, "{note}")?;
            }
        }
        Ok(())
    }

    /// Progress sink drawing to stderr: a bar when the size is known, a
    /// spinner otherwise.
    pub fn progress(&self, label: &str) -> SharedSink {
        Arc::new(TerminalSink::new(label, self.color, self.refresh))
    }
}

/// `ProgressSink` backed by an `indicatif` bar. Draws are rate limited by
/// indicatif so a slow terminal never holds up the transfer.
pub struct TerminalSink {
    bar: ProgressBar,
    label: String,
    color: bool,
    tick: Duration,
    started: AtomicBool,
}

impl TerminalSink {
    pub fn new(label: &str, color: bool, refresh: Duration) -> Self {
        let hz = (1000 / refresh.as_millis().max(1)).clamp(1, 60) as u8;
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(hz));
        TerminalSink {
            bar,
            label: label.to_string(),
            color,
            tick: refresh,
            started: AtomicBool::new(false),
        }
    }

    fn bar_style(&self) -> ProgressStyle {
        let template = if self.color {
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})"
        } else {
            "{msg} [{bar:40}] {bytes}/{total_bytes} ({eta})"
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    fn spinner_style(&self) -> ProgressStyle {
        let template = if self.color {
            "{spinner:.green} {msg} {bytes} ({bytes_per_sec})"
        } else {
            "{spinner} {msg} {bytes} ({bytes_per_sec})"
        };
        ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl ProgressSink for TerminalSink {
    fn on_start(&self, total: Option<u64>) {
        self.started.store(true, Ordering::Relaxed);
        self.bar.set_message(self.label.clone());
        match total {
            Some(total) => {
                self.bar.set_length(total);
                self.bar.set_style(self.bar_style());
            }
            None => {
                self.bar.set_style(self.spinner_style());
                self.bar.enable_steady_tick(self.tick);
            }
        }
    }

    fn on_progress(&self, transferred: u64) {
        self.bar.set_position(transferred);
    }

    fn on_complete(&self) {
        self.bar.finish_with_message(format!("{} - done", self.label));
    }

    fn on_failure(&self, _reason: &str) {
        if self.started.load(Ordering::Relaxed) {
            self.bar.abandon_with_message(format!("{} - failed", self.label));
        } else {
            self.bar.finish_and_clear();
        }
    }
}
