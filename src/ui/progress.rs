// Sat Oct 17 2026 - Alex

use std::io::IsTerminal;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::race::clock::{sleep_until, CancelToken, Clock, SLEEP_SLICE};
use crate::utils::format_countdown;

/// Spinner that counts down to a target instant. Hidden when stderr is not a terminal.
pub struct Countdown {
    bar: ProgressBar,
    label: String,
}

impl Countdown {
    pub fn new(label: &str) -> Self {
        Self::with_visibility(label, std::io::stderr().is_terminal())
    }

    pub fn with_visibility(label: &str, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            label: label.to_string(),
        }
    }

    pub fn update(&self, remaining_seconds: f64) {
        self.bar
            .set_message(format!("{} in {}", self.label, format_countdown(remaining_seconds)));
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Sleeps until `target`, refreshing the message. Returns `false` if cancelled.
    pub fn wait_until(&self, clock: &dyn Clock, target: DateTime<Utc>, cancel: &CancelToken) -> bool {
        loop {
            let now = clock.now();
            let remaining = (target - now).num_milliseconds() as f64 / 1000.0;
            self.update(remaining);
            if remaining <= 0.0 {
                return true;
            }
            let step = now + chrono::Duration::from_std(SLEEP_SLICE * 10).unwrap_or_else(|_| chrono::Duration::seconds(1));
            if !sleep_until(clock, step.min(target), cancel) {
                return false;
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
