// Sat Oct 17 2026 - Alex

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Longest uninterrupted sleep; cancellation is noticed within this bound.
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares the flag with an existing one, e.g. the Ctrl+C handler's.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Sleeps until `deadline` in slices. Returns `false` if cancelled first.
pub fn sleep_until(clock: &dyn Clock, deadline: DateTime<Utc>, cancel: &CancelToken) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let remaining = match (deadline - clock.now()).to_std() {
            Ok(d) if !d.is_zero() => d,
            _ => return true,
        };
        clock.sleep(remaining.min(SLEEP_SLICE));
    }
}

pub fn sleep_for(clock: &dyn Clock, duration: Duration, cancel: &CancelToken) -> bool {
    let deadline = clock.now() + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
    sleep_until(clock, deadline, cancel)
}

pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0
}
