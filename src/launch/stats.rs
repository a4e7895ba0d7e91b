// Sat Oct 17 2026 - Alex

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::race::{RaceOutcome, RaceStatus};
use crate::window::TournamentWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    AllRegistered,
    Partial,
    NoneRegistered,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::AllRegistered => write!(f, "All registrants registered"),
            Verdict::Partial => write!(f, "Some registrants registered"),
            Verdict::NoneRegistered => write!(f, "No registrant registered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchStats {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub cancelled: usize,
    /// Percentage, 0 to 100.
    pub success_rate: f64,
    pub fastest_seconds: Option<f64>,
    pub mean_seconds: Option<f64>,
    pub verdict: Verdict,
}

impl LaunchStats {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a RaceOutcome>) -> Self {
        let mut total = 0;
        let mut failures = 0;
        let mut cancelled = 0;
        let mut times = Vec::new();

        for outcome in outcomes {
            total += 1;
            match outcome.status {
                RaceStatus::Success | RaceStatus::Ambiguous => times.push(outcome.elapsed_seconds),
                RaceStatus::Failed => failures += 1,
                RaceStatus::Cancelled => cancelled += 1,
            }
        }

        let successes = times.len();
        let success_rate = if total > 0 {
            successes as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let fastest_seconds = times.iter().copied().reduce(f64::min);
        let mean_seconds = if successes > 0 {
            Some(times.iter().sum::<f64>() / successes as f64)
        } else {
            None
        };
        let verdict = if total > 0 && successes == total {
            Verdict::AllRegistered
        } else if successes > 0 {
            Verdict::Partial
        } else {
            Verdict::NoneRegistered
        };

        Self {
            total,
            successes,
            failures,
            cancelled,
            success_rate,
            fastest_seconds,
            mean_seconds,
            verdict,
        }
    }
}

/// Everything a multi-agent run produced, in launch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchReport {
    pub tournament_id: u32,
    pub window: TournamentWindow,
    pub started_at: IndexMap<String, DateTime<Utc>>,
    pub outcomes: IndexMap<String, RaceOutcome>,
    pub stats: LaunchStats,
}

impl LaunchReport {
    pub fn new(
        window: TournamentWindow,
        started_at: IndexMap<String, DateTime<Utc>>,
        outcomes: IndexMap<String, RaceOutcome>,
    ) -> Self {
        let stats = LaunchStats::from_outcomes(outcomes.values());
        Self {
            tournament_id: window.tournament_id,
            window,
            started_at,
            outcomes,
            stats,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.stats.verdict == Verdict::AllRegistered
    }

    /// Gap between the first and last agent start, in milliseconds.
    pub fn start_spread_ms(&self) -> Option<i64> {
        let first = self.started_at.values().min()?;
        let last = self.started_at.values().max()?;
        Some((*last - *first).num_milliseconds())
    }
}
