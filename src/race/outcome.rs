// Sat Oct 17 2026 - Alex

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::EXIT_CANCELLED;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Success,
    Failed,
    /// Tentative success that needs a human to check the saved body.
    Ambiguous,
    Cancelled,
}

impl RaceStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            RaceStatus::Success | RaceStatus::Ambiguous => EXIT_SUCCESS,
            RaceStatus::Failed => EXIT_FAILED,
            RaceStatus::Cancelled => EXIT_CANCELLED,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RaceStatus::Success => "success",
            RaceStatus::Failed => "failed",
            RaceStatus::Ambiguous => "ambiguous",
            RaceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal result for one registrant. Built once by its producer and then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub registrant_id: String,
    pub status: RaceStatus,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<PathBuf>,
    /// Set when the outcome was read from a child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl RaceOutcome {
    pub fn new(registrant_id: impl Into<String>, status: RaceStatus, elapsed_seconds: f64) -> Self {
        Self {
            registrant_id: registrant_id.into(),
            status,
            elapsed_seconds,
            http_status: None,
            attempts: 0,
            diagnostic: None,
            exit_code: None,
        }
    }

    pub fn cancelled(registrant_id: impl Into<String>, elapsed_seconds: f64, attempts: u32) -> Self {
        Self::new(registrant_id, RaceStatus::Cancelled, elapsed_seconds).with_attempts(attempts)
    }

    /// Coordinator view of a finished child: only the exit code crosses the process boundary.
    pub fn from_exit_code(registrant_id: impl Into<String>, code: i32, elapsed_seconds: f64) -> Self {
        let status = if code == EXIT_SUCCESS {
            RaceStatus::Success
        } else {
            RaceStatus::Failed
        };
        let mut outcome = Self::new(registrant_id, status, elapsed_seconds);
        outcome.exit_code = Some(code);
        outcome
    }

    pub fn with_http_status(mut self, status: Option<u16>) -> Self {
        self.http_status = status;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_diagnostic(mut self, path: Option<PathBuf>) -> Self {
        self.diagnostic = path;
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.unwrap_or_else(|| self.status.exit_code())
    }

    pub fn is_success(&self) -> bool {
        self.status == RaceStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(RaceStatus::Success.exit_code(), 0);
        assert_eq!(RaceStatus::Ambiguous.exit_code(), 0);
        assert_eq!(RaceStatus::Failed.exit_code(), 1);
        assert_eq!(RaceStatus::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_from_exit_code() {
        let ok = RaceOutcome::from_exit_code("alice", 0, 1.5);
        assert_eq!(ok.status, RaceStatus::Success);
        assert_eq!(ok.exit_code(), 0);

        let crashed = RaceOutcome::from_exit_code("bob", 101, 0.2);
        assert_eq!(crashed.status, RaceStatus::Failed);
        assert_eq!(crashed.exit_code(), 101);
    }

    #[test]
    fn test_serializes_snake_case_status() {
        let outcome = RaceOutcome::new("alice", RaceStatus::Ambiguous, 0.25).with_http_status(Some(200));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ambiguous");
        assert_eq!(json["http_status"], 200);
        assert!(json.get("diagnostic").is_none());
    }
}
