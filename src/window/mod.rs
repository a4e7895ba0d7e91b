// Sat Oct 17 2026 - Alex

pub mod calculator;
pub mod dates;

pub use calculator::{is_world_cup, TournamentWindow, WindowCalculator, DEFAULT_LEAD_TIME_SECONDS, MAX_LEAD_TIME_SECONDS};
pub use dates::{format_date, parse_date, parse_time};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Unparseable date: {0:?}")]
    InvalidDate(String),
    #[error("Unparseable time: {0:?}")]
    InvalidTime(String),
    #[error("Local time {0} does not exist in {1}")]
    NonexistentLocalTime(String, String),
    #[error("Lead time must not be negative (got {0}s)")]
    NegativeLeadTime(i64),
    #[error("Lead time of {0}s exceeds the {1}s maximum")]
    LeadTimeTooLong(i64, i64),
}
