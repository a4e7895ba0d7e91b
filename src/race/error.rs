// Sat Oct 17 2026 - Alex

use thiserror::Error;

use crate::browser::BrowserError;
use crate::config::ConfigError;
use crate::net::NetError;
use crate::profile::ProfileError;
use crate::tournament::TournamentError;
use crate::window::WindowError;

pub const EXIT_CONFIGURATION: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

/// Errors that stop an agent before it can produce an outcome. Poll and
/// submission failures are not errors here; they become outcomes.
#[derive(Error, Debug)]
pub enum RaceError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] WindowError),
    #[error(transparent)]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Tournament(#[from] TournamentError),
    #[error("Network setup failed: {0}")]
    Network(#[from] NetError),
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("Race cancelled")]
    Cancelled,
}

impl RaceError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RaceError::Cancelled => EXIT_CANCELLED,
            _ => EXIT_CONFIGURATION,
        }
    }
}
