// Sat Oct 17 2026 - Alex

pub mod race_config;
pub mod record;

pub use race_config::{is_valid_player_name, LaunchSettings, MultiRaceConfig, PlayerEntry, TournamentRaceConfig};
pub use record::{TournamentList, TournamentRecord, TournamentStore};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("Configuration not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Malformed JSON in {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),
    #[error("Invalid race configuration: {0}")]
    Invalid(String),
}
