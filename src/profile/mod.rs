// Sat Oct 17 2026 - Alex

pub mod directory;
pub mod registrant;

pub use directory::{PlayerDirectory, PlayerSummary};
pub use registrant::{FieldKind, RegistrantProfile, REQUIRED_FIELDS};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Player file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Malformed player file {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),
    #[error("No player_data section in {0}")]
    MissingPlayerData(PathBuf),
    #[error("Missing required fields in {path}: {fields:?}")]
    MissingFields { path: PathBuf, fields: Vec<String> },
    #[error("{0}")]
    Invalid(String),
}
