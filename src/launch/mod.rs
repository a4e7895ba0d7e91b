// Sat Oct 17 2026 - Alex

pub mod coordinator;
pub mod process;
pub mod stats;

pub use coordinator::{AgentProcess, LaunchCoordinator};
pub use process::{AgentCommand, AgentHandle, AgentLauncher, ChildHandle, ProcessLauncher};
pub use stats::{LaunchReport, LaunchStats, Verdict};

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::ConfigError;
use crate::tournament::TournamentError;
use crate::window::WindowError;

fn describe_invalid(invalid: &IndexMap<String, Vec<String>>) -> String {
    invalid
        .iter()
        .map(|(name, problems)| format!("{} ({})", name, problems.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Invalid registrants: {}", describe_invalid(.0))]
    InvalidRegistrants(IndexMap<String, Vec<String>>),
    #[error("Invalid launch configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Tournament(#[from] TournamentError),
    #[error("Could not start agent for {0}: {1}")]
    Spawn(String, std::io::Error),
    #[error("Launch cancelled before any agent started")]
    Cancelled,
}

impl LaunchError {
    pub fn invalid_registrants(&self) -> Vec<&str> {
        match self {
            LaunchError::InvalidRegistrants(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}
