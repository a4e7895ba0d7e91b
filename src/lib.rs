// Sat Oct 17 2026 - Alex

pub mod browser;
pub mod config;
pub mod launch;
pub mod net;
pub mod output;
pub mod profile;
pub mod race;
pub mod tournament;
pub mod ui;
pub mod utils;
pub mod window;

pub use config::{BotSettings, ProjectPaths};
pub use launch::{LaunchCoordinator, LaunchReport};
pub use race::{RaceAgent, RaceOutcome, RaceStatus, Strategy};
pub use window::{TournamentWindow, WindowCalculator};
