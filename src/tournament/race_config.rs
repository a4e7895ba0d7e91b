// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::TournamentError;
use crate::race::Strategy;
use crate::window::{TournamentWindow, WindowCalculator, WindowError, MAX_LEAD_TIME_SECONDS};

pub const MAX_SYNC_WAIT_SECONDS: u64 = 3_600;
pub const MAX_DELAY_BETWEEN_BOTS_MS: u64 = 60_000;

fn default_registration_time() -> String {
    "12:00:00".to_string()
}

fn default_check_start_offset() -> i64 {
    5
}

fn default_delay_between_bots_ms() -> u64 {
    50
}

fn default_max_sync_wait_seconds() -> u64 {
    30
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, TournamentError> {
    if !path.exists() {
        return Err(TournamentError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|e| TournamentError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&raw).map_err(|e| TournamentError::Json(path.to_path_buf(), e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TournamentError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TournamentError::Io(parent.to_path_buf(), e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| TournamentError::Json(path.to_path_buf(), e))?;
    fs::write(path, json).map_err(|e| TournamentError::Io(path.to_path_buf(), e))
}

/// Single-agent race configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRaceConfig {
    pub tournament_id: u32,
    pub registration_date: String,
    #[serde(default = "default_registration_time")]
    pub registration_time: String,
    #[serde(default = "default_check_start_offset")]
    pub check_start_offset: i64,
}

impl TournamentRaceConfig {
    pub fn new(tournament_id: u32, registration_date: impl Into<String>) -> Self {
        Self {
            tournament_id,
            registration_date: registration_date.into(),
            registration_time: default_registration_time(),
            check_start_offset: default_check_start_offset(),
        }
    }

    pub fn with_registration_time(mut self, time: impl Into<String>) -> Self {
        self.registration_time = time.into();
        self
    }

    pub fn with_check_start_offset(mut self, seconds: i64) -> Self {
        self.check_start_offset = seconds;
        self
    }

    pub fn load(path: &Path) -> Result<Self, TournamentError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), TournamentError> {
        write_json(path, self)
    }

    pub fn default_file_name(tournament_id: u32) -> String {
        format!("tournament_{}.json", tournament_id)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tournament_id == 0 {
            errors.push("tournament_id is missing".to_string());
        }
        if self.registration_date.trim().is_empty() {
            errors.push("registration_date is missing".to_string());
        }
        if !(0..=MAX_LEAD_TIME_SECONDS).contains(&self.check_start_offset) {
            errors.push(format!("check_start_offset must be in [0, {}]", MAX_LEAD_TIME_SECONDS));
        }
        errors
    }

    pub fn window(&self, calculator: &WindowCalculator) -> Result<TournamentWindow, WindowError> {
        calculator
            .with_lead_time(self.check_start_offset)
            .from_registration(self.tournament_id, &self.registration_date, &self.registration_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    pub config_file: PathBuf,
    #[serde(default)]
    pub bot_type: Strategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSettings {
    #[serde(default = "default_delay_between_bots_ms")]
    pub delay_between_bots_ms: u64,
    #[serde(default = "default_max_sync_wait_seconds")]
    pub max_sync_wait_seconds: u64,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            delay_between_bots_ms: default_delay_between_bots_ms(),
            max_sync_wait_seconds: default_max_sync_wait_seconds(),
        }
    }
}

/// Player names become part of temporary file names, so they stay within `[A-Za-z0-9._-]`.
pub fn is_valid_player_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Multi-agent race configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRaceConfig {
    pub tournament_id: u32,
    pub registration_date: String,
    #[serde(default = "default_registration_time")]
    pub registration_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub players: Vec<PlayerEntry>,
    #[serde(default)]
    pub launch_settings: LaunchSettings,
}

impl MultiRaceConfig {
    pub fn new(tournament_id: u32, registration_date: impl Into<String>, players: Vec<PlayerEntry>) -> Self {
        Self {
            tournament_id,
            registration_date: registration_date.into(),
            registration_time: default_registration_time(),
            mode: Some("multi".to_string()),
            players,
            launch_settings: LaunchSettings::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TournamentError> {
        let config: Self = read_json(path)?;
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(TournamentError::Invalid(errors.join("; ")));
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), TournamentError> {
        write_json(path, self)
    }

    pub fn default_file_name(tournament_id: u32) -> String {
        format!("tournament_{}_multi.json", tournament_id)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tournament_id == 0 {
            errors.push("tournament_id is missing".to_string());
        }
        if self.registration_date.trim().is_empty() {
            errors.push("registration_date is missing".to_string());
        }
        if self.players.is_empty() {
            errors.push("no players configured".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for player in &self.players {
            if player.name.trim().is_empty() {
                errors.push("player with empty name".to_string());
            } else if !is_valid_player_name(&player.name) {
                errors.push(format!(
                    "player name {:?} may only contain letters, digits, '-', '_' and '.'",
                    player.name
                ));
            } else if !seen.insert(player.name.as_str()) {
                errors.push(format!("duplicate player name: {}", player.name));
            }
        }
        let launch = &self.launch_settings;
        if launch.max_sync_wait_seconds > MAX_SYNC_WAIT_SECONDS {
            errors.push(format!("max_sync_wait_seconds must be <= {}", MAX_SYNC_WAIT_SECONDS));
        }
        if launch.delay_between_bots_ms > MAX_DELAY_BETWEEN_BOTS_MS {
            errors.push(format!("delay_between_bots_ms must be <= {}", MAX_DELAY_BETWEEN_BOTS_MS));
        }
        errors
    }

    /// The config each spawned agent receives; every agent sees the same instant.
    pub fn agent_config(&self, check_start_offset: i64) -> TournamentRaceConfig {
        TournamentRaceConfig::new(self.tournament_id, self.registration_date.clone())
            .with_registration_time(self.registration_time.clone())
            .with_check_start_offset(check_start_offset)
    }

    pub fn window(&self, calculator: &WindowCalculator) -> Result<TournamentWindow, WindowError> {
        calculator.from_registration(self.tournament_id, &self.registration_date, &self.registration_time)
    }
}
