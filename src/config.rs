// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::MAX_LEAD_TIME_SECONDS;

pub const REGISTRATION_HOST: &str = "https://files.umb-carom.org";
pub const REGISTRATION_PATH: &str = "/public/PlayerModify.aspx";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousPolicy {
    AssumeSuccess,
    TreatAsFailed,
}

impl Default for AmbiguousPolicy {
    fn default() -> Self {
        AmbiguousPolicy::AssumeSuccess
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    pub check_interval_normal: f64,
    pub check_interval_critical: f64,
    pub critical_window: f64,
    pub check_start_offset_seconds: i64,
    pub poll_timeout_seconds: f64,
    pub submit_timeout_seconds: f64,
    /// `None` keeps retrying until success or cancellation.
    pub max_submit_attempts: Option<u32>,
    pub retry_pause_ms: u64,
    pub progress_log_every: u64,
    pub reference_timezone: String,
    pub success_markers: Vec<String>,
    pub error_markers: Vec<String>,
    pub ambiguous_policy: AmbiguousPolicy,
    pub webdriver_url: String,
    pub browser_headless: bool,
    pub browser_settle_seconds: f64,
    pub browser_form_timeout_seconds: f64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            check_interval_normal: 0.5,
            check_interval_critical: 0.05,
            critical_window: 10.0,
            check_start_offset_seconds: 5,
            poll_timeout_seconds: 2.0,
            submit_timeout_seconds: 5.0,
            max_submit_attempts: None,
            retry_pause_ms: 100,
            progress_log_every: 100,
            reference_timezone: "Europe/Paris".to_string(),
            success_markers: ["success", "confirm", "registered", "inscrit", "thank", "merci"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            error_markers: ["error", "erreur", "failed", "échec", "invalid", "required"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ambiguous_policy: AmbiguousPolicy::AssumeSuccess,
            webdriver_url: "http://localhost:9515".to_string(),
            browser_headless: true,
            browser_settle_seconds: 3.0,
            browser_form_timeout_seconds: 5.0,
        }
    }
}

#[derive(Deserialize)]
struct WrappedSettings {
    bot: BotSettings,
}

impl BotSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing file means defaults. Both the bare object and the `{"bot": {...}}`
    /// layout written by older tooling are accepted.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No bot settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let settings = if value.get("bot").is_some() {
            serde_json::from_value::<WrappedSettings>(value).map(|w| w.bot)
        } else {
            serde_json::from_value::<BotSettings>(value)
        }
        .map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_intervals(mut self, normal: f64, critical: f64) -> Self {
        self.check_interval_normal = normal;
        self.check_interval_critical = critical;
        self
    }

    pub fn with_max_submit_attempts(mut self, attempts: u32) -> Self {
        self.max_submit_attempts = Some(attempts);
        self
    }

    pub fn with_ambiguous_policy(mut self, policy: AmbiguousPolicy) -> Self {
        self.ambiguous_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_normal <= 0.0 || self.check_interval_critical <= 0.0 {
            return Err(ConfigError::Invalid(
                "check intervals must be greater than 0".to_string(),
            ));
        }
        if self.check_interval_critical > self.check_interval_normal {
            return Err(ConfigError::Invalid(
                "check_interval_critical must not exceed check_interval_normal".to_string(),
            ));
        }
        if self.critical_window < 0.0 {
            return Err(ConfigError::Invalid("critical_window must be >= 0".to_string()));
        }
        if !(0..=MAX_LEAD_TIME_SECONDS).contains(&self.check_start_offset_seconds) {
            return Err(ConfigError::Invalid(format!(
                "check_start_offset_seconds must be in [0, {}]",
                MAX_LEAD_TIME_SECONDS
            )));
        }
        if self.poll_timeout_seconds <= 0.0 || self.poll_timeout_seconds > 3.0 {
            return Err(ConfigError::Invalid(
                "poll_timeout_seconds must be in (0, 3]".to_string(),
            ));
        }
        if self.submit_timeout_seconds <= 0.0 || self.submit_timeout_seconds > 5.0 {
            return Err(ConfigError::Invalid(
                "submit_timeout_seconds must be in (0, 5]".to_string(),
            ));
        }
        if self.max_submit_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_submit_attempts must be at least 1".to_string(),
            ));
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.reference_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone: {}", self.reference_timezone)))
    }

    pub fn normal_interval(&self) -> Duration {
        Duration::from_secs_f64(self.check_interval_normal)
    }

    pub fn critical_interval(&self) -> Duration {
        Duration::from_secs_f64(self.check_interval_critical)
    }

    pub fn critical_window(&self) -> Duration {
        Duration::from_secs_f64(self.critical_window)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.poll_timeout_seconds)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.submit_timeout_seconds)
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

pub fn registration_url(tournament_id: u32) -> String {
    format!("{}{}?tourID={}", REGISTRATION_HOST, REGISTRATION_PATH, tournament_id)
}

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub players_dir: PathBuf,
    pub tournaments_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join("config");
        Self {
            players_dir: config_dir.join("players"),
            tournaments_dir: config_dir.join("tournaments"),
            config_dir,
            data_dir: root.join("data"),
            logs_dir: root.join("logs"),
            diagnostics_dir: root.join("diagnostics"),
            root,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.config_dir,
            &self.players_dir,
            &self.tournaments_dir,
            &self.data_dir,
            &self.logs_dir,
            &self.diagnostics_dir,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn bot_settings_file(&self) -> PathBuf {
        self.config_dir.join("bot_config.json")
    }

    pub fn tournaments_data_file(&self) -> PathBuf {
        self.data_dir.join("umb_tournaments.json")
    }

    pub fn player_file(&self, name: &str) -> PathBuf {
        self.players_dir.join(format!("{}.json", name))
    }

    /// Relative paths are resolved against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
