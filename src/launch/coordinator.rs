// Sat Oct 17 2026 - Alex

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, error, info, warn};

use super::process::{AgentCommand, AgentHandle, AgentLauncher};
use super::stats::LaunchReport;
use super::LaunchError;
use crate::config::{BotSettings, ProjectPaths};
use crate::profile::RegistrantProfile;
use crate::race::clock::{seconds_between, sleep_for, sleep_until, CancelToken, Clock, SystemClock};
use crate::race::RaceOutcome;
use crate::tournament::{MultiRaceConfig, PlayerEntry};
use crate::window::{TournamentWindow, WindowCalculator};

pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_millis(500);

pub struct AgentProcess {
    pub registrant_id: String,
    pub handle: Box<dyn AgentHandle>,
    pub scheduled_start_offset_ms: u64,
    pub started_at: DateTime<Utc>,
    pub outcome: Option<RaceOutcome>,
}

/// Runs one agent process per registrant against a shared window and gathers the results.
pub struct LaunchCoordinator {
    paths: ProjectPaths,
    settings: BotSettings,
    settings_file: Option<PathBuf>,
    launcher: Arc<dyn AgentLauncher>,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    liveness_interval: Duration,
    wait_for_window: bool,
    agents: Vec<AgentProcess>,
    temp_files: Vec<PathBuf>,
    tournament_id: Option<u32>,
}

impl LaunchCoordinator {
    pub fn new(paths: ProjectPaths, settings: BotSettings, launcher: Arc<dyn AgentLauncher>) -> Self {
        Self {
            paths,
            settings,
            settings_file: None,
            launcher,
            clock: Arc::new(SystemClock),
            cancel: CancelToken::new(),
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            wait_for_window: true,
            agents: Vec::new(),
            temp_files: Vec::new(),
            tournament_id: None,
        }
    }

    /// Forwarded to every child as `--settings`.
    pub fn with_settings_file(mut self, path: PathBuf) -> Self {
        self.settings_file = Some(path);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    /// Launch immediately instead of waiting for the pre-opening sync point.
    pub fn launch_now(mut self) -> Self {
        self.wait_for_window = false;
        self
    }

    /// Checks every registrant before anything is started. Returns names with their problems.
    pub fn validate_registrants(&self, players: &[PlayerEntry]) -> IndexMap<String, Vec<String>> {
        let mut invalid = IndexMap::new();
        for player in players {
            let path = self.paths.resolve(&player.config_file);
            if let Err(e) = RegistrantProfile::load(&path) {
                invalid.insert(player.name.clone(), vec![e.to_string()]);
            }
        }
        invalid
    }

    /// Always a direct child of the config dir, whatever the player name holds.
    pub fn temp_config_path(&self, tournament_id: u32, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.paths
            .config_dir
            .join(format!("temp_tournament_{}_{}.json", tournament_id, safe))
    }

    pub fn launch_all(&mut self, config: &MultiRaceConfig) -> Result<LaunchReport, LaunchError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(LaunchError::Configuration(problems.join("; ")));
        }
        let invalid = self.validate_registrants(&config.players);
        if !invalid.is_empty() {
            for (name, errors) in &invalid {
                error!("Registrant {} is invalid: {}", name, errors.join(", "));
            }
            return Err(LaunchError::InvalidRegistrants(invalid));
        }

        let calculator = WindowCalculator::new(self.settings.timezone()?);
        let window = config.window(&calculator)?;
        self.tournament_id = Some(config.tournament_id);

        info!(
            "Launching {} agents for tournament {} (opens {})",
            config.players.len(),
            config.tournament_id,
            window.opens_at_in(calculator.timezone()).format("%d-%m-%Y %H:%M:%S %Z")
        );
        for (i, player) in config.players.iter().enumerate() {
            info!("  {}. {} ({})", i + 1, player.name, player.bot_type);
        }

        if !self.wait_until_sync_point(&window, config.launch_settings.max_sync_wait_seconds)? {
            self.cleanup();
            return Err(LaunchError::Cancelled);
        }

        let result = self.start_and_watch(config, window);
        self.cleanup();
        result
    }

    fn wait_until_sync_point(&self, window: &TournamentWindow, max_sync_wait_seconds: u64) -> Result<bool, LaunchError> {
        if !self.wait_for_window {
            return Ok(true);
        }
        let sync_at = i64::try_from(max_sync_wait_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|wait| window.registration_opens_at.checked_sub_signed(wait))
            .ok_or_else(|| {
                LaunchError::Configuration(format!("max_sync_wait_seconds out of range: {}", max_sync_wait_seconds))
            })?;
        let now = self.clock.now();
        if now >= sync_at {
            return Ok(true);
        }
        info!("Waiting {:.1}s before launching agents", seconds_between(now, sync_at));
        Ok(sleep_until(self.clock.as_ref(), sync_at, &self.cancel))
    }

    fn write_agent_configs(&mut self, config: &MultiRaceConfig) -> Result<Vec<PathBuf>, LaunchError> {
        let agent_config = config.agent_config(self.settings.check_start_offset_seconds);
        let mut files = Vec::with_capacity(config.players.len());
        for player in &config.players {
            let path = self.temp_config_path(config.tournament_id, &player.name);
            agent_config.save(&path)?;
            self.temp_files.push(path.clone());
            files.push(path);
        }
        Ok(files)
    }

    fn start_and_watch(&mut self, config: &MultiRaceConfig, window: TournamentWindow) -> Result<LaunchReport, LaunchError> {
        let config_files = self.write_agent_configs(config)?;
        let delay_ms = config.launch_settings.delay_between_bots_ms;
        let base = self.clock.now();

        for (i, (player, config_file)) in config.players.iter().zip(config_files).enumerate() {
            let offset_ms = i as u64 * delay_ms;
            let target = base + chrono::Duration::milliseconds(offset_ms as i64);
            if !sleep_until(self.clock.as_ref(), target, &self.cancel) {
                warn!("Launch cancelled after {} of {} agents", i, config.players.len());
                break;
            }

            let command = AgentCommand {
                registrant_id: player.name.clone(),
                config_file,
                player_file: self.paths.resolve(&player.config_file),
                strategy: player.bot_type,
                root: self.paths.root.clone(),
                settings_file: self.settings_file.clone(),
            };
            let handle = self
                .launcher
                .spawn(&command)
                .map_err(|e| LaunchError::Spawn(player.name.clone(), e))?;
            let started_at = self.clock.now();
            info!(
                "Started {} ({}) at +{}ms{}",
                player.name,
                player.bot_type,
                offset_ms,
                handle.id().map(|pid| format!(", pid {}", pid)).unwrap_or_default()
            );

            self.agents.push(AgentProcess {
                registrant_id: player.name.clone(),
                handle,
                scheduled_start_offset_ms: offset_ms,
                started_at,
                outcome: None,
            });
        }

        self.watch();

        let mut started_at = IndexMap::new();
        let mut outcomes = IndexMap::new();
        for agent in &self.agents {
            started_at.insert(agent.registrant_id.clone(), agent.started_at);
            if let Some(outcome) = &agent.outcome {
                outcomes.insert(agent.registrant_id.clone(), outcome.clone());
            }
        }
        for player in &config.players {
            if !outcomes.contains_key(&player.name) {
                outcomes.insert(player.name.clone(), RaceOutcome::cancelled(&player.name, 0.0, 0));
            }
        }
        Ok(LaunchReport::new(window, started_at, outcomes))
    }

    /// Polls every child until all have exited or the run is cancelled.
    fn watch(&mut self) {
        loop {
            let now = self.clock.now();
            let mut running = 0;

            for agent in self.agents.iter_mut().filter(|a| a.outcome.is_none()) {
                let elapsed = seconds_between(agent.started_at, now);
                match agent.handle.try_wait() {
                    Ok(Some(code)) => {
                        let outcome = RaceOutcome::from_exit_code(&agent.registrant_id, code, elapsed);
                        if outcome.is_success() {
                            info!("{}: success in {:.1}s", agent.registrant_id, elapsed);
                        } else {
                            warn!("{}: failed (exit {}) in {:.1}s", agent.registrant_id, code, elapsed);
                        }
                        agent.outcome = Some(outcome);
                    }
                    Ok(None) => {
                        running += 1;
                        debug!("{}: running ({:.1}s)", agent.registrant_id, elapsed);
                    }
                    Err(e) => {
                        error!("{}: lost track of process: {}", agent.registrant_id, e);
                        agent.handle.terminate();
                        agent.outcome = Some(RaceOutcome::from_exit_code(&agent.registrant_id, -1, elapsed));
                    }
                }
            }

            if running == 0 {
                return;
            }
            if self.cancel.is_cancelled() || !sleep_for(self.clock.as_ref(), self.liveness_interval, &self.cancel) {
                warn!("Cancelled with {} agents still running", running);
                self.stop_running();
                return;
            }
        }
    }

    fn stop_running(&mut self) {
        let now = self.clock.now();
        for agent in self.agents.iter_mut().filter(|a| a.outcome.is_none()) {
            agent.handle.terminate();
            let elapsed = seconds_between(agent.started_at, now);
            agent.outcome = Some(RaceOutcome::cancelled(&agent.registrant_id, elapsed, 0));
        }
    }

    fn remove_temp_files(&mut self) {
        for path in self.temp_files.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                if path.exists() {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }

        let Some(id) = self.tournament_id else {
            return;
        };
        let prefix = format!("temp_tournament_{}_", id);
        let Ok(entries) = fs::read_dir(&self.paths.config_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                let _ = fs::remove_file(entry.path());
            }
        }
    }

    /// Stops leftover children and deletes transient configs. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        for agent in self.agents.iter_mut().filter(|a| a.outcome.is_none()) {
            agent.handle.terminate();
        }
        self.remove_temp_files();
    }

    pub fn agents(&self) -> &[AgentProcess] {
        &self.agents
    }
}

impl Drop for LaunchCoordinator {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::testing::VirtualClock;
    use crate::race::{RaceStatus, Strategy};
    use parking_lot::Mutex;
    use std::io;
    use std::path::Path;

    /// Exits with a preset code after a number of liveness checks.
    struct FakeHandle {
        code: i32,
        checks_left: usize,
        lost: bool,
        terminated: Arc<Mutex<Vec<String>>>,
        name: String,
    }

    impl AgentHandle for FakeHandle {
        fn id(&self) -> Option<u32> {
            None
        }

        fn try_wait(&mut self) -> io::Result<Option<i32>> {
            if self.lost {
                return Err(io::Error::new(io::ErrorKind::Other, "wait failed"));
            }
            if self.checks_left == 0 {
                return Ok(Some(self.code));
            }
            self.checks_left -= 1;
            Ok(None)
        }

        fn terminate(&mut self) {
            self.terminated.lock().push(self.name.clone());
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        codes: IndexMap<String, (i32, usize)>,
        spawned: Mutex<Vec<(AgentCommand, DateTime<Utc>)>>,
        terminated: Arc<Mutex<Vec<String>>>,
        clock: Option<Arc<dyn Clock>>,
        cancel_on_spawn: Option<CancelToken>,
        lost: Vec<String>,
    }

    impl FakeLauncher {
        fn exits(mut self, name: &str, code: i32, checks: usize) -> Self {
            self.codes.insert(name.to_string(), (code, checks));
            self
        }
    }

    impl AgentLauncher for FakeLauncher {
        fn spawn(&self, command: &AgentCommand) -> io::Result<Box<dyn AgentHandle>> {
            let at = self.clock.as_ref().map(|c| c.now()).unwrap_or_else(Utc::now);
            self.spawned.lock().push((command.clone(), at));
            if let Some(cancel) = &self.cancel_on_spawn {
                cancel.cancel();
            }
            let (code, checks_left) = self.codes.get(&command.registrant_id).copied().unwrap_or((0, 0));
            Ok(Box::new(FakeHandle {
                code,
                checks_left,
                lost: self.lost.contains(&command.registrant_id),
                terminated: self.terminated.clone(),
                name: command.registrant_id.clone(),
            }))
        }
    }

    fn write_player(dir: &Path, name: &str, email: &str) {
        let body = format!(
            r#"{{"player_data": {{"lastName": "{0}", "firstName": "Test", "email": "{1}"}}}}"#,
            name, email
        );
        fs::write(dir.join(format!("{}.json", name)), body).unwrap();
    }

    fn setup(players: &[(&str, &str)]) -> (tempfile::TempDir, ProjectPaths, MultiRaceConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path());
        paths.ensure_dirs().unwrap();
        let entries = players
            .iter()
            .map(|(name, email)| {
                write_player(&paths.players_dir, name, email);
                PlayerEntry {
                    name: name.to_string(),
                    config_file: PathBuf::from(format!("config/players/{}.json", name)),
                    bot_type: Strategy::PureHttp,
                }
            })
            .collect();
        let config = MultiRaceConfig::new(362, "18-January-2026", entries);
        (tmp, paths, config)
    }

    fn temp_files(paths: &ProjectPaths) -> Vec<String> {
        fs::read_dir(&paths.config_dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("temp_tournament_"))
            .collect()
    }

    #[test]
    fn test_invalid_registrant_fails_fast() {
        let (_tmp, paths, config) = setup(&[
            ("alice", "alice@example.org"),
            ("bob", "bob@example.org"),
            ("carol", ""),
            ("dave", "dave@example.org"),
        ]);
        let launcher = Arc::new(FakeLauncher::default());
        let mut coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), launcher.clone()).launch_now();

        let err = coordinator.launch_all(&config).unwrap_err();
        assert_eq!(err.invalid_registrants(), vec!["carol"]);
        assert!(launcher.spawned.lock().is_empty());
        assert!(temp_files(&paths).is_empty());
    }

    #[test]
    fn test_missing_profile_file_is_reported() {
        let (_tmp, paths, mut config) = setup(&[("alice", "alice@example.org")]);
        config.players.push(PlayerEntry {
            name: "ghost".to_string(),
            config_file: PathBuf::from("config/players/ghost.json"),
            bot_type: Strategy::PureHttp,
        });
        let launcher = Arc::new(FakeLauncher::default());
        let mut coordinator = LaunchCoordinator::new(paths, BotSettings::default(), launcher.clone()).launch_now();

        let err = coordinator.launch_all(&config).unwrap_err();
        assert_eq!(err.invalid_registrants(), vec!["ghost"]);
        assert!(launcher.spawned.lock().is_empty());
    }

    #[test]
    fn test_exit_codes_become_outcomes_in_launch_order() {
        let (_tmp, paths, config) = setup(&[
            ("alice", "alice@example.org"),
            ("bob", "bob@example.org"),
            ("carol", "carol@example.org"),
        ]);
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:30Z"));
        let launcher = Arc::new(FakeLauncher::default().exits("alice", 0, 4).exits("bob", 1, 1).exits("carol", 0, 0));
        let mut coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), launcher.clone())
            .with_clock(clock.clone())
            .launch_now();

        let report = coordinator.launch_all(&config).unwrap();

        let names: Vec<&str> = report.outcomes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert_eq!(report.outcomes["alice"].status, RaceStatus::Success);
        assert_eq!(report.outcomes["bob"].status, RaceStatus::Failed);
        assert_eq!(report.outcomes["bob"].exit_code, Some(1));
        assert_eq!(report.stats.successes, 2);
        assert!(report.outcomes["alice"].elapsed_seconds >= 2.0);
        assert!(temp_files(&paths).is_empty());
    }

    #[test]
    fn test_agents_share_window_and_stagger() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org"), ("bob", "bob@example.org")]);
        let clock: Arc<VirtualClock> = Arc::new(VirtualClock::at("2026-01-18T10:59:30Z"));
        let launcher = Arc::new(FakeLauncher {
            clock: Some(clock.clone()),
            ..FakeLauncher::default()
        });
        let mut coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), launcher.clone())
            .with_clock(clock.clone())
            .launch_now();

        let report = coordinator.launch_all(&config).unwrap();
        assert_eq!(report.start_spread_ms(), Some(50));

        let spawned = launcher.spawned.lock().clone();
        assert_eq!(spawned.len(), 2);
        assert_eq!((spawned[1].1 - spawned[0].1).num_milliseconds(), 50);
        for (command, _) in &spawned {
            assert!(command.config_file.ends_with(format!("temp_tournament_362_{}.json", command.registrant_id)));
            assert!(command.player_file.is_absolute());
        }
    }

    #[test]
    fn test_real_time_stagger_within_jitter() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org"), ("bob", "bob@example.org")]);
        let launcher = Arc::new(FakeLauncher::default());
        let mut coordinator = LaunchCoordinator::new(paths, BotSettings::default(), launcher.clone())
            .with_liveness_interval(Duration::from_millis(10))
            .launch_now();

        coordinator.launch_all(&config).unwrap();
        let spawned = launcher.spawned.lock().clone();
        let gap = (spawned[1].1 - spawned[0].1).num_milliseconds();
        assert!((45..=150).contains(&gap), "gap {}", gap);
    }

    #[test]
    fn test_waits_until_sync_point() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org")]);
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:58:00Z"));
        let launcher = Arc::new(FakeLauncher {
            clock: Some(clock.clone()),
            ..FakeLauncher::default()
        });
        let mut coordinator =
            LaunchCoordinator::new(paths, BotSettings::default(), launcher.clone()).with_clock(clock.clone());

        coordinator.launch_all(&config).unwrap();
        let spawned_at = launcher.spawned.lock()[0].1;
        // Opens 11:00:00 UTC, launch 30s earlier.
        assert_eq!(spawned_at.to_rfc3339(), "2026-01-18T10:59:30+00:00");
    }

    #[test]
    fn test_cancel_terminates_running_children() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org")]);
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:30Z"));
        let cancel = CancelToken::new();
        let launcher = Arc::new(FakeLauncher {
            cancel_on_spawn: Some(cancel.clone()),
            ..FakeLauncher::default()
        }
        .exits("alice", 0, usize::MAX));
        let mut coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), launcher.clone())
            .with_clock(clock)
            .with_cancel(cancel)
            .launch_now();

        let report = coordinator.launch_all(&config).unwrap();
        assert_eq!(report.outcomes["alice"].status, RaceStatus::Cancelled);
        assert_eq!(*launcher.terminated.lock(), vec!["alice".to_string()]);
        assert!(temp_files(&paths).is_empty());
    }

    #[test]
    fn test_cancel_before_sync_point() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org")]);
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:00:00Z"));
        let cancel = CancelToken::new();
        cancel.cancel();
        let launcher = Arc::new(FakeLauncher::default());
        let mut coordinator = LaunchCoordinator::new(paths, BotSettings::default(), launcher.clone())
            .with_clock(clock)
            .with_cancel(cancel);

        assert!(matches!(coordinator.launch_all(&config), Err(LaunchError::Cancelled)));
        assert!(launcher.spawned.lock().is_empty());
    }

    #[test]
    fn test_temp_config_stays_in_config_dir() {
        let (_tmp, paths, _config) = setup(&[]);
        let coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), Arc::new(FakeLauncher::default()));

        for name in ["../../escape", "team/alice", "alice"] {
            let path = coordinator.temp_config_path(362, name);
            assert_eq!(path.parent(), Some(paths.config_dir.as_path()), "{}", name);
        }
        assert!(coordinator
            .temp_config_path(362, "../../escape")
            .ends_with("temp_tournament_362_.._.._escape.json"));
    }

    #[test]
    fn test_path_like_player_name_is_rejected_before_launch() {
        let (_tmp, paths, mut config) = setup(&[("alice", "alice@example.org")]);
        config.players[0].name = "../../escape".to_string();
        let launcher = Arc::new(FakeLauncher::default());
        let mut coordinator = LaunchCoordinator::new(paths.clone(), BotSettings::default(), launcher.clone()).launch_now();

        let err = coordinator.launch_all(&config).unwrap_err();
        assert!(matches!(err, LaunchError::Configuration(_)));
        assert!(launcher.spawned.lock().is_empty());
        assert!(temp_files(&paths).is_empty());
    }

    #[test]
    fn test_oversized_sync_wait_is_a_configuration_error() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org")]);
        let launcher = Arc::new(FakeLauncher::default());
        let coordinator = LaunchCoordinator::new(paths, BotSettings::default(), launcher);
        let window = config.window(&WindowCalculator::new(chrono_tz::Europe::Paris)).unwrap();

        let err = coordinator.wait_until_sync_point(&window, u64::MAX).unwrap_err();
        assert!(matches!(err, LaunchError::Configuration(_)));
    }

    #[test]
    fn test_lost_child_is_terminated() {
        let (_tmp, paths, config) = setup(&[("alice", "alice@example.org"), ("bob", "bob@example.org")]);
        let clock = Arc::new(VirtualClock::at("2026-01-18T10:59:30Z"));
        let launcher = Arc::new(FakeLauncher {
            lost: vec!["bob".to_string()],
            ..FakeLauncher::default()
        });
        let mut coordinator = LaunchCoordinator::new(paths, BotSettings::default(), launcher.clone())
            .with_clock(clock)
            .launch_now();

        let report = coordinator.launch_all(&config).unwrap();
        assert_eq!(report.outcomes["alice"].status, RaceStatus::Success);
        assert_eq!(report.outcomes["bob"].status, RaceStatus::Failed);
        assert_eq!(*launcher.terminated.lock(), vec!["bob".to_string()]);
    }
}
