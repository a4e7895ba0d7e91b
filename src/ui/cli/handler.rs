// Sat Oct 17 2026 - Alex

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};

use super::args::{
    Args, Command, ConfigArgs, LaunchArgs, MultiConfigArgs, PlayersCommand, RaceArgs, SetupBotArgs, WindowArgs,
    WorldCupsArgs,
};
use crate::config::{BotSettings, ProjectPaths};
use crate::launch::{LaunchCoordinator, LaunchError, ProcessLauncher};
use crate::output::{render_launch_summary, render_race_summary, DiagnosticsWriter, ReportWriter};
use crate::profile::{PlayerDirectory, RegistrantProfile};
use crate::race::error::{EXIT_CANCELLED, EXIT_CONFIGURATION};
use crate::race::outcome::{EXIT_FAILED, EXIT_SUCCESS};
use crate::race::{CancelToken, RaceAgent, RaceError, Strategy, SystemClock};
use crate::tournament::{MultiRaceConfig, TournamentRaceConfig, TournamentRecord, TournamentStore};
use crate::ui::banner::Banner;
use crate::ui::progress::Countdown;
use crate::ui::table::{Alignment, TableBuilder};
use crate::ui::{print_error, print_info, print_success, print_warning};
use crate::utils::{format_countdown, logging};
use crate::window::dates::registration_start_date;
use crate::window::{format_date, TournamentWindow, WindowCalculator};

/// Registration date for a tournament record: the published one when present,
/// otherwise derived from the start date.
pub fn registration_date_for(record: &TournamentRecord, calculator: &WindowCalculator) -> anyhow::Result<NaiveDate> {
    if let Some(raw) = record.registration_start.as_deref() {
        match registration_start_date(raw) {
            Ok(date) => return Ok(date),
            Err(e) => warn!("Ignoring registration_start '{}' for {}: {}", raw, record.id, e),
        }
    }
    let window = calculator.compute(record.id, &record.starts_on)?;
    Ok(window.opens_at_in(calculator.timezone()).date_naive())
}

fn profile_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("registrant")
        .to_string()
}

pub struct CommandHandler {
    paths: ProjectPaths,
    settings_file: Option<PathBuf>,
    use_color: bool,
    cancel: CancelToken,
}

impl CommandHandler {
    pub fn new(args: &Args) -> Self {
        let root = std::fs::canonicalize(&args.root).unwrap_or_else(|_| args.root.clone());
        Self {
            paths: ProjectPaths::new(root),
            settings_file: args.settings.clone(),
            use_color: !args.no_color,
            cancel: CancelToken::new(),
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Runs the command and returns the process exit code.
    pub fn execute(&self, args: Args) -> anyhow::Result<i32> {
        if args.no_color {
            colored::control::set_override(false);
        }
        if !args.no_banner {
            Banner::print_default(self.use_color);
        }

        let level = logging::level_from_str(&args.log_level);
        if args.command.is_run() {
            self.paths.ensure_dirs().context("creating project directories")?;
            let name = self.run_log_name(&args.command);
            match logging::init_run_logger(level, &name, &self.paths.logs_dir, self.use_color) {
                Ok(path) => log::debug!("Logging to {}", path.display()),
                Err(e) => {
                    logging::init_simple(level);
                    warn!("Could not open log file: {}", e);
                }
            }
            self.install_signal_handler();
        } else {
            logging::init_simple(level);
        }

        match args.command {
            Command::Race(race) => self.handle_race(race),
            Command::Launch(launch) => self.handle_launch(launch),
            Command::Window(window) => self.handle_window(window),
            Command::WorldCups(cups) => self.handle_world_cups(cups),
            Command::SetupBot(setup) => self.handle_setup_bot(setup),
            Command::Players(players) => self.handle_players(players),
            Command::Config(config) => self.handle_config(config),
        }
    }

    fn run_log_name(&self, command: &Command) -> String {
        match command {
            Command::Race(race) => format!(
                "race_{}",
                race.registrant_id.clone().unwrap_or_else(|| profile_stem(&race.player))
            ),
            Command::Launch(_) => "launch".to_string(),
            other => other.name().to_string(),
        }
    }

    fn install_signal_handler(&self) {
        let cancel = self.cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            warn!("Could not install Ctrl+C handler: {}", e);
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| self.paths.bot_settings_file())
    }

    fn load_settings(&self) -> anyhow::Result<BotSettings> {
        let path = self.settings_path();
        BotSettings::load(&path).with_context(|| format!("loading settings from {}", path.display()))
    }

    fn calculator(&self, settings: &BotSettings) -> anyhow::Result<WindowCalculator> {
        Ok(WindowCalculator::new(settings.timezone()?).with_lead_time(settings.check_start_offset_seconds))
    }

    fn handle_race(&self, args: RaceArgs) -> anyhow::Result<i32> {
        let registrant_id = args.registrant_id.clone().unwrap_or_else(|| profile_stem(&args.player));
        match self.prepare_agent(&args, &registrant_id) {
            Ok(agent) => Ok(self.run_agent(agent)),
            Err(e) => {
                error!("{}", e);
                Ok(e.exit_code())
            }
        }
    }

    fn prepare_agent(&self, args: &RaceArgs, registrant_id: &str) -> Result<RaceAgent, RaceError> {
        let settings = BotSettings::load(&self.settings_path())?;
        let config = TournamentRaceConfig::load(&self.paths.resolve(&args.config))?;
        let profile = RegistrantProfile::load(&self.paths.resolve(&args.player))?;
        let agent = RaceAgent::new(registrant_id, profile, &config, &settings, args.strategy)?
            .with_cancel(self.cancel.clone())
            .with_diagnostics(DiagnosticsWriter::new(self.paths.diagnostics_dir.clone()));
        Ok(agent)
    }

    fn run_agent(&self, mut agent: RaceAgent) -> i32 {
        let window = *agent.window();
        if window.monitoring_starts_at > Utc::now() {
            let countdown = Countdown::new("Monitoring starts");
            let reached = countdown.wait_until(&SystemClock, window.monitoring_starts_at, &self.cancel);
            countdown.finish();
            if !reached {
                info!("Cancelled before monitoring started");
            }
        }

        match agent.run() {
            Ok(outcome) => {
                println!("{}", render_race_summary(&outcome, self.use_color));
                outcome.exit_code()
            }
            Err(e) => {
                error!("{}", e);
                e.exit_code()
            }
        }
    }

    fn handle_launch(&self, args: LaunchArgs) -> anyhow::Result<i32> {
        let settings = match self.load_settings() {
            Ok(s) => s,
            Err(e) => {
                error!("{:#}", e);
                return Ok(EXIT_CONFIGURATION);
            }
        };
        let config = match MultiRaceConfig::load(&self.paths.resolve(&args.config)) {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                return Ok(EXIT_CONFIGURATION);
            }
        };
        let tz = settings.timezone()?;

        let launcher = Arc::new(ProcessLauncher::new().context("locating the agent executable")?);
        let mut coordinator = LaunchCoordinator::new(self.paths.clone(), settings, launcher)
            .with_cancel(self.cancel.clone())
            .with_liveness_interval(std::time::Duration::from_millis(args.liveness_ms));
        if let Some(path) = &self.settings_file {
            coordinator = coordinator.with_settings_file(self.paths.resolve(path));
        }
        if args.now {
            coordinator = coordinator.launch_now();
        }

        match coordinator.launch_all(&config) {
            Ok(report) => {
                println!();
                println!("{}", render_launch_summary(&report, tz, self.use_color));
                match ReportWriter::new(self.paths.logs_dir.clone()).write(&report, Utc::now()) {
                    Ok(path) => print_info(&format!("Report saved to {}", path.display())),
                    Err(e) => warn!("Could not save report: {}", e),
                }
                Ok(if report.all_succeeded() { EXIT_SUCCESS } else { EXIT_FAILED })
            }
            Err(LaunchError::Cancelled) => {
                print_warning("Launch cancelled");
                Ok(EXIT_CANCELLED)
            }
            Err(e @ LaunchError::Spawn(..)) => {
                print_error(&e.to_string());
                Ok(EXIT_FAILED)
            }
            Err(e) => {
                print_error(&e.to_string());
                Ok(EXIT_CONFIGURATION)
            }
        }
    }

    fn window_for(&self, args: &WindowArgs, calculator: &WindowCalculator) -> anyhow::Result<(TournamentWindow, String)> {
        if let Some(date) = &args.start_date {
            return Ok((calculator.compute(args.tournament, date)?, format!("starts {}", date)));
        }
        let store = TournamentStore::load(&self.paths.tournaments_data_file())?;
        let record = store
            .find(args.tournament)
            .ok_or_else(|| anyhow!("tournament {} not found, pass --start-date", args.tournament))?;
        let opens_on = registration_date_for(record, calculator)?;
        let window = calculator.from_registration(record.id, &format_date(opens_on), "12:00:00")?;
        Ok((window, format!("{} in {}, starts {}", record.tournament, record.place, record.starts_on)))
    }

    fn handle_window(&self, args: WindowArgs) -> anyhow::Result<i32> {
        let settings = self.load_settings()?;
        let calculator = self.calculator(&settings)?;
        let (window, description) = self.window_for(&args, &calculator)?;
        let tz = calculator.timezone();
        let remaining = window.seconds_until_open(Utc::now());

        print_info(&format!("Tournament {} ({})", window.tournament_id, description));
        print_info(&format!(
            "Registration opens: {}",
            window.opens_at_in(tz).format("%A %d %B %Y %H:%M:%S %Z")
        ));
        print_info(&format!(
            "Local time:         {}",
            window.registration_opens_at.with_timezone(&chrono::Local).format("%A %d %B %Y %H:%M:%S")
        ));
        print_info(&format!(
            "Monitoring starts:  {} ({}s lead)",
            window.monitoring_starts_in(tz).format("%H:%M:%S"),
            window.lead_time().num_seconds()
        ));
        if remaining > 0.0 {
            print_success(&format!("Opens in {}", format_countdown(remaining)));
        } else {
            print_warning("Registration has already opened");
        }
        Ok(EXIT_SUCCESS)
    }

    fn handle_world_cups(&self, args: WorldCupsArgs) -> anyhow::Result<i32> {
        let settings = self.load_settings()?;
        let calculator = self.calculator(&settings)?;
        let store = TournamentStore::load(&self.paths.tournaments_data_file())?;
        let today = Utc::now().with_timezone(&calculator.timezone()).date_naive();

        let mut cups = store.upcoming_world_cups(today);
        if let Some(limit) = args.limit {
            cups.truncate(limit);
        }
        if cups.is_empty() {
            print_warning("No upcoming World Cup 3-Cushion tournaments in the data file");
            return Ok(EXIT_SUCCESS);
        }

        let mut table = TableBuilder::new()
            .with_headers(&["ID", "Place", "Starts", "Registration opens", "In"])
            .with_color(self.use_color)
            .with_alignment(0, Alignment::Right)
            .with_alignment(4, Alignment::Right);
        for record in cups {
            let (opens, until) = match registration_date_for(record, &calculator)
                .and_then(|d| Ok(calculator.from_registration(record.id, &format_date(d), "12:00:00")?))
            {
                Ok(window) => (
                    window.opens_at_in(calculator.timezone()).format("%d-%m-%Y %H:%M").to_string(),
                    format_countdown(window.seconds_until_open(Utc::now())),
                ),
                Err(_) => ("?".to_string(), "-".to_string()),
            };
            table = table.add_row(&[record.id.to_string(), record.place.clone(), record.starts_on.clone(), opens, until]);
        }
        println!("{}", table.build());
        Ok(EXIT_SUCCESS)
    }

    fn save_multi_config(&self, config: &MultiRaceConfig, output: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = match output {
            Some(p) => self.paths.resolve(p),
            None => self
                .paths
                .tournaments_dir
                .join(MultiRaceConfig::default_file_name(config.tournament_id)),
        };
        config.save(&path)?;
        Ok(path)
    }

    fn handle_setup_bot(&self, args: SetupBotArgs) -> anyhow::Result<i32> {
        let settings = self.load_settings()?;
        let calculator = self.calculator(&settings)?;
        let registration_date = match &args.registration_date {
            Some(date) => date.clone(),
            None => {
                let store = TournamentStore::load(&self.paths.tournaments_data_file())?;
                let record = store.find(args.tournament).ok_or_else(|| {
                    anyhow!("tournament {} not found, pass --registration-date", args.tournament)
                })?;
                format_date(registration_date_for(record, &calculator)?)
            }
        };

        let directory = PlayerDirectory::new(self.paths.players_dir.clone());
        let names = if args.players.is_empty() {
            directory
                .summaries()?
                .into_iter()
                .filter(|s| s.is_valid())
                .map(|s| s.name)
                .collect()
        } else {
            args.players.clone()
        };
        if names.is_empty() {
            print_error("No valid player profiles found");
            return Ok(EXIT_CONFIGURATION);
        }

        let players: Vec<(String, Strategy)> = names.into_iter().map(|n| (n, args.strategy)).collect();
        let mut config = directory.build_multi_config(args.tournament, &registration_date, &players)?;
        for entry in &mut config.players {
            if let Ok(relative) = entry.config_file.strip_prefix(&self.paths.root) {
                entry.config_file = relative.to_path_buf();
            }
        }
        let path = self.save_multi_config(&config, None)?;

        print_success(&format!(
            "{} players set up for tournament {} (registration {})",
            config.players.len(),
            config.tournament_id,
            registration_date
        ));
        print_info(&format!("Run: umb-racer launch --config {}", path.display()));
        Ok(EXIT_SUCCESS)
    }

    fn handle_players(&self, command: PlayersCommand) -> anyhow::Result<i32> {
        let directory = PlayerDirectory::new(self.paths.players_dir.clone());
        match command {
            PlayersCommand::List => {
                let summaries = directory.summaries()?;
                if summaries.is_empty() {
                    print_warning(&format!("No player profiles in {}", directory.path().display()));
                    return Ok(EXIT_SUCCESS);
                }
                let mut table = TableBuilder::new()
                    .with_headers(&["Name", "Player", "Email", "Federation", "Status"])
                    .with_color(self.use_color);
                for s in summaries {
                    let status = if s.is_valid() {
                        "ok".to_string()
                    } else {
                        format!("{} problem(s)", s.errors.len())
                    };
                    table = table.add_row(&[s.name, s.full_name, s.email, s.federation, status]);
                }
                println!("{}", table.build());
                Ok(EXIT_SUCCESS)
            }
            PlayersCommand::Validate { name } => {
                let names = match name {
                    Some(n) => vec![n],
                    None => directory.list()?,
                };
                let mut failures = 0;
                for (name, errors) in directory.validate_all(&names) {
                    if errors.is_empty() {
                        print_success(&format!("{}: valid", name));
                    } else {
                        failures += 1;
                        print_error(&format!("{}: {}", name, errors.join(", ")));
                    }
                }
                Ok(if failures == 0 { EXIT_SUCCESS } else { EXIT_FAILED })
            }
            PlayersCommand::MultiConfig(args) => self.handle_multi_config(&directory, args),
        }
    }

    fn handle_multi_config(&self, directory: &PlayerDirectory, args: MultiConfigArgs) -> anyhow::Result<i32> {
        let players: Vec<(String, Strategy)> = args.players.iter().map(|n| (n.clone(), args.strategy)).collect();
        let config = match directory.build_multi_config(args.tournament, &args.registration_date, &players) {
            Ok(c) => c,
            Err(e) => {
                print_error(&e.to_string());
                return Ok(EXIT_CONFIGURATION);
            }
        };
        let path = self.save_multi_config(&config, args.output.as_deref())?;
        print_success(&format!("Multi-agent config written to {}", path.display()));
        Ok(EXIT_SUCCESS)
    }

    fn handle_config(&self, args: ConfigArgs) -> anyhow::Result<i32> {
        let path = self.settings_path();
        if args.init {
            if path.exists() && !args.force {
                print_warning(&format!("{} already exists, use --force to overwrite", path.display()));
                return Ok(EXIT_FAILED);
            }
            BotSettings::default().save(&path)?;
            print_success(&format!("Default settings written to {}", path.display()));
            return Ok(EXIT_SUCCESS);
        }

        match BotSettings::load(&path) {
            Ok(settings) => {
                println!("{}", serde_json::to_string_pretty(&settings)?);
                print_success(&format!("Settings valid ({})", path.display()));
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                print_error(&e.to_string());
                Ok(EXIT_CONFIGURATION)
            }
        }
    }
}
