// Sat Oct 17 2026 - Alex

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::race::Strategy;

#[derive(Parser, Debug)]
#[command(name = "umb-racer")]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Races UMB World Cup registration forms the moment they open", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Project root holding config/, data/, logs/ and diagnostics/.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Bot settings file, defaults to <root>/config/bot_config.json.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Race one registrant against one tournament.
    Race(RaceArgs),
    /// Race several registrants in parallel, one process each.
    Launch(LaunchArgs),
    /// Show when registration opens for a tournament.
    Window(WindowArgs),
    /// List upcoming World Cup 3-Cushion tournaments.
    WorldCups(WorldCupsArgs),
    /// Write a multi-agent race config for a tournament from the player directory.
    SetupBot(SetupBotArgs),
    #[command(subcommand)]
    Players(PlayersCommand),
    /// Show or initialise bot settings.
    Config(ConfigArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RaceArgs {
    /// Tournament race config (tournament_id, registration_date, ...).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Registrant profile file.
    #[arg(short, long)]
    pub player: PathBuf,

    #[arg(short, long, default_value = "http")]
    pub strategy: Strategy,

    /// Name used in logs and diagnostics, defaults to the profile file stem.
    #[arg(long)]
    pub registrant_id: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct LaunchArgs {
    /// Multi-agent race config.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Start the agents immediately instead of shortly before opening.
    #[arg(long)]
    pub now: bool,

    #[arg(long, default_value = "500")]
    pub liveness_ms: u64,
}

#[derive(ClapArgs, Debug)]
pub struct WindowArgs {
    #[arg(short, long)]
    pub tournament: u32,

    /// Tournament start date (e.g. 15-March-2026). Looked up in the tournament data when omitted.
    #[arg(long)]
    pub start_date: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct WorldCupsArgs {
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct SetupBotArgs {
    #[arg(short, long)]
    pub tournament: u32,

    /// Players to include, defaults to every valid profile.
    #[arg(long, value_delimiter = ',')]
    pub players: Vec<String>,

    #[arg(short, long, default_value = "http")]
    pub strategy: Strategy,

    /// Registration date override (e.g. 18-January-2026).
    #[arg(long)]
    pub registration_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PlayersCommand {
    /// List player profiles and whether they are complete.
    List,
    /// Check one profile, or all of them.
    Validate { name: Option<String> },
    /// Build a multi-agent config from named players.
    MultiConfig(MultiConfigArgs),
}

#[derive(ClapArgs, Debug)]
pub struct MultiConfigArgs {
    #[arg(short, long)]
    pub tournament: u32,

    #[arg(long)]
    pub registration_date: String,

    #[arg(long, value_delimiter = ',', required = true)]
    pub players: Vec<String>,

    #[arg(short, long, default_value = "http")]
    pub strategy: Strategy,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Write the default settings file.
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing settings file with --init.
    #[arg(long)]
    pub force: bool,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Race(_) => "race",
            Command::Launch(_) => "launch",
            Command::Window(_) => "window",
            Command::WorldCups(_) => "world-cups",
            Command::SetupBot(_) => "setup-bot",
            Command::Players(_) => "players",
            Command::Config(_) => "config",
        }
    }

    /// Long-running commands get a per-run log file.
    pub fn is_run(&self) -> bool {
        matches!(self, Command::Race(_) | Command::Launch(_))
    }
}
