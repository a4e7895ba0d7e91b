// Sat Oct 17 2026 - Alex

pub mod args;
pub mod handler;

pub use args::{Args, Command, PlayersCommand};
pub use handler::CommandHandler;

use clap::Parser;

pub fn parse_args() -> Args {
    Args::parse()
}

/// Parses the command line, runs it and returns the exit code.
pub fn run() -> i32 {
    let args = parse_args();
    let handler = CommandHandler::new(&args);
    match handler.execute(args) {
        Ok(code) => code,
        Err(e) => {
            crate::ui::print_error(&format!("{:#}", e));
            crate::race::error::EXIT_CONFIGURATION
        }
    }
}
