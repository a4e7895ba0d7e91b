// Sat Oct 17 2026 - Alex

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

pub fn level_from_str(s: &str) -> LevelFilter {
    match s.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn log_file_name(name: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.log", name, at.with_timezone(&Local).format("%Y%m%d_%H%M%S"))
}

/// Console logger with millisecond timestamps, optionally copied into a per-run file.
struct RaceLogger {
    level: LevelFilter,
    use_color: bool,
    file: Option<Mutex<File>>,
}

impl RaceLogger {
    fn format_level(&self, level: Level) -> String {
        if !self.use_color {
            return format!("{:5}", level);
        }
        match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".green().bold(),
            Level::Debug => "DEBUG".blue().bold(),
            Level::Trace => "TRACE".magenta().bold(),
        }
        .to_string()
    }
}

impl Log for RaceLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let stamp = if self.use_color {
            timestamp.to_string().dimmed().to_string()
        } else {
            timestamp.to_string()
        };
        eprintln!("{} {} {}", stamp, self.format_level(record.level()), record.args());

        if let Some(file) = &self.file {
            let line = format!(
                "{} {:5} [{}] {}\n",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            );
            let _ = file.lock().write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Installs the console logger and tees it into `logs_dir/<name>_<stamp>.log`.
/// Returns the log file path.
pub fn init_run_logger(level: LevelFilter, name: &str, logs_dir: &Path, use_color: bool) -> io::Result<PathBuf> {
    fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(log_file_name(name, Utc::now()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let logger = RaceLogger {
        level,
        use_color,
        file: Some(Mutex::new(file)),
    };
    log::set_boxed_logger(Box::new(logger)).ok();
    log::set_max_level(level);
    Ok(path)
}

/// Console only, for short informational commands.
pub fn init_simple(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .ok();
}
