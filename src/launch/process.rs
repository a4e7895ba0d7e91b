// Sat Oct 17 2026 - Alex

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

use crate::race::Strategy;
use crate::utils::process;

/// Everything a child agent needs on its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    pub registrant_id: String,
    pub config_file: PathBuf,
    pub player_file: PathBuf,
    pub strategy: Strategy,
    pub root: PathBuf,
    pub settings_file: Option<PathBuf>,
}

impl AgentCommand {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-banner".to_string(),
            "--root".to_string(),
            path_arg(&self.root),
        ];
        if let Some(settings) = &self.settings_file {
            args.push("--settings".to_string());
            args.push(path_arg(settings));
        }
        args.extend([
            "race".to_string(),
            "--config".to_string(),
            path_arg(&self.config_file),
            "--player".to_string(),
            path_arg(&self.player_file),
            "--strategy".to_string(),
            self.strategy.to_string(),
            "--registrant-id".to_string(),
            self.registrant_id.clone(),
        ]);
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub trait AgentHandle: Send {
    fn id(&self) -> Option<u32>;

    /// `Some(code)` once the agent has exited.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;

    fn terminate(&mut self);
}

pub trait AgentLauncher: Send + Sync {
    fn spawn(&self, command: &AgentCommand) -> io::Result<Box<dyn AgentHandle>>;
}

/// Starts agents as child processes of a given program, by default this executable.
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
        })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl AgentLauncher for ProcessLauncher {
    fn spawn(&self, command: &AgentCommand) -> io::Result<Box<dyn AgentHandle>> {
        let child = Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!("Spawned {} as pid {}", command.registrant_id, child.id());
        Ok(Box::new(ChildHandle::new(child)))
    }
}

pub struct ChildHandle {
    child: Child,
    exited: Option<i32>,
}

impl ChildHandle {
    pub fn new(child: Child) -> Self {
        Self { child, exited: None }
    }
}

/// Exit code, or a negative signal number when the child was killed.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

impl AgentHandle for ChildHandle {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        if let Some(code) = self.exited {
            return Ok(Some(code));
        }
        let code = self.child.try_wait()?.map(exit_code);
        self.exited = code;
        Ok(code)
    }

    fn terminate(&mut self) {
        if matches!(self.try_wait(), Ok(Some(_))) {
            return;
        }
        if !process::terminate(self.child.id()) {
            if let Err(e) = self.child.kill() {
                warn!("Could not stop pid {}: {}", self.child.id(), e);
            }
        }
        // Reap so the child does not linger as a zombie.
        if let Ok(status) = self.child.wait() {
            self.exited = Some(exit_code(status));
        }
    }
}
