//! Worker process spawning.
//!
//! Workers are the same binary re-executed with a hidden worker flag. The
//! master owns the stdout pipe for lifecycle messages; worker stderr goes
//! straight to the master's stderr so worker logs stay visible.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::SupervisorError;

/// Builds and spawns worker processes.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerLauncher {
    /// Launcher that re-executes the current binary in worker mode,
    /// forwarding the config path when one was given.
    pub fn from_current_exe(config_path: Option<&Path>) -> Result<Self, SupervisorError> {
        let program = std::env::current_exe().map_err(SupervisorError::WorkerBinary)?;

        let mut args = vec!["--worker".to_string()];
        if let Some(path) = config_path {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }

        Ok(Self { program, args })
    }

    /// Launcher for an arbitrary program. Tests use shell stubs in place
    /// of real workers.
    pub fn custom(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Spawn one worker with a piped stdout for lifecycle messages.
    pub fn spawn(&self, id: u32) -> Result<Child, SupervisorError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn { id, source })
    }
}
