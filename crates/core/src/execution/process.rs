//! Process-backed run environment
//!
//! This module provides the production [`RunEnvironment`]: logging to the
//! terminal and task bodies executed as external processes with consistent
//! error handling. The core executor never constructs it; the caller does.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::anyhow;
use colored::*;

use crate::context::RunEnvironment;
use crate::platform::Shell;

/// [`RunEnvironment`] backed by the real process environment.
pub struct SystemEnvironment {
    working_dir: PathBuf,
    shell: Shell,
}

impl SystemEnvironment {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            shell: Shell::current(),
        }
    }

    /// Common setup and execution for both shell and argv commands.
    fn execute(
        &self,
        command: &mut Command,
        vars: &[(String, String)],
        execution_error_message: &str,
        failure_error_message: &str,
    ) -> anyhow::Result<()> {
        command.current_dir(&self.working_dir);
        for (name, value) in vars {
            command.env(name, value);
        }

        let status = command
            .status()
            .map_err(|e| anyhow!("{}: {}", execution_error_message, e))?;

        if !status.success() {
            return Err(anyhow!(
                "{}: {}",
                failure_error_message,
                status.code().unwrap_or(-1)
            ));
        }

        Ok(())
    }
}

impl RunEnvironment for SystemEnvironment {
    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn warn(&self, message: &str) {
        println!("{} {}", "Warning:".yellow().bold(), message.yellow());
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message.red());
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn run_shell(&self, command_line: &str, vars: &[(String, String)]) -> anyhow::Result<()> {
        let mut command = Command::new(self.shell.program);
        command.arg(self.shell.flag).arg(command_line);
        self.execute(
            &mut command,
            vars,
            &format!("Failed to execute command '{}'", command_line),
            &format!("Command '{}' failed with exit code", command_line),
        )
    }

    fn run_command(
        &self,
        program: &str,
        args: &[String],
        vars: &[(String, String)],
    ) -> anyhow::Result<()> {
        let mut command = Command::new(program);
        command.args(args);
        self.execute(
            &mut command,
            vars,
            &format!("Failed to execute command '{}'", program),
            &format!("Command '{}' failed with exit code", program),
        )
    }
}
