//! Control transfer to the entry process.
//!
//! The default [`LaunchMode::Replace`] replaces the launcher's process image,
//! so the entry process inherits its PID and receives container signals
//! directly. [`LaunchMode::Supervise`] keeps the launcher as parent, forwards
//! termination signals and reports the child's exit status.

mod error;
mod supervise;

use std::os::unix::process::CommandExt;
use std::process::Command;

use launchpad_config::{Config, EntryTarget, EnvironmentProfile, LaunchMode};
use tracing::debug;

use crate::environment::configure_environment;

pub use error::LaunchFailure;

const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Entry command with the environment profile applied, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    program: String,
    args: Vec<String>,
    environment: EnvironmentProfile,
}

impl PreparedCommand {
    /// Prepares the command for `entry` with `environment` exported to it.
    #[must_use]
    pub fn new(entry: &EntryTarget, environment: &EnvironmentProfile) -> Self {
        Self {
            program: entry.program().to_owned(),
            args: entry.arguments(),
            environment: environment.clone(),
        }
    }

    /// Prepares the entry command described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.entry(), config.environment())
    }

    /// Program that receives control.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to [`Self::program`].
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Variables exported on top of the inherited environment.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentProfile {
        &self.environment
    }

    /// Builds a [`Command`] that inherits the launcher's stdio.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        configure_environment(&self.environment, &mut command);
        command
    }
}

/// Transfers control to a prepared entry command.
pub trait Launcher {
    /// Starts `command` in `mode`, calling `running` with the entry PID once
    /// control has been handed over.
    ///
    /// Only returns in [`LaunchMode::Supervise`], or when launching failed.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchFailure`] when the program cannot be started or waited on.
    fn launch(
        &self,
        command: &PreparedCommand,
        mode: LaunchMode,
        running: &dyn Fn(u32),
    ) -> Result<u8, LaunchFailure>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(
        &self,
        command: &PreparedCommand,
        mode: LaunchMode,
        running: &dyn Fn(u32),
    ) -> Result<u8, LaunchFailure> {
        (**self).launch(command, mode, running)
    }
}

/// Launcher backed by `execvp(3)` and `fork(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(
        &self,
        command: &PreparedCommand,
        mode: LaunchMode,
        running: &dyn Fn(u32),
    ) -> Result<u8, LaunchFailure> {
        match mode {
            LaunchMode::Replace => replace(command, running),
            LaunchMode::Supervise => supervise::run(command, running),
        }
    }
}

// The PID survives `exec`, so `running` is reported first; it is the last
// chance to log before the process image is gone.
fn replace(command: &PreparedCommand, running: &dyn Fn(u32)) -> Result<u8, LaunchFailure> {
    debug!(
        target: LAUNCH_TARGET,
        program = command.program(),
        args = ?command.args(),
        "replacing process image"
    );
    running(std::process::id());
    let error = command.to_command().exec();
    Err(LaunchFailure::from_exec(command.program(), error))
}
