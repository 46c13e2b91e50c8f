//! Container entry process for single-purpose application images.
//!
//! `launchpad` runs as the first process of a container and takes it from
//! creation to a running application in a fixed order:
//!
//! 1. **INIT**: configuration is loaded and validated, telemetry and
//!    termination handlers are installed.
//! 2. **ENV_CONFIGURED**: required variables are checked and the environment
//!    profile is applied to the entry command.
//! 3. **AWAITING_READINESS**: when targets are configured, the launcher blocks
//!    until each accepts a connection, or its deadline passes.
//! 4. **LAUNCHING**: control is handed to the entry process, which is either
//!    the application or a shim that starts it.
//! 5. **RUNNING**: the entry process owns the container. In the default
//!    replace mode the launcher's image is gone; in supervise mode it forwards
//!    signals and reports the child's exit status.
//!
//! Every fatal failure is reported with the phase it happened in and a
//! non-zero exit status that tells the orchestrator what went wrong.

mod cli;
mod environment;
mod errors;
mod launch;
mod phase;
mod plan;
mod readiness;
mod sequencer;
mod signals;
mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use launchpad_config::Config;

pub use cli::Cli;
pub use environment::{configure_environment, verify_required};
pub use errors::{
    EXIT_CANNOT_EXECUTE, EXIT_CONFIG, EXIT_NOT_FOUND, EXIT_SOFTWARE, EXIT_UNAVAILABLE,
    FailureKind, SequencerError,
};
pub use launch::{LaunchFailure, Launcher, PreparedCommand, SystemLauncher};
pub use phase::{Phase, PhaseReporter, StructuredPhaseReporter};
pub use plan::LaunchPlan;
pub use readiness::{Probe, Ready, ReadinessError, SocketProbe, await_readiness};
pub use sequencer::{EnvironmentLookup, Sequencer};
pub use signals::{Cancellation, Cancelled, TERMINATION_SIGNALS, signal_exit_code};
pub use telemetry::{TelemetryError, TelemetryHandle};

/// Runs the launcher with the provided arguments and IO handles.
///
/// Help and version output go to `stdout` with a zero status. Any other
/// argument error exits with [`EXIT_CONFIG`]. In replace mode a successful
/// launch never returns.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            let _ = write!(stdout, "{}", error.render());
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", error.render());
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let config = match Config::from_args(cli.config) {
        Ok(config) => config,
        Err(error) => return fail(&SequencerError::from(error), stderr),
    };
    if let Err(error) = telemetry::initialise(&config) {
        return fail(&SequencerError::from(error), stderr);
    }

    if cli.check {
        return check(&config, stdout, stderr);
    }

    let cancellation = match Cancellation::install() {
        Ok(cancellation) => cancellation,
        Err(source) => return fail(&SequencerError::SignalHandlers { source }, stderr),
    };
    match Sequencer::system(cancellation).dispatch_entry(&config) {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            let _ = writeln!(stderr, "launchpad: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn check<W, E>(config: &Config, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    W: Write,
    E: Write,
{
    let plan = LaunchPlan::new(config, |name| std::env::var_os(name));
    match plan.to_json() {
        Ok(json) => {
            let _ = writeln!(stdout, "{json}");
        }
        Err(error) => {
            let _ = writeln!(stderr, "launchpad: failed to render launch plan: {error}");
            return ExitCode::from(EXIT_SOFTWARE);
        }
    }
    if plan.missing_environment().is_empty() {
        return ExitCode::SUCCESS;
    }
    let _ = writeln!(
        stderr,
        "launchpad: required environment variables are not set: {}",
        plan.missing_environment().join(", ")
    );
    ExitCode::from(EXIT_CONFIG)
}

fn fail<E: Write>(error: &SequencerError, stderr: &mut E) -> ExitCode {
    StructuredPhaseReporter::new().failed(error);
    let _ = writeln!(stderr, "launchpad: {error}");
    ExitCode::from(error.exit_code())
}

#[cfg(test)]
mod tests;
