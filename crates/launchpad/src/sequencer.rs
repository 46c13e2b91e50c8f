//! Phase-ordered dispatch from configuration to a running entry process.

use std::ffi::OsString;

use launchpad_config::Config;

use crate::environment::verify_required;
use crate::errors::SequencerError;
use crate::launch::{Launcher, PreparedCommand, SystemLauncher};
use crate::phase::{Phase, PhaseReporter, StructuredPhaseReporter};
use crate::readiness::{Probe, SocketProbe, await_readiness};
use crate::signals::Cancellation;

/// Lookup used to consult the inherited process environment.
pub type EnvironmentLookup = fn(&str) -> Option<OsString>;

fn process_environment(name: &str) -> Option<OsString> {
    std::env::var_os(name)
}

/// Drives a single launch through `INIT → ENV_CONFIGURED →
/// [AWAITING_READINESS] → LAUNCHING → RUNNING`.
///
/// Every collaborator with an observable side effect is injected so the
/// ordering can be verified without sockets or `exec`.
#[derive(Debug)]
pub struct Sequencer<P, L, R> {
    probe: P,
    launcher: L,
    reporter: R,
    cancellation: Cancellation,
    inherited: EnvironmentLookup,
}

impl Sequencer<SocketProbe, SystemLauncher, StructuredPhaseReporter> {
    /// Sequencer wired to real sockets, `exec`, and `tracing`.
    #[must_use]
    pub fn system(cancellation: Cancellation) -> Self {
        Self::new(
            SocketProbe,
            SystemLauncher,
            StructuredPhaseReporter::new(),
            cancellation,
        )
    }
}

impl<P, L, R> Sequencer<P, L, R>
where
    P: Probe,
    L: Launcher,
    R: PhaseReporter,
{
    /// Builds a sequencer from explicit collaborators.
    #[must_use]
    pub fn new(probe: P, launcher: L, reporter: R, cancellation: Cancellation) -> Self {
        Self {
            probe,
            launcher,
            reporter,
            cancellation,
            inherited: process_environment,
        }
    }

    /// Replaces the lookup used to check required variables against the
    /// inherited environment.
    #[must_use]
    pub fn with_inherited_environment(mut self, lookup: EnvironmentLookup) -> Self {
        self.inherited = lookup;
        self
    }

    /// Reporter receiving phase events.
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Runs the launch sequence for `config`.
    ///
    /// The readiness gate is entered only when targets are configured, and the
    /// entry process is never started before it passes. When a shim is
    /// configured it is the only program started; the application is reachable
    /// solely through the shim's arguments.
    ///
    /// Returns the exit status to report: the supervised child's, or whatever
    /// the launcher returned. In replace mode a successful launch never
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] for missing required variables, unreachable
    /// dependencies, cancellation, and launch failures. The reporter is told
    /// about the failure before it is returned.
    pub fn dispatch_entry(&self, config: &Config) -> Result<u8, SequencerError> {
        self.run_phases(config)
            .inspect_err(|error| self.reporter.failed(error))
    }

    fn run_phases(&self, config: &Config) -> Result<u8, SequencerError> {
        self.reporter.phase_entered(Phase::Init);

        verify_required(
            config.required_environment(),
            config.environment(),
            self.inherited,
        )?;
        let command = PreparedCommand::from_config(config);
        self.reporter.phase_entered(Phase::EnvConfigured);

        if config.readiness().is_enabled() {
            self.reporter.phase_entered(Phase::AwaitingReadiness);
            await_readiness(
                &self.probe,
                config.readiness(),
                &self.cancellation,
                |target, attempts| self.reporter.target_ready(target, attempts),
            )?;
        }

        let mode = config.mode();
        self.reporter.phase_entered(Phase::Launching);
        self.reporter.launching(config.entry(), mode);
        let code = self.launcher.launch(&command, mode, &|pid| {
            self.reporter.phase_entered(Phase::Running);
            self.reporter.running(pid, mode);
        })?;
        Ok(code)
    }
}
