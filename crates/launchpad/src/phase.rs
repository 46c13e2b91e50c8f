//! Launch phases and the observer that surfaces them to telemetry sinks.

use std::fmt;
use std::sync::Arc;

use launchpad_config::{EntryTarget, LaunchMode, ReadinessTarget};

use crate::errors::SequencerError;

const PHASE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::phase");

/// States a container instance passes through between creation and hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Process created; nothing applied yet.
    Init,
    /// Environment profile applied to the entry command.
    EnvConfigured,
    /// Blocking until every readiness target accepts a connection.
    AwaitingReadiness,
    /// Control transfer to the entry process has been initiated.
    Launching,
    /// Control handed off, or a child is being supervised.
    Running,
}

impl Phase {
    /// Upper-case label used in logs and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::EnvConfigured => "ENV_CONFIGURED",
            Self::AwaitingReadiness => "AWAITING_READINESS",
            Self::Launching => "LAUNCHING",
            Self::Running => "RUNNING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observer trait used to surface sequencing events.
pub trait PhaseReporter: Send + Sync {
    /// Invoked when the sequencer enters `phase`.
    fn phase_entered(&self, phase: Phase);

    /// Invoked when a readiness target accepts a connection.
    fn target_ready(&self, target: &ReadinessTarget, attempts: u32);

    /// Invoked immediately before control is transferred.
    fn launching(&self, entry: &EntryTarget, mode: LaunchMode);

    /// Invoked once the entry process is running under `pid`.
    fn running(&self, pid: u32, mode: LaunchMode);

    /// Invoked when the sequence fails fatally.
    fn failed(&self, error: &SequencerError);
}

impl<T> PhaseReporter for Arc<T>
where
    T: PhaseReporter,
{
    fn phase_entered(&self, phase: Phase) {
        (**self).phase_entered(phase);
    }

    fn target_ready(&self, target: &ReadinessTarget, attempts: u32) {
        (**self).target_ready(target, attempts);
    }

    fn launching(&self, entry: &EntryTarget, mode: LaunchMode) {
        (**self).launching(entry, mode);
    }

    fn running(&self, pid: u32, mode: LaunchMode) {
        (**self).running(pid, mode);
    }

    fn failed(&self, error: &SequencerError) {
        (**self).failed(error);
    }
}

/// Default reporter that records sequencing events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredPhaseReporter;

impl StructuredPhaseReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PhaseReporter for StructuredPhaseReporter {
    fn phase_entered(&self, phase: Phase) {
        tracing::debug!(
            target: PHASE_TARGET,
            event = "phase_entered",
            phase = %phase,
            "entered phase"
        );
    }

    fn target_ready(&self, target: &ReadinessTarget, attempts: u32) {
        tracing::info!(
            target: PHASE_TARGET,
            event = "target_ready",
            endpoint = %target,
            attempts,
            "readiness target reachable"
        );
    }

    fn launching(&self, entry: &EntryTarget, mode: LaunchMode) {
        tracing::info!(
            target: PHASE_TARGET,
            event = "launching",
            entry = entry.kind(),
            program = entry.program(),
            argv = ?entry.argv(),
            %mode,
            "handing control to entry process"
        );
    }

    fn running(&self, pid: u32, mode: LaunchMode) {
        tracing::info!(
            target: PHASE_TARGET,
            event = "running",
            pid,
            %mode,
            "entry process running"
        );
    }

    fn failed(&self, error: &SequencerError) {
        tracing::error!(
            target: PHASE_TARGET,
            event = "failed",
            phase = %error.phase(),
            kind = %error.kind(),
            exit_code = error.exit_code(),
            error = %error,
            "launch sequence failed"
        );
    }
}
