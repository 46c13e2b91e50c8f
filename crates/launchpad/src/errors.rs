//! Defines the unified error surface for the launch sequence.

use std::fmt;
use std::io;

use launchpad_config::ConfigError;
use thiserror::Error;

use crate::launch::LaunchFailure;
use crate::phase::Phase;
use crate::readiness::ReadinessError;
use crate::telemetry::TelemetryError;

/// Exit status for configuration problems (`EX_CONFIG`).
pub const EXIT_CONFIG: u8 = 78;
/// Exit status when a dependency never became reachable (`EX_UNAVAILABLE`).
pub const EXIT_UNAVAILABLE: u8 = 69;
/// Exit status for internal launcher failures (`EX_SOFTWARE`).
pub const EXIT_SOFTWARE: u8 = 70;
/// Exit status when the entry program does not exist.
pub const EXIT_NOT_FOUND: u8 = 127;
/// Exit status when the entry program exists but cannot be executed.
pub const EXIT_CANNOT_EXECUTE: u8 = 126;

/// Classification of fatal launch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Required configuration is missing or malformed.
    ConfigurationError,
    /// A readiness target did not accept a connection in time.
    DependencyUnreachable,
    /// A termination signal aborted the sequence before launch.
    Cancelled,
    /// The entry process could not be started or supervised.
    LaunchFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::DependencyUnreachable => "DependencyUnreachable",
            Self::Cancelled => "Cancelled",
            Self::LaunchFailure => "LaunchFailure",
        };
        f.write_str(label)
    }
}

/// Errors that terminate the launch sequence.
///
/// The rendered message always starts with the phase that failed so container
/// logs point straight at the broken step.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// Configuration failed to load or validate.
    #[error("ENV_CONFIGURED failed: {source}")]
    Configuration {
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry could not be installed.
    #[error("INIT failed: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Termination signal handlers could not be installed.
    #[error("INIT failed: failed to install signal handlers: {source}")]
    SignalHandlers {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A readiness target never became reachable, or waiting was interrupted.
    #[error("AWAITING_READINESS failed: {source}")]
    Readiness {
        /// Underlying readiness error.
        #[source]
        source: ReadinessError,
    },
    /// The entry process could not be started.
    #[error("LAUNCHING failed: {source}")]
    Launch {
        /// Underlying launch failure.
        #[source]
        source: LaunchFailure,
    },
}

impl SequencerError {
    /// Phase in which the failure happened.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Configuration { .. } => Phase::EnvConfigured,
            Self::Telemetry { .. } | Self::SignalHandlers { .. } => Phase::Init,
            Self::Readiness { .. } => Phase::AwaitingReadiness,
            Self::Launch { .. } => Phase::Launching,
        }
    }

    /// Failure classification.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration { .. } => FailureKind::ConfigurationError,
            Self::Readiness {
                source: ReadinessError::Cancelled { .. },
            } => FailureKind::Cancelled,
            Self::Readiness { .. } => FailureKind::DependencyUnreachable,
            Self::Telemetry { .. } | Self::SignalHandlers { .. } | Self::Launch { .. } => {
                FailureKind::LaunchFailure
            }
        }
    }

    /// Process exit status reported for this failure; never zero.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } => EXIT_CONFIG,
            Self::Telemetry { .. } | Self::SignalHandlers { .. } => EXIT_SOFTWARE,
            Self::Readiness { source } => source.exit_code(),
            Self::Launch { source } => source.exit_code(),
        }
    }
}

impl From<ConfigError> for SequencerError {
    fn from(source: ConfigError) -> Self {
        Self::Configuration { source }
    }
}

impl From<TelemetryError> for SequencerError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<ReadinessError> for SequencerError {
    fn from(source: ReadinessError) -> Self {
        Self::Readiness { source }
    }
}

impl From<LaunchFailure> for SequencerError {
    fn from(source: LaunchFailure) -> Self {
        Self::Launch { source }
    }
}
