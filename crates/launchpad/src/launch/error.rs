//! Error types for control transfer.

use std::io;

use thiserror::Error;

use crate::errors::{EXIT_CANNOT_EXECUTE, EXIT_NOT_FOUND, EXIT_SOFTWARE};

/// Failures to hand control to the entry process. These are never retried.
#[derive(Debug, Error)]
pub enum LaunchFailure {
    /// The program could not be found on `PATH` or at the given path.
    #[error("entry program '{program}' was not found: {source}")]
    NotFound {
        /// Program that was requested.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The program exists but may not be executed.
    #[error("permission denied executing '{program}': {source}")]
    PermissionDenied {
        /// Program that was requested.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Any other `exec` or spawn failure.
    #[error("failed to execute '{program}': {source}")]
    Exec {
        /// Program that was requested.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Waiting on the supervised child failed.
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        /// Program being supervised.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Signal forwarding to the supervised child could not be set up.
    #[error("failed to forward signals to '{program}': {source}")]
    SignalForwarding {
        /// Program being supervised.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl LaunchFailure {
    /// Classifies an `exec`/spawn error by its kind.
    #[must_use]
    pub fn from_exec(program: &str, source: io::Error) -> Self {
        let program = program.to_owned();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { program, source },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { program, source },
            _ => Self::Exec { program, source },
        }
    }

    /// Process exit status for this failure, following shell conventions.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound { .. } => EXIT_NOT_FOUND,
            Self::PermissionDenied { .. } | Self::Exec { .. } => EXIT_CANNOT_EXECUTE,
            Self::Wait { .. } | Self::SignalForwarding { .. } => EXIT_SOFTWARE,
        }
    }
}
