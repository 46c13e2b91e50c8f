use std::fmt;
use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating launcher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line flags or `LAUNCHPAD_*` variables failed to parse.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadFile {
        /// File that failed to load.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML for the launcher schema.
    #[error("failed to parse configuration file '{path}': {source}")]
    ParseFile {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },
    /// The merged configuration is incomplete or malformed.
    #[error("{}", render_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

impl ConfigError {
    /// Returns the validation issues when the error is [`ConfigError::Invalid`].
    #[must_use]
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            Self::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

/// A single problem found while validating the merged configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// Neither an application command nor a shim was configured.
    MissingEntry,
    /// A command was configured with an empty program.
    EmptyProgram {
        /// Which command was empty (`app` or `shim`).
        role: &'static str,
    },
    /// An environment variable name is empty or contains `=` or NUL.
    InvalidEnvironmentName {
        /// Offending name.
        name: String,
    },
    /// An environment variable value contains NUL.
    InvalidEnvironmentValue {
        /// Name of the offending variable.
        name: String,
    },
    /// A readiness timing was zero.
    ZeroDuration {
        /// Setting that was zero.
        setting: &'static str,
    },
    /// A required variable is absent or empty.
    MissingRequiredEnvironment {
        /// Name of the missing variable.
        name: String,
    },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntry => write!(
                formatter,
                "no entry command configured; pass a command after the flags or set [app] or [shim]"
            ),
            Self::EmptyProgram { role } => write!(formatter, "{role} program must not be empty"),
            Self::InvalidEnvironmentName { name } => {
                write!(formatter, "invalid environment variable name '{name}'")
            }
            Self::InvalidEnvironmentValue { name } => {
                write!(formatter, "environment variable '{name}' contains a NUL byte")
            }
            Self::ZeroDuration { setting } => {
                write!(formatter, "{setting} must be greater than zero")
            }
            Self::MissingRequiredEnvironment { name } => {
                write!(formatter, "required environment variable '{name}' is not set")
            }
        }
    }
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    match issues {
        [single] => format!("invalid configuration: {single}"),
        many => {
            let joined = many
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            format!("multiple configuration errors: {joined}")
        }
    }
}
