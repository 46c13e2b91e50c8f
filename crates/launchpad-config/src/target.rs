use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Network endpoint that must accept connections before the application starts.
///
/// Targets are written as `host:port`, `tcp://host:port` or `unix:///path`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum ReadinessTarget {
    /// TCP endpoint.
    Tcp {
        /// Host name or address literal.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
}

impl ReadinessTarget {
    /// Builds a TCP readiness target.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Builds a Unix domain socket readiness target.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }
}

impl fmt::Display for ReadinessTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } if host.contains(':') => {
                write!(formatter, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
            Self::Unix { path } => write!(formatter, "unix://{path}"),
        }
    }
}

impl FromStr for ReadinessTarget {
    type Err = TargetParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TargetParseError::Empty);
        }
        if trimmed.contains("://") {
            return parse_url(trimmed);
        }
        parse_host_port(trimmed)
    }
}

impl TryFrom<String> for ReadinessTarget {
    type Error = TargetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReadinessTarget> for String {
    fn from(target: ReadinessTarget) -> Self {
        target.to_string()
    }
}

fn parse_url(input: &str) -> Result<ReadinessTarget, TargetParseError> {
    let url = Url::parse(input)?;
    match url.scheme() {
        "unix" => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return Err(TargetParseError::MissingUnixPath(input.to_owned()));
            }
            Ok(ReadinessTarget::unix(path))
        }
        "tcp" => {
            let host = url
                .host_str()
                .ok_or_else(|| TargetParseError::MissingHost(input.to_owned()))?;
            let port = url
                .port()
                .ok_or_else(|| TargetParseError::MissingPort(input.to_owned()))?;
            Ok(ReadinessTarget::tcp(
                host.trim_start_matches('[').trim_end_matches(']'),
                port,
            ))
        }
        other => Err(TargetParseError::UnsupportedScheme(other.to_owned())),
    }
}

// `db:5432` and `[::1]:5432`; the port is always the text after the last colon.
fn parse_host_port(input: &str) -> Result<ReadinessTarget, TargetParseError> {
    let Some((host, port)) = input.rsplit_once(':') else {
        return Err(TargetParseError::MissingPort(input.to_owned()));
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(TargetParseError::MissingHost(input.to_owned()));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| TargetParseError::InvalidPort(input.to_owned()))?;
    Ok(ReadinessTarget::tcp(host, port))
}

/// Errors encountered while parsing a [`ReadinessTarget`] from text.
#[derive(Debug, Error)]
pub enum TargetParseError {
    /// The target string was blank.
    #[error("readiness target must not be empty")]
    Empty,
    /// Scheme was not recognised.
    #[error("unsupported readiness target scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// TCP port was not a valid number.
    #[error("invalid TCP port in '{0}'")]
    InvalidPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
