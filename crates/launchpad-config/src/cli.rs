//! Command-line and environment layer.
//!
//! `clap` resolves each flag from the command line first and falls back to the
//! matching `LAUNCHPAD_*` variable, so this layer already encodes the
//! "CLI beats environment" rule before it is merged over the file layer.

use camino::Utf8PathBuf;
use clap::{Args, Parser};

use crate::entry::LaunchMode;
use crate::environment::parse_assignment;
use crate::logging::LogFormat;
use crate::target::ReadinessTarget;

/// Configuration flags accepted by the launcher.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file.
    #[arg(long, env = "LAUNCHPAD_CONFIG_PATH", value_name = "PATH")]
    pub config_path: Option<Utf8PathBuf>,
    /// Shim that receives control instead of the application.
    #[arg(long, env = "LAUNCHPAD_SHIM", value_name = "PROGRAM")]
    pub shim: Option<String>,
    /// Argument passed to the shim; repeat for several.
    #[arg(long = "shim-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub shim_args: Vec<String>,
    /// Endpoint that must accept connections before launch (`host:port`,
    /// `tcp://host:port` or `unix:///path`); repeat for several.
    #[arg(
        long = "wait-for",
        env = "LAUNCHPAD_WAIT_FOR",
        value_name = "TARGET",
        value_delimiter = ','
    )]
    pub wait_for: Vec<ReadinessTarget>,
    /// Give up waiting for readiness after this many milliseconds.
    #[arg(long, env = "LAUNCHPAD_TIMEOUT_MS", value_name = "MS")]
    pub timeout_ms: Option<u64>,
    /// Pause between readiness attempts in milliseconds.
    #[arg(long, env = "LAUNCHPAD_INTERVAL_MS", value_name = "MS")]
    pub interval_ms: Option<u64>,
    /// Upper bound of a single readiness attempt in milliseconds.
    #[arg(long, env = "LAUNCHPAD_CONNECT_TIMEOUT_MS", value_name = "MS")]
    pub connect_timeout_ms: Option<u64>,
    /// Variable exported to the entry process; repeat for several.
    #[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub env: Vec<(String, String)>,
    /// Variable that must be set and non-empty before launch.
    #[arg(
        long = "require-env",
        env = "LAUNCHPAD_REQUIRE_ENV",
        value_name = "NAME",
        value_delimiter = ','
    )]
    pub require_env: Vec<String>,
    /// How control is transferred: `replace` or `supervise`.
    #[arg(long, env = "LAUNCHPAD_MODE", value_name = "MODE")]
    pub mode: Option<LaunchMode>,
    /// Tracing filter expression.
    #[arg(long, env = "LAUNCHPAD_LOG_FILTER", value_name = "FILTER")]
    pub log_filter: Option<String>,
    /// Log output format: `json` or `compact`.
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
    /// Application command and its arguments.
    #[arg(
        value_name = "COMMAND",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Standalone parser used by [`crate::Config::load_from_iter`].
#[derive(Parser, Debug)]
#[command(name = "launchpad")]
pub(crate) struct ConfigCli {
    #[command(flatten)]
    pub(crate) args: ConfigArgs,
}
