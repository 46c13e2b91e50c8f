use std::time::Duration;

use camino::Utf8Path;

use crate::entry::LaunchMode;
use crate::logging::LogFormat;

/// Default log filter expression used by the launcher.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Pause between readiness attempts when none is configured.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound for a single readiness connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Prefix shared by every environment variable the launcher reads itself.
pub const ENV_PREFIX: &str = "LAUNCHPAD_";

/// Files consulted, in order, when no configuration path is given.
pub const CONFIG_FILE_CANDIDATES: &[&str] = &["launchpad.toml", "/etc/launchpad/launchpad.toml"];

/// Default log filter expression used by the launcher.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the launcher.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default control transfer strategy.
#[must_use]
pub fn default_launch_mode() -> LaunchMode {
    LaunchMode::Replace
}

/// Returns the first candidate configuration file that exists.
#[must_use]
pub fn discover_config_file() -> Option<&'static Utf8Path> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(|candidate| Utf8Path::new(candidate))
        .find(|candidate| candidate.is_file())
}
