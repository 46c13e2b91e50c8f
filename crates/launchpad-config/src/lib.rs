//! Shared configuration for the `launchpad` container entry process.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `LAUNCHPAD_*` environment variables, then command-line flags. The
//! merged result is validated eagerly so a misconfigured image fails before it
//! spends any time waiting on dependencies.

mod cli;
mod defaults;
mod entry;
mod environment;
mod error;
mod file;
mod logging;
mod readiness;
mod target;

use std::ffi::OsString;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

pub use cli::ConfigArgs;
pub use defaults::{
    CONFIG_FILE_CANDIDATES, DEFAULT_CONNECT_TIMEOUT, DEFAULT_LOG_FILTER, DEFAULT_RETRY_INTERVAL,
    ENV_PREFIX, default_launch_mode, default_log_filter, default_log_format, discover_config_file,
};
pub use entry::{EntryTarget, IndirectionSpec, LaunchMode, LaunchSpec};
pub use environment::{EnvironmentProfile, RequiredEnvironment, parse_assignment};
pub use error::{ConfigError, ConfigIssue};
pub use logging::LogFormat;
pub use readiness::ReadinessPolicy;
pub use target::{ReadinessTarget, TargetParseError};

use file::FileLayer;

/// Fully merged and validated launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    entry: EntryTarget,
    environment: EnvironmentProfile,
    required_environment: RequiredEnvironment,
    readiness: ReadinessPolicy,
    mode: LaunchMode,
    log_filter: String,
    log_format: LogFormat,
    source: Option<Utf8PathBuf>,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer fails to parse or the merged
    /// configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list (argv\[0\] first).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer fails to parse or the merged
    /// configuration is invalid.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = cli::ConfigCli::try_parse_from(args)?;
        Self::from_args(cli.args)
    }

    /// Merges already-parsed flags over the file layer and validates the result.
    ///
    /// An explicit `config_path` must exist; otherwise the first existing entry
    /// of [`CONFIG_FILE_CANDIDATES`] is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or the
    /// merged configuration is invalid.
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let source = args
            .config_path
            .clone()
            .or_else(|| discover_config_file().map(Utf8Path::to_path_buf));
        let layer = match source.as_deref() {
            Some(path) => FileLayer::read(path)?,
            None => FileLayer::default(),
        };
        Self::merge(layer, args, source)
    }

    fn merge(
        layer: FileLayer,
        args: ConfigArgs,
        source: Option<Utf8PathBuf>,
    ) -> Result<Self, ConfigError> {
        let ConfigArgs {
            shim,
            shim_args,
            wait_for,
            timeout_ms,
            interval_ms,
            connect_timeout_ms,
            env,
            require_env,
            mode,
            log_filter,
            log_format,
            command,
            ..
        } = args;

        let app = LaunchSpec::from_argv(&command).or(layer.app);
        let shim = shim.map(|program| IndirectionSpec::new(program, shim_args)).or(layer.shim);

        let mut issues = Vec::new();
        if app.as_ref().is_some_and(|app| app.program.trim().is_empty()) {
            issues.push(ConfigIssue::EmptyProgram { role: "app" });
        }
        if shim.as_ref().is_some_and(|shim| shim.program.trim().is_empty()) {
            issues.push(ConfigIssue::EmptyProgram { role: "shim" });
        }
        let entry = EntryTarget::resolve(shim, app);
        if entry.is_none() {
            issues.push(ConfigIssue::MissingEntry);
        }

        let mut environment = layer.environment;
        environment.merge(env.into_iter().collect());
        issues.extend(environment.issues());

        let required_environment = if require_env.is_empty() {
            layer.require_env
        } else {
            RequiredEnvironment::new(require_env)
        };
        issues.extend(required_environment.issues());

        let section = layer.readiness;
        let targets = if wait_for.is_empty() {
            section.targets
        } else {
            wait_for
        };
        let timeout = timeout_ms.or(section.timeout_ms);
        let interval = interval_ms.or(section.interval_ms);
        let connect_timeout = connect_timeout_ms.or(section.connect_timeout_ms);
        for (setting, value) in [
            ("readiness timeout", timeout),
            ("readiness interval", interval),
            ("readiness connect timeout", connect_timeout),
        ] {
            if value == Some(0) {
                issues.push(ConfigIssue::ZeroDuration { setting });
            }
        }
        let readiness = ReadinessPolicy::new(targets)
            .with_timeout(timeout.map(Duration::from_millis))
            .with_interval(interval.map_or(DEFAULT_RETRY_INTERVAL, Duration::from_millis))
            .with_connect_timeout(
                connect_timeout.map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis),
            );

        let Some(entry) = entry.filter(|_| issues.is_empty()) else {
            return Err(ConfigError::Invalid(issues));
        };

        Ok(Self {
            entry,
            environment,
            required_environment,
            readiness,
            mode: mode.or(layer.mode).unwrap_or_else(default_launch_mode),
            log_filter: log_filter
                .or(layer.log_filter)
                .unwrap_or_else(|| default_log_filter().to_owned()),
            log_format: log_format.or(layer.log_format).unwrap_or_else(default_log_format),
            source,
        })
    }

    /// Builds a configuration programmatically with defaults for everything
    /// except the entry target.
    #[must_use]
    pub fn for_entry(entry: EntryTarget) -> Self {
        Self {
            entry,
            environment: EnvironmentProfile::default(),
            required_environment: RequiredEnvironment::default(),
            readiness: ReadinessPolicy::default(),
            mode: default_launch_mode(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            source: None,
        }
    }

    /// Replaces the environment profile.
    #[must_use]
    pub fn with_environment(mut self, environment: EnvironmentProfile) -> Self {
        self.environment = environment;
        self
    }

    /// Replaces the required variable list.
    #[must_use]
    pub fn with_required_environment(mut self, required: RequiredEnvironment) -> Self {
        self.required_environment = required;
        self
    }

    /// Replaces the readiness policy.
    #[must_use]
    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    /// Replaces the launch mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Process that receives control.
    #[must_use]
    pub const fn entry(&self) -> &EntryTarget {
        &self.entry
    }

    /// Variables exported to the entry process.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentProfile {
        &self.environment
    }

    /// Variables that must be present before launch.
    #[must_use]
    pub const fn required_environment(&self) -> &RequiredEnvironment {
        &self.required_environment
    }

    /// Dependency gate applied before launch.
    #[must_use]
    pub const fn readiness(&self) -> &ReadinessPolicy {
        &self.readiness
    }

    /// Control transfer strategy.
    #[must_use]
    pub const fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Configuration file that contributed to this configuration, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Utf8Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_command(command: &[&str]) -> ConfigArgs {
        ConfigArgs {
            command: command.iter().map(|part| (*part).to_owned()).collect(),
            ..ConfigArgs::default()
        }
    }

    #[test]
    fn cli_command_wins_over_file_application() {
        let layer = FileLayer {
            app: Some(LaunchSpec::new("python", ["old.py"])),
            ..FileLayer::default()
        };
        let config = Config::merge(layer, args_with_command(&["uv", "run", "main.py"]), None)
            .expect("configuration merges");
        assert_eq!(config.entry().argv(), ["uv", "run", "main.py"]);
    }

    #[test]
    fn file_application_is_used_without_cli_command() {
        let layer = FileLayer {
            app: Some(LaunchSpec::new("python", ["main.py"])),
            ..FileLayer::default()
        };
        let config = Config::merge(layer, ConfigArgs::default(), None).expect("merges");
        assert_eq!(config.entry(), &EntryTarget::Direct(LaunchSpec::new("python", ["main.py"])));
        assert_eq!(config.mode(), LaunchMode::Replace);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn missing_entry_and_bad_timings_are_reported_together() {
        let args = ConfigArgs {
            timeout_ms: Some(0),
            interval_ms: Some(0),
            ..ConfigArgs::default()
        };
        let error = Config::merge(FileLayer::default(), args, None).expect_err("must fail");
        assert_eq!(
            error.issues(),
            [
                ConfigIssue::MissingEntry,
                ConfigIssue::ZeroDuration {
                    setting: "readiness timeout"
                },
                ConfigIssue::ZeroDuration {
                    setting: "readiness interval"
                },
            ]
        );
        assert!(error.to_string().starts_with("multiple configuration errors"));
    }

    #[test]
    fn blank_shim_program_is_rejected() {
        let args = ConfigArgs {
            shim: Some(String::from("  ")),
            ..args_with_command(&["app"])
        };
        let error = Config::merge(FileLayer::default(), args, None).expect_err("must fail");
        assert_eq!(error.issues(), [ConfigIssue::EmptyProgram { role: "shim" }]);
    }

    #[test]
    fn cli_environment_overlays_file_profile() {
        let layer = FileLayer {
            environment: [("PYTHONUNBUFFERED", "0"), ("LANG", "C.UTF-8")]
                .into_iter()
                .collect(),
            ..FileLayer::default()
        };
        let args = ConfigArgs {
            env: vec![(String::from("PYTHONUNBUFFERED"), String::from("1"))],
            ..args_with_command(&["app"])
        };
        let config = Config::merge(layer, args, None).expect("merges");
        assert_eq!(config.environment().get("PYTHONUNBUFFERED"), Some("1"));
        assert_eq!(config.environment().get("LANG"), Some("C.UTF-8"));
    }

    #[test]
    fn readiness_timings_fall_back_to_defaults() {
        let args = ConfigArgs {
            wait_for: vec![ReadinessTarget::tcp("db", 5432)],
            timeout_ms: Some(5000),
            ..args_with_command(&["app"])
        };
        let config = Config::merge(FileLayer::default(), args, None).expect("merges");
        let readiness = config.readiness();
        assert!(readiness.is_enabled());
        assert_eq!(readiness.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(readiness.interval(), DEFAULT_RETRY_INTERVAL);
        assert_eq!(readiness.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
    }
}
