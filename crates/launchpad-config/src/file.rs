//! TOML file layer, the lowest-precedence source after built-in defaults.

use std::fs;

use camino::Utf8Path;
use serde::Deserialize;

use crate::entry::{IndirectionSpec, LaunchMode, LaunchSpec};
use crate::environment::{EnvironmentProfile, RequiredEnvironment};
use crate::error::ConfigError;
use crate::logging::LogFormat;
use crate::target::ReadinessTarget;

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileLayer {
    pub(crate) app: Option<LaunchSpec>,
    pub(crate) shim: Option<IndirectionSpec>,
    pub(crate) readiness: ReadinessSection,
    pub(crate) environment: EnvironmentProfile,
    pub(crate) require_env: RequiredEnvironment,
    pub(crate) mode: Option<LaunchMode>,
    pub(crate) log_filter: Option<String>,
    pub(crate) log_format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReadinessSection {
    pub(crate) targets: Vec<ReadinessTarget>,
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) interval_ms: Option<u64>,
    pub(crate) connect_timeout_ms: Option<u64>,
}

impl FileLayer {
    pub(crate) fn read(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub(crate) fn parse(path: &Utf8Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        mode = "supervise"
        require_env = ["BOT_TOKEN"]
        log_format = "compact"

        [app]
        program = "uv"
        args = ["run", "main.py"]

        [shim]
        program = "/bin/sh"
        args = ["/fake_entrypoint.sh"]

        [readiness]
        targets = ["db:5432", "unix:///run/cache.sock"]
        timeout_ms = 5000

        [environment]
        PYTHONDONTWRITEBYTECODE = "1"
        PYTHONUNBUFFERED = "1"
    "#;

    #[test]
    fn parses_every_section() {
        let layer = FileLayer::parse(Utf8Path::new("launchpad.toml"), SAMPLE)
            .expect("sample configuration parses");
        assert_eq!(layer.mode, Some(LaunchMode::Supervise));
        assert_eq!(layer.app, Some(LaunchSpec::new("uv", ["run", "main.py"])));
        assert_eq!(
            layer.shim,
            Some(IndirectionSpec::new("/bin/sh", ["/fake_entrypoint.sh"]))
        );
        assert_eq!(
            layer.readiness.targets,
            [
                ReadinessTarget::tcp("db", 5432),
                ReadinessTarget::unix("/run/cache.sock")
            ]
        );
        assert_eq!(layer.readiness.timeout_ms, Some(5000));
        assert_eq!(layer.environment.get("PYTHONUNBUFFERED"), Some("1"));
        assert_eq!(layer.require_env.names(), ["BOT_TOKEN"]);
        assert_eq!(layer.log_format, Some(LogFormat::Compact));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let layer = FileLayer::parse(Utf8Path::new("empty.toml"), "").expect("empty parses");
        assert_eq!(layer, FileLayer::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = FileLayer::parse(Utf8Path::new("typo.toml"), "modes = \"replace\"")
            .expect_err("unknown key should fail");
        assert!(matches!(error, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn malformed_targets_are_rejected() {
        let error = FileLayer::parse(
            Utf8Path::new("bad.toml"),
            "[readiness]\ntargets = [\"db\"]\n",
        )
        .expect_err("target without port should fail");
        assert!(error.to_string().contains("bad.toml"));
    }
}
