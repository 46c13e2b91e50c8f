//! Dry-run rendering of the resolved launch plan.
//!
//! `--check` validates configuration and prints what would happen as JSON
//! without waiting on dependencies or starting anything.

use std::time::Duration;

use camino::Utf8Path;
use launchpad_config::{
    Config, EnvironmentProfile, LaunchMode, ReadinessTarget, RequiredEnvironment,
};
use serde::Serialize;

use crate::sequencer::EnvironmentLookup;

/// Serialisable view of what the sequencer would do for a configuration.
#[derive(Debug, Serialize)]
pub struct LaunchPlan<'a> {
    entry: EntryPlan<'a>,
    mode: LaunchMode,
    environment: &'a EnvironmentProfile,
    required_environment: &'a RequiredEnvironment,
    missing_environment: Vec<String>,
    readiness: ReadinessPlan<'a>,
    config_file: Option<&'a Utf8Path>,
}

#[derive(Debug, Serialize)]
struct EntryPlan<'a> {
    kind: &'static str,
    program: &'a str,
    argv: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReadinessPlan<'a> {
    targets: &'a [ReadinessTarget],
    timeout_ms: Option<u64>,
    interval_ms: u64,
    connect_timeout_ms: u64,
}

impl<'a> LaunchPlan<'a> {
    /// Resolves the plan, checking required variables through `inherited`.
    #[must_use]
    pub fn new(config: &'a Config, inherited: EnvironmentLookup) -> Self {
        let readiness = config.readiness();
        Self {
            entry: EntryPlan {
                kind: config.entry().kind(),
                program: config.entry().program(),
                argv: config.entry().argv(),
            },
            mode: config.mode(),
            environment: config.environment(),
            required_environment: config.required_environment(),
            missing_environment: config
                .required_environment()
                .missing(config.environment(), inherited),
            readiness: ReadinessPlan {
                targets: readiness.targets(),
                timeout_ms: readiness.timeout().map(millis),
                interval_ms: millis(readiness.interval()),
                connect_timeout_ms: millis(readiness.connect_timeout()),
            },
            config_file: config.source(),
        }
    }

    /// Required variables that would block the launch.
    #[must_use]
    pub fn missing_environment(&self) -> &[String] {
        &self.missing_environment
    }

    /// Pretty-printed JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error; the plan only holds strings and
    /// numbers, so this does not happen in practice.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
