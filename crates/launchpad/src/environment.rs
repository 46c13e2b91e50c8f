//! Applies the environment profile to the entry command.
//!
//! The profile is threaded into the [`Command`] explicitly rather than written
//! into the launcher's own process environment, so the result is observable
//! and testable without global state. `exec` and `spawn` both pass the command
//! environment on, which makes it visible to the entry process and every
//! process it starts.

use std::ffi::OsString;
use std::process::Command;

use launchpad_config::{ConfigError, ConfigIssue, EnvironmentProfile, RequiredEnvironment};

/// Exports every profile variable to `command`.
///
/// Applying the same profile twice leaves the command environment unchanged.
pub fn configure_environment(profile: &EnvironmentProfile, command: &mut Command) {
    for (name, value) in profile.iter() {
        command.env(name, value);
    }
}

/// Fails when a required variable is absent from both the profile and the
/// inherited environment.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] listing every missing variable.
pub fn verify_required(
    required: &RequiredEnvironment,
    profile: &EnvironmentProfile,
    inherited: fn(&str) -> Option<OsString>,
) -> Result<(), ConfigError> {
    let issues: Vec<_> = required
        .missing(profile, inherited)
        .into_iter()
        .map(|name| ConfigIssue::MissingRequiredEnvironment { name })
        .collect();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(issues))
    }
}
