//! Malformed configuration must fail before any launch work begins.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use launchpad_config::{Config, ConfigError, ConfigIssue};
use once_cell::sync::Lazy;
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var_os(key);
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[test]
fn malformed_file_names_the_failing_path() {
    let _env = lock_env();
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("launchpad.toml");
    fs::write(&path, "[readiness]\ntimeout_ms = \"soon\"\n").expect("write config");

    let error = Config::load_from_iter([
        OsString::from("launchpad"),
        OsString::from("--config-path"),
        path.clone().into_os_string(),
        OsString::from("app"),
    ])
    .expect_err("loading must fail");

    assert!(matches!(error, ConfigError::ParseFile { .. }), "got {error:?}");
    let message = error.to_string();
    assert!(
        message.contains(path.to_str().expect("utf-8 path")),
        "expected path in message, got {message:?}"
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let missing = temp_dir.path().join("absent.toml");
    let _env = EnvOverride::set_var("LAUNCHPAD_CONFIG_PATH", missing.as_os_str());

    let error = Config::load_from_iter(["launchpad", "app"]).expect_err("loading must fail");
    assert!(matches!(error, ConfigError::ReadFile { .. }), "got {error:?}");
}

#[test]
fn validation_problems_are_aggregated() {
    let _env = lock_env();
    let error = Config::load_from_iter([
        "launchpad",
        "--env",
        "BAD=ok",
        "--env",
        "ALSO\u{0}BAD=x",
        "--require-env",
        "=nope",
        "--interval-ms",
        "0",
    ])
    .expect_err("loading must fail");

    let issues = error.issues();
    assert!(issues.contains(&ConfigIssue::MissingEntry), "{issues:?}");
    assert!(
        issues.contains(&ConfigIssue::InvalidEnvironmentName {
            name: String::from("=nope")
        }),
        "{issues:?}"
    );
    assert!(
        issues.contains(&ConfigIssue::ZeroDuration {
            setting: "readiness interval"
        }),
        "{issues:?}"
    );
    assert!(
        error.to_string().contains("multiple configuration errors"),
        "unexpected message: {error}"
    );
}

#[test]
fn invalid_readiness_target_is_a_cli_error() {
    let _env = lock_env();
    let error = Config::load_from_iter(["launchpad", "--wait-for", "db", "app"])
        .expect_err("loading must fail");
    assert!(matches!(error, ConfigError::Cli(_)), "got {error:?}");
}
