//! Tests for the in-process `run` entry point.
//!
//! Only paths that return without launching are exercised here; the binary
//! tests cover `exec` and supervision.

use std::ffi::OsString;
use std::process::ExitCode;

use rstest::rstest;

use crate::errors::EXIT_CONFIG;
use crate::run;

fn invoke(args: &[&str]) -> (ExitCode, String, String) {
    let argv = std::iter::once("launchpad")
        .chain(args.iter().copied())
        .map(OsString::from);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf-8 stdout"),
        String::from_utf8(stderr).expect("utf-8 stderr"),
    )
}

#[rstest]
#[case::help(&["--help"], "Usage")]
#[case::version(&["--version"], env!("CARGO_PKG_VERSION"))]
fn informational_flags_print_to_stdout(#[case] args: &[&str], #[case] expected: &str) {
    let (code, stdout, stderr) = invoke(args);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains(expected), "stdout was: {stdout}");
    assert!(stderr.is_empty());
}

#[rstest]
fn unknown_flag_is_a_configuration_error() {
    let (code, _, stderr) = invoke(&["--no-such-flag", "--", "true"]);
    assert_eq!(code, ExitCode::from(EXIT_CONFIG));
    assert!(stderr.contains("--no-such-flag"));
}

#[rstest]
fn missing_entry_is_reported_with_its_phase() {
    let (code, stdout, stderr) = invoke(&["--check"]);
    assert_eq!(code, ExitCode::from(EXIT_CONFIG));
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("launchpad: ENV_CONFIGURED failed"), "stderr was: {stderr}");
}

#[rstest]
fn check_prints_the_plan_without_launching() {
    let (code, stdout, _) = invoke(&[
        "--check",
        "--env",
        "GREETING=hello",
        "--wait-for",
        "127.0.0.1:9",
        "--",
        "false",
    ]);
    assert_eq!(code, ExitCode::SUCCESS);
    let plan: serde_json::Value = serde_json::from_str(&stdout).expect("plan is json");
    assert_eq!(plan["entry"]["program"], "false");
    assert_eq!(plan["environment"]["GREETING"], "hello");
    assert_eq!(plan["readiness"]["targets"][0], "tcp://127.0.0.1:9");
}
