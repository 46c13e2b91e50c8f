//! Binary entrypoint for the `launchpad` container entry process.
//!
//! Delegates to [`launchpad::run`]. The standard streams are passed unlocked:
//! in supervise mode the signal forwarder logs from its own thread while the
//! main thread is blocked waiting on the child.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    launchpad::run(std::env::args_os(), &mut io::stdout(), &mut io::stderr())
}
