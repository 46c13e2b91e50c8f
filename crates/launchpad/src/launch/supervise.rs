//! Supervised launch: spawn, forward termination signals, reap.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::thread;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use signal_hook::iterator::Signals;
use tracing::{debug, info, warn};

use super::{LAUNCH_TARGET, LaunchFailure, PreparedCommand};
use crate::errors::EXIT_SOFTWARE;
use crate::signals::{TERMINATION_SIGNALS, signal_exit_code};

/// Runs `command` as a child and returns its exit status as a shell would.
pub(super) fn run(command: &PreparedCommand, running: &dyn Fn(u32)) -> Result<u8, LaunchFailure> {
    let program = command.program();
    // Register before spawning so a signal arriving in between is not lost.
    let mut signals =
        Signals::new(TERMINATION_SIGNALS).map_err(|source| LaunchFailure::SignalForwarding {
            program: program.to_owned(),
            source,
        })?;
    let handle = signals.handle();

    let mut child = match command.to_command().spawn() {
        Ok(child) => child,
        Err(error) => {
            handle.close();
            return Err(LaunchFailure::from_exec(program, error));
        }
    };
    let pid = child.id();
    running(pid);

    let forwarder = thread::spawn(move || {
        for signal in signals.forever() {
            forward(pid, signal);
        }
    });

    let waited = child.wait();
    handle.close();
    if forwarder.join().is_err() {
        warn!(target: LAUNCH_TARGET, pid, "signal forwarder panicked");
    }

    let status = waited.map_err(|source| LaunchFailure::Wait {
        program: program.to_owned(),
        source,
    })?;
    let code = exit_code(status);
    info!(target: LAUNCH_TARGET, pid, exit_code = code, "entry process exited");
    Ok(code)
}

fn forward(pid: u32, signal: i32) {
    let (Ok(raw_pid), Ok(signal)) = (i32::try_from(pid), Signal::try_from(signal)) else {
        return;
    };
    debug!(target: LAUNCH_TARGET, pid, signal = %signal, "forwarding signal to entry process");
    if let Err(error) = kill(Pid::from_raw(raw_pid), signal) {
        warn!(
            target: LAUNCH_TARGET,
            pid,
            signal = %signal,
            error = %error,
            "failed to forward signal"
        );
    }
}

fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(EXIT_SOFTWARE);
    }
    status.signal().map_or(EXIT_SOFTWARE, signal_exit_code)
}
