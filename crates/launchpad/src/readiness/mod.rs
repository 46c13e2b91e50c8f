//! Dependency readiness gate.
//!
//! Blocks until every configured target accepts a connection. Targets are
//! probed in order and share a single deadline; without a deadline the gate
//! retries forever at a fixed interval, since starting the application against
//! a missing backend is worse than not starting it.

mod probe;

use std::io;
use std::time::{Duration, Instant};

use launchpad_config::{ReadinessPolicy, ReadinessTarget};
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::EXIT_UNAVAILABLE;
use crate::signals::{Cancellation, signal_exit_code};

pub use probe::{Probe, SocketProbe};

const READINESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::readiness");

// A zero timeout is rejected by `connect_timeout`; keep the final attempt at the
// deadline meaningful without extending the wait noticeably.
const MIN_CONNECT_BUDGET: Duration = Duration::from_millis(10);

/// Outcome of a successful readiness wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    /// Attempts needed per target, in probe order.
    pub attempts: Vec<(ReadinessTarget, u32)>,
    /// Wall-clock time spent waiting.
    pub elapsed: Duration,
}

impl Ready {
    /// Total connection attempts across all targets.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.attempts.iter().map(|(_, attempts)| attempts).sum()
    }
}

/// Errors raised by the readiness gate.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The deadline passed before the target accepted a connection.
    #[error("{target} unreachable after {timeout_ms} ms ({attempts} attempts): {last_error}")]
    Timeout {
        /// Target still unreachable at the deadline.
        target: ReadinessTarget,
        /// Configured deadline in milliseconds.
        timeout_ms: u64,
        /// Attempts made against this target.
        attempts: u32,
        /// Error reported by the final attempt.
        #[source]
        last_error: io::Error,
    },
    /// A termination signal interrupted the wait.
    #[error("interrupted by signal {signal} while waiting for {target}")]
    Cancelled {
        /// Target being waited on.
        target: ReadinessTarget,
        /// Signal number received.
        signal: i32,
    },
}

impl ReadinessError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Timeout { .. } => EXIT_UNAVAILABLE,
            Self::Cancelled { signal, .. } => signal_exit_code(*signal),
        }
    }
}

/// Waits until every target in `policy` accepts a connection.
///
/// A target that refuses the first `N` attempts is reported ready on attempt
/// `N + 1`. With a timeout configured the call returns no later than one retry
/// interval (plus one minimal connection attempt) after the deadline.
///
/// # Errors
///
/// Returns [`ReadinessError::Timeout`] when the deadline passes and
/// [`ReadinessError::Cancelled`] when a termination signal is received.
pub fn await_readiness<P, F>(
    probe: &P,
    policy: &ReadinessPolicy,
    cancellation: &Cancellation,
    mut on_ready: F,
) -> Result<Ready, ReadinessError>
where
    P: Probe + ?Sized,
    F: FnMut(&ReadinessTarget, u32),
{
    let started = Instant::now();
    let deadline = policy.timeout().map(|timeout| started + timeout);
    let mut attempts = Vec::with_capacity(policy.targets().len());
    for target in policy.targets() {
        let count = wait_for_target(probe, target, policy, deadline, cancellation)?;
        on_ready(target, count);
        attempts.push((target.clone(), count));
    }
    let ready = Ready {
        attempts,
        elapsed: started.elapsed(),
    };
    info!(
        target: READINESS_TARGET,
        targets = ready.attempts.len(),
        attempts = ready.total_attempts(),
        elapsed_ms = millis(ready.elapsed),
        "all readiness targets reachable"
    );
    Ok(ready)
}

fn wait_for_target<P>(
    probe: &P,
    target: &ReadinessTarget,
    policy: &ReadinessPolicy,
    deadline: Option<Instant>,
    cancellation: &Cancellation,
) -> Result<u32, ReadinessError>
where
    P: Probe + ?Sized,
{
    let cancelled = |signal| ReadinessError::Cancelled {
        target: target.clone(),
        signal,
    };
    let mut attempts = 0u32;
    loop {
        cancellation
            .ensure_active()
            .map_err(|interrupt| cancelled(interrupt.signal))?;
        attempts = attempts.saturating_add(1);
        let budget = connect_budget(policy.connect_timeout(), deadline);
        let error = match probe.connect(target, budget) {
            Ok(()) => return Ok(attempts),
            Err(error) => error,
        };
        debug!(
            target: READINESS_TARGET,
            endpoint = %target,
            attempt = attempts,
            error = %error,
            "readiness target not reachable yet"
        );
        let Some(pause) = next_pause(policy.interval(), deadline) else {
            return Err(ReadinessError::Timeout {
                target: target.clone(),
                timeout_ms: policy.timeout().map_or(0, millis),
                attempts,
                last_error: error,
            });
        };
        cancellation
            .pause(pause)
            .map_err(|interrupt| cancelled(interrupt.signal))?;
    }
}

fn connect_budget(connect_timeout: Duration, deadline: Option<Instant>) -> Duration {
    let bounded = match deadline {
        Some(deadline) => connect_timeout.min(deadline.saturating_duration_since(Instant::now())),
        None => connect_timeout,
    };
    bounded.max(MIN_CONNECT_BUDGET)
}

fn next_pause(interval: Duration, deadline: Option<Instant>) -> Option<Duration> {
    let Some(deadline) = deadline else {
        return Some(interval);
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return None;
    }
    Some(interval.min(remaining))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
