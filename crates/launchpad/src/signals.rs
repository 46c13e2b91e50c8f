//! Termination signal handling.
//!
//! As process 1 of a container the launcher receives `SIGTERM` from the
//! runtime. While waiting on dependencies the signal only sets a flag, so the
//! readiness loop can notice it between attempts and exit instead of leaving an
//! orphaned retry loop behind.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use tracing::debug;

/// Signals that abort the readiness wait and are forwarded to supervised children.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

const PAUSE_SLICE: Duration = Duration::from_millis(50);
const SIGNALS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::signals");

/// Shared record of the first termination signal received.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    signal: Arc<AtomicUsize>,
}

/// Returned when a termination signal interrupted a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled {
    /// Signal number that was delivered.
    pub signal: i32,
}

impl Cancellation {
    /// A cancellation token that only trips through [`Self::cancel`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers [`TERMINATION_SIGNALS`] so delivery trips this token.
    ///
    /// # Errors
    ///
    /// Returns the OS error when a handler cannot be installed.
    pub fn install() -> io::Result<Self> {
        let cancellation = Self::new();
        for signal in TERMINATION_SIGNALS {
            let value = usize::try_from(signal)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "negative signal"))?;
            signal_hook::flag::register_usize(signal, Arc::clone(&cancellation.signal), value)?;
        }
        debug!(
            target: SIGNALS_TARGET,
            signals = ?TERMINATION_SIGNALS,
            "termination handlers installed"
        );
        Ok(cancellation)
    }

    /// Records `signal` as if it had been delivered.
    pub fn cancel(&self, signal: i32) {
        let value = usize::try_from(signal).unwrap_or_default();
        self.signal.store(value, Ordering::SeqCst);
    }

    /// Signal received so far, if any.
    #[must_use]
    pub fn received(&self) -> Option<i32> {
        match self.signal.load(Ordering::SeqCst) {
            0 => None,
            value => i32::try_from(value).ok(),
        }
    }

    /// Fails when a termination signal has been received.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] carrying the received signal.
    pub fn ensure_active(&self) -> Result<(), Cancelled> {
        match self.received() {
            Some(signal) => Err(Cancelled { signal }),
            None => Ok(()),
        }
    }

    /// Sleeps for `duration`, waking early when a signal arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] as soon as a termination signal is observed.
    pub fn pause(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now() + duration;
        loop {
            self.ensure_active()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }
}

/// Exit status conventionally reported for death by `signal`.
#[must_use]
pub fn signal_exit_code(signal: i32) -> u8 {
    u8::try_from(128 + signal).unwrap_or(u8::MAX)
}
