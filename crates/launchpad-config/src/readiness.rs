use std::time::Duration;

use crate::defaults::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RETRY_INTERVAL};
use crate::target::ReadinessTarget;

/// Which endpoints gate the launch and how long to keep trying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    targets: Vec<ReadinessTarget>,
    timeout: Option<Duration>,
    interval: Duration,
    connect_timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            timeout: None,
            interval: DEFAULT_RETRY_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ReadinessPolicy {
    /// Builds a policy gating on `targets` with default timings and no deadline.
    #[must_use]
    pub fn new(targets: Vec<ReadinessTarget>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    /// Sets the overall deadline; `None` retries indefinitely.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the upper bound of a single connection attempt.
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Endpoints to probe, in order.
    #[must_use]
    pub fn targets(&self) -> &[ReadinessTarget] {
        &self.targets
    }

    /// Overall deadline shared by every target.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Pause between failed attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound of a single connection attempt.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns true when at least one target gates the launch.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.targets.is_empty()
    }
}
