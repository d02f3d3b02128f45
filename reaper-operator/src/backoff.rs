//! Requeue delays per failure class.

use std::time::Duration;

/// How a failure should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Object store unreachable, timeouts, unexpected not-found.
    Transient,
    /// Bad or missing configuration. Needs an operator to act.
    Configuration,
    /// The schema job failed.
    TaskFailed,
    /// Create, update or owner reference failed.
    Persistence,
}

/// Requeue delays used by the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Polling delay while waiting for a job or a freshly created object.
    pub short: Duration,
    /// Delay after a create, update or delete was issued.
    pub standard: Duration,
    /// Delay after a transient error.
    pub transient: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5),
            standard: Duration::from_secs(10),
            transient: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Requeue delay for a failure class, `None` when retrying cannot help.
    pub fn delay_for(&self, class: FailureClass) -> Option<Duration> {
        match class {
            FailureClass::Transient | FailureClass::Persistence => Some(self.transient),
            FailureClass::TaskFailed => Some(self.standard),
            FailureClass::Configuration => None,
        }
    }
}
