//! Linear reconnect backoff.

use std::time::Duration;

/// Reconnect delay policy for the upstream link.
///
/// The delay grows by the base amount after every failed or closed
/// attempt: 1×, 2×, 3×, … base. There is no cap and the delay is never
/// reset on a successful reconnect: after k failures the kth retry
/// waits exactly `k × base`, however long the process has been up.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    failures: u32,
}

impl ReconnectBackoff {
    /// Creates a policy with the given base delay.
    pub fn new(base: Duration) -> Self {
        Self { base, failures: 0 }
    }

    /// Records a failed or closed attempt and returns the delay before
    /// the next dial.
    pub fn next_delay(&mut self) -> Duration {
        self.failures += 1;
        self.base * self.failures
    }

    /// Number of failed or closed attempts recorded so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
