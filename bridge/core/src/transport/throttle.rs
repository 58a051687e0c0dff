//! Minimum spacing between display frames

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between successful sends
///
/// The wait before a send is `max(0, min_interval - elapsed)` where `elapsed`
/// is measured from the last successful send.
#[derive(Clone, Debug)]
pub struct SendThrottle {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl SendThrottle {
    /// Create a throttle; a zero interval never waits
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Configured interval
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time still to wait at `now`
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_sent {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleep until a send is allowed
    pub async fn wait(&self) {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }

    /// Record a successful send
    pub fn mark_sent(&mut self) {
        self.last_sent = Some(Instant::now());
    }
}
