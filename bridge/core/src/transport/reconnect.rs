//! Reconnect State Machine
//!
//! Both socket loops follow the same lifecycle:
//!
//! ```text
//!            ┌──────────── success ───────────┐
//!            │                                ▼
//!      ┌────────────┐                  ┌────────────┐
//!  ───▶│ Connecting │                  │ Subscribed │
//!      └────────────┘                  └────────────┘
//!            ▲  │ failure                     │ closed / error
//!            │  ▼                             │
//!      ┌──────────────┐◀────────────────────┘
//!      │ Disconnected │  sleep backoff, then Connecting
//!      └──────────────┘
//! ```
//!
//! Retries never stop. The sleep grows exponentially with consecutive
//! failures up to a cap, and a successful connection resets it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff settings for a reconnect loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay after the first failure (milliseconds)
    pub initial_backoff_ms: u64,
    /// Upper bound on the delay (milliseconds)
    pub max_backoff_ms: u64,
    /// Growth factor per consecutive failure
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter
    pub use_jitter: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 250,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay
    #[must_use]
    pub fn with_initial_backoff_ms(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub fn with_max_backoff_ms(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Delay before retry `attempt` (0-based)
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = base.min(self.max_backoff_ms as f64);

        let duration_ms = if self.use_jitter {
            // Up to 25% extra
            let jitter = rand::random::<f64>() * 0.25;
            (capped * (1.0 + jitter)) as u64
        } else {
            capped as u64
        };

        Duration::from_millis(duration_ms)
    }
}

/// Connection lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// Opening the socket (and subscribing, for the feed)
    Connecting,
    /// Connected and streaming
    Subscribed,
    /// Waiting out the backoff before the next attempt
    Disconnected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Tracks one socket's lifecycle and failure count
#[derive(Debug)]
pub struct Link {
    name: &'static str,
    policy: ReconnectPolicy,
    state: LinkState,
    failures: u32,
}

impl Link {
    /// Create a link in the `Connecting` state
    #[must_use]
    pub fn new(name: &'static str, policy: ReconnectPolicy) -> Self {
        Self {
            name,
            policy,
            state: LinkState::Connecting,
            failures: 0,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Consecutive failures since the last success
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Start a new attempt
    pub fn connecting(&mut self) {
        self.transition(LinkState::Connecting);
    }

    /// Record a successful connection
    pub fn connected(&mut self) {
        self.failures = 0;
        self.transition(LinkState::Subscribed);
    }

    /// Record a failure or closure, returning how long to wait
    pub fn disconnected(&mut self) -> Duration {
        let delay = self.policy.backoff_for_attempt(self.failures);
        self.failures = self.failures.saturating_add(1);
        self.transition(LinkState::Disconnected);
        delay
    }

    fn transition(&mut self, next: LinkState) {
        if self.state != next {
            tracing::debug!(link = self.name, from = %self.state, to = %next, "Link state change");
        }
        self.state = next;
    }
}
