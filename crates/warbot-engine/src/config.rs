//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WarConfig
// ---------------------------------------------------------------------------

/// Configuration for the war engine.
///
/// Injected once when the [`WarDesk`](crate::WarDesk) is built and shared
/// read-only by every ticket actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarConfig {
    /// Round wins needed to take the match.
    pub rounds_to_win: u32,

    /// Rounds played before a match with no winner is closed as unresolved.
    pub max_rounds: u32,

    /// Mailbox size of each ticket actor. Senders wait when it is full.
    pub command_buffer: usize,

    /// Capacity of the [`WarEvent`](crate::WarEvent) broadcast channel.
    pub event_buffer: usize,

    /// Seconds a ticket actor may sit idle before it stops. 0 = never.
    pub idle_timeout_secs: u64,

    /// Retry policy for score and cleanup writes.
    pub retry: RetryPolicy,

    /// Text posted into a thread when it is closed.
    pub closing_notice: String,
}

impl Default for WarConfig {
    fn default() -> Self {
        Self {
            rounds_to_win: 2,
            max_rounds: 3,
            command_buffer: 64,
            event_buffer: 256,
            idle_timeout_secs: 300,
            retry: RetryPolicy::default(),
            closing_notice: "This war has ended. The thread is now closed.".into(),
        }
    }
}

impl WarConfig {
    /// Checks the values that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.rounds_to_win == 0 {
            return Err(InvalidConfig::new("rounds_to_win", "must be > 0"));
        }
        if self.max_rounds < self.rounds_to_win {
            return Err(InvalidConfig::new(
                "max_rounds",
                format!("must be >= rounds_to_win ({})", self.rounds_to_win),
            ));
        }
        if self.command_buffer == 0 {
            return Err(InvalidConfig::new("command_buffer", "must be > 0"));
        }
        if self.event_buffer == 0 {
            return Err(InvalidConfig::new("event_buffer", "must be > 0"));
        }
        if self.retry.attempts == 0 {
            return Err(InvalidConfig::new("retry.attempts", "must be > 0"));
        }
        Ok(())
    }

    /// `None` when actors never time out.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How often a retryable write is attempted, with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; grows linearly after that.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 50,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// A configuration value that fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid config value for {field}: {reason}")]
pub struct InvalidConfig {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidConfig {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
