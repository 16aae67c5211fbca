/// Reconnection controller for the live transport
///
/// State machine:
/// - `Disconnected → Connecting`: start, or drop detected
/// - `Connecting → Connected`: socket opened, attempt counter reset
/// - `Connecting → Connecting`: failure with budget left, retry after a
///   linear, capped delay
/// - `Connecting → Exhausted`: failure number `max_attempts` (terminal)
///
/// The controller only decides. The transport driver owns the single retry
/// timer, so starting a new attempt can never leave a second one pending.
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::ReconnectConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Exhausted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Exhausted => "exhausted",
        };
        write!(f, "{}", label)
    }
}

/// Retry budget and backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based): `min(base × attempt, max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&ReconnectConfig::default())
    }
}

/// What the driver should do after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
}

#[derive(Debug)]
pub struct ReconnectController {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
}

impl ReconnectController {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failed attempts in the current run
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// A connection attempt is starting
    ///
    /// From `Exhausted` this starts a fresh run with a full budget.
    pub fn begin_attempt(&mut self) {
        if self.state == ConnectionState::Exhausted {
            self.attempts = 0;
        }
        self.state = ConnectionState::Connecting;
    }

    /// The socket opened
    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.state = ConnectionState::Connected;
    }

    /// A connection attempt failed or an open connection dropped
    pub fn on_failure(&mut self) -> ReconnectDecision {
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts >= self.policy.max_attempts {
            self.state = ConnectionState::Exhausted;
            ReconnectDecision::Exhausted {
                attempts: self.attempts,
            }
        } else {
            self.state = ConnectionState::Connecting;
            ReconnectDecision::Retry {
                attempt: self.attempts,
                delay: self.policy.delay_for(self.attempts),
            }
        }
    }

    /// Explicit disconnect: stop retrying and forget the run
    pub fn stop(&mut self) {
        self.attempts = 0;
        self.state = ConnectionState::Disconnected;
    }
}
