/// Configuration schemas - every config structure defined once with defaults
///
/// All intervals are milliseconds. Defaults match the backend shipped with
/// the dashboard (`localhost:8080`).
use crate::config_struct;
use std::time::Duration;

// ============================================================================
// LIVE TRANSPORT
// ============================================================================

config_struct! {
    /// WebSocket connection to the backend
    pub struct LiveTransportConfig {
        /// WebSocket endpoint (ws:// or wss://)
        url: String = "ws://localhost:8080/websocket".to_string(),

        /// Give up on a single handshake after this long
        connect_timeout_ms: u64 = 10_000,

        /// Keep-alive period while connected
        heartbeat_interval_ms: u64 = 30_000,

        /// Destination for keep-alive envelopes
        heartbeat_destination: String = "/app/heartbeat".to_string(),

        /// Server-side subscriptions requested right after the socket opens
        subscribe_destinations: Vec<String> = vec![
            "/app/subscribe/purchase-requests".to_string(),
            "/app/subscribe/dashboard".to_string(),
            "/app/subscribe/approvals".to_string(),
            "/app/subscribe/purchase-orders".to_string(),
        ],

        /// File holding the bearer token written at login (none = unauthenticated)
        token_file: Option<String> = None,
    }
}

impl LiveTransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

// ============================================================================
// RECONNECTION
// ============================================================================

config_struct! {
    /// Retry policy for the live transport (linear backoff, capped)
    pub struct ReconnectConfig {
        /// Failed connection attempts before giving up on the live transport
        max_attempts: u32 = 5,

        /// Delay after the first failure; attempt N waits N x base
        base_delay_ms: u64 = 5_000,

        /// Upper bound for any single retry delay
        max_delay_ms: u64 = 30_000,
    }
}

// ============================================================================
// SIMULATION
// ============================================================================

config_struct! {
    /// Simulated transport (degraded mode data source)
    pub struct SimulationConfig {
        /// Delay before the simulated transport reports itself connected
        startup_delay_ms: u64 = 1_000,

        /// Period of synthetic statistics ticks
        statistics_interval_ms: u64 = 30_000,

        /// Period of synthetic notifications
        notification_interval_ms: u64 = 45_000,

        /// Fixed RNG seed for reproducible output
        seed: Option<u64> = None,
    }
}

impl SimulationConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn statistics_interval(&self) -> Duration {
        Duration::from_millis(self.statistics_interval_ms)
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_millis(self.notification_interval_ms)
    }
}

// ============================================================================
// BACKEND HEALTH
// ============================================================================

config_struct! {
    /// Backend health probe, used to upgrade from simulated back to live
    pub struct HealthConfig {
        url: String = "http://localhost:8080/actuator/health".to_string(),
        timeout_ms: u64 = 3_000,

        /// Probe periodically while degraded and reconnect when healthy
        upgrade_enabled: bool = true,
        upgrade_check_interval_ms: u64 = 30_000,
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn upgrade_check_interval(&self) -> Duration {
        Duration::from_millis(self.upgrade_check_interval_ms)
    }
}

// ============================================================================
// NOTIFICATION SERVICE
// ============================================================================

config_struct! {
    /// Notification service (facade) configuration
    pub struct RealtimeConfig {
        /// Transport used on start: "live" or "simulated"
        initial_transport: String = "live".to_string(),

        /// Switch to the simulated transport once live reconnection is exhausted
        fallback_enabled: bool = true,

        /// Replay the last statistics snapshot to new statistics subscribers
        replay_statistics: bool = true,

        /// Mirror every classified message to the general dashboard topic
        broadcast_to_general: bool = true,

        live: LiveTransportConfig = LiveTransportConfig::default(),
        reconnect: ReconnectConfig = ReconnectConfig::default(),
        simulation: SimulationConfig = SimulationConfig::default(),
        health: HealthConfig = HealthConfig::default(),
    }
}

impl RealtimeConfig {
    /// Reject values that would make timers or retries misbehave
    pub fn validate(&self) -> Result<(), String> {
        match self.initial_transport.as_str() {
            "live" | "simulated" => {}
            other => {
                return Err(format!(
                    "initial_transport must be \"live\" or \"simulated\", got \"{}\"",
                    other
                ))
            }
        }

        let url = url::Url::parse(&self.live.url)
            .map_err(|e| format!("live.url '{}' is invalid: {}", self.live.url, e))?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(format!(
                "live.url must use ws:// or wss://, got '{}'",
                self.live.url
            ));
        }

        if self.reconnect.max_attempts == 0 {
            return Err("reconnect.max_attempts must be > 0".to_string());
        }
        if self.reconnect.base_delay_ms == 0 {
            return Err("reconnect.base_delay_ms must be > 0".to_string());
        }
        if self.reconnect.max_delay_ms < self.reconnect.base_delay_ms {
            return Err("reconnect.max_delay_ms must be >= reconnect.base_delay_ms".to_string());
        }

        let intervals = [
            ("live.connect_timeout_ms", self.live.connect_timeout_ms),
            ("live.heartbeat_interval_ms", self.live.heartbeat_interval_ms),
            ("simulation.statistics_interval_ms", self.simulation.statistics_interval_ms),
            ("simulation.notification_interval_ms", self.simulation.notification_interval_ms),
            ("health.timeout_ms", self.health.timeout_ms),
            ("health.upgrade_check_interval_ms", self.health.upgrade_check_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(format!("{} must be > 0", name));
            }
        }

        Ok(())
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration file structure
    pub struct Config {
        realtime: RealtimeConfig = RealtimeConfig::default(),
    }
}
