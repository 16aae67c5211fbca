use thiserror::Error;

/// Errors raised inside the realtime client
///
/// These stay internal to transports and tooling. The notification service
/// facade logs them and degrades instead of returning them to callers.
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Connection to {endpoint} failed: {reason}")] ConnectionFailed {
        endpoint: String,
        reason: String,
    },

    #[error("Connection to {endpoint} timed out after {timeout_ms}ms")] ConnectionTimeout {
        endpoint: String,
        timeout_ms: u64,
    },

    #[error("Invalid endpoint '{url}': {reason}")] InvalidEndpoint {
        url: String,
        reason: String,
    },

    #[error("{transport} transport is not connected")] NotConnected {
        transport: String,
    },

    #[error("Malformed frame: {0}")] MalformedFrame(String),

    #[error("No tokio runtime available to drive the transport")] RuntimeUnavailable,

    #[error("Health check failed: {0}")] HealthCheck(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),
}

impl RealtimeError {
    /// Whether retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            RealtimeError::ConnectionFailed { .. } => true,
            RealtimeError::ConnectionTimeout { .. } => true,
            RealtimeError::NotConnected { .. } => true,
            RealtimeError::HealthCheck(_) => true,
            RealtimeError::Io(_) => true,
            _ => false,
        }
    }
}

pub type RealtimeResult<T> = Result<T, RealtimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let err = RealtimeError::ConnectionTimeout {
            endpoint: "ws://localhost:8080/websocket".to_string(),
            timeout_ms: 10_000,
        };
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Connection to ws://localhost:8080/websocket timed out after 10000ms"
        );

        assert!(!RealtimeError::RuntimeUnavailable.is_recoverable());
        assert!(!RealtimeError::InvalidEndpoint {
            url: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: RealtimeError = parse.unwrap_err().into();
        assert!(matches!(err, RealtimeError::Serialization(_)));
    }
}
