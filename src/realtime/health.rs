/// Backend health probe
///
/// Decides whether it is worth upgrading from the simulated transport back
/// to the live one. A 2xx response whose JSON body carries a `status` field
/// means the backend is available.
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{sleep, timeout, Duration};

use crate::config::HealthConfig;
use crate::errors::RealtimeError;
use crate::logger::{self, LogTag};

/// Result of one health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub is_available: bool,
    pub message: String,
    pub latency_ms: Option<u64>,
    pub last_checked: DateTime<Utc>,
}

impl HealthStatus {
    pub fn available(message: String, latency_ms: u64) -> Self {
        Self {
            is_available: true,
            message,
            latency_ms: Some(latency_ms),
            last_checked: Utc::now(),
        }
    }

    pub fn unavailable(message: String) -> Self {
        Self {
            is_available: false,
            message,
            latency_ms: None,
            last_checked: Utc::now(),
        }
    }
}

/// Anything that can tell whether the backend is reachable
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Perform one health check; never fails, failures are reported in the status
    async fn check_health(&self) -> HealthStatus;
}

// ============================================================================
// BACKEND HEALTH CHECKER
// ============================================================================

/// HTTP GET against the backend health endpoint
pub struct BackendHealthChecker {
    url: String,
    timeout: Duration,
    client: Option<reqwest::Client>,
    last_check: Mutex<Option<HealthStatus>>,
}

impl BackendHealthChecker {
    pub fn new(config: &HealthConfig) -> Self {
        let client = match reqwest::Client::builder().timeout(config.timeout()).build() {
            Ok(client) => Some(client),
            Err(e) => {
                logger::error(
                    LogTag::Health,
                    &format!("Failed to create HTTP client: {}", e),
                );
                None
            }
        };

        Self {
            url: config.url.clone(),
            timeout: config.timeout(),
            client,
            last_check: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Most recent result, if any check ran
    pub fn last_check(&self) -> Option<HealthStatus> {
        self.last_check.lock().clone()
    }

    /// Check repeatedly until the backend is available or attempts run out
    pub async fn wait_for_backend(&self, max_attempts: u32, delay: Duration) -> bool {
        for attempt in 1..=max_attempts {
            logger::info(
                LogTag::Health,
                &format!("Checking backend availability (attempt {}/{})", attempt, max_attempts),
            );

            let status = self.check_health().await;
            if status.is_available {
                logger::info(LogTag::Health, "Backend is available");
                return true;
            }

            if attempt < max_attempts {
                logger::info(
                    LogTag::Health,
                    &format!("Backend not ready ({}), waiting {}ms", status.message, delay.as_millis()),
                );
                sleep(delay).await;
            }
        }

        logger::warning(LogTag::Health, "Backend is not available after maximum attempts");
        false
    }

    async fn probe(&self) -> Result<HealthStatus, RealtimeError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| RealtimeError::HealthCheck("HTTP client unavailable".to_string()))?;

        let start = Instant::now();
        let response = match timeout(self.timeout, client.get(&self.url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Ok(HealthStatus::unavailable("Backend connection timeout".to_string()))
            }
            Ok(Err(e)) if e.is_connect() => {
                return Ok(HealthStatus::unavailable("Backend not running".to_string()))
            }
            Ok(Err(e)) => return Err(RealtimeError::HealthCheck(e.to_string())),
            Err(_) => return Ok(HealthStatus::unavailable("Backend connection timeout".to_string())),
        };

        let code = response.status();
        if !code.is_success() {
            return Ok(HealthStatus::unavailable(format!("Backend returned {}", code)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RealtimeError::HealthCheck(format!("invalid health body: {}", e)))?;
        let latency = start.elapsed().as_millis() as u64;

        match body.get("status") {
            Some(status) => {
                let status = status
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string());
                Ok(HealthStatus::available(format!("Backend is healthy ({})", status), latency))
            }
            None => Ok(HealthStatus::unavailable(format!(
                "Backend returned {} without a status field",
                code
            ))),
        }
    }
}

#[async_trait]
impl HealthProbe for BackendHealthChecker {
    fn name(&self) -> &str {
        "backend"
    }

    async fn check_health(&self) -> HealthStatus {
        let status = match self.probe().await {
            Ok(status) => status,
            Err(e) => HealthStatus::unavailable(format!("Backend error: {}", e)),
        };

        logger::debug(
            LogTag::Health,
            &format!("{} -> available={} ({})", self.url, status.is_available, status.message),
        );

        *self.last_check.lock() = Some(status.clone());
        status
    }
}
