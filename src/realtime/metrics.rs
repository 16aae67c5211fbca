use serde::Serialize;
/// Realtime client metrics
///
/// Counters shared by the transports and the notification service.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Client-wide metrics (thread-safe)
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    messages_dispatched: AtomicU64,
    callback_failures: AtomicU64,
    messages_sent: AtomicU64,
    sends_dropped: AtomicU64,
    heartbeats_sent: AtomicU64,
    connection_attempts: AtomicU64,
    fallbacks: AtomicU64,
    upgrades: AtomicU64,
}

impl RealtimeMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inbound frame accepted from a transport
    pub fn inc_frames_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Inbound frame dropped (malformed JSON or not an object)
    pub fn inc_frames_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Callback deliveries, successful and failed
    pub fn record_dispatch(&self, delivered: usize, failed: usize) {
        self.messages_dispatched
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.callback_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn inc_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Send attempted while disconnected
    pub fn inc_sends_dropped(&self) {
        self.sends_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_heartbeats_sent(&self) {
        self.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_connection_attempts(&self) {
        self.connection_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Switched from live to simulated
    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Switched from simulated back to live
    pub fn inc_upgrades(&self) {
        self.upgrades.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RealtimeMetricsSnapshot {
        RealtimeMetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            sends_dropped: self.sends_dropped.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            upgrades: self.upgrades.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot (serializable)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RealtimeMetricsSnapshot {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub messages_dispatched: u64,
    pub callback_failures: u64,
    pub messages_sent: u64,
    pub sends_dropped: u64,
    pub heartbeats_sent: u64,
    pub connection_attempts: u64,
    pub fallbacks: u64,
    pub upgrades: u64,
}
