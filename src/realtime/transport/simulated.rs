/// Simulated transport - no network, timer-driven synthetic data
///
/// After a short startup delay it reports itself connected, emits the
/// baseline statistics once, then emits statistics ticks and notifications
/// on independent intervals. It never fails and never disconnects on its own.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use crate::config::SimulationConfig;
use crate::errors::{RealtimeError, RealtimeResult};
use crate::logger::{self, LogTag};
use crate::realtime::message::OutboundEnvelope;
use crate::realtime::simulator::Simulator;

use super::{runtime_handle, ConnectionState, EventSink, Transport, TransportKind};

/// Envelopes kept by `sent_messages`; older ones are discarded
const SENT_HISTORY_LIMIT: usize = 32;

struct SimSession {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
    connected: Arc<AtomicBool>,
}

pub struct SimulatedTransport {
    config: SimulationConfig,
    session: Mutex<Option<SimSession>>,

    /// Most recent envelopes accepted by `send` (nothing leaves the process)
    sent: Mutex<VecDeque<OutboundEnvelope>>,
    sent_total: AtomicU64,
}

impl SimulatedTransport {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
            sent: Mutex::new(VecDeque::with_capacity(SENT_HISTORY_LIMIT)),
            sent_total: AtomicU64::new(0),
        }
    }

    /// Latest envelopes recorded as sent, oldest first
    pub fn sent_messages(&self) -> Vec<OutboundEnvelope> {
        self.sent.lock().iter().cloned().collect()
    }

    /// Envelopes accepted since construction
    pub fn sent_count(&self) -> u64 {
        self.sent_total.load(Ordering::Relaxed)
    }
}

impl Transport for SimulatedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Simulated
    }

    fn connect(&self, sink: EventSink) -> RealtimeResult<()> {
        let mut session = self.session.lock();
        if session.as_ref().map_or(false, |s| !s.handle.is_finished()) {
            return Ok(());
        }

        let runtime = runtime_handle()?;
        let shutdown = Arc::new(Notify::new());
        let connected = Arc::new(AtomicBool::new(false));

        let handle = runtime.spawn(run(
            self.config.clone(),
            connected.clone(),
            shutdown.clone(),
            sink.for_source(TransportKind::Simulated),
        ));

        *session = Some(SimSession {
            handle,
            shutdown,
            connected,
        });
        Ok(())
    }

    fn send(&self, envelope: &OutboundEnvelope) -> RealtimeResult<()> {
        if !self.is_connected() {
            return Err(RealtimeError::NotConnected {
                transport: TransportKind::Simulated.to_string(),
            });
        }

        logger::debug(
            LogTag::Simulator,
            &format!("Simulated send to {}: {}", envelope.destination, envelope.body),
        );
        let mut sent = self.sent.lock();
        if sent.len() == SENT_HISTORY_LIMIT {
            sent.pop_front();
        }
        sent.push_back(envelope.clone());
        self.sent_total.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(session) = self.session.lock().take() {
            session.connected.store(false, Ordering::SeqCst);
            session.shutdown.notify_one();
            logger::info(LogTag::Simulator, "Simulated transport disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map_or(false, |s| s.connected.load(Ordering::SeqCst))
    }

    fn is_running(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map_or(false, |s| !s.handle.is_finished())
    }

    fn connection_state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else if self.is_running() {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }
}

async fn run(
    config: SimulationConfig,
    connected: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    sink: EventSink,
) {
    tokio::select! {
        _ = shutdown.notified() => return,
        _ = sleep(config.startup_delay()) => {}
    }

    let mut simulator = Simulator::new(config.seed);
    connected.store(true, Ordering::SeqCst);
    sink.connected();
    logger::info(LogTag::Simulator, "Simulated transport connected");

    sink.frame(simulator.snapshot_update().into());

    let stats_period = config.statistics_interval();
    let notification_period = config.notification_interval();
    let mut stats_timer = interval_at(Instant::now() + stats_period, stats_period);
    let mut notification_timer =
        interval_at(Instant::now() + notification_period, notification_period);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                connected.store(false, Ordering::SeqCst);
                sink.disconnected("simulated transport stopped");
                return;
            }
            _ = stats_timer.tick() => {
                simulator.advance_statistics();
                logger::debug(
                    LogTag::Simulator,
                    &format!(
                        "Statistics tick (total={}, pending={})",
                        simulator.statistics().total_requests,
                        simulator.statistics().pending_requests
                    ),
                );
                sink.frame(simulator.snapshot_update().into());
            }
            _ = notification_timer.tick() => {
                let notification = simulator.next_notification();
                logger::debug(
                    LogTag::Simulator,
                    &format!("Notification {}", notification.message_type),
                );
                sink.frame(notification.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::transport::TransportEvent;
    use serde_json::json;
    use std::time::Duration;

    fn fast_config() -> SimulationConfig {
        SimulationConfig {
            startup_delay_ms: 1_000,
            statistics_interval_ms: 30_000,
            notification_interval_ms: 45_000,
            seed: Some(11),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_after_startup_delay_and_emits_baseline() {
        let transport = SimulatedTransport::new(fast_config());
        let (sink, mut rx) = EventSink::channel(TransportKind::Simulated);

        transport.connect(sink).unwrap();
        assert!(transport.is_running());
        assert!(!transport.is_connected());

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, TransportEvent::Connected));
        assert_eq!(first.source, TransportKind::Simulated);
        assert!(transport.is_connected());

        match rx.recv().await.unwrap().event {
            TransportEvent::Frame(message) => {
                assert_eq!(message.as_statistics().unwrap().stat_i64("totalRequests"), Some(127));
            }
            other => panic!("expected baseline frame, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_independent_intervals() {
        let transport = SimulatedTransport::new(fast_config());
        let (sink, mut rx) = EventSink::channel(TransportKind::Simulated);
        transport.connect(sink).unwrap();

        // connected + baseline
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        // t=31s: statistics tick
        let tick = rx.recv().await.unwrap();
        match tick.event {
            TransportEvent::Frame(message) => assert!(message.as_statistics().is_some()),
            other => panic!("unexpected {:?}", other),
        }

        // t=46s: notification
        let note = rx.recv().await.unwrap();
        match note.event {
            TransportEvent::Frame(message) => assert!(message.as_notification().is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_is_idempotent_and_disconnect_stops() {
        let transport = SimulatedTransport::new(fast_config());
        let (sink, mut rx) = EventSink::channel(TransportKind::Simulated);
        transport.connect(sink.clone()).unwrap();
        transport.connect(sink).unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let mut connected_events = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event.event, TransportEvent::Connected) {
                connected_events += 1;
            }
        }
        assert_eq!(connected_events, 1);

        transport.disconnect();
        assert!(!transport.is_connected());
        assert_eq!(transport.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_only_when_connected() {
        let transport = SimulatedTransport::new(fast_config());
        let envelope = OutboundEnvelope::new("/app/test", json!({ "x": 1 })).unwrap();

        assert!(matches!(
            transport.send(&envelope),
            Err(RealtimeError::NotConnected { .. })
        ));
        assert!(transport.sent_messages().is_empty());

        let (sink, mut rx) = EventSink::channel(TransportKind::Simulated);
        transport.connect(sink).unwrap();
        rx.recv().await.unwrap();

        transport.send(&envelope).unwrap();
        assert_eq!(transport.sent_messages().len(), 1);
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sent_history_is_bounded() {
        let transport = SimulatedTransport::new(fast_config());
        let (sink, mut rx) = EventSink::channel(TransportKind::Simulated);
        transport.connect(sink).unwrap();
        rx.recv().await.unwrap();

        let total = SENT_HISTORY_LIMIT as u64 * 100;
        for i in 0..total {
            let envelope = OutboundEnvelope::new("/app/test", json!({ "seq": i })).unwrap();
            transport.send(&envelope).unwrap();
        }

        let sent = transport.sent_messages();
        assert_eq!(sent.len(), SENT_HISTORY_LIMIT);
        assert_eq!(transport.sent_count(), total);
        let last = sent.last().unwrap().body_value().unwrap();
        assert_eq!(last["seq"], total - 1);
        let first = sent[0].body_value().unwrap();
        assert_eq!(first["seq"], total - SENT_HISTORY_LIMIT as u64);
    }

    #[test]
    fn test_connect_without_runtime() {
        let transport = SimulatedTransport::new(fast_config());
        let (sink, _rx) = EventSink::channel(TransportKind::Simulated);
        assert!(matches!(
            transport.connect(sink),
            Err(RealtimeError::RuntimeUnavailable)
        ));
    }
}
