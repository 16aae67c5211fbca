/// Notification service - the single entry point for consumers
///
/// Owns the topic registry and both transports, and holds which transport
/// is active. Inbound messages from the transports arrive on one channel,
/// are classified into a topic and fanned out to subscribers.
///
/// Transport swaps:
/// - live reconnection exhausted → simulated (degraded mode)
/// - live reports `Connected` while degraded → live again
///
/// Subscriptions live in the registry and are untouched by either swap.
/// None of the public operations return errors or panic.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

use crate::config::RealtimeConfig;
use crate::logger::{self, LogTag};

use super::classify::{classify, delivery_topics};
use super::credentials::{CredentialStore, FileCredentials, NoCredentials};
use super::health::{BackendHealthChecker, HealthProbe};
use super::message::{OutboundEnvelope, RealtimeMessage, Topic};
use super::metrics::{RealtimeMetrics, RealtimeMetricsSnapshot};
use super::registry::{Subscription, TopicRegistry};
use super::transport::{
    ConnectionState, EventSink, LiveTransport, ReconnectPolicy, SimulatedTransport, SourcedEvent,
    Transport, TransportEvent, TransportKind,
};

// ============================================================================
// CONNECTION STATUS
// ============================================================================

/// What the UI connection indicator shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Active transport
    pub mode: TransportKind,
    pub connected: bool,
    /// Live transport reconnection state
    pub reconnect_state: ConnectionState,
    /// Running on the simulated transport after a fallback
    pub degraded: bool,
}

impl ConnectionStatus {
    /// `live`, `simulated` or `offline`
    pub fn label(&self) -> &'static str {
        if self.connected {
            self.mode.label()
        } else {
            "offline"
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct NotificationServiceBuilder {
    config: RealtimeConfig,
    credentials: Option<Arc<dyn CredentialStore>>,
    health_probe: Option<Arc<dyn HealthProbe>>,
}

impl NotificationServiceBuilder {
    /// Bearer-token source for the live handshake
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Probe used to decide when to leave degraded mode
    pub fn health_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.health_probe = Some(probe);
        self
    }

    pub fn build(self) -> NotificationService {
        let config = self.config;
        let metrics = RealtimeMetrics::new();

        let credentials: Arc<dyn CredentialStore> = match (self.credentials, &config.live.token_file) {
            (Some(credentials), _) => credentials,
            (None, Some(path)) => Arc::new(FileCredentials::new(path)),
            (None, None) => Arc::new(NoCredentials),
        };
        let health_probe: Arc<dyn HealthProbe> = match self.health_probe {
            Some(probe) => probe,
            None => Arc::new(BackendHealthChecker::new(&config.health)),
        };

        let live = Arc::new(LiveTransport::new(
            config.live.clone(),
            ReconnectPolicy::from_config(&config.reconnect),
            credentials,
            metrics.clone(),
        ));
        let simulated = Arc::new(SimulatedTransport::new(config.simulation.clone()));

        let initial = initial_kind(&config);
        let active: Arc<dyn Transport> = match initial {
            TransportKind::Live => live.clone(),
            TransportKind::Simulated => simulated.clone(),
        };

        NotificationService {
            inner: Arc::new(ServiceInner {
                config,
                registry: TopicRegistry::new(),
                live,
                simulated,
                active: RwLock::new(active),
                degraded: AtomicBool::new(false),
                health_probe,
                metrics,
                last_statistics: Mutex::new(None),
                run: Mutex::new(None),
            }),
        }
    }
}

fn initial_kind(config: &RealtimeConfig) -> TransportKind {
    match TransportKind::from_label(&config.initial_transport) {
        Some(kind) => kind,
        None => {
            logger::warning(
                LogTag::Realtime,
                &format!(
                    "Unknown initial_transport '{}', using live",
                    config.initial_transport
                ),
            );
            TransportKind::Live
        }
    }
}

// ============================================================================
// NOTIFICATION SERVICE
// ============================================================================

/// Cheap to clone; clones share one service
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: RealtimeConfig,
    registry: Arc<TopicRegistry>,
    live: Arc<LiveTransport>,
    simulated: Arc<SimulatedTransport>,
    active: RwLock<Arc<dyn Transport>>,
    degraded: AtomicBool,
    health_probe: Arc<dyn HealthProbe>,
    metrics: Arc<RealtimeMetrics>,
    last_statistics: Mutex<Option<RealtimeMessage>>,
    run: Mutex<Option<RunState>>,
}

/// Tasks and channel of one started period (until `disconnect`)
struct RunState {
    events_tx: mpsc::UnboundedSender<SourcedEvent>,
    event_loop: JoinHandle<()>,
    upgrade_monitor: Option<JoinHandle<()>>,
}

impl NotificationService {
    /// Service with credentials from `live.token_file` and the HTTP health probe
    pub fn new(config: RealtimeConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: RealtimeConfig) -> NotificationServiceBuilder {
        NotificationServiceBuilder {
            config,
            credentials: None,
            health_probe: None,
        }
    }

    /// Register `callback` for `topic` and make sure the active transport runs
    ///
    /// Works before any transport has connected: the callback simply starts
    /// receiving once data flows. New statistics subscribers get the last
    /// known snapshot right away when one exists.
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> Subscription
    where
        F: Fn(&RealtimeMessage) + Send + Sync + 'static,
    {
        let inner = &self.inner;
        let id = inner.registry.register(topic, Arc::new(callback));
        let subscription = Subscription::new(&inner.registry, topic, id);

        inner.start();

        if inner.config.replay_statistics && topic == Topic::DashboardStatistics.code() {
            inner.replay_statistics(topic, id);
        }

        subscription
    }

    /// Send a message through the active transport
    ///
    /// While disconnected this only logs a warning: nothing is queued.
    pub fn send_message(&self, destination: &str, payload: Value) {
        let inner = &self.inner;
        let active = inner.active();

        if !active.is_connected() {
            inner.metrics.inc_sends_dropped();
            logger::warning(
                LogTag::Realtime,
                &format!("Not connected, message to {} not sent", destination),
            );
            return;
        }

        let envelope = match OutboundEnvelope::new(destination, payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                inner.metrics.inc_sends_dropped();
                logger::error(
                    LogTag::Realtime,
                    &format!("Message to {} not sent: {}", destination, e),
                );
                return;
            }
        };

        match active.send(&envelope) {
            Ok(()) => {
                inner.metrics.inc_messages_sent();
                logger::debug(
                    LogTag::Realtime,
                    &format!("Sent message to {} via {}", destination, active.kind()),
                );
            }
            Err(e) => {
                inner.metrics.inc_sends_dropped();
                logger::warning(
                    LogTag::Realtime,
                    &format!("Message to {} not sent: {}", destination, e),
                );
            }
        }
    }

    /// Active transport's connection state at call time
    pub fn is_connected(&self) -> bool {
        self.inner.active().is_connected()
    }

    /// Tear down transports, timers and dispatch
    ///
    /// Subscriptions stay registered; the next `subscribe` (or `start`)
    /// connects again using the configured initial transport.
    pub fn disconnect(&self) {
        self.inner.stop();
    }

    /// Start the configured initial transport without subscribing
    pub fn start(&self) {
        self.inner.start();
    }

    pub fn status(&self) -> ConnectionStatus {
        let active = self.inner.active();
        ConnectionStatus {
            mode: active.kind(),
            connected: active.is_connected(),
            reconnect_state: self.inner.live.connection_state(),
            degraded: self.inner.degraded.load(Ordering::SeqCst),
        }
    }

    /// Live transport reconnection state
    pub fn reconnect_state(&self) -> ConnectionState {
        self.inner.live.connection_state()
    }

    pub fn metrics(&self) -> RealtimeMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.registry.subscriber_count(topic)
    }

    /// Latest envelopes accepted by the simulated transport (bounded history)
    pub fn simulated_sent_messages(&self) -> Vec<OutboundEnvelope> {
        self.inner.simulated.sent_messages()
    }
}

impl ServiceInner {
    fn active(&self) -> Arc<dyn Transport> {
        self.active.read().clone()
    }

    fn transport(&self, kind: TransportKind) -> Arc<dyn Transport> {
        match kind {
            TransportKind::Live => self.live.clone(),
            TransportKind::Simulated => self.simulated.clone(),
        }
    }

    /// Ensure the event loop runs and the active transport is connecting
    fn start(self: &Arc<Self>) {
        {
            let mut run = self.run.lock();
            if run.is_none() {
                let runtime = match Handle::try_current() {
                    Ok(handle) => handle,
                    Err(_) => {
                        logger::warning(
                            LogTag::Realtime,
                            "No tokio runtime available, realtime transport not started",
                        );
                        return;
                    }
                };

                let (events_tx, events_rx) = mpsc::unbounded_channel();
                let event_loop = runtime.spawn(run_event_loop(Arc::downgrade(self), events_rx));
                *run = Some(RunState {
                    events_tx,
                    event_loop,
                    upgrade_monitor: None,
                });

                let initial = initial_kind(&self.config);
                *self.active.write() = self.transport(initial);
                self.degraded.store(false, Ordering::SeqCst);
                logger::info(
                    LogTag::Realtime,
                    &format!("Notification service started on {} transport", initial),
                );
            }
        }

        self.connect_transport(&self.active());
    }

    fn connect_transport(&self, transport: &Arc<dyn Transport>) {
        let Some(sink) = self.sink(transport.kind()) else {
            return;
        };
        if let Err(e) = transport.connect(sink) {
            logger::error(
                LogTag::Realtime,
                &format!("Failed to start {} transport: {}", transport.kind(), e),
            );
        }
    }

    fn sink(&self, kind: TransportKind) -> Option<EventSink> {
        self.run
            .lock()
            .as_ref()
            .map(|run| EventSink::new(run.events_tx.clone(), kind))
    }

    fn stop(&self) {
        if let Some(run) = self.run.lock().take() {
            run.event_loop.abort();
            if let Some(monitor) = run.upgrade_monitor {
                monitor.abort();
            }
            logger::info(LogTag::Realtime, "Notification service disconnected");
        }
        self.live.disconnect();
        self.simulated.disconnect();
        self.degraded.store(false, Ordering::SeqCst);
    }

    fn handle_event(self: &Arc<Self>, event: SourcedEvent) {
        let active_kind = self.active().kind();

        match event.event {
            TransportEvent::Frame(message) => {
                self.metrics.inc_frames_received();
                self.dispatch(message);
            }
            TransportEvent::Connected => {
                logger::info(
                    LogTag::Realtime,
                    &format!("{} transport connected", event.source),
                );
                if event.source == TransportKind::Live && active_kind == TransportKind::Simulated {
                    self.upgrade_to_live();
                }
            }
            TransportEvent::Disconnected { reason } => {
                logger::debug(
                    LogTag::Realtime,
                    &format!("{} transport disconnected: {}", event.source, reason),
                );
            }
            TransportEvent::Exhausted { attempts } => {
                if event.source != TransportKind::Live {
                    return;
                }
                if active_kind == TransportKind::Simulated {
                    logger::info(
                        LogTag::Realtime,
                        &format!("Live transport still unavailable after {} attempts, staying on simulated", attempts),
                    );
                } else if self.config.fallback_enabled {
                    self.fall_back_to_simulated(attempts);
                } else {
                    logger::error(
                        LogTag::Realtime,
                        &format!("Live transport exhausted after {} attempts and fallback is disabled, offline", attempts),
                    );
                }
            }
        }
    }

    /// Classify and fan out one inbound message
    fn dispatch(&self, message: RealtimeMessage) {
        let primary = classify(message.message_type());

        if primary == Topic::DashboardStatistics && message.as_statistics().is_some() {
            *self.last_statistics.lock() = Some(message.clone());
        }

        for topic in delivery_topics(primary, self.config.broadcast_to_general) {
            let outcome = self.registry.dispatch(topic.code(), &message);
            self.metrics.record_dispatch(outcome.delivered, outcome.failed);
        }
    }

    fn replay_statistics(self: &Arc<Self>, topic: &str, id: u64) {
        let Some(snapshot) = self.last_statistics.lock().clone() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            return;
        };

        let inner = Arc::downgrade(self);
        let topic = topic.to_string();
        runtime.spawn(async move {
            if let Some(inner) = inner.upgrade() {
                let outcome = inner.registry.deliver_to(&topic, id, &snapshot);
                inner.metrics.record_dispatch(outcome.delivered, outcome.failed);
            }
        });
    }

    fn fall_back_to_simulated(self: &Arc<Self>, attempts: u32) {
        logger::warning(
            LogTag::Realtime,
            &format!(
                "Live transport exhausted after {} attempts, switching to simulated transport",
                attempts
            ),
        );

        let simulated = self.transport(TransportKind::Simulated);
        *self.active.write() = simulated.clone();
        self.degraded.store(true, Ordering::SeqCst);
        self.metrics.inc_fallbacks();
        self.connect_transport(&simulated);

        if self.config.health.upgrade_enabled {
            self.start_upgrade_monitor();
        }
    }

    fn upgrade_to_live(&self) {
        *self.active.write() = self.transport(TransportKind::Live);
        self.degraded.store(false, Ordering::SeqCst);
        self.simulated.disconnect();
        self.metrics.inc_upgrades();

        if let Some(run) = self.run.lock().as_mut() {
            if let Some(monitor) = run.upgrade_monitor.take() {
                monitor.abort();
            }
        }

        logger::info(
            LogTag::Realtime,
            "Live backend reachable again, switched back to live transport",
        );
    }

    fn start_upgrade_monitor(self: &Arc<Self>) {
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let mut run = self.run.lock();
        let Some(run) = run.as_mut() else {
            return;
        };
        if run.upgrade_monitor.as_ref().map_or(false, |m| !m.is_finished()) {
            return;
        }

        run.upgrade_monitor = Some(runtime.spawn(run_upgrade_monitor(
            Arc::downgrade(self),
            self.health_probe.clone(),
            self.config.health.upgrade_check_interval(),
        )));
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_event_loop(inner: Weak<ServiceInner>, mut events: mpsc::UnboundedReceiver<SourcedEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle_event(event);
    }
}

/// While degraded, probe the backend and restart the live transport once healthy
async fn run_upgrade_monitor(inner: Weak<ServiceInner>, probe: Arc<dyn HealthProbe>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        let status = probe.check_health().await;

        let Some(inner) = inner.upgrade() else {
            return;
        };
        if inner.active().kind() != TransportKind::Simulated {
            return;
        }

        if !status.is_available {
            logger::debug(
                LogTag::Health,
                &format!("{} still unavailable: {}", probe.name(), status.message),
            );
            continue;
        }

        if !inner.live.is_running() {
            logger::info(
                LogTag::Health,
                &format!("{} ({}), retrying live transport", status.message, probe.name()),
            );
            let live = inner.transport(TransportKind::Live);
            inner.connect_transport(&live);
        }
    }
}
