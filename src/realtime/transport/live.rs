/// Live transport - WebSocket connection to the backend
///
/// One driver task per `connect` owns the socket, the heartbeat timer and
/// the single pending retry timer. Connection failures and drops go through
/// the `ReconnectController`; when it reports exhaustion the driver emits
/// `Exhausted` and stops.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::LiveTransportConfig;
use crate::errors::{RealtimeError, RealtimeResult};
use crate::logger::{self, LogTag};
use crate::realtime::credentials::CredentialStore;
use crate::realtime::message::{OutboundEnvelope, RealtimeMessage};
use crate::realtime::metrics::RealtimeMetrics;

use super::{
    runtime_handle, ConnectionState, EventSink, ReconnectController, ReconnectDecision,
    ReconnectPolicy, Transport, TransportKind,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State shared between the transport handle and one driver task
struct SessionState {
    connected: AtomicBool,
    controller: Mutex<ReconnectController>,
    /// Writer queue of the open socket (None while not connected)
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

struct LiveSession {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
    state: Arc<SessionState>,
}

/// Why an open session ended
enum SessionEnd {
    Shutdown,
    Dropped(String),
}

pub struct LiveTransport {
    config: LiveTransportConfig,
    policy: ReconnectPolicy,
    credentials: Arc<dyn CredentialStore>,
    metrics: Arc<RealtimeMetrics>,
    session: Mutex<Option<LiveSession>>,
}

impl LiveTransport {
    pub fn new(
        config: LiveTransportConfig,
        policy: ReconnectPolicy,
        credentials: Arc<dyn CredentialStore>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            config,
            policy,
            credentials,
            metrics,
            session: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Failed attempts in the current run
    pub fn reconnect_attempts(&self) -> u32 {
        self.session
            .lock()
            .as_ref()
            .map_or(0, |s| s.state.controller.lock().attempts())
    }
}

impl Transport for LiveTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Live
    }

    fn connect(&self, sink: EventSink) -> RealtimeResult<()> {
        let mut session = self.session.lock();
        if session.as_ref().map_or(false, |s| !s.handle.is_finished()) {
            logger::debug(LogTag::Transport, "Live transport already running, connect ignored");
            return Ok(());
        }

        let runtime = runtime_handle()?;
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(SessionState {
            connected: AtomicBool::new(false),
            controller: Mutex::new(ReconnectController::new(self.policy)),
            outbound: Mutex::new(None),
        });

        let driver = Driver {
            config: self.config.clone(),
            credentials: self.credentials.clone(),
            metrics: self.metrics.clone(),
            state: state.clone(),
            shutdown: shutdown.clone(),
            sink: sink.for_source(TransportKind::Live),
        };
        let handle = runtime.spawn(driver.run());

        *session = Some(LiveSession {
            handle,
            shutdown,
            state,
        });
        Ok(())
    }

    fn send(&self, envelope: &OutboundEnvelope) -> RealtimeResult<()> {
        let not_connected = || RealtimeError::NotConnected {
            transport: TransportKind::Live.to_string(),
        };

        let session = self.session.lock();
        let state = session.as_ref().map(|s| s.state.clone()).ok_or_else(not_connected)?;
        drop(session);

        if !state.connected.load(Ordering::SeqCst) {
            return Err(not_connected());
        }

        let text = envelope.to_json()?;
        let outbound = state.outbound.lock();
        match outbound.as_ref() {
            Some(tx) => tx.send(Message::Text(text)).map_err(|_| not_connected()),
            None => Err(not_connected()),
        }
    }

    fn disconnect(&self) {
        if let Some(session) = self.session.lock().take() {
            session.state.connected.store(false, Ordering::SeqCst);
            *session.state.outbound.lock() = None;
            session.state.controller.lock().stop();
            session.shutdown.notify_one();
            logger::info(
                LogTag::Transport,
                &format!("Live transport to {} disconnected", self.config.url),
            );
        }
    }

    fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map_or(false, |s| s.state.connected.load(Ordering::SeqCst))
    }

    fn is_running(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map_or(false, |s| !s.handle.is_finished())
    }

    fn connection_state(&self) -> ConnectionState {
        self.session
            .lock()
            .as_ref()
            .map_or(ConnectionState::Disconnected, |s| s.state.controller.lock().state())
    }
}

// ============================================================================
// DRIVER TASK
// ============================================================================

struct Driver {
    config: LiveTransportConfig,
    credentials: Arc<dyn CredentialStore>,
    metrics: Arc<RealtimeMetrics>,
    state: Arc<SessionState>,
    shutdown: Arc<Notify>,
    sink: EventSink,
}

impl Driver {
    async fn run(self) {
        loop {
            self.state.controller.lock().begin_attempt();
            self.metrics.inc_connection_attempts();
            logger::info(
                LogTag::Transport,
                &format!("Connecting to {}", self.config.url),
            );

            let opened = tokio::select! {
                _ = self.shutdown.notified() => return,
                result = open_socket(&self.config, self.credentials.as_ref()) => result,
            };

            let reason = match opened {
                Ok(socket) => match self.run_session(socket).await {
                    SessionEnd::Shutdown => {
                        self.sink.disconnected("disconnect requested");
                        return;
                    }
                    SessionEnd::Dropped(reason) => {
                        logger::warning(
                            LogTag::Transport,
                            &format!("Connection to {} lost: {}", self.config.url, reason),
                        );
                        self.sink.disconnected(reason.clone());
                        reason
                    }
                },
                Err(e) => {
                    logger::warning(LogTag::Transport, &e.to_string());
                    e.to_string()
                }
            };

            let decision = self.state.controller.lock().on_failure();
            match decision {
                ReconnectDecision::Retry { attempt, delay } => {
                    logger::info(
                        LogTag::Reconnect,
                        &format!(
                            "Reconnecting ({}/{}) in {}ms after: {}",
                            attempt,
                            self.state.controller.lock().policy().max_attempts,
                            delay.as_millis(),
                            reason
                        ),
                    );
                    tokio::select! {
                        _ = self.shutdown.notified() => return,
                        _ = sleep(delay) => {}
                    }
                }
                ReconnectDecision::Exhausted { attempts } => {
                    logger::error(
                        LogTag::Reconnect,
                        &format!(
                            "Max reconnection attempts reached ({}), live transport unavailable",
                            attempts
                        ),
                    );
                    self.sink.exhausted(attempts);
                    return;
                }
            }
        }
    }

    /// Drive one open socket until it drops or shutdown is requested
    async fn run_session(&self, socket: Socket) -> SessionEnd {
        let (mut write, mut read) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

        *self.state.outbound.lock() = Some(out_tx);
        self.state.controller.lock().on_open();
        self.state.connected.store(true, Ordering::SeqCst);
        logger::info(
            LogTag::Transport,
            &format!("Connected to {}", self.config.url),
        );
        self.sink.connected();

        let end = self.session_loop(&mut write, &mut read, &mut out_rx).await;

        self.state.connected.store(false, Ordering::SeqCst);
        *self.state.outbound.lock() = None;
        if let SessionEnd::Shutdown = end {
            let _ = write.send(Message::Close(None)).await;
        }
        end
    }

    async fn session_loop<W, R>(
        &self,
        write: &mut W,
        read: &mut R,
        out_rx: &mut mpsc::UnboundedReceiver<Message>,
    ) -> SessionEnd
    where
        W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
        R: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        for destination in &self.config.subscribe_destinations {
            let text = match OutboundEnvelope::subscribe(destination).and_then(|e| e.to_json()) {
                Ok(text) => text,
                Err(e) => {
                    logger::error(LogTag::Transport, &format!("Subscribe envelope failed: {}", e));
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(text)).await {
                return SessionEnd::Dropped(format!("subscribe to {} failed: {}", destination, e));
            }
        }

        let period = self.config.heartbeat_interval();
        let mut heartbeat = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => return SessionEnd::Shutdown,

                _ = heartbeat.tick() => {
                    let text = match OutboundEnvelope::heartbeat(&self.config.heartbeat_destination)
                        .and_then(|e| e.to_json())
                    {
                        Ok(text) => text,
                        Err(e) => {
                            logger::error(LogTag::Transport, &format!("Heartbeat envelope failed: {}", e));
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(text)).await {
                        return SessionEnd::Dropped(format!("send failed: {}", e));
                    }
                    self.metrics.inc_heartbeats_sent();
                    logger::debug(LogTag::Transport, "Heartbeat sent");
                }

                Some(message) = out_rx.recv() => {
                    if let Err(e) = write.send(message).await {
                        return SessionEnd::Dropped(format!("send failed: {}", e));
                    }
                }

                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => self.handle_frame(&text),
                        Err(_) => self.drop_frame("binary frame is not UTF-8"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("closed by server ({})", f.code))
                            .unwrap_or_else(|| "closed by server".to_string());
                        return SessionEnd::Dropped(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                    None => return SessionEnd::Dropped("stream ended".to_string()),
                },
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        logger::verbose(LogTag::Transport, &format!("Frame: {}", text));
        match RealtimeMessage::from_frame(text) {
            Ok(message) => self.sink.frame(message),
            Err(e) => self.drop_frame(&e.to_string()),
        }
    }

    fn drop_frame(&self, reason: &str) {
        self.metrics.inc_frames_dropped();
        logger::warning(
            LogTag::Transport,
            &format!("Dropped inbound frame: {}", reason),
        );
    }
}

/// Open the socket, attaching the bearer token when one is available
async fn open_socket(
    config: &LiveTransportConfig,
    credentials: &dyn CredentialStore,
) -> RealtimeResult<Socket> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| RealtimeError::InvalidEndpoint {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

    if let Some(token) = credentials.bearer_token() {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            RealtimeError::ConnectionFailed {
                endpoint: config.url.clone(),
                reason: format!("invalid bearer token: {}", e),
            }
        })?;
        request.headers_mut().insert("Authorization", value);
    }

    match timeout(config.connect_timeout(), connect_async(request)).await {
        Ok(Ok((socket, _response))) => Ok(socket),
        Ok(Err(e)) => Err(RealtimeError::ConnectionFailed {
            endpoint: config.url.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Err(RealtimeError::ConnectionTimeout {
            endpoint: config.url.clone(),
            timeout_ms: config.connect_timeout_ms,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::credentials::{MemoryCredentials, NoCredentials};
    use crate::realtime::transport::{SourcedEvent, TransportEvent};
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[derive(Clone, Default)]
    struct ServerBehavior {
        frames: Vec<String>,
        close_after_frames: bool,
    }

    struct TestServer {
        url: String,
        accepts: Arc<AtomicUsize>,
        auth_headers: Arc<Mutex<Vec<Option<String>>>>,
        received: Arc<Mutex<Vec<String>>>,
    }

    impl TestServer {
        fn received_destinations(&self) -> Vec<String> {
            self.received
                .lock()
                .iter()
                .filter_map(|text| serde_json::from_str::<Value>(text).ok())
                .filter_map(|v| v["destination"].as_str().map(str::to_string))
                .collect()
        }
    }

    async fn spawn_server(behavior: ServerBehavior) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepts = Arc::new(AtomicUsize::new(0));
        let auth_headers = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));

        let (accepts_c, auth_c, received_c) = (accepts.clone(), auth_headers.clone(), received.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepts_c.fetch_add(1, Ordering::SeqCst);
                let auth = auth_c.clone();
                let received = received_c.clone();
                let behavior = behavior.clone();

                tokio::spawn(async move {
                    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                        let header = req
                            .headers()
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        auth.lock().push(header);
                        Ok(resp)
                    };
                    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
                        return;
                    };

                    for frame in &behavior.frames {
                        let _ = ws.send(Message::Text(frame.clone())).await;
                    }
                    if behavior.close_after_frames {
                        let _ = ws.close(None).await;
                        return;
                    }

                    while let Some(Ok(message)) = ws.next().await {
                        if let Message::Text(text) = message {
                            received.lock().push(text);
                        }
                    }
                });
            }
        });

        TestServer {
            url: format!("ws://{}/websocket", addr),
            accepts,
            auth_headers,
            received,
        }
    }

    fn transport(url: &str, credentials: Arc<dyn CredentialStore>, policy: ReconnectPolicy) -> LiveTransport {
        let config = LiveTransportConfig {
            url: url.to_string(),
            connect_timeout_ms: 2_000,
            ..LiveTransportConfig::default()
        };
        LiveTransport::new(config, policy, credentials, RealtimeMetrics::new())
    }

    fn quick_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        }
    }

    async fn next_event(rx: &mut UnboundedReceiver<SourcedEvent>) -> TransportEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("event channel closed")
            .event
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met in time");
    }

    async fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("ws://{}/websocket", addr)
    }

    #[tokio::test]
    async fn test_handshake_carries_bearer_token_and_subscribes() {
        let server = spawn_server(ServerBehavior::default()).await;
        let credentials = Arc::new(MemoryCredentials::with_token("secret-token"));
        let live = transport(&server.url, credentials, quick_policy(3));
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        assert!(live.is_connected());
        assert_eq!(live.connection_state(), ConnectionState::Connected);

        assert_eq!(
            server.auth_headers.lock().clone(),
            vec![Some("Bearer secret-token".to_string())]
        );

        wait_until(|| server.received_destinations().len() >= 4).await;
        assert_eq!(
            server.received_destinations(),
            LiveTransportConfig::default().subscribe_destinations
        );

        live.disconnect();
        assert!(!live.is_connected());
    }

    #[tokio::test]
    async fn test_unauthenticated_without_token() {
        let server = spawn_server(ServerBehavior::default()).await;
        let live = transport(&server.url, Arc::new(NoCredentials), quick_policy(3));
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        assert_eq!(server.auth_headers.lock().clone(), vec![None]);
        live.disconnect();
    }

    #[tokio::test]
    async fn test_malformed_frames_are_dropped() {
        let server = spawn_server(ServerBehavior {
            frames: vec![
                "{not json".to_string(),
                "[1,2,3]".to_string(),
                json!({ "type": "PURCHASE_REQUEST_CREATED", "title": "Laptop" }).to_string(),
            ],
            close_after_frames: false,
        })
        .await;
        let metrics = RealtimeMetrics::new();
        let live = LiveTransport::new(
            LiveTransportConfig {
                url: server.url.clone(),
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            metrics.clone(),
        );
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        match next_event(&mut rx).await {
            TransportEvent::Frame(message) => {
                assert_eq!(message.message_type(), "PURCHASE_REQUEST_CREATED")
            }
            other => panic!("expected frame, got {:?}", other),
        }

        assert_eq!(metrics.snapshot().frames_dropped, 2);
        assert!(live.is_connected());
        live.disconnect();
    }

    #[tokio::test]
    async fn test_frames_with_null_or_numeric_fields_are_delivered() {
        let server = spawn_server(ServerBehavior {
            frames: vec![
                json!({ "type": "WORKFLOW_UPDATE", "title": null, "message": "m", "action": null })
                    .to_string(),
                json!({ "type": "APPROVAL_UPDATE", "title": 5, "timestamp": 1709287200000u64 })
                    .to_string(),
            ],
            close_after_frames: false,
        })
        .await;
        let metrics = RealtimeMetrics::new();
        let live = LiveTransport::new(
            LiveTransportConfig {
                url: server.url.clone(),
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            metrics.clone(),
        );
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));

        let mut types = Vec::new();
        for _ in 0..2 {
            match next_event(&mut rx).await {
                TransportEvent::Frame(message) => types.push(message.message_type().to_string()),
                other => panic!("expected frame, got {:?}", other),
            }
        }
        assert_eq!(types, vec!["WORKFLOW_UPDATE", "APPROVAL_UPDATE"]);
        assert_eq!(metrics.snapshot().frames_dropped, 0);
        live.disconnect();
    }

    #[tokio::test]
    async fn test_connect_twice_opens_one_socket_and_one_heartbeat() {
        let server = spawn_server(ServerBehavior::default()).await;
        let metrics = RealtimeMetrics::new();
        let live = LiveTransport::new(
            LiveTransportConfig {
                url: server.url.clone(),
                heartbeat_interval_ms: 100,
                subscribe_destinations: Vec::new(),
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            metrics.clone(),
        );
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink.clone()).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        live.connect(sink.clone()).unwrap();
        live.connect(sink).unwrap();

        sleep(Duration::from_millis(550)).await;
        assert_eq!(server.accepts.load(Ordering::SeqCst), 1);

        let heartbeats = server
            .received_destinations()
            .iter()
            .filter(|d| d.as_str() == "/app/heartbeat")
            .count();
        assert!((3..=6).contains(&heartbeats), "heartbeats = {}", heartbeats);
        assert!(metrics.snapshot().heartbeats_sent as usize >= heartbeats);
        live.disconnect();
    }

    #[tokio::test]
    async fn test_send_reaches_server() {
        let server = spawn_server(ServerBehavior::default()).await;
        let live = LiveTransport::new(
            LiveTransportConfig {
                url: server.url.clone(),
                subscribe_destinations: Vec::new(),
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            RealtimeMetrics::new(),
        );

        let envelope = OutboundEnvelope::new("/app/approve", json!({ "requestId": 9 })).unwrap();
        assert!(matches!(live.send(&envelope), Err(RealtimeError::NotConnected { .. })));

        let (sink, mut rx) = EventSink::channel(TransportKind::Live);
        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));

        live.send(&envelope).unwrap();
        wait_until(|| server.received_destinations().contains(&"/app/approve".to_string())).await;
        live.disconnect();
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let url = closed_port_url().await;
        let metrics = RealtimeMetrics::new();
        let live = LiveTransport::new(
            LiveTransportConfig {
                url,
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            metrics.clone(),
        );
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        match next_event(&mut rx).await {
            TransportEvent::Exhausted { attempts } => assert_eq!(attempts, 3),
            other => panic!("expected exhaustion, got {:?}", other),
        }

        assert_eq!(live.connection_state(), ConnectionState::Exhausted);
        assert!(!live.is_connected());
        assert_eq!(metrics.snapshot().connection_attempts, 3);
        wait_until(|| !live.is_running()).await;
    }

    #[tokio::test]
    async fn test_reconnects_after_server_drop() {
        let server = spawn_server(ServerBehavior {
            frames: Vec::new(),
            close_after_frames: true,
        })
        .await;
        let live = transport(&server.url, Arc::new(NoCredentials), quick_policy(5));
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Disconnected { .. }));
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        assert!(server.accepts.load(Ordering::SeqCst) >= 2);
        live.disconnect();
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_retry() {
        let url = closed_port_url().await;
        let live = transport(
            &url,
            Arc::new(NoCredentials),
            ReconnectPolicy {
                max_attempts: 5,
                base_delay: Duration::from_secs(60),
                max_delay: Duration::from_secs(60),
            },
        );
        let (sink, _rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        wait_until(|| live.reconnect_attempts() == 1).await;
        assert!(live.is_running());

        live.disconnect();
        assert_eq!(live.connection_state(), ConnectionState::Disconnected);
        assert!(!live.is_running());
    }

    #[tokio::test]
    async fn test_disconnect_stops_heartbeat() {
        let server = spawn_server(ServerBehavior::default()).await;
        let metrics = RealtimeMetrics::new();
        let live = LiveTransport::new(
            LiveTransportConfig {
                url: server.url.clone(),
                heartbeat_interval_ms: 50,
                subscribe_destinations: Vec::new(),
                ..LiveTransportConfig::default()
            },
            quick_policy(3),
            Arc::new(NoCredentials),
            metrics.clone(),
        );
        let heartbeats_at_server = || {
            server
                .received_destinations()
                .iter()
                .filter(|d| d.as_str() == "/app/heartbeat")
                .count()
        };
        let (sink, mut rx) = EventSink::channel(TransportKind::Live);

        live.connect(sink).unwrap();
        assert!(matches!(next_event(&mut rx).await, TransportEvent::Connected));
        wait_until(|| heartbeats_at_server() >= 2).await;

        live.disconnect();
        sleep(Duration::from_millis(100)).await;
        let received = heartbeats_at_server();
        let sent = metrics.snapshot().heartbeats_sent;

        sleep(Duration::from_millis(400)).await;
        assert_eq!(heartbeats_at_server(), received);
        assert_eq!(metrics.snapshot().heartbeats_sent, sent);
        assert!(!live.is_connected());
    }

    #[test]
    fn test_connect_without_runtime() {
        let live = transport("ws://localhost:1/websocket", Arc::new(NoCredentials), quick_policy(1));
        let (sink, _rx) = EventSink::channel(TransportKind::Live);
        assert!(matches!(live.connect(sink), Err(RealtimeError::RuntimeUnavailable)));
    }
}
