/// Transport adapters - interchangeable sources of inbound messages
///
/// Two variants sit behind the `Transport` trait:
/// - `LiveTransport`: WebSocket connection with heartbeat and reconnection
/// - `SimulatedTransport`: local timer-driven synthetic data, never fails
///
/// Transports push everything they observe into an `EventSink`; the
/// notification service consumes the other end of the channel.
pub mod live;
pub mod reconnect;
pub mod simulated;

use std::fmt;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::errors::{RealtimeError, RealtimeResult};

use super::message::{OutboundEnvelope, RealtimeMessage};

pub use live::LiveTransport;
pub use reconnect::{ConnectionState, ReconnectController, ReconnectDecision, ReconnectPolicy};
pub use simulated::SimulatedTransport;

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Live,
    Simulated,
}

impl TransportKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::Live => "live",
            TransportKind::Simulated => "simulated",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "live" => Some(TransportKind::Live),
            "simulated" => Some(TransportKind::Simulated),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Common contract of the live and simulated transports
///
/// All methods return immediately; network and timer work runs on tasks
/// spawned by `connect`.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Start the transport, delivering events to `sink`
    ///
    /// No-op while the transport is already running (connected or retrying).
    fn connect(&self, sink: EventSink) -> RealtimeResult<()>;

    /// Send one envelope; `NotConnected` when there is no open connection
    fn send(&self, envelope: &OutboundEnvelope) -> RealtimeResult<()>;

    /// Stop the transport and cancel its timers
    fn disconnect(&self);

    /// Connection state at call time
    fn is_connected(&self) -> bool;

    /// A task is driving the transport (connected, connecting or retrying)
    fn is_running(&self) -> bool;

    fn connection_state(&self) -> ConnectionState;
}

/// Handle of the runtime that will drive transport tasks
pub(crate) fn runtime_handle() -> RealtimeResult<Handle> {
    Handle::try_current().map_err(|_| RealtimeError::RuntimeUnavailable)
}

// ============================================================================
// EVENTS
// ============================================================================

/// What a transport observed
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Frame(RealtimeMessage),
    Disconnected { reason: String },
    /// Live reconnection budget used up
    Exhausted { attempts: u32 },
}

/// An event tagged with the transport that produced it
#[derive(Debug, Clone)]
pub struct SourcedEvent {
    pub source: TransportKind,
    pub event: TransportEvent,
}

/// Sending half of the transport → service channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SourcedEvent>,
    source: TransportKind,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<SourcedEvent>, source: TransportKind) -> Self {
        Self { tx, source }
    }

    /// Fresh channel, mostly for driving a transport on its own
    pub fn channel(source: TransportKind) -> (Self, mpsc::UnboundedReceiver<SourcedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, source), rx)
    }

    /// Same channel, different source tag
    pub fn for_source(&self, source: TransportKind) -> Self {
        Self::new(self.tx.clone(), source)
    }

    pub fn source(&self) -> TransportKind {
        self.source
    }

    pub fn connected(&self) {
        self.emit(TransportEvent::Connected);
    }

    pub fn frame(&self, message: RealtimeMessage) {
        self.emit(TransportEvent::Frame(message));
    }

    pub fn disconnected(&self, reason: impl Into<String>) {
        self.emit(TransportEvent::Disconnected {
            reason: reason.into(),
        });
    }

    pub fn exhausted(&self, attempts: u32) {
        self.emit(TransportEvent::Exhausted { attempts });
    }

    /// Receiver gone means the service stopped listening; nothing to do
    fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(SourcedEvent {
            source: self.source,
            event,
        });
    }
}
