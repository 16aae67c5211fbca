/// Realtime notification subsystem
///
/// Topic-based publish/subscribe client for the procurement dashboard:
/// - `service`: the `NotificationService` facade consumers talk to
/// - `registry`: topic → subscriber callbacks
/// - `classify`: message type → topic rules
/// - `transport`: live WebSocket and simulated transports, reconnection
/// - `simulator`: synthetic statistics and notifications for degraded mode
/// - `health`: backend probe deciding when to return to live
pub mod classify;
pub mod credentials;
pub mod health;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod service;
pub mod simulator;
pub mod transport;

pub use classify::{classify, delivery_topics};
pub use credentials::{CredentialStore, FileCredentials, MemoryCredentials, NoCredentials};
pub use health::{BackendHealthChecker, HealthProbe, HealthStatus};
pub use message::{NotificationMessage, OutboundEnvelope, RealtimeMessage, StatisticsUpdate, Topic};
pub use metrics::{RealtimeMetrics, RealtimeMetricsSnapshot};
pub use registry::{Subscription, SubscriptionId, TopicRegistry};
pub use service::{ConnectionStatus, NotificationService, NotificationServiceBuilder};
pub use transport::{ConnectionState, TransportKind};
