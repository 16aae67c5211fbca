/// Realtime message schema - topics, inbound messages and outbound envelopes
///
/// Inbound frames are JSON objects carrying at least a `type` field. Every
/// field that is not part of the typed model is kept in `extra` so consumers
/// see the frame untouched.
use crate::errors::{RealtimeError, RealtimeResult};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// TOPIC ENUM
// ============================================================================

/// Topics produced by message classification
///
/// Consumers subscribe with plain strings; these are the names the
/// classifier can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    PurchaseRequests,
    Approvals,
    PurchaseOrders,
    Workflow,
    DashboardStatistics,
    DashboardUpdates,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::PurchaseRequests,
        Topic::Approvals,
        Topic::PurchaseOrders,
        Topic::Workflow,
        Topic::DashboardStatistics,
        Topic::DashboardUpdates,
    ];

    /// Topic name used for subscriptions
    pub fn code(&self) -> &'static str {
        match self {
            Topic::PurchaseRequests => "purchase-requests",
            Topic::Approvals => "approvals",
            Topic::PurchaseOrders => "purchase-orders",
            Topic::Workflow => "workflow",
            Topic::DashboardStatistics => "dashboard-statistics",
            Topic::DashboardUpdates => "dashboard-updates",
        }
    }

    /// Parse topic from its subscription name
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "purchase-requests" => Some(Topic::PurchaseRequests),
            "approvals" => Some(Topic::Approvals),
            "purchase-orders" => Some(Topic::PurchaseOrders),
            "workflow" => Some(Topic::Workflow),
            "dashboard-statistics" => Some(Topic::DashboardStatistics),
            "dashboard-updates" => Some(Topic::DashboardUpdates),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        self.code()
    }
}

// ============================================================================
// INBOUND MESSAGES
// ============================================================================

/// A unit of inbound data (request, approval, order or workflow event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    /// Event category tag, e.g. `PURCHASE_REQUEST_CREATED`
    #[serde(rename = "type", default)]
    pub message_type: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,

    /// Shape depends on `message_type`
    #[serde(default)]
    pub data: Value,

    /// ISO 8601, not monotonic across transport swaps
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,

    /// Advisory verb tag (created/approved/rejected)
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,

    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,

    /// Fields outside the model, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A statistics tick: named aggregate fields for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsUpdate {
    #[serde(rename = "type", default)]
    pub message_type: String,

    pub statistics: Map<String, Value>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text field that also accepts `null` (empty) and scalars (their JSON text)
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

impl StatisticsUpdate {
    /// Numeric statistic by name (`totalRequests`, `pendingRequests`, ...)
    pub fn stat_i64(&self, name: &str) -> Option<i64> {
        self.statistics.get(name).and_then(Value::as_i64)
    }
}

/// Any inbound message after parsing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RealtimeMessage {
    Statistics(StatisticsUpdate),
    Notification(NotificationMessage),
}

impl RealtimeMessage {
    /// Parse a raw text frame
    pub fn from_frame(text: &str) -> RealtimeResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a message from a JSON value
    ///
    /// Only objects are accepted. A `STATISTICS` type with an object
    /// `statistics` field becomes a `StatisticsUpdate`; everything else is a
    /// `NotificationMessage` (a missing `type` reads as empty).
    pub fn from_value(value: Value) -> RealtimeResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RealtimeError::MalformedFrame(format!("expected a JSON object, got {}", kind_of(&value))))?;

        if let Some(kind) = object.get("type") {
            if !kind.is_string() {
                return Err(RealtimeError::MalformedFrame(format!(
                    "`type` must be a string, got {}",
                    kind_of(kind)
                )));
            }
        }

        let is_statistics = object
            .get("type")
            .and_then(Value::as_str)
            .map_or(false, |kind| kind.contains("STATISTICS"))
            && object.get("statistics").map_or(false, Value::is_object);

        if is_statistics {
            Ok(RealtimeMessage::Statistics(serde_json::from_value(value)?))
        } else {
            Ok(RealtimeMessage::Notification(serde_json::from_value(value)?))
        }
    }

    /// The `type` tag used for classification
    pub fn message_type(&self) -> &str {
        match self {
            RealtimeMessage::Statistics(update) => &update.message_type,
            RealtimeMessage::Notification(notification) => &notification.message_type,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            RealtimeMessage::Statistics(update) => &update.timestamp,
            RealtimeMessage::Notification(notification) => &notification.timestamp,
        }
    }

    pub fn as_statistics(&self) -> Option<&StatisticsUpdate> {
        match self {
            RealtimeMessage::Statistics(update) => Some(update),
            RealtimeMessage::Notification(_) => None,
        }
    }

    pub fn as_notification(&self) -> Option<&NotificationMessage> {
        match self {
            RealtimeMessage::Notification(notification) => Some(notification),
            RealtimeMessage::Statistics(_) => None,
        }
    }

    /// JSON view of the message, including pass-through fields
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<StatisticsUpdate> for RealtimeMessage {
    fn from(update: StatisticsUpdate) -> Self {
        RealtimeMessage::Statistics(update)
    }
}

impl From<NotificationMessage> for RealtimeMessage {
    fn from(notification: NotificationMessage) -> Self {
        RealtimeMessage::Notification(notification)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// OUTBOUND ENVELOPE
// ============================================================================

/// Outbound message: destination plus serialized body with a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub destination: String,

    /// JSON-serialized payload
    pub body: String,
}

impl OutboundEnvelope {
    /// Wrap a payload, stamping it with the current time
    ///
    /// Object payloads get the send time as `timestamp` (replacing any value
    /// already there); other values are wrapped as
    /// `{"payload": <value>, "timestamp": ...}`.
    pub fn new(destination: impl Into<String>, payload: Value) -> RealtimeResult<Self> {
        let mut body = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("payload".to_string(), other);
                map
            }
        };
        body.insert("timestamp".to_string(), Value::String(now_iso()));

        Ok(Self {
            destination: destination.into(),
            body: serde_json::to_string(&body)?,
        })
    }

    /// Keep-alive envelope
    pub fn heartbeat(destination: &str) -> RealtimeResult<Self> {
        Self::new(destination, serde_json::json!({ "type": "HEARTBEAT" }))
    }

    /// Server-side topic subscription request sent after the socket opens
    pub fn subscribe(destination: &str) -> RealtimeResult<Self> {
        Self::new(destination, serde_json::json!({ "action": "subscribe" }))
    }

    /// Wire representation sent as one text frame
    pub fn to_json(&self) -> RealtimeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parsed body
    pub fn body_value(&self) -> RealtimeResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Current UTC time as an ISO 8601 string with milliseconds
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_codes() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_code(topic.code()), Some(topic));
        }
        assert_eq!(Topic::from_code("nope"), None);
        assert_eq!(Topic::DashboardStatistics.to_string(), "dashboard-statistics");
    }

    #[test]
    fn test_notification_passes_unknown_fields_through() {
        let msg = RealtimeMessage::from_value(json!({
            "type": "PURCHASE_REQUEST_CREATED",
            "title": "New request",
            "message": "Laptop",
            "data": { "id": 42 },
            "timestamp": "2024-03-01T10:00:00.000Z",
            "action": "CREATED",
            "userId": 7,
            "department": "IT"
        }))
        .unwrap();

        let notification = msg.as_notification().unwrap();
        assert_eq!(notification.message_type, "PURCHASE_REQUEST_CREATED");
        assert_eq!(notification.data["id"], 42);
        assert_eq!(notification.user_id, Some(json!(7)));
        assert_eq!(notification.extra.get("department"), Some(&json!("IT")));

        let value = msg.to_value();
        assert_eq!(value["department"], "IT");
        assert_eq!(value["userId"], 7);
    }

    #[test]
    fn test_null_and_scalar_fields_are_tolerated() {
        let msg = RealtimeMessage::from_frame(
            r#"{"type":"WORKFLOW_UPDATE","title":null,"message":"m","action":null,"priority":3}"#,
        )
        .unwrap();
        let notification = msg.as_notification().unwrap();
        assert_eq!(notification.title, "");
        assert_eq!(notification.action, "");
        assert_eq!(notification.message, "m");
        assert_eq!(notification.priority.as_deref(), Some("3"));

        let msg = RealtimeMessage::from_value(json!({
            "type": "APPROVAL_UPDATE",
            "timestamp": 1709287200000u64,
            "title": true
        }))
        .unwrap();
        assert_eq!(msg.timestamp(), "1709287200000");
        assert_eq!(msg.as_notification().unwrap().title, "true");

        let msg = RealtimeMessage::from_value(json!({
            "type": "STATISTICS_UPDATE",
            "statistics": { "totalRequests": 3 },
            "timestamp": null
        }))
        .unwrap();
        assert_eq!(msg.as_statistics().unwrap().stat_i64("totalRequests"), Some(3));
        assert_eq!(msg.timestamp(), "");
    }

    #[test]
    fn test_statistics_detection() {
        let msg = RealtimeMessage::from_value(json!({
            "type": "STATISTICS_UPDATE",
            "statistics": { "totalRequests": 127 },
            "timestamp": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(msg.as_statistics().unwrap().stat_i64("totalRequests"), Some(127));

        // STATISTICS type without a statistics object stays a notification
        let msg = RealtimeMessage::from_value(json!({ "type": "STATISTICS_UPDATE" })).unwrap();
        assert!(msg.as_notification().is_some());
    }

    #[test]
    fn test_malformed_frames() {
        assert!(RealtimeMessage::from_frame("{not json").is_err());
        assert!(matches!(
            RealtimeMessage::from_frame("[1, 2]"),
            Err(RealtimeError::MalformedFrame(_))
        ));
        assert!(matches!(
            RealtimeMessage::from_value(json!({ "type": 5 })),
            Err(RealtimeError::MalformedFrame(_))
        ));

        let untyped = RealtimeMessage::from_frame(r#"{"title":"hello"}"#).unwrap();
        assert_eq!(untyped.message_type(), "");
    }

    #[test]
    fn test_envelope_adds_timestamp() {
        let envelope = OutboundEnvelope::new("/app/approve", json!({ "id": 1 })).unwrap();
        let body = envelope.body_value().unwrap();
        assert_eq!(body["id"], 1);
        assert!(body["timestamp"].is_string());

        let stamped = OutboundEnvelope::new("/app/approve", json!({ "timestamp": "old" })).unwrap();
        let body = stamped.body_value().unwrap();
        assert_ne!(body["timestamp"], "old");

        let wrapped = OutboundEnvelope::new("/app/echo", json!("ping")).unwrap();
        let body = wrapped.body_value().unwrap();
        assert_eq!(body["payload"], "ping");

        let wire: Value = serde_json::from_str(&wrapped.to_json().unwrap()).unwrap();
        assert_eq!(wire["destination"], "/app/echo");
        assert!(wire["body"].is_string());
    }
}
