/// Message classification - maps a message `type` to exactly one topic
///
/// Rules are evaluated top to bottom, first match wins, and the general
/// dashboard topic catches everything else. Matching is a case-sensitive
/// substring test.
use super::message::Topic;

/// Ordered (keyword, topic) rules
const RULES: &[(&str, Topic)] = &[
    ("PURCHASE_REQUEST", Topic::PurchaseRequests),
    ("APPROVAL", Topic::Approvals),
    ("PURCHASE_ORDER", Topic::PurchaseOrders),
    ("WORKFLOW", Topic::Workflow),
    ("STATISTICS", Topic::DashboardStatistics),
];

/// Topic for messages no rule matches
pub const DEFAULT_TOPIC: Topic = Topic::DashboardUpdates;

/// Classify a message type into its primary topic
pub fn classify(message_type: &str) -> Topic {
    RULES
        .iter()
        .find(|(keyword, _)| message_type.contains(keyword))
        .map(|(_, topic)| *topic)
        .unwrap_or(DEFAULT_TOPIC)
}

/// Every topic a message is delivered to
///
/// The primary topic first, then the general topic when broadcasting is on
/// and the primary topic is not already the general one.
pub fn delivery_topics(primary: Topic, broadcast_to_general: bool) -> Vec<Topic> {
    let mut topics = vec![primary];
    if broadcast_to_general && primary != DEFAULT_TOPIC {
        topics.push(DEFAULT_TOPIC);
    }
    topics
}
