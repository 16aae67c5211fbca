/// Topic registry - topic name to subscriber callbacks
///
/// Pure in-memory data structure, no I/O. Dispatch works on a snapshot of
/// the subscriber list so callbacks may subscribe or unsubscribe while a
/// message is being delivered.
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::logger::{self, LogTag};

use super::message::RealtimeMessage;

// ============================================================================
// TYPES
// ============================================================================

/// Subscription ID (unique per registry)
pub type SubscriptionId = u64;

/// Subscriber callback
pub type Callback = Arc<dyn Fn(&RealtimeMessage) + Send + Sync>;

/// Result of one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Callbacks that returned normally
    pub delivered: usize,

    /// Callbacks that panicked
    pub failed: usize,
}

// ============================================================================
// TOPIC REGISTRY
// ============================================================================

pub struct TopicRegistry {
    /// topic → subscribers (empty topics are removed)
    topics: Mutex<HashMap<String, Vec<(SubscriptionId, Callback)>>>,

    /// Next subscription ID
    next_id: AtomicU64,
}

impl TopicRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            topics: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Add a callback to a topic, creating the topic if absent
    pub fn register(&self, topic: &str, callback: Callback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let count = {
            let mut topics = self.topics.lock();
            let subscribers = topics.entry(topic.to_string()).or_default();
            subscribers.push((id, callback));
            subscribers.len()
        };

        logger::debug(
            LogTag::Registry,
            &format!("Subscriber {} registered on '{}' (topic subscribers={})", id, topic, count),
        );

        id
    }

    /// Remove a callback; drops the topic entry when it becomes empty
    ///
    /// Returns false if the subscription was not registered (already removed).
    pub fn unregister(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut topics = self.topics.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            topics.remove(topic);
        }
        drop(topics);

        if removed {
            logger::debug(
                LogTag::Registry,
                &format!("Subscriber {} removed from '{}'", id, topic),
            );
        }

        removed
    }

    /// Deliver a message to every callback registered for `topic`
    ///
    /// A panicking callback is logged and counted; the remaining callbacks
    /// still run.
    pub fn dispatch(&self, topic: &str, message: &RealtimeMessage) -> DispatchOutcome {
        let snapshot = self.snapshot(topic);
        let mut outcome = DispatchOutcome::default();

        for (id, callback) in snapshot {
            if invoke(topic, id, &callback, message) {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
            }
        }

        if outcome.delivered + outcome.failed > 0 {
            logger::verbose(
                LogTag::Registry,
                &format!(
                    "Dispatched {} to '{}' (delivered={}, failed={})",
                    message.message_type(),
                    topic,
                    outcome.delivered,
                    outcome.failed
                ),
            );
        }

        outcome
    }

    /// Deliver a message to a single subscription (snapshot replay)
    pub fn deliver_to(&self, topic: &str, id: SubscriptionId, message: &RealtimeMessage) -> DispatchOutcome {
        let callback = self
            .snapshot(topic)
            .into_iter()
            .find(|(sub_id, _)| *sub_id == id)
            .map(|(_, callback)| callback);

        match callback {
            Some(callback) if invoke(topic, id, &callback, message) => DispatchOutcome { delivered: 1, failed: 0 },
            Some(_) => DispatchOutcome { delivered: 0, failed: 1 },
            None => DispatchOutcome::default(),
        }
    }

    /// Number of topics with at least one subscriber
    pub fn topic_count(&self) -> usize {
        self.topics.lock().len()
    }

    /// Number of subscribers for a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Topics with at least one subscriber
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    fn snapshot(&self, topic: &str) -> Vec<(SubscriptionId, Callback)> {
        self.topics
            .lock()
            .get(topic)
            .map(|subscribers| subscribers.clone())
            .unwrap_or_default()
    }
}

/// Run one callback outside the lock, catching panics
fn invoke(topic: &str, id: SubscriptionId, callback: &Callback, message: &RealtimeMessage) -> bool {
    match catch_unwind(AssertUnwindSafe(|| callback(message))) {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            logger::error(
                LogTag::Registry,
                &format!("Subscriber {} on '{}' failed: {}", id, topic, reason),
            );
            false
        }
    }
}

// ============================================================================
// SUBSCRIPTION HANDLE
// ============================================================================

/// Handle returned by `subscribe`; call `unsubscribe` to stop delivery
///
/// Dropping the handle does not unsubscribe. Unsubscribing twice is a no-op.
#[must_use = "dropping a Subscription keeps the callback registered; call unsubscribe() to remove it"]
#[derive(Clone)]
pub struct Subscription {
    registry: Weak<TopicRegistry>,
    topic: String,
    id: SubscriptionId,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<TopicRegistry>, topic: &str, id: SubscriptionId) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            topic: topic.to_string(),
            id,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop delivery to this callback
    ///
    /// An in-flight dispatch already calling the callback is not interrupted.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.topic, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}
