/// Synthetic dashboard data for the simulated transport
///
/// Starts from a fixed baseline and drifts it with small random deltas on
/// every statistics tick. Notifications come from a small fixed set of
/// templates.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::message::{now_iso, NotificationMessage, StatisticsUpdate};

pub const STATISTICS_UPDATE_TYPE: &str = "STATISTICS_UPDATE";

/// Aggregate dashboard statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_requests: u64,
    pub pending_requests: u64,
    pub under_review_requests: u64,
    pub approved_requests: u64,
    pub rejected_requests: u64,
    pub in_progress_requests: u64,
    pub completed_requests: u64,
    pub total_spent: u64,
    pub pending_amount: u64,
    pub approved_amount: u64,
    pub in_progress_amount: u64,
    pub requests_this_week: u64,
    pub requests_this_month: u64,
    pub last_updated: String,
}

impl DashboardStatistics {
    /// Starting point of every simulation run
    pub fn baseline() -> Self {
        Self {
            total_requests: 127,
            pending_requests: 23,
            under_review_requests: 8,
            approved_requests: 45,
            rejected_requests: 12,
            in_progress_requests: 18,
            completed_requests: 21,
            total_spent: 2_450_000,
            pending_amount: 875_000,
            approved_amount: 1_250_000,
            in_progress_amount: 650_000,
            requests_this_week: 18,
            requests_this_month: 47,
            last_updated: now_iso(),
        }
    }
}

/// (type, title, message, action)
const NOTIFICATION_TEMPLATES: &[(&str, &str, &str, &str)] = &[
    (
        "PURCHASE_REQUEST_UPDATE",
        "New Purchase Request",
        "New laptop request for ₹1,25,000 created by John Doe",
        "CREATED",
    ),
    (
        "APPROVAL_UPDATE",
        "Request Approved",
        "Office supplies request approved for ₹25,000",
        "APPROVED",
    ),
    (
        "PURCHASE_ORDER_CREATED",
        "Purchase Order Created",
        "PO-2024-008 created with Dell Technologies",
        "CREATED",
    ),
];

pub struct Simulator {
    statistics: DashboardStatistics,
    rng: StdRng,
}

impl Simulator {
    /// Seeded generators produce the same sequence every run
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            statistics: DashboardStatistics::baseline(),
            rng,
        }
    }

    pub fn statistics(&self) -> &DashboardStatistics {
        &self.statistics
    }

    /// One tick: total grows by 0..=2, pending moves by -1..=+1 (never below 0)
    pub fn advance_statistics(&mut self) {
        self.statistics.total_requests += self.rng.gen_range(0..=2);
        let delta: i64 = self.rng.gen_range(-1..=1);
        self.statistics.pending_requests =
            (self.statistics.pending_requests as i64 + delta).max(0) as u64;
        self.statistics.last_updated = now_iso();
    }

    /// Current statistics as a statistics message
    pub fn snapshot_update(&self) -> StatisticsUpdate {
        let statistics = match serde_json::to_value(&self.statistics) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        StatisticsUpdate {
            message_type: STATISTICS_UPDATE_TYPE.to_string(),
            statistics,
            timestamp: now_iso(),
            extra: Map::new(),
        }
    }

    /// A notification picked at random from the templates
    pub fn next_notification(&mut self) -> NotificationMessage {
        let (message_type, title, message, action) = NOTIFICATION_TEMPLATES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(NOTIFICATION_TEMPLATES[0]);

        NotificationMessage {
            message_type: message_type.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            data: json!({}),
            timestamp: now_iso(),
            action: action.to_string(),
            priority: None,
            user_id: None,
            extra: Map::new(),
        }
    }
}
