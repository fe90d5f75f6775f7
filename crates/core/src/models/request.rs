//! Redemption request records and their ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a request: a single one-way transition, pending → completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
}

/// A redemption request as it lives in the shared store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: String,
    pub coupon_id: String,
    /// Catalog title snapshotted at redemption time
    pub title: String,
    #[serde(default)]
    pub note: Option<String>,
    pub status: RequestStatus,
    /// Store-assigned; `None` until the write is acknowledged
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RequestRecord {
    /// Creation time in epoch millis; unresolved timestamps count as 0
    /// so in-flight records sort oldest instead of jumping around.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == RequestStatus::Completed
    }
}

/// Fields written on append; id and createdAt are assigned by the store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub coupon_id: String,
    pub title: String,
    pub note: Option<String>,
    pub status: RequestStatus,
}

/// Sort descending by creation time (newest first)
pub fn sort_requests(requests: &mut [RequestRecord]) {
    requests.sort_by_key(|r| std::cmp::Reverse(r.created_at_millis()));
}
