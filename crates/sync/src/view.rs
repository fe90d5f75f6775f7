//! Locally derived view of the shared state

use coupup_core::{CooldownLedger, RequestRecord, DAY_MILLIS};
use std::collections::HashMap;

/// Snapshot of everything a viewer renders, rebuilt wholesale from each
/// sync notification. Never mutated incrementally from local writes — the
/// authoritative store echo is what updates it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Newest first
    pub requests: Vec<RequestRecord>,
    pub cooldowns: CooldownLedger,
}

impl ViewState {
    pub fn is_locked(&self, coupon_id: &str, now: i64) -> bool {
        coupup_core::is_locked(&self.cooldowns, coupon_id, now)
    }

    pub fn remaining_days(&self, coupon_id: &str, now: i64) -> i64 {
        coupup_core::remaining_days(&self.cooldowns, coupon_id, now)
    }

    /// Whole days since the newest request, `None` when the log is empty.
    /// A newest record the store has not yet timestamped counts as "just
    /// now".
    pub fn days_since_last(&self, now: i64) -> Option<i64> {
        let newest = self.requests.first()?;
        let last = newest
            .created_at
            .map(|t| t.timestamp_millis())
            .unwrap_or(now);
        Some((now - last).max(0) / DAY_MILLIS)
    }
}

/// Local, unsynced free-text drafts keyed by coupon id. Reset on reload,
/// never written to the store except as the note of a redemption.
#[derive(Debug, Default)]
pub struct NoteDrafts {
    map: HashMap<String, String>,
}

impl NoteDrafts {
    pub fn set(&mut self, coupon_id: &str, text: &str) {
        if text.is_empty() {
            self.map.remove(coupon_id);
        } else {
            self.map.insert(coupon_id.to_string(), text.to_string());
        }
    }

    pub fn get(&self, coupon_id: &str) -> Option<&str> {
        self.map.get(coupon_id).map(String::as_str)
    }

    pub fn clear(&mut self, coupon_id: &str) {
        self.map.remove(coupon_id);
    }
}
