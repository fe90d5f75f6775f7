//! Cooldown ledger math — pure decisions over unlock timestamps
//!
//! The ledger is a single shared map of coupon id to the epoch-millis point
//! at which the coupon unlocks again. A missing key means the coupon was
//! never redeemed and is unlocked.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Milliseconds in one day
pub const DAY_MILLIS: i64 = 86_400_000;

/// Coupon id → unlock point in epoch millis
pub type CooldownLedger = HashMap<String, i64>;

/// Wire shape of the `meta/cooldowns` document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerDoc {
    #[serde(default)]
    pub map: CooldownLedger,
}

/// True iff the ledger has an entry for `id` and `now` is still before it.
/// The boundary is exclusive: at exactly the unlock point the coupon is free.
pub fn is_locked(ledger: &CooldownLedger, id: &str, now: i64) -> bool {
    matches!(ledger.get(id), Some(&until) if now < until)
}

/// Whole days until `id` unlocks, rounded up so a fractional remaining day
/// still reports 1. Zero when absent or already unlocked.
pub fn remaining_days(ledger: &CooldownLedger, id: &str, now: i64) -> i64 {
    match ledger.get(id) {
        Some(&until) if now < until => (until - now + DAY_MILLIS - 1) / DAY_MILLIS,
        _ => 0,
    }
}

/// Unlock point for a redemption happening at `now`
pub fn unlock_at(now: i64, cooldown_days: i64) -> i64 {
    now + cooldown_days * DAY_MILLIS
}
