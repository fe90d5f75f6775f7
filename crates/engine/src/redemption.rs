//! Redemption Engine — deciding whether a coupon can be claimed and
//! recording the claim
//!
//! A redemption is two independent writes: append the request record,
//! then extend the cooldown ledger. The order is load-bearing — append
//! first, lock second — so a failed ledger extension never loses the
//! underlying request. Neither write rolls the other back; the system
//! tolerates the rare request-without-lock state.

use coupup_core::{
    is_locked, remaining_days, unlock_at, CooldownLedger, CouponDef, Error, LedgerDoc, NewRequest,
    RequestStatus, Result,
};
use coupup_store::{with_timeout, write_with_retry, SharedStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Collection holding redemption requests
pub const REQUESTS_COLLECTION: &str = "requests";
/// Document holding the shared cooldown ledger
pub const COOLDOWNS_DOC: &str = "meta/cooldowns";

/// Decision logic for redeeming coupons and closing out requests
pub struct RedemptionEngine {
    store: Arc<dyn SharedStore>,
}

impl RedemptionEngine {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Redeem `coupon` against the most recently synced ledger snapshot.
    ///
    /// Returns the store-assigned id of the new request. A locked coupon
    /// fails with `OnCooldown` before any write. Concurrent redemptions of
    /// the same coupon race last-write-wins on the ledger document; the
    /// single-active-redeemer assumption makes that acceptable.
    pub async fn redeem(
        &self,
        coupon: &CouponDef,
        ledger: &CooldownLedger,
        now: i64,
        note_draft: Option<&str>,
    ) -> Result<String> {
        if is_locked(ledger, coupon.id, now) {
            let days = remaining_days(ledger, coupon.id, now);
            info!("'{}' is on cooldown for {} more day(s)", coupon.id, days);
            return Err(Error::OnCooldown { remaining_days: days });
        }

        // The note rides along whether or not the coupon requires one;
        // requires_note only controls the input affordance.
        let note = note_draft
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let new_request = NewRequest {
            coupon_id: coupon.id.to_string(),
            title: coupon.title.to_string(),
            note,
            status: RequestStatus::Pending,
        };
        let fields = serde_json::to_value(&new_request)?;
        let store = Arc::clone(&self.store);
        let request_id = write_with_retry("append request", move || {
            let store = Arc::clone(&store);
            let fields = fields.clone();
            async move { store.append_to_collection(REQUESTS_COLLECTION, fields).await }
        })
        .await?;
        info!("Recorded redemption request '{}' for '{}'", request_id, coupon.id);

        // Read-modify-write on the shared ledger. A failed read proceeds
        // with an empty map so a transient read error never blocks the
        // redemption — the request above is already recorded.
        let read = with_timeout("read cooldowns", self.store.read_document_once(COOLDOWNS_DOC));
        let mut map = match read.await {
            Ok(Some(doc)) => match serde_json::from_value::<LedgerDoc>(doc) {
                Ok(ledger_doc) => ledger_doc.map,
                Err(e) => {
                    warn!("cooldowns document is malformed, starting fresh: {}", e);
                    CooldownLedger::new()
                }
            },
            Ok(None) => CooldownLedger::new(),
            Err(e) => {
                warn!("cooldowns read failed, proceeding with an empty map: {}", e);
                CooldownLedger::new()
            }
        };
        map.insert(coupon.id.to_string(), unlock_at(now, coupon.cooldown_days));

        let doc = serde_json::to_value(&LedgerDoc { map })?;
        let store = Arc::clone(&self.store);
        write_with_retry("extend cooldown", move || {
            let store = Arc::clone(&store);
            let doc = doc.clone();
            async move { store.write_document_merge(COOLDOWNS_DOC, doc).await }
        })
        .await?;

        Ok(request_id)
    }

    /// Close out a request: the one-way pending → completed transition.
    /// Idempotent — completing an already completed record changes nothing
    /// and reports no error. Fails when the record id does not exist.
    pub async fn mark_completed(&self, record_id: &str) -> Result<()> {
        let store = Arc::clone(&self.store);
        let record_id = record_id.to_string();
        write_with_retry("update request status", move || {
            let store = Arc::clone(&store);
            let record_id = record_id.clone();
            async move {
                store
                    .update_document(REQUESTS_COLLECTION, &record_id, json!({"status": "completed"}))
                    .await
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coupup_core::{find_coupon, DAY_MILLIS};
    use coupup_store::MemoryStore;

    fn engine_with_store() -> (Arc<MemoryStore>, RedemptionEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = RedemptionEngine::new(store.clone() as Arc<dyn SharedStore>);
        (store, engine)
    }

    fn ledger_map(store: &MemoryStore) -> CooldownLedger {
        let doc = store.document(COOLDOWNS_DOC).expect("cooldowns document");
        serde_json::from_value::<LedgerDoc>(doc).unwrap().map
    }

    #[tokio::test]
    async fn redeem_appends_request_and_extends_cooldown() {
        let (store, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();

        let id = engine
            .redeem(snack, &CooldownLedger::new(), 0, Some("  extra spicy  "))
            .await
            .unwrap();

        let docs = store.collection(REQUESTS_COLLECTION);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].fields["couponId"], "snack");
        assert_eq!(docs[0].fields["title"], snack.title);
        assert_eq!(docs[0].fields["status"], "pending");
        assert_eq!(docs[0].fields["note"], "extra spicy");

        assert_eq!(ledger_map(&store)["snack"], 8 * DAY_MILLIS);
    }

    #[tokio::test]
    async fn locked_coupon_writes_nothing() {
        let (store, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();

        let mut ledger = CooldownLedger::new();
        ledger.insert("snack".to_string(), 8 * DAY_MILLIS);

        let err = engine
            .redeem(snack, &ledger, 8 * DAY_MILLIS - 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OnCooldown { remaining_days: 1 }));

        assert!(store.collection(REQUESTS_COLLECTION).is_empty());
        assert!(store.document(COOLDOWNS_DOC).is_none());
    }

    #[tokio::test]
    async fn unlocked_at_exact_boundary() {
        let (_, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();

        let mut ledger = CooldownLedger::new();
        ledger.insert("snack".to_string(), 8 * DAY_MILLIS);

        // now == entry is unlocked
        assert!(engine.redeem(snack, &ledger, 8 * DAY_MILLIS, None).await.is_ok());
    }

    #[tokio::test]
    async fn note_carried_even_when_not_required() {
        let (store, engine) = engine_with_store();
        let song = find_coupon("song").unwrap();
        assert!(!song.requires_note);

        engine
            .redeem(song, &CooldownLedger::new(), 0, Some("acoustic please"))
            .await
            .unwrap();

        let docs = store.collection(REQUESTS_COLLECTION);
        assert_eq!(docs[0].fields["note"], "acoustic please");
    }

    #[tokio::test]
    async fn blank_draft_persists_as_null_note() {
        let (store, engine) = engine_with_store();
        let song = find_coupon("song").unwrap();

        engine
            .redeem(song, &CooldownLedger::new(), 0, Some("   "))
            .await
            .unwrap();

        let docs = store.collection(REQUESTS_COLLECTION);
        assert!(docs[0].fields["note"].is_null());
    }

    #[tokio::test]
    async fn failed_append_leaves_ledger_untouched() {
        let (store, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();
        store.set_fail_writes(true);

        let err = engine
            .redeem(snack, &CooldownLedger::new(), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreWrite(_)));

        assert!(store.collection(REQUESTS_COLLECTION).is_empty());
        assert!(store.document(COOLDOWNS_DOC).is_none());
    }

    #[tokio::test]
    async fn ledger_read_failure_is_fail_open() {
        let (store, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();
        store.set_fail_reads(true);

        // request still recorded, fresh ledger entry still written
        engine
            .redeem(snack, &CooldownLedger::new(), 0, None)
            .await
            .unwrap();

        assert_eq!(store.collection(REQUESTS_COLLECTION).len(), 1);
        assert_eq!(ledger_map(&store)["snack"], 8 * DAY_MILLIS);
    }

    #[tokio::test]
    async fn concurrent_redeems_race_last_write_wins() {
        let (store, engine) = engine_with_store();
        let snack = find_coupon("snack").unwrap();

        // Both intents observe the same stale (empty) snapshot, as when a
        // second click lands before the first extend resolves.
        let stale = CooldownLedger::new();
        engine.redeem(snack, &stale, 0, None).await.unwrap();
        engine.redeem(snack, &stale, 0, None).await.unwrap();

        // both requests recorded, ledger holds one extend's value, not a sum
        assert_eq!(store.collection(REQUESTS_COLLECTION).len(), 2);
        assert_eq!(ledger_map(&store)["snack"], 8 * DAY_MILLIS);
    }

    #[tokio::test]
    async fn mark_completed_is_idempotent() {
        let (store, engine) = engine_with_store();
        let song = find_coupon("song").unwrap();

        let id = engine
            .redeem(song, &CooldownLedger::new(), 0, None)
            .await
            .unwrap();

        engine.mark_completed(&id).await.unwrap();
        engine.mark_completed(&id).await.unwrap();

        let docs = store.collection(REQUESTS_COLLECTION);
        assert_eq!(docs[0].fields["status"], "completed");
    }

    #[tokio::test]
    async fn mark_completed_on_missing_id_fails() {
        let (_, engine) = engine_with_store();
        let err = engine.mark_completed("mem-000099").await.unwrap_err();
        assert!(matches!(err, Error::RequestNotFound(id) if id == "mem-000099"));
    }
}
