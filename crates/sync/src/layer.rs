//! Sync Layer — subscribes to the shared structures and republishes full
//! snapshots to local observers
//!
//! The task holds two independent subscriptions (requests collection,
//! cooldowns document). There is no ordering guarantee between them, so a
//! request and its ledger update may become visible in either order; each
//! delivery republishes the complete [`ViewState`]. Malformed records are
//! skipped with a warning rather than poisoning the snapshot.

use crate::ViewState;
use coupup_core::{sort_requests, CooldownLedger, LedgerDoc, RequestRecord};
use coupup_engine::{COOLDOWNS_DOC, REQUESTS_COLLECTION};
use coupup_store::{Document, SharedStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Handle to a running sync task
#[derive(Clone)]
pub struct SyncHandle {
    view_rx: watch::Receiver<ViewState>,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// The latest published snapshot
    pub fn view(&self) -> ViewState {
        self.view_rx.borrow().clone()
    }

    /// A receiver observers can await change notifications on
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_rx.clone()
    }

    /// Stop the sync task
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Spawn the sync task and return a handle for observing it
pub fn spawn_sync(store: Arc<dyn SharedStore>) -> SyncHandle {
    let (view_tx, view_rx) = watch::channel(ViewState::default());
    let cancel = CancellationToken::new();
    tokio::spawn(sync_loop(store, view_tx, cancel.clone()));
    SyncHandle { view_rx, cancel }
}

async fn sync_loop(
    store: Arc<dyn SharedStore>,
    view_tx: watch::Sender<ViewState>,
    cancel: CancellationToken,
) {
    let mut requests_sub = store.subscribe_collection(REQUESTS_COLLECTION);
    let mut ledger_sub = store.subscribe_document(COOLDOWNS_DOC);
    let mut state = ViewState::default();
    info!("Sync loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Sync loop cancelled, exiting");
                return;
            }
            snapshot = requests_sub.recv() => {
                let Some(docs) = snapshot else {
                    warn!("requests subscription closed, sync loop exiting");
                    return;
                };
                state.requests = parse_requests(&docs);
                let _ = view_tx.send(state.clone());
            }
            doc = ledger_sub.recv() => {
                let Some(doc) = doc else {
                    warn!("cooldowns subscription closed, sync loop exiting");
                    return;
                };
                state.cooldowns = parse_ledger(doc);
                let _ = view_tx.send(state.clone());
            }
        }
    }
}

fn parse_requests(docs: &[Document]) -> Vec<RequestRecord> {
    let mut requests: Vec<RequestRecord> = docs
        .iter()
        .filter_map(|doc| match serde_json::from_value(doc.merged()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping malformed request '{}': {}", doc.id, e);
                None
            }
        })
        .collect();
    sort_requests(&mut requests);
    requests
}

fn parse_ledger(doc: Option<Value>) -> CooldownLedger {
    match doc {
        Some(value) => match serde_json::from_value::<LedgerDoc>(value) {
            Ok(ledger_doc) => ledger_doc.map,
            Err(e) => {
                warn!("cooldowns document is malformed, treating as empty: {}", e);
                CooldownLedger::new()
            }
        },
        None => CooldownLedger::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coupup_store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for<F>(handle: &SyncHandle, pred: F) -> ViewState
    where
        F: Fn(&ViewState) -> bool,
    {
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async move {
            loop {
                let view = rx.borrow_and_update().clone();
                if pred(&view) {
                    return view;
                }
                rx.changed().await.expect("sync loop ended");
            }
        })
        .await
        .expect("view did not converge")
    }

    #[tokio::test]
    async fn requests_propagate_sorted_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_sync(store.clone());

        for coupon in ["song", "game"] {
            store
                .append_to_collection(
                    REQUESTS_COLLECTION,
                    json!({"couponId": coupon, "title": coupon, "status": "pending"}),
                )
                .await
                .unwrap();
            // keep the two createdAt millis distinct
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let view = wait_for(&handle, |v| v.requests.len() == 2).await;
        // second append has the later timestamp
        assert_eq!(view.requests[0].coupon_id, "game");
        assert_eq!(view.requests[1].coupon_id, "song");
        handle.shutdown();
    }

    #[tokio::test]
    async fn ledger_changes_propagate() {
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_sync(store.clone());

        store
            .write_document_merge(COOLDOWNS_DOC, json!({"map": {"date": 1_296_000_000i64}}))
            .await
            .unwrap();

        let view = wait_for(&handle, |v| !v.cooldowns.is_empty()).await;
        assert_eq!(view.cooldowns["date"], 1_296_000_000);
        assert!(view.is_locked("date", 0));
        assert_eq!(view.remaining_days("date", 0), 15);
        handle.shutdown();
    }

    #[tokio::test]
    async fn malformed_records_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_sync(store.clone());

        store
            .append_to_collection(REQUESTS_COLLECTION, json!({"bogus": true}))
            .await
            .unwrap();
        store
            .append_to_collection(
                REQUESTS_COLLECTION,
                json!({"couponId": "pics", "title": "📸 Send Pictures", "status": "pending"}),
            )
            .await
            .unwrap();

        let view = wait_for(&handle, |v| v.requests.len() == 1).await;
        assert_eq!(view.requests[0].coupon_id, "pics");
        handle.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_publishing() {
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_sync(store.clone());
        handle.shutdown();

        // give the loop a chance to observe the cancellation
        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .append_to_collection(
                REQUESTS_COLLECTION,
                json!({"couponId": "nice", "title": "✍️ Write Something Nice", "status": "pending"}),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.view().requests.is_empty());
    }
}
