//! Client facade — one connected viewer
//!
//! Wires the engine, the sync layer, and the local note drafts together
//! and exposes the presentation intents 1:1: redeem, mark-completed, note
//! editing, and the role toggle.

use crate::{spawn_sync, NoteDrafts, SyncHandle, ViewState};
use chrono::Utc;
use coupup_core::{find_coupon, Error, Result};
use coupup_engine::RedemptionEngine;
use coupup_store::SharedStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Which role the local user currently acts as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Redeemer,
    Owner,
}

/// Engine + sync + drafts for a single connected viewer
pub struct Client {
    engine: RedemptionEngine,
    sync: SyncHandle,
    drafts: NoteDrafts,
    role: Role,
}

impl Client {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            engine: RedemptionEngine::new(Arc::clone(&store)),
            sync: spawn_sync(store),
            drafts: NoteDrafts::default(),
            role: Role::Redeemer,
        }
    }

    /// The latest synced snapshot
    pub fn view(&self) -> ViewState {
        self.sync.view()
    }

    /// Await-able change notifications for observers
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.sync.subscribe()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_note_draft(&mut self, coupon_id: &str, text: &str) {
        self.drafts.set(coupon_id, text);
    }

    pub fn note_draft(&self, coupon_id: &str) -> Option<&str> {
        self.drafts.get(coupon_id)
    }

    /// Redeem intent: checks the latest synced snapshot, records the
    /// request, extends the cooldown, and clears the draft on full
    /// success. A draft survives any failure so the user can retry.
    pub async fn redeem(&mut self, coupon_id: &str) -> Result<String> {
        let coupon = find_coupon(coupon_id)
            .ok_or_else(|| Error::InvalidData(format!("unknown coupon '{}'", coupon_id)))?;
        let view = self.sync.view();
        let now = Utc::now().timestamp_millis();
        let draft = self.drafts.get(coupon_id).map(str::to_string);

        let request_id = self
            .engine
            .redeem(coupon, &view.cooldowns, now, draft.as_deref())
            .await?;
        self.drafts.clear(coupon_id);
        Ok(request_id)
    }

    /// Owner intent: close out a request
    pub async fn mark_completed(&self, request_id: &str) -> Result<()> {
        self.engine.mark_completed(request_id).await
    }

    /// Days since the newest redemption, for the sidebar badge
    pub fn days_since_last(&self, now: i64) -> Option<i64> {
        self.sync.view().days_since_last(now)
    }

    pub fn shutdown(&self) {
        self.sync.shutdown();
    }
}
