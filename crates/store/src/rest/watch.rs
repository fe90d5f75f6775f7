//! Polling watchers that turn one-shot reads into change subscriptions
//!
//! The REST transport has no push channel, so each subscription runs a
//! poll loop: read, compare against the last delivered snapshot, deliver
//! on change. Transport errors back the poll off exponentially (capped)
//! and delivery resumes once the store recovers. A watcher exits when its
//! receiver is dropped.

use super::client::RestStore;
use crate::{CollectionSubscription, Document, DocumentSubscription, SUBSCRIPTION_BUFFER};
use crate::SharedStore;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub(super) fn spawn_collection_watcher(store: RestStore, name: String) -> CollectionSubscription {
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    tokio::spawn(async move {
        let mut last: Option<Vec<Document>> = None;
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if tx.is_closed() {
                debug!("collection watcher for '{}' dropped, exiting", name);
                return;
            }
            match store.list_collection(&name).await {
                Ok(docs) => {
                    backoff = INITIAL_BACKOFF;
                    if last.as_ref() != Some(&docs) {
                        if tx.send(docs.clone()).await.is_err() {
                            return;
                        }
                        last = Some(docs);
                    }
                    tokio::time::sleep(store.poll_interval()).await;
                }
                Err(e) => {
                    warn!(
                        "collection poll for '{}' failed, backing off {:?}: {}",
                        name, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    });
    rx
}

pub(super) fn spawn_document_watcher(store: RestStore, path: String) -> DocumentSubscription {
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    tokio::spawn(async move {
        // Option-of-Option: the outer None means nothing delivered yet, so
        // the first successful read is always pushed, even for an absent doc.
        let mut last: Option<Option<Value>> = None;
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if tx.is_closed() {
                debug!("document watcher for '{}' dropped, exiting", path);
                return;
            }
            match store.read_document_once(&path).await {
                Ok(doc) => {
                    backoff = INITIAL_BACKOFF;
                    if last.as_ref() != Some(&doc) {
                        if tx.send(doc.clone()).await.is_err() {
                            return;
                        }
                        last = Some(doc);
                    }
                    tokio::time::sleep(store.poll_interval()).await;
                }
                Err(e) => {
                    warn!(
                        "document poll for '{}' failed, backing off {:?}: {}",
                        path, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    });
    rx
}
