//! In-memory Shared Store
//!
//! Backs tests and local runs. Every mutation fans the full snapshot out to
//! all live subscribers synchronously, which also provides the
//! write-through echo the sync layer relies on. Failure injection toggles
//! let engine tests exercise the store-error paths.

use crate::{
    CollectionSubscription, Document, DocumentSubscription, SharedStore, SUBSCRIPTION_BUFFER,
};
use async_trait::async_trait;
use chrono::Utc;
use coupup_core::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    documents: HashMap<String, Value>,
    collection_subs: HashMap<String, Vec<mpsc::Sender<Vec<Document>>>>,
    document_subs: HashMap<String, Vec<mpsc::Sender<Option<Value>>>>,
    next_id: u64,
}

/// In-process implementation of [`SharedStore`]
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a store error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent one-shot read fail with a store error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a collection, for test assertions
    pub fn collection(&self, name: &str) -> Vec<Document> {
        self.inner
            .read()
            .map(|inner| inner.collections.get(name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Snapshot of a document, for test assertions
    pub fn document(&self, path: &str) -> Option<Value> {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.documents.get(path).cloned())
    }

    fn notify_collection(inner: &mut Inner, name: &str) {
        let snapshot = inner.collections.get(name).cloned().unwrap_or_default();
        if let Some(subs) = inner.collection_subs.get_mut(name) {
            subs.retain(|tx| match tx.try_send(snapshot.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("collection subscriber for '{}' is lagging, dropping snapshot", name);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
        }
    }

    fn notify_document(inner: &mut Inner, path: &str) {
        let snapshot = inner.documents.get(path).cloned();
        if let Some(subs) = inner.document_subs.get_mut(path) {
            subs.retain(|tx| match tx.try_send(snapshot.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("document subscriber for '{}' is lagging, dropping snapshot", path);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreWrite("injected write failure".to_string()));
        }
        Ok(())
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::StoreWrite("store lock poisoned".to_string()))
    }
}

/// Shallow merge: top-level keys of `incoming` replace keys of `target`
fn merge_shallow(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(fields)) => {
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        (target, incoming) => *target = incoming,
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    fn subscribe_collection(&self, name: &str) -> CollectionSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        if let Ok(mut inner) = self.inner.write() {
            let snapshot = inner.collections.get(name).cloned().unwrap_or_default();
            let _ = tx.try_send(snapshot);
            inner
                .collection_subs
                .entry(name.to_string())
                .or_default()
                .push(tx);
        }
        rx
    }

    fn subscribe_document(&self, path: &str) -> DocumentSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        if let Ok(mut inner) = self.inner.write() {
            let snapshot = inner.documents.get(path).cloned();
            let _ = tx.try_send(snapshot);
            inner
                .document_subs
                .entry(path.to_string())
                .or_default()
                .push(tx);
        }
        rx
    }

    async fn append_to_collection(&self, name: &str, fields: Value) -> Result<String> {
        self.check_write()?;
        let mut inner = self.lock_write()?;
        inner.next_id += 1;
        let id = format!("mem-{:06}", inner.next_id);
        let doc = Document {
            id: id.clone(),
            created_at: Some(Utc::now()),
            fields,
        };
        inner
            .collections
            .entry(name.to_string())
            .or_default()
            .push(doc);
        Self::notify_collection(&mut inner, name);
        Ok(id)
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.check_write()?;
        let mut inner = self.lock_write()?;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| Error::RequestNotFound(id.to_string()))?;
        merge_shallow(&mut doc.fields, fields);
        Self::notify_collection(&mut inner, collection);
        Ok(())
    }

    async fn read_document_once(&self, path: &str) -> Result<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::StoreRead("injected read failure".to_string()));
        }
        let inner = self
            .inner
            .read()
            .map_err(|_| Error::StoreRead("store lock poisoned".to_string()))?;
        Ok(inner.documents.get(path).cloned())
    }

    async fn write_document_merge(&self, path: &str, fields: Value) -> Result<()> {
        self.check_write()?;
        let mut inner = self.lock_write()?;
        let doc = inner
            .documents
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        merge_shallow(doc, fields);
        Self::notify_document(&mut inner, path);
        Ok(())
    }
}
