//! CoupUp Store - the Shared Store abstraction and its implementations
//!
//! The rest of the system talks to remote state exclusively through the
//! [`SharedStore`] trait: an ordered collection of request documents plus
//! free-form JSON documents addressed by path. Subscriptions deliver full
//! snapshots (never diffs), including the echo of the subscriber's own
//! writes.

pub mod document;
pub mod guard;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use coupup_core::Result;
use serde_json::Value;
use tokio::sync::mpsc;

pub use document::Document;
pub use guard::{with_timeout, write_with_retry, STORE_OP_TIMEOUT};
pub use memory::MemoryStore;
pub use rest::{RestStore, StoreConfig};

/// Buffer size for subscription channels
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// Receives the full ordered snapshot of a collection on every change
pub type CollectionSubscription = mpsc::Receiver<Vec<Document>>;

/// Receives the full document (or `None` when absent) on every change
pub type DocumentSubscription = mpsc::Receiver<Option<Value>>;

/// The external persistence/notification service the core depends on.
///
/// Both subscription methods deliver the current snapshot immediately on
/// subscribe, then again after every change. Transport errors inside a
/// subscription are logged and retried by the implementation; they never
/// tear down the channel.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Subscribe to full snapshots of a named collection
    fn subscribe_collection(&self, name: &str) -> CollectionSubscription;

    /// Subscribe to a single document by path (e.g. `meta/cooldowns`)
    fn subscribe_document(&self, path: &str) -> DocumentSubscription;

    /// Append an entry; the store assigns the id and creation timestamp
    async fn append_to_collection(&self, name: &str, fields: Value) -> Result<String>;

    /// Shallow-update an existing collection entry; fails when the id is absent
    async fn update_document(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// One-shot read of a document by path
    async fn read_document_once(&self, path: &str) -> Result<Option<Value>>;

    /// Shallow-merge fields into a document, creating it when absent
    async fn write_document_merge(&self, path: &str, fields: Value) -> Result<()>;
}
