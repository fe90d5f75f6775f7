//! REST-backed Shared Store
//!
//! Talks to a document-store HTTP API shaped like the [`SharedStore`]
//! contract. The transport has no push channel, so subscriptions are
//! served by polling watchers (see [`watch`]).
//!
//! [`SharedStore`]: crate::SharedStore

mod client;
mod config;
mod watch;

pub use client::RestStore;
pub use config::StoreConfig;
