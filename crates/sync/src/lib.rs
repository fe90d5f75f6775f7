//! CoupUp Sync - realtime local view of the shared store, plus the
//! client facade that maps presentation intents onto the engine

pub mod client;
pub mod layer;
pub mod view;

pub use client::{Client, Role};
pub use layer::{spawn_sync, SyncHandle};
pub use view::{NoteDrafts, ViewState};
