//! Timeout and retry guards around store operations
//!
//! The store contract gives no delivery guarantee for a single call, so
//! every operation issued by the engine is bounded by a timeout, and writes
//! get exactly one retry. Errors that a retry cannot fix (missing target,
//! active cooldown, malformed data) are returned as-is.

use coupup_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bound on any single store operation
pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a store operation under [`STORE_OP_TIMEOUT`], surfacing expiry as
/// `Error::StoreTimeout` instead of waiting forever.
pub async fn with_timeout<T, F>(op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(STORE_OP_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::StoreTimeout { op }),
    }
}

/// Whether a failed store call is worth one more attempt
fn is_transient(err: &Error) -> bool {
    matches!(
        err,
        Error::StoreWrite(_) | Error::StoreRead(_) | Error::StoreTimeout { .. }
    )
}

/// Run a write with a timeout and a single bounded retry on transient
/// failure. `attempt` must produce a fresh future per call.
pub async fn write_with_retry<T, F, Fut>(op: &'static str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match with_timeout(op, attempt()).await {
        Ok(value) => Ok(value),
        Err(err) if is_transient(&err) => {
            warn!("store op '{}' failed, retrying once: {}", op, err);
            with_timeout(op, attempt()).await
        }
        Err(err) => Err(err),
    }
}
