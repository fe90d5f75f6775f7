//! CoupUp Engine - redemption decisions and request lifecycle

pub mod redemption;

pub use redemption::{RedemptionEngine, COOLDOWNS_DOC, REQUESTS_COLLECTION};
