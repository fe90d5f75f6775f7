//! Data models: coupon catalog, cooldown ledger, redemption requests

mod coupon;
mod ledger;
mod request;

pub use coupon::*;
pub use ledger::*;
pub use request::*;
