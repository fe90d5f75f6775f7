//! Coupon catalog — static, compiled-in definitions

use serde::Serialize;

/// A redeemable coupon with a fixed re-redemption cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDef {
    pub id: &'static str,
    pub title: &'static str,
    /// Days the coupon stays locked after a redemption
    pub cooldown_days: i64,
    /// Whether the note input is shown for this coupon
    pub requires_note: bool,
}

const CATALOG: &[CouponDef] = &[
    CouponDef { id: "snack",   title: "🍫 Order a Snack for Me", cooldown_days: 8,  requires_note: true },
    CouponDef { id: "song",    title: "🎶 Sing Me a Song",       cooldown_days: 8,  requires_note: false },
    CouponDef { id: "date",    title: "💖 Plan a Date",          cooldown_days: 15, requires_note: false },
    CouponDef { id: "game",    title: "🎮 Play a Game with Me",  cooldown_days: 8,  requires_note: false },
    CouponDef { id: "dessert", title: "🍰 Order Desserts",       cooldown_days: 8,  requires_note: false },
    CouponDef { id: "pics",    title: "📸 Send Pictures",        cooldown_days: 8,  requires_note: false },
    CouponDef { id: "nice",    title: "✍️ Write Something Nice", cooldown_days: 8,  requires_note: false },
];

/// The fixed catalog, in display order
pub fn catalog() -> &'static [CouponDef] {
    CATALOG
}

/// Look up a coupon by id
pub fn find_coupon(id: &str) -> Option<&'static CouponDef> {
    CATALOG.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_stable() {
        let ids: Vec<&str> = catalog().iter().map(|c| c.id).collect();
        assert_eq!(ids, ["snack", "song", "date", "game", "dessert", "pics", "nice"]);
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = catalog().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn find_coupon_hits_and_misses() {
        assert_eq!(find_coupon("date").unwrap().cooldown_days, 15);
        assert!(find_coupon("yacht").is_none());
    }
}
