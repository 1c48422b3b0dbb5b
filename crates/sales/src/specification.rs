//! Yes/no questions policy layers ask about a sale.
//!
//! All functions are pure: they read the sale and never change it.

use chrono::{DateTime, TimeDelta, Utc};

use salesdesk_core::{ProductId, SaleItemId};

use crate::sale::{Sale, SaleStatus};

/// Sales older than this many days can no longer be cancelled by default.
pub const DEFAULT_CANCELLATION_WINDOW_DAYS: u32 = 30;

pub fn is_cancelled(sale: &Sale) -> bool {
    sale.status() == SaleStatus::Cancelled
}

pub fn contains_product(sale: &Sale, product_id: ProductId) -> bool {
    sale.item_for_product(product_id).is_some()
}

pub fn contains_item(sale: &Sale, item_id: SaleItemId) -> bool {
    sale.item(item_id).is_some()
}

/// Active and dated no earlier than `max_age_days` before `now` (inclusive).
pub fn can_be_cancelled(sale: &Sale, max_age_days: u32, now: DateTime<Utc>) -> bool {
    if sale.status() != SaleStatus::Active {
        return false;
    }
    match TimeDelta::try_days(i64::from(max_age_days)).and_then(|d| now.checked_sub_signed(d)) {
        Some(cutoff) => sale.sale_date() >= cutoff,
        // Window reaches past the representable range: everything is inside it.
        None => true,
    }
}

/// More than one line and still active, i.e. a line may be removed.
pub fn has_multiple_items_and_active(sale: &Sale) -> bool {
    sale.items().len() > 1 && sale.status() == SaleStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SaleBuilder, sample_product, usd};
    use rust_decimal_macros::dec;

    #[test]
    fn cancelled_sale_is_cancelled() {
        let sale = SaleBuilder::new().status(SaleStatus::Cancelled).build().unwrap();
        assert!(is_cancelled(&sale));
        assert!(!is_cancelled(&SaleBuilder::new().build().unwrap()));
    }

    #[test]
    fn product_and_item_membership() {
        let product = sample_product("A");
        let sale = SaleBuilder::new().item(product.clone(), 1, usd(dec!(1))).build().unwrap();
        let item_id = sale.items()[0].id();

        assert!(contains_product(&sale, product.id()));
        assert!(!contains_product(&sale, ProductId::new()));
        assert!(contains_item(&sale, item_id));
        assert!(!contains_item(&sale, SaleItemId::new()));
    }

    #[test]
    fn cancellation_window_is_inclusive() {
        let now = Utc::now();
        let exactly_thirty = SaleBuilder::new()
            .sale_date(now - TimeDelta::days(30))
            .build()
            .unwrap();
        let thirty_one = SaleBuilder::new()
            .sale_date(now - TimeDelta::days(31))
            .build()
            .unwrap();

        assert!(can_be_cancelled(&exactly_thirty, DEFAULT_CANCELLATION_WINDOW_DAYS, now));
        assert!(!can_be_cancelled(&thirty_one, DEFAULT_CANCELLATION_WINDOW_DAYS, now));
        assert!(can_be_cancelled(&thirty_one, 31, now));
    }

    #[test]
    fn cancelled_sale_cannot_be_cancelled_again() {
        let sale = SaleBuilder::new().status(SaleStatus::Cancelled).build().unwrap();
        assert!(!can_be_cancelled(&sale, DEFAULT_CANCELLATION_WINDOW_DAYS, Utc::now()));
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let sale = SaleBuilder::new().build().unwrap();
        assert!(can_be_cancelled(&sale, u32::MAX, Utc::now()));
    }

    #[test]
    fn removable_line_needs_two_lines_and_active_status() {
        let one = SaleBuilder::new().item(sample_product("A"), 1, usd(dec!(1))).build().unwrap();
        let two = SaleBuilder::new()
            .item(sample_product("A"), 1, usd(dec!(1)))
            .item(sample_product("B"), 1, usd(dec!(1)))
            .build()
            .unwrap();
        let two_cancelled = SaleBuilder::new()
            .item(sample_product("A"), 1, usd(dec!(1)))
            .item(sample_product("B"), 1, usd(dec!(1)))
            .status(SaleStatus::Cancelled)
            .build()
            .unwrap();

        assert!(!has_multiple_items_and_active(&one));
        assert!(has_multiple_items_and_active(&two));
        assert!(!has_multiple_items_and_active(&two_cancelled));
    }
}
