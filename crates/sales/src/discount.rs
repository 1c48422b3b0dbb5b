//! Quantity-driven discount tiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainError, DomainResult};

/// Smallest quantity a sale line may carry.
pub const MIN_ITEM_QUANTITY: u32 = 1;
/// Largest quantity of one product a single sale may carry.
pub const MAX_ITEM_QUANTITY: u32 = 20;

/// Discount bucket derived from a line's quantity.
///
/// | quantity | tier        | discount |
/// |----------|-------------|----------|
/// | 1..=3    | `Standard`  | 0 %      |
/// | 4..=9    | `Bulk`      | 10 %     |
/// | 10..=20  | `Wholesale` | 20 %     |
///
/// The tier depends on quantity only; changing the unit price never moves a
/// line to another tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountTier {
    Standard,
    Bulk,
    Wholesale,
}

impl DiscountTier {
    pub fn for_quantity(quantity: u32) -> DomainResult<Self> {
        ensure_quantity(quantity)?;
        Ok(match quantity {
            1..=3 => DiscountTier::Standard,
            4..=9 => DiscountTier::Bulk,
            _ => DiscountTier::Wholesale,
        })
    }

    /// Discount in percent (0, 10 or 20).
    pub fn percentage(self) -> Decimal {
        match self {
            DiscountTier::Standard => Decimal::ZERO,
            DiscountTier::Bulk => Decimal::TEN,
            DiscountTier::Wholesale => Decimal::from(20),
        }
    }

    pub fn is_discounted(self) -> bool {
        !matches!(self, DiscountTier::Standard)
    }
}

/// Rejects quantities outside `MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY`.
pub fn ensure_quantity(quantity: u32) -> DomainResult<()> {
    if !(MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(DomainError::quantity_out_of_range(
            quantity,
            MIN_ITEM_QUANTITY,
            MAX_ITEM_QUANTITY,
        ));
    }
    Ok(())
}
