//! Sale line entity.

use rust_decimal::Decimal;
use serde::Serialize;

use salesdesk_core::{DomainError, DomainResult, Entity, Money, SaleItemId};

use crate::discount::DiscountTier;
use crate::refs::ProductRef;

/// One line of a sale: a product, how many, at what price.
///
/// Lines are created, changed and removed only through [`crate::Sale`]; the
/// mutators here are crate-private so the sale can keep its total in step.
/// A failed mutation leaves the line exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleItem {
    id: SaleItemId,
    product: ProductRef,
    quantity: u32,
    unit_price: Money,
    discount: DiscountTier,
    total_amount: Money,
}

/// Stored form of a line. Tier and total are derived again on restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItemState {
    pub id: SaleItemId,
    pub product: ProductRef,
    pub quantity: u32,
    pub unit_price: Money,
}

impl SaleItem {
    pub(crate) fn create(product: ProductRef, quantity: u32, unit_price: Money) -> DomainResult<Self> {
        Self::restore(SaleItemState {
            id: SaleItemId::new(),
            product,
            quantity,
            unit_price,
        })
    }

    /// Rebuild a persisted line, re-validating its quantity.
    pub fn restore(state: SaleItemState) -> DomainResult<Self> {
        if state.id.is_nil() {
            return Err(DomainError::invalid_argument("sale item id is required"));
        }
        let discount = DiscountTier::for_quantity(state.quantity)?;
        let total_amount = line_total(&state.unit_price, state.quantity, discount)?;
        Ok(Self {
            id: state.id,
            product: state.product,
            quantity: state.quantity,
            unit_price: state.unit_price,
            discount,
            total_amount,
        })
    }

    /// Stored form of this line.
    pub fn to_state(&self) -> SaleItemState {
        SaleItemState {
            id: self.id,
            product: self.product.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }

    /// Change the quantity; the discount tier follows it.
    pub(crate) fn update_quantity(&mut self, quantity: u32) -> DomainResult<()> {
        let discount = DiscountTier::for_quantity(quantity)?;
        let total_amount = line_total(&self.unit_price, quantity, discount)?;
        self.quantity = quantity;
        self.discount = discount;
        self.total_amount = total_amount;
        Ok(())
    }

    /// Change the price; the tier stays where the quantity put it.
    pub(crate) fn update_unit_price(&mut self, unit_price: Money) -> DomainResult<()> {
        self.unit_price.ensure_same_currency(&unit_price)?;
        let total_amount = line_total(&unit_price, self.quantity, self.discount)?;
        self.unit_price = unit_price;
        self.total_amount = total_amount;
        Ok(())
    }

    pub fn id(&self) -> SaleItemId {
        self.id
    }

    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount_tier(&self) -> DiscountTier {
        self.discount
    }

    pub fn discount_percentage(&self) -> Decimal {
        self.discount.percentage()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn is_discounted(&self) -> bool {
        self.discount.is_discounted()
    }
}

impl Entity for SaleItem {
    type Id = SaleItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `unit_price × quantity × (1 − discount / 100)`
fn line_total(unit_price: &Money, quantity: u32, discount: DiscountTier) -> DomainResult<Money> {
    unit_price.multiply(quantity)?.apply_discount(discount.percentage())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_product, usd};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use salesdesk_core::Currency;

    fn item(quantity: u32, price: Decimal) -> SaleItem {
        SaleItem::create(sample_product("Widget"), quantity, usd(price)).unwrap()
    }

    #[test]
    fn four_units_get_ten_percent() {
        let line = item(4, dec!(10.00));
        assert_eq!(line.discount_percentage(), dec!(10));
        assert_eq!(line.total_amount().amount(), dec!(36.00));
    }

    #[test]
    fn ten_units_get_twenty_percent() {
        let line = item(10, dec!(10.00));
        assert_eq!(line.discount_percentage(), dec!(20));
        assert_eq!(line.total_amount().amount(), dec!(80.00));
    }

    #[test]
    fn three_units_pay_full_price() {
        let line = item(3, dec!(10.00));
        assert!(!line.is_discounted());
        assert_eq!(line.total_amount().amount(), dec!(30.00));
    }

    #[test]
    fn create_rejects_out_of_range_quantity() {
        let err = SaleItem::create(sample_product("Widget"), 21, usd(dec!(1))).unwrap_err();
        assert!(matches!(err, DomainError::QuantityOutOfRange { quantity: 21, .. }));
    }

    #[test]
    fn quantity_change_moves_the_tier() {
        let mut line = item(3, dec!(10.00));
        line.update_quantity(12).unwrap();
        assert_eq!(line.discount_tier(), DiscountTier::Wholesale);
        assert_eq!(line.total_amount().amount(), dec!(96.00));
    }

    #[test]
    fn rejected_quantity_change_leaves_the_line_untouched() {
        let mut line = item(5, dec!(10.00));
        let before = line.clone();
        assert!(line.update_quantity(0).is_err());
        assert!(line.update_quantity(25).is_err());
        assert_eq!(line, before);
    }

    #[test]
    fn price_change_keeps_the_tier() {
        let mut line = item(4, dec!(10.00));
        line.update_unit_price(usd(dec!(20.00))).unwrap();
        assert_eq!(line.discount_tier(), DiscountTier::Bulk);
        assert_eq!(line.total_amount().amount(), dec!(72.00));
    }

    #[test]
    fn price_in_another_currency_is_rejected() {
        let mut line = item(4, dec!(10.00));
        let eur = Money::new(dec!(5), Currency::new("EUR").unwrap()).unwrap();
        assert!(matches!(
            line.update_unit_price(eur),
            Err(DomainError::InvalidArgument(_))
        ));
        assert_eq!(line.unit_price(), usd(dec!(10.00)));
    }

    #[test]
    fn restore_keeps_the_id_and_derives_tier_and_total() {
        let line = item(4, dec!(10.00));
        let restored = SaleItem::restore(line.to_state()).unwrap();
        assert_eq!(restored, line);

        let mut state = line.to_state();
        state.quantity = 0;
        assert!(matches!(
            SaleItem::restore(state),
            Err(DomainError::QuantityOutOfRange { quantity: 0, .. })
        ));
    }

    #[test]
    fn restore_rejects_a_nil_id() {
        let mut state = item(1, dec!(1)).to_state();
        state.id = "00000000-0000-0000-0000-000000000000".parse().unwrap();
        assert!(matches!(
            SaleItem::restore(state),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total = price × quantity × (1 − discount/100), for any valid input.
        #[test]
        fn total_matches_formula(quantity in 1u32..=20, cents in 0i64..1_000_000) {
            let price = Decimal::new(cents, 2);
            let line = item(quantity, price);
            let expected = price
                * Decimal::from(quantity)
                * (Decimal::ONE - line.discount_percentage() / Decimal::ONE_HUNDRED);
            prop_assert_eq!(line.total_amount().amount(), expected);
        }

        /// Property: applying the same quantity twice gives the same total both times.
        #[test]
        fn quantity_update_is_idempotent(start in 1u32..=20, target in 1u32..=20) {
            let mut line = item(start, dec!(7.35));
            line.update_quantity(target).unwrap();
            let first = line.total_amount();
            line.update_quantity(target).unwrap();
            prop_assert_eq!(line.total_amount(), first);
        }
    }
}
