//! Sale aggregate root.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesdesk_core::{
    AggregateRoot, Currency, DomainError, DomainResult, Money, ProductId, SaleId, SaleItemId,
};

use crate::discount::{MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY, ensure_quantity};
use crate::events::{
    ItemCancelled, SaleCancelled, SaleChange, SaleCreated, SaleEvent, SaleModified,
    SaleReactivated,
};
use crate::item::{SaleItem, SaleItemState};
use crate::refs::{BranchRef, CustomerRef, ProductRef};

/// Sale status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Active,
    Cancelled,
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("active") => Ok(SaleStatus::Active),
            v if v.eq_ignore_ascii_case("cancelled") => Ok(SaleStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown sale status '{other}'"))),
        }
    }
}

/// Aggregate root: Sale.
///
/// Invariants held by every public method:
/// - `total_amount` is the sum of the line totals, recomputed after each line change
/// - one line per product; adding a product again merges into its line
/// - no line changes while the sale is cancelled
/// - status only flips Active ⇄ Cancelled, never onto itself
///
/// Every mutation is computed on a copy of the lines and committed only once
/// it has fully succeeded, so an `Err` always leaves the sale untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer: CustomerRef,
    branch: BranchRef,
    status: SaleStatus,
    items: Vec<SaleItem>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    version: u64,
    pending_events: Vec<SaleEvent>,
}

impl Sale {
    /// Open a new, empty, active sale priced in `currency`.
    pub fn create(
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer: CustomerRef,
        branch: BranchRef,
        currency: Currency,
    ) -> DomainResult<Self> {
        let sale_number = sale_number.into().trim().to_string();
        if sale_number.is_empty() {
            return Err(DomainError::invalid_argument("sale number is required"));
        }

        let now = Utc::now();
        let mut sale = Self {
            id: SaleId::new(),
            sale_number,
            sale_date,
            customer,
            branch,
            status: SaleStatus::Active,
            items: Vec::new(),
            total_amount: Money::zero(currency),
            created_at: now,
            updated_at: None,
            cancelled_at: None,
            version: 0,
            pending_events: Vec::new(),
        };
        sale.record(SaleEvent::SaleCreated(SaleCreated {
            sale_id: sale.id,
            sale_number: sale.sale_number.clone(),
            customer_id: sale.customer.id(),
            branch_id: sale.branch.id(),
            occurred_at: now,
        }));
        Ok(sale)
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn customer(&self) -> &CustomerRef {
        &self.customer
    }

    pub fn branch(&self) -> &BranchRef {
        &self.branch
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn currency(&self) -> Currency {
        self.total_amount.currency()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SaleStatus::Active)
    }

    pub fn item(&self, item_id: SaleItemId) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn item_for_product(&self, product_id: ProductId) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.product().id() == product_id)
    }

    /// Add `quantity` units of `product`.
    ///
    /// If the product is already on the sale its line absorbs the quantity
    /// (the combined quantity must stay within the limit) and that same line
    /// is returned; otherwise a new line is appended.
    pub fn add_item(
        &mut self,
        product: ProductRef,
        quantity: u32,
        unit_price: Money,
    ) -> DomainResult<&SaleItem> {
        self.ensure_active()?;
        ensure_quantity(quantity)?;
        self.total_amount.ensure_same_currency(&unit_price)?;

        let mut items = self.items.clone();
        let (index, change) = match items.iter().position(|i| i.product().id() == product.id()) {
            Some(index) => {
                let existing = &mut items[index];
                let combined = existing.quantity() + quantity;
                if combined > MAX_ITEM_QUANTITY {
                    return Err(DomainError::quantity_out_of_range(
                        combined,
                        MIN_ITEM_QUANTITY,
                        MAX_ITEM_QUANTITY,
                    ));
                }
                existing.update_quantity(combined)?;
                let change = SaleChange::ItemMerged {
                    item_id: existing.id(),
                    product_id: product.id(),
                    quantity: combined,
                };
                (index, change)
            }
            None => {
                let item = SaleItem::create(product, quantity, unit_price)?;
                let change = SaleChange::ItemAdded {
                    item_id: item.id(),
                    product_id: item.product().id(),
                    quantity,
                };
                items.push(item);
                (items.len() - 1, change)
            }
        };

        self.commit_items(items)?;
        self.record_modified(change);
        Ok(&self.items[index])
    }

    /// Remove a line. Keeping at least one line is the caller's policy, not
    /// an invariant of the sale.
    pub fn remove_item(&mut self, item_id: SaleItemId) -> DomainResult<()> {
        self.ensure_active()?;
        let index = self.index_of(item_id)?;

        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit_items(items)?;

        let occurred_at = self.updated_at.unwrap_or_else(Utc::now);
        self.record(SaleEvent::ItemCancelled(ItemCancelled {
            sale_id: self.id,
            item_id: removed.id(),
            product_id: removed.product().id(),
            total_amount: self.total_amount,
            occurred_at,
        }));
        Ok(())
    }

    pub fn update_item_quantity(
        &mut self,
        item_id: SaleItemId,
        quantity: u32,
    ) -> DomainResult<&SaleItem> {
        let index = self.index_of(item_id)?;
        self.ensure_active()?;

        let mut items = self.items.clone();
        items[index].update_quantity(quantity)?;
        self.commit_items(items)?;
        self.record_modified(SaleChange::QuantityChanged { item_id, quantity });
        Ok(&self.items[index])
    }

    pub fn update_item_price(
        &mut self,
        item_id: SaleItemId,
        unit_price: Money,
    ) -> DomainResult<&SaleItem> {
        let index = self.index_of(item_id)?;
        self.ensure_active()?;

        let mut items = self.items.clone();
        items[index].update_unit_price(unit_price)?;
        self.commit_items(items)?;
        self.record_modified(SaleChange::PriceChanged { item_id, unit_price });
        Ok(&self.items[index])
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status == SaleStatus::Cancelled {
            return Err(DomainError::invalid_state("sale is already cancelled"));
        }
        let now = Utc::now();
        self.status = SaleStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = Some(now);
        self.record(SaleEvent::SaleCancelled(SaleCancelled {
            sale_id: self.id,
            occurred_at: now,
        }));
        Ok(())
    }

    pub fn reactivate(&mut self) -> DomainResult<()> {
        if self.status == SaleStatus::Active {
            return Err(DomainError::invalid_state("sale is already active"));
        }
        let now = Utc::now();
        self.status = SaleStatus::Active;
        self.cancelled_at = None;
        self.updated_at = Some(now);
        self.record(SaleEvent::SaleReactivated(SaleReactivated {
            sale_id: self.id,
            occurred_at: now,
        }));
        Ok(())
    }

    pub fn has_discounted_items(&self) -> bool {
        self.items.iter().any(SaleItem::is_discounted)
    }

    /// Units across all lines (not the number of lines).
    pub fn total_items_count(&self) -> u32 {
        self.items.iter().map(SaleItem::quantity).sum()
    }

    pub fn is_eligible_for_bulk_discount(&self) -> bool {
        self.items.iter().any(|i| i.quantity() >= 4)
    }

    /// Events recorded since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<SaleEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_events(&self) -> &[SaleEvent] {
        &self.pending_events
    }

    /// Advance the version after a successful write.
    ///
    /// Only `SaleRepository` implementations may call this, once per accepted
    /// write. Calling it anywhere else defeats the stale-write check.
    #[doc(hidden)]
    pub fn mark_committed(&mut self) {
        self.version += 1;
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.status == SaleStatus::Cancelled {
            return Err(DomainError::invalid_state("cannot modify a cancelled sale"));
        }
        Ok(())
    }

    fn index_of(&self, item_id: SaleItemId) -> DomainResult<usize> {
        self.items
            .iter()
            .position(|i| i.id() == item_id)
            .ok_or_else(|| DomainError::not_found(format!("sale item {item_id}")))
    }

    fn commit_items(&mut self, items: Vec<SaleItem>) -> DomainResult<()> {
        let total = Money::sum(self.currency(), items.iter().map(SaleItem::total_amount))?;
        self.items = items;
        self.total_amount = total;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    fn record_modified(&mut self, change: SaleChange) {
        let occurred_at = self.updated_at.unwrap_or_else(Utc::now);
        self.record(SaleEvent::SaleModified(SaleModified {
            sale_id: self.id,
            change,
            total_amount: self.total_amount,
            occurred_at,
        }));
    }

    fn record(&mut self, event: SaleEvent) {
        self.pending_events.push(event);
    }
}

/// Stored form of a sale, as a persistence adapter reads it back.
///
/// Totals, discount tiers and pending events are not stored; [`Sale::restore`]
/// derives them again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleState {
    pub id: SaleId,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: CustomerRef,
    pub branch: BranchRef,
    pub currency: Currency,
    pub status: SaleStatus,
    pub items: Vec<SaleItemState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Sale {
    /// Rebuild a persisted sale at its stored version.
    ///
    /// Rejects state no sequence of operations could have produced: a nil id,
    /// a blank number, a product on two lines, a line in another currency, or
    /// a cancellation time that disagrees with the status.
    pub fn restore(state: SaleState) -> DomainResult<Self> {
        if state.id.is_nil() {
            return Err(DomainError::invalid_argument("sale id is required"));
        }
        let sale_number = state.sale_number.trim().to_string();
        if sale_number.is_empty() {
            return Err(DomainError::invalid_argument("sale number is required"));
        }
        match (state.status, state.cancelled_at) {
            (SaleStatus::Active, Some(_)) => {
                return Err(DomainError::invalid_argument(
                    "an active sale cannot carry a cancellation time",
                ));
            }
            (SaleStatus::Cancelled, None) => {
                return Err(DomainError::invalid_argument(
                    "a cancelled sale needs a cancellation time",
                ));
            }
            _ => {}
        }

        let zero = Money::zero(state.currency);
        let mut items: Vec<SaleItem> = Vec::with_capacity(state.items.len());
        for item_state in state.items {
            let item = SaleItem::restore(item_state)?;
            zero.ensure_same_currency(&item.unit_price())?;
            if items.iter().any(|i| i.product().id() == item.product().id()) {
                return Err(DomainError::invalid_argument(format!(
                    "product {} appears on more than one line",
                    item.product().id()
                )));
            }
            if items.iter().any(|i| i.id() == item.id()) {
                return Err(DomainError::invalid_argument(format!(
                    "sale item {} appears more than once",
                    item.id()
                )));
            }
            items.push(item);
        }

        let total_amount = Money::sum(state.currency, items.iter().map(SaleItem::total_amount))?;
        Ok(Self {
            id: state.id,
            sale_number,
            sale_date: state.sale_date,
            customer: state.customer,
            branch: state.branch,
            status: state.status,
            items,
            total_amount,
            created_at: state.created_at,
            updated_at: state.updated_at,
            cancelled_at: state.cancelled_at,
            version: state.version,
            pending_events: Vec::new(),
        })
    }

    /// Stored form of this sale. Pending events are not included.
    pub fn to_state(&self) -> SaleState {
        SaleState {
            id: self.id,
            sale_number: self.sale_number.clone(),
            sale_date: self.sale_date,
            customer: self.customer.clone(),
            branch: self.branch.clone(),
            currency: self.currency(),
            status: self.status,
            items: self.items.iter().map(SaleItem::to_state).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            cancelled_at: self.cancelled_at,
            version: self.version,
        }
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
