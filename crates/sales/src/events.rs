//! Facts recorded by the sale aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use salesdesk_core::{BranchId, CustomerId, Money, ProductId, SaleId, SaleItemId};
use salesdesk_events::Event;

/// Event: SaleCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleCreated {
    pub sale_id: SaleId,
    pub sale_number: String,
    pub customer_id: CustomerId,
    pub branch_id: BranchId,
    pub occurred_at: DateTime<Utc>,
}

/// What changed in a [`SaleModified`] event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleChange {
    ItemAdded {
        item_id: SaleItemId,
        product_id: ProductId,
        quantity: u32,
    },
    /// A product already on the sale was added again and merged into its line.
    ItemMerged {
        item_id: SaleItemId,
        product_id: ProductId,
        quantity: u32,
    },
    QuantityChanged {
        item_id: SaleItemId,
        quantity: u32,
    },
    PriceChanged {
        item_id: SaleItemId,
        unit_price: Money,
    },
}

/// Event: SaleModified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleModified {
    pub sale_id: SaleId,
    pub change: SaleChange,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemCancelled (a line was removed from the sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCancelled {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
    pub product_id: ProductId,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleCancelled {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleReactivated {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SaleEvent {
    SaleCreated(SaleCreated),
    SaleModified(SaleModified),
    ItemCancelled(ItemCancelled),
    SaleCancelled(SaleCancelled),
    SaleReactivated(SaleReactivated),
}

impl SaleEvent {
    pub fn sale_id(&self) -> SaleId {
        match self {
            SaleEvent::SaleCreated(e) => e.sale_id,
            SaleEvent::SaleModified(e) => e.sale_id,
            SaleEvent::ItemCancelled(e) => e.sale_id,
            SaleEvent::SaleCancelled(e) => e.sale_id,
            SaleEvent::SaleReactivated(e) => e.sale_id,
        }
    }
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated(_) => "sales.sale.created",
            SaleEvent::SaleModified(_) => "sales.sale.modified",
            SaleEvent::ItemCancelled(_) => "sales.sale.item_cancelled",
            SaleEvent::SaleCancelled(_) => "sales.sale.cancelled",
            SaleEvent::SaleReactivated(_) => "sales.sale.reactivated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated(e) => e.occurred_at,
            SaleEvent::SaleModified(e) => e.occurred_at,
            SaleEvent::ItemCancelled(e) => e.occurred_at,
            SaleEvent::SaleCancelled(e) => e.occurred_at,
            SaleEvent::SaleReactivated(e) => e.occurred_at,
        }
    }
}
