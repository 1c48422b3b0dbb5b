//! Read-only view of a sale for response shaping.
//!
//! Everything here is derived on demand from the aggregate; nothing is cached
//! on the sale beyond its own `total_amount`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use salesdesk_core::{Money, SaleId, SaleItemId};

use crate::item::SaleItem;
use crate::refs::{BranchRef, CustomerRef, ProductRef};
use crate::sale::{Sale, SaleStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleItemSummary {
    pub id: SaleItemId,
    pub product: ProductRef,
    pub quantity: u32,
    pub unit_price: Money,
    pub discount_percentage: Decimal,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSummary {
    pub id: SaleId,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: CustomerRef,
    pub branch: BranchRef,
    pub status: SaleStatus,
    pub total_amount: Money,
    pub total_items_count: u32,
    pub has_discounted_items: bool,
    pub is_eligible_for_bulk_discount: bool,
    pub items: Vec<SaleItemSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&SaleItem> for SaleItemSummary {
    fn from(item: &SaleItem) -> Self {
        Self {
            id: item.id(),
            product: item.product().clone(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            discount_percentage: item.discount_percentage(),
            total_amount: item.total_amount(),
        }
    }
}

impl From<&Sale> for SaleSummary {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id_typed(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer: sale.customer().clone(),
            branch: sale.branch().clone(),
            status: sale.status(),
            total_amount: sale.total_amount(),
            total_items_count: sale.total_items_count(),
            has_discounted_items: sale.has_discounted_items(),
            is_eligible_for_bulk_discount: sale.is_eligible_for_bulk_discount(),
            items: sale.items().iter().map(SaleItemSummary::from).collect(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
            cancelled_at: sale.cancelled_at(),
        }
    }
}
