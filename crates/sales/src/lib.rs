//! Sales domain module.
//!
//! This crate contains the business rules for sales, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - [`Sale`] is the aggregate root; every line mutation goes through it.
//! - [`SaleItem`] holds the per-line math (quantity limits, discount tier, total).
//! - [`specification`] holds the yes/no predicates policy layers ask about a sale.
//! - [`query`] is the filter/sort/paging contract repositories implement.
//! - [`projection`] derives the read-only facts handed to response shaping.

pub mod discount;
pub mod events;
pub mod item;
pub mod projection;
pub mod query;
pub mod refs;
pub mod sale;
pub mod specification;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use discount::{DiscountTier, MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY};
pub use events::{
    ItemCancelled, SaleCancelled, SaleChange, SaleCreated, SaleEvent, SaleModified,
    SaleReactivated,
};
pub use item::{SaleItem, SaleItemState};
pub use projection::{SaleItemSummary, SaleSummary};
pub use query::{
    DateRange, PagedResult, SaleOrderBy, SaleQuery, SaleQueryParams, SortDirection,
};
pub use refs::{BranchRef, CustomerRef, ProductRef};
pub use sale::{Sale, SaleState, SaleStatus};
