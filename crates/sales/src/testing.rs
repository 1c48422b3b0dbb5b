//! Fixtures for tests (enabled by `cfg(test)` or the `test-support` feature).
//!
//! [`SaleBuilder`] assembles a sale in an explicit state (id, status, lines,
//! dates) without going through the mutation history, while still running
//! every line through the same validation the aggregate uses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use salesdesk_core::{
    BranchId, Currency, CustomerId, DomainResult, Money, ProductId, SaleId, SaleItemId,
};

use crate::item::SaleItemState;
use crate::refs::{BranchRef, CustomerRef, ProductRef};
use crate::sale::{Sale, SaleState, SaleStatus};

/// USD amount; panics on negative literals.
pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::usd()).expect("fixture amounts are non-negative")
}

pub fn sample_customer(name: &str) -> CustomerRef {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    CustomerRef::new(CustomerId::new(), name, email).expect("fixture customer is valid")
}

pub fn sample_branch(name: &str) -> BranchRef {
    BranchRef::new(BranchId::new(), name, format!("{name} Avenue, 100"))
        .expect("fixture branch is valid")
}

pub fn sample_product(name: &str) -> ProductRef {
    ProductRef::new(ProductId::new(), name, format!("{name} (fixture)"))
        .expect("fixture product is valid")
}

/// Builder for sales in an arbitrary, but still consistent, state.
#[derive(Debug, Clone)]
pub struct SaleBuilder {
    id: SaleId,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer: CustomerRef,
    branch: BranchRef,
    currency: Currency,
    status: SaleStatus,
    items: Vec<(ProductRef, u32, Money)>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Default for SaleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SaleBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SaleId::new(),
            sale_number: "S-TEST-0001".to_string(),
            sale_date: now,
            customer: sample_customer("Test Customer"),
            branch: sample_branch("Test Branch"),
            currency: Currency::usd(),
            status: SaleStatus::Active,
            items: Vec::new(),
            created_at: now,
            cancelled_at: None,
            version: 0,
        }
    }

    pub fn id(mut self, id: SaleId) -> Self {
        self.id = id;
        self
    }

    pub fn sale_number(mut self, sale_number: impl Into<String>) -> Self {
        self.sale_number = sale_number.into();
        self
    }

    pub fn sale_date(mut self, sale_date: DateTime<Utc>) -> Self {
        self.sale_date = sale_date;
        self
    }

    pub fn customer(mut self, customer: CustomerRef) -> Self {
        self.customer = customer;
        self
    }

    pub fn branch(mut self, branch: BranchRef) -> Self {
        self.branch = branch;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn status(mut self, status: SaleStatus) -> Self {
        self.status = status;
        self
    }

    /// Cancelled, with the given cancellation time.
    pub fn cancelled_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = SaleStatus::Cancelled;
        self.cancelled_at = Some(at);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn item(mut self, product: ProductRef, quantity: u32, unit_price: Money) -> Self {
        self.items.push((product, quantity, unit_price));
        self
    }

    /// Fails when a line is invalid, a product repeats, or currencies differ.
    ///
    /// A cancelled sale without an explicit cancellation time is taken to
    /// have been cancelled when it was created.
    pub fn build(self) -> DomainResult<Sale> {
        let items = self
            .items
            .into_iter()
            .map(|(product, quantity, unit_price)| SaleItemState {
                id: SaleItemId::new(),
                product,
                quantity,
                unit_price,
            })
            .collect();
        let cancelled_at = match self.status {
            SaleStatus::Active => None,
            SaleStatus::Cancelled => Some(self.cancelled_at.unwrap_or(self.created_at)),
        };

        Sale::restore(SaleState {
            id: self.id,
            sale_number: self.sale_number,
            sale_date: self.sale_date,
            customer: self.customer,
            branch: self.branch,
            currency: self.currency,
            status: self.status,
            items,
            created_at: self.created_at,
            updated_at: None,
            cancelled_at,
            version: self.version,
        })
    }
}
