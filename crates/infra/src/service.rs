//! Sales application service.
//!
//! Orchestrates every sale use case the same way:
//!
//! ```text
//! load (repository) → mutate (aggregate) → persist (repository) → publish (bus)
//! ```
//!
//! Caller-level policies that are not invariants of the aggregate live here:
//! sale numbers are unique, a sale is created with at least one line, the last
//! line cannot be removed, and only sales inside the configured window can be
//! cancelled.
//!
//! Events are published only after the write succeeded. If publication then
//! fails the write stands and [`ServiceError::Publish`] is returned, giving
//! at-least-once delivery when callers retry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use salesdesk_core::{AggregateRoot, Currency, DomainError, Money, SaleId, SaleItemId};
use salesdesk_events::{EventBus, EventEnvelope};
use salesdesk_sales::specification::{
    can_be_cancelled, contains_item, has_multiple_items_and_active,
};
use salesdesk_sales::{
    BranchRef, CustomerRef, PagedResult, ProductRef, Sale, SaleEvent, SaleQueryParams,
};

use crate::config::SalesConfig;
use crate::repository::{RepositoryError, SaleRepository};

/// Aggregate type stamped on published envelopes.
pub const SALE_AGGREGATE_TYPE: &str = "sales.sale";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification of a [`ServiceError`], for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Validation,
    NotFound,
    InvalidState,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Publication failed after a successful write.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(err) => match err {
                DomainError::InvalidArgument(_)
                | DomainError::QuantityOutOfRange { .. }
                | DomainError::InvalidId(_) => ErrorKind::InvalidArgument,
                DomainError::Validation(_) => ErrorKind::Validation,
                DomainError::NotFound(_) => ErrorKind::NotFound,
                DomainError::InvalidStateTransition(_) => ErrorKind::InvalidState,
                DomainError::Conflict(_) => ErrorKind::Conflict,
            },
            ServiceError::Repository(err) => match err {
                RepositoryError::Conflict(_) | RepositoryError::Duplicate(_) => ErrorKind::Conflict,
                RepositoryError::NotFound(_) => ErrorKind::NotFound,
                RepositoryError::Storage(_) => ErrorKind::Internal,
            },
            ServiceError::Publish(_) => ErrorKind::Internal,
        }
    }
}

/// A line requested when creating or extending a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleItem {
    pub product: ProductRef,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSale {
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer: CustomerRef,
    pub branch: BranchRef,
    pub currency: Currency,
    pub items: Vec<NewSaleItem>,
}

#[derive(Debug)]
pub struct SalesService<R, B> {
    repository: R,
    bus: B,
    config: SalesConfig,
}

impl<R, B> SalesService<R, B> {
    pub fn new(repository: R, bus: B, config: SalesConfig) -> Self {
        Self {
            repository,
            bus,
            config,
        }
    }

    pub fn config(&self) -> &SalesConfig {
        &self.config
    }

    pub fn into_parts(self) -> (R, B) {
        (self.repository, self.bus)
    }
}

impl<R, B> SalesService<R, B>
where
    R: SaleRepository,
    B: EventBus<EventEnvelope<SaleEvent>>,
{
    /// Open a sale with its initial lines. Repeated products merge into one line.
    #[tracing::instrument(skip(self, command), fields(sale_number = %command.sale_number))]
    pub fn create_sale(&self, command: CreateSale) -> ServiceResult<Sale> {
        if command.items.is_empty() {
            return Err(DomainError::validation("a sale needs at least one item").into());
        }
        if self
            .repository
            .get_by_sale_number(command.sale_number.trim())?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "sale number '{}' is already in use",
                command.sale_number.trim()
            ))
            .into());
        }

        let mut sale = Sale::create(
            command.sale_number,
            command.sale_date,
            command.customer,
            command.branch,
            command.currency,
        )?;
        for item in command.items {
            sale.add_item(item.product, item.quantity, item.unit_price)?;
        }

        let events = sale.take_events();
        let stored = self.repository.create(sale)?;
        tracing::info!(
            sale_id = %stored.id_typed(),
            total = %stored.total_amount(),
            items = stored.items().len(),
            "sale created"
        );
        self.publish(&stored, events)?;
        Ok(stored)
    }

    pub fn get_sale(&self, sale_id: SaleId) -> ServiceResult<Sale> {
        self.load(sale_id)
    }

    pub fn get_sale_by_number(&self, sale_number: &str) -> ServiceResult<Sale> {
        self.repository
            .get_by_sale_number(sale_number.trim())?
            .ok_or_else(|| DomainError::not_found(format!("sale '{}'", sale_number.trim())).into())
    }

    /// Validate listing parameters (unset page size falls back to the
    /// configured default) and run the query.
    #[tracing::instrument(skip(self, params))]
    pub fn list_sales(&self, params: SaleQueryParams) -> ServiceResult<PagedResult<Sale>> {
        let query = params.into_query(self.config.default_page_size)?;
        let page = self.repository.get_paginated(&query)?;
        tracing::debug!(
            page = page.current_page(),
            returned = page.items().len(),
            total = page.total_count(),
            "sales listed"
        );
        Ok(page)
    }

    #[tracing::instrument(skip(self, item), fields(sale_id = %sale_id, product_id = %item.product.id()))]
    pub fn add_item(&self, sale_id: SaleId, item: NewSaleItem) -> ServiceResult<Sale> {
        self.mutate(sale_id, |sale| {
            sale.add_item(item.product, item.quantity, item.unit_price)
                .map(|_| ())
        })
    }

    #[tracing::instrument(skip(self), fields(sale_id = %sale_id, item_id = %item_id))]
    pub fn update_item_quantity(
        &self,
        sale_id: SaleId,
        item_id: SaleItemId,
        quantity: u32,
    ) -> ServiceResult<Sale> {
        self.mutate(sale_id, |sale| {
            sale.update_item_quantity(item_id, quantity).map(|_| ())
        })
    }

    #[tracing::instrument(skip(self), fields(sale_id = %sale_id, item_id = %item_id))]
    pub fn update_item_price(
        &self,
        sale_id: SaleId,
        item_id: SaleItemId,
        unit_price: Money,
    ) -> ServiceResult<Sale> {
        self.mutate(sale_id, |sale| {
            sale.update_item_price(item_id, unit_price).map(|_| ())
        })
    }

    /// Remove a line; the last remaining line of an active sale cannot be removed.
    #[tracing::instrument(skip(self), fields(sale_id = %sale_id, item_id = %item_id))]
    pub fn remove_item(&self, sale_id: SaleId, item_id: SaleItemId) -> ServiceResult<Sale> {
        self.mutate(sale_id, |sale| {
            if sale.is_active() && contains_item(sale, item_id) && !has_multiple_items_and_active(sale)
            {
                return Err(DomainError::validation(
                    "cannot remove the last item of a sale",
                ));
            }
            sale.remove_item(item_id)
        })
    }

    #[tracing::instrument(skip(self), fields(sale_id = %sale_id))]
    pub fn cancel_sale(&self, sale_id: SaleId) -> ServiceResult<Sale> {
        let window = self.config.cancellation_window_days;
        self.mutate(sale_id, |sale| {
            if sale.is_active() && !can_be_cancelled(sale, window, Utc::now()) {
                return Err(DomainError::invalid_state(format!(
                    "sale is older than the {window}-day cancellation window"
                )));
            }
            sale.cancel()
        })
    }

    #[tracing::instrument(skip(self), fields(sale_id = %sale_id))]
    pub fn reactivate_sale(&self, sale_id: SaleId) -> ServiceResult<Sale> {
        self.mutate(sale_id, Sale::reactivate)
    }

    #[tracing::instrument(skip(self), fields(sale_id = %sale_id))]
    pub fn delete_sale(&self, sale_id: SaleId) -> ServiceResult<()> {
        if !self.repository.delete(sale_id)? {
            return Err(DomainError::not_found(format!("sale {sale_id}")).into());
        }
        tracing::info!("sale deleted");
        Ok(())
    }

    fn load(&self, sale_id: SaleId) -> ServiceResult<Sale> {
        self.repository
            .get_by_id(sale_id)?
            .ok_or_else(|| DomainError::not_found(format!("sale {sale_id}")).into())
    }

    /// Load, apply `change`, persist, publish. Nothing is written when `change` fails.
    fn mutate(
        &self,
        sale_id: SaleId,
        change: impl FnOnce(&mut Sale) -> Result<(), DomainError>,
    ) -> ServiceResult<Sale> {
        let mut sale = self.load(sale_id)?;
        if let Err(err) = change(&mut sale) {
            tracing::debug!(error = %err, "sale change rejected");
            return Err(err.into());
        }

        let events = sale.take_events();
        let stored = self.repository.update(sale)?;
        tracing::info!(
            version = stored.version(),
            total = %stored.total_amount(),
            status = ?stored.status(),
            "sale updated"
        );
        self.publish(&stored, events)?;
        Ok(stored)
    }

    fn publish(&self, sale: &Sale, events: Vec<SaleEvent>) -> ServiceResult<()> {
        let aggregate_id = *sale.id_typed().as_uuid();
        let version = sale.version();
        for event in events {
            let envelope = EventEnvelope::new(aggregate_id, SALE_AGGREGATE_TYPE, version, event);
            self.bus.publish(envelope).map_err(|err| {
                tracing::warn!(sale_id = %sale.id_typed(), error = ?err, "event publication failed");
                ServiceError::Publish(format!("{err:?}"))
            })?;
        }
        Ok(())
    }
}
