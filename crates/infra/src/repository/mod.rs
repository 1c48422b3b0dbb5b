//! Sale persistence port.
//!
//! The repository is the source of truth for sales. It stores whole
//! aggregates and enforces two things the aggregate cannot see on its own:
//! uniqueness of sale ids and sale numbers, and optimistic concurrency via
//! the aggregate version.
//!
//! ## Versioning
//!
//! - `create` accepts only never-persisted sales (version 0) and stores them at version 1.
//! - `update` requires the incoming version to equal the stored one
//!   (`ExpectedVersion::Exact`) and stores `version + 1`.
//! - A mismatch is [`RepositoryError::Conflict`]; the caller reloads and retries.
//!
//! Callers drain the sale's pending events before writing; repositories
//! neither publish nor inspect them.

mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use salesdesk_core::SaleId;
use salesdesk_sales::{PagedResult, Sale, SaleQuery};

pub use in_memory::InMemorySaleRepository;

/// Repository operation error.
///
/// Infrastructure failures (storage, concurrency, uniqueness) as opposed to
/// domain errors raised by the aggregate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("duplicate sale: {0}")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

pub trait SaleRepository: Send + Sync {
    /// Persist a new sale; returns the stored copy (version 1).
    fn create(&self, sale: Sale) -> Result<Sale, RepositoryError>;

    fn get_by_id(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError>;

    /// Exact match on the sale number.
    fn get_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>, RepositoryError>;

    /// Replace a stored sale; returns the stored copy with its version advanced.
    fn update(&self, sale: Sale) -> Result<Sale, RepositoryError>;

    /// Returns `false` when there was nothing to delete.
    fn delete(&self, id: SaleId) -> Result<bool, RepositoryError>;

    fn get_paginated(&self, query: &SaleQuery) -> Result<PagedResult<Sale>, RepositoryError>;
}

impl<R> SaleRepository for Arc<R>
where
    R: SaleRepository + ?Sized,
{
    fn create(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        (**self).create(sale)
    }

    fn get_by_id(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        (**self).get_by_id(id)
    }

    fn get_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>, RepositoryError> {
        (**self).get_by_sale_number(sale_number)
    }

    fn update(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        (**self).update(sale)
    }

    fn delete(&self, id: SaleId) -> Result<bool, RepositoryError> {
        (**self).delete(id)
    }

    fn get_paginated(&self, query: &SaleQuery) -> Result<PagedResult<Sale>, RepositoryError> {
        (**self).get_paginated(query)
    }
}
