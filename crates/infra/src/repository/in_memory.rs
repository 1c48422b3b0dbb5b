use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use salesdesk_core::{AggregateRoot, ExpectedVersion, SaleId};
use salesdesk_sales::{PagedResult, Sale, SaleQuery};

use super::{RepositoryError, SaleRepository};

/// In-memory sale repository.
///
/// Intended for tests/dev. Queries scan every stored sale.
#[derive(Debug, Default)]
pub struct InMemorySaleRepository {
    sales: RwLock<HashMap<SaleId, Sale>>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SaleId, Sale>>, RepositoryError> {
        self.sales
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SaleId, Sale>>, RepositoryError> {
        self.sales
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }
}

fn check_version(expected: ExpectedVersion, actual: u64) -> Result<(), RepositoryError> {
    if expected.matches(actual) {
        Ok(())
    } else {
        Err(RepositoryError::Conflict(format!(
            "expected {expected:?}, found {actual}"
        )))
    }
}

impl SaleRepository for InMemorySaleRepository {
    fn create(&self, mut sale: Sale) -> Result<Sale, RepositoryError> {
        check_version(ExpectedVersion::Exact(0), sale.version())?;

        let mut sales = self.write()?;
        let id = sale.id_typed();
        if sales.contains_key(&id) {
            return Err(RepositoryError::Duplicate(format!("sale {id} already exists")));
        }
        if sales.values().any(|s| s.sale_number() == sale.sale_number()) {
            return Err(RepositoryError::Duplicate(format!(
                "sale number '{}' is already in use",
                sale.sale_number()
            )));
        }

        sale.mark_committed();
        sales.insert(id, sale.clone());
        tracing::debug!(sale_id = %id, version = sale.version(), "sale stored");
        Ok(sale)
    }

    fn get_by_id(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn get_by_sale_number(&self, sale_number: &str) -> Result<Option<Sale>, RepositoryError> {
        Ok(self
            .read()?
            .values()
            .find(|s| s.sale_number() == sale_number)
            .cloned())
    }

    fn update(&self, mut sale: Sale) -> Result<Sale, RepositoryError> {
        let mut sales = self.write()?;
        let id = sale.id_typed();
        let stored = sales
            .get(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("sale {id}")))?;
        check_version(ExpectedVersion::Exact(stored.version()), sale.version())?;

        sale.mark_committed();
        sales.insert(id, sale.clone());
        tracing::debug!(sale_id = %id, version = sale.version(), "sale updated");
        Ok(sale)
    }

    fn delete(&self, id: SaleId) -> Result<bool, RepositoryError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    fn get_paginated(&self, query: &SaleQuery) -> Result<PagedResult<Sale>, RepositoryError> {
        let sales = self.read()?;
        Ok(query.apply(sales.values().cloned()))
    }
}
