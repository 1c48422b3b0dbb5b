//! Infrastructure layer: persistence, configuration, application services.
//!
//! - [`repository`] is the sale persistence port and its in-memory adapter.
//! - [`service`] orchestrates sale use cases (load, mutate, persist, publish).
//! - [`config`] loads service settings from the environment.

pub mod config;
pub mod repository;
pub mod service;

pub use config::{ConfigError, SalesConfig};
pub use repository::{InMemorySaleRepository, RepositoryError, SaleRepository};
pub use service::{
    CreateSale, ErrorKind, NewSaleItem, SALE_AGGREGATE_TYPE, SalesService, ServiceError,
    ServiceResult,
};
