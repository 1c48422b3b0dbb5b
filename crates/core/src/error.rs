//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant
/// is raised at the point of violation, before any state is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required value was missing or malformed (blank names, nil ids,
    /// negative amounts, mixed currencies).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An item quantity fell outside the allowed range.
    #[error("quantity {quantity} is out of range (allowed {min}..={max})")]
    QuantityOutOfRange { quantity: u32, min: u32, max: u32 },

    /// A referenced sale or item does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation is not allowed in the aggregate's current status.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// An input command or query failed validation before reaching the aggregate.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (duplicate key, stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn quantity_out_of_range(quantity: u32, min: u32, max: u32) -> Self {
        Self::QuantityOutOfRange { quantity, min, max }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
