//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are domain objects that are **immutable** and **compared by value**.
///
/// - **Value Object**: `Money`, `Currency`, the customer/branch/product snapshots
///   embedded in a sale
/// - **Entity**: a sale line (two lines with the same figures are still two lines)
///
/// To "modify" a value object, create a new one. `Money::add` returns a fresh
/// amount; a product snapshot is never refreshed once captured by a sale.
///
/// ```ignore
/// let a = Money::new(dec!(10.00), Currency::usd())?;
/// let b = Money::new(dec!(10.00), Currency::usd())?;
/// assert_eq!(a, b); // Equal by value, not identity
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
