//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Sale items are entities: two lines with equal quantities and prices are
/// still different lines if their ids differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
