//! Entity trait: identity + soft-delete lifecycle.

/// Entity marker + minimal interface.
///
/// Business records are never physically removed; deleting an entity flips it
/// to inactive and every read path filters on [`Entity::is_active`].
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Whether the entity is visible to reads.
    fn is_active(&self) -> bool;

    /// Mark the entity as deleted.
    fn deactivate(&mut self);
}
