//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog entities are never physically removed through normal operations;
/// they are deactivated instead, so the soft-delete flag is part of the
/// contract.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether the entity is active (not soft-deleted).
    fn is_active(&self) -> bool;
}
