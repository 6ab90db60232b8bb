//! Entity trait: identity that persists across state changes.

/// Minimal interface shared by aggregate roots.
///
/// Identifiers here are small `Copy` newtypes, so `id` returns by value.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
