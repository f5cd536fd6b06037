//! Core aggregate trait.

use std::fmt;
use std::hash::Hash;

/// Trait for aggregate roots persisted through a unit of work.
///
/// An aggregate is a consistency boundary: storage tracks, deduplicates and
/// commits changes per aggregate identity. A freshly built aggregate has no
/// identity until a repository `create` assigns one.
pub trait Aggregate: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identity type of the aggregate.
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for change tracking keys and log fields.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity (the unset value for a new aggregate).
    fn id(&self) -> Self::Id;

    /// Returns true once a repository has assigned an identity.
    fn has_identity(&self) -> bool;
}
