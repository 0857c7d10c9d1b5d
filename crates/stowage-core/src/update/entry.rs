use crate::{
    model::{EntityTypeId, PropertyId},
    value::Value,
};
use std::fmt;

///
/// EntityState
///
/// Change-tracking state of one entry. Only `Added`, `Modified` and
/// `Deleted` entries produce row writes.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

impl EntityState {
    #[must_use]
    pub const fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }

    #[must_use]
    pub const fn is_modified(self) -> bool {
        matches!(self, Self::Modified)
    }

    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unchanged => "Unchanged",
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        };
        write!(f, "{label}")
    }
}

///
/// UpdateEntry
///
/// Read contract over one tracked entity.
///
/// All methods take `&self`. Implementations that let an executor write
/// store-generated values back between execution batches must do so with
/// interior mutability; the pipeline re-reads temporary flags when it
/// validates each command, not when it builds the graph.
///

pub trait UpdateEntry {
    fn entity_type(&self) -> EntityTypeId;

    fn state(&self) -> EntityState;

    fn current_value(&self, property: PropertyId) -> Value;

    fn original_value(&self, property: PropertyId) -> Value;

    /// True while `property` still holds a placeholder the store must replace.
    fn has_temporary_value(&self, property: PropertyId) -> bool;

    fn is_modified(&self, property: PropertyId) -> bool;
}
