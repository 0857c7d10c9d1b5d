use crate::{
    model::Property,
    update::{EntityState, UpdateEntry},
    value::Value,
};
use std::fmt;

///
/// ColumnModification
///
/// How one column takes part in a row write.
///
/// `is_read`: the store generates the value and it is read back.
/// `is_write`: the value is sent in the SET/VALUES list.
/// `is_condition`: the original value goes into the WHERE clause.
///
/// Columns contributed by several entries on one row are merged by column
/// name; the first contributing entry stays the value source.
///

#[derive(Clone)]
pub struct ColumnModification<'a> {
    entry: &'a dyn UpdateEntry,
    property: &'a Property,
    is_read: bool,
    is_write: bool,
    is_condition: bool,
    is_key: bool,
    is_concurrency_token: bool,
}

impl<'a> ColumnModification<'a> {
    /// Classify `property` of `entry`; `None` when the column takes no part
    /// in the write.
    pub(crate) fn classify(
        entry: &'a dyn UpdateEntry,
        property: &'a Property,
        is_key: bool,
    ) -> Option<Self> {
        let state = entry.state();
        let generated = property.value_generated;

        let store_generated = (generated.for_add()
            && state == EntityState::Added
            && (entry.has_temporary_value(property.id)
                || entry.current_value(property.id).is_null()))
            || (generated.for_update()
                && state == EntityState::Modified
                && !entry.is_modified(property.id));

        let is_read = store_generated;
        let is_write = !is_read
            && (state == EntityState::Added
                || (state == EntityState::Modified && entry.is_modified(property.id) && !is_key));
        let is_condition =
            state != EntityState::Added && (is_key || property.concurrency_token);

        (is_read || is_write || is_condition).then_some(Self {
            entry,
            property,
            is_read,
            is_write,
            is_condition,
            is_key,
            is_concurrency_token: property.concurrency_token,
        })
    }

    pub(crate) const fn merge(&mut self, other: &Self) {
        self.is_read |= other.is_read;
        self.is_write |= other.is_write;
        self.is_condition |= other.is_condition;
        self.is_key |= other.is_key;
        self.is_concurrency_token |= other.is_concurrency_token;
    }

    #[must_use]
    pub fn column_name(&self) -> &'a str {
        let property: &'a Property = self.property;
        &property.column
    }

    #[must_use]
    pub const fn property(&self) -> &'a Property {
        self.property
    }

    #[must_use]
    pub fn entry(&self) -> &'a dyn UpdateEntry {
        self.entry
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.is_read
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.is_write
    }

    #[must_use]
    pub const fn is_condition(&self) -> bool {
        self.is_condition
    }

    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.is_key
    }

    #[must_use]
    pub const fn is_concurrency_token(&self) -> bool {
        self.is_concurrency_token
    }

    /// Live query; an executor may have replaced the placeholder since the
    /// column was classified.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.entry.has_temporary_value(self.property.id)
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.entry.current_value(self.property.id)
    }

    #[must_use]
    pub fn original_value(&self) -> Value {
        self.entry.original_value(self.property.id)
    }
}

impl fmt::Debug for ColumnModification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnModification")
            .field("column", &self.property.column)
            .field("is_read", &self.is_read)
            .field("is_write", &self.is_write)
            .field("is_condition", &self.is_condition)
            .field("is_key", &self.is_key)
            .field("is_concurrency_token", &self.is_concurrency_token)
            .finish_non_exhaustive()
    }
}
