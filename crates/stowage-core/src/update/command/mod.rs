//! Module: update::command
//! Responsibility: one physical row write and the column modifications
//! derived from the entries that target it.
//! Does not own: row identity lookup (see `sharing`) or ordering.
//! Boundary: built by the preparer, handed to execution batches by value.

mod column;

#[cfg(test)]
mod tests;

pub use column::ColumnModification;

use crate::{
    error::InternalError,
    model::{Model, PropertyId, TableName},
    update::{EntityState, UpdateEntry, batch::ParameterNames, key_value::ValueSource},
    value::{Value, format_values},
};
use std::{cell::OnceCell, fmt};

///
/// ModificationCommand
///
/// One row-level write. Holds every entry that maps onto the row, in the
/// order they were added. The entity state is derived from the entries;
/// column modifications are computed on first use and cached.
///

pub struct ModificationCommand<'a> {
    model: &'a Model,
    table: TableName,
    entries: Vec<&'a dyn UpdateEntry>,
    parameter_names: ParameterNames,
    sensitive_logging: bool,
    columns: OnceCell<Vec<ColumnModification<'a>>>,
}

impl<'a> ModificationCommand<'a> {
    pub(crate) const fn new(
        model: &'a Model,
        table: TableName,
        parameter_names: ParameterNames,
        sensitive_logging: bool,
    ) -> Self {
        Self {
            model,
            table,
            entries: Vec::new(),
            parameter_names,
            sensitive_logging,
            columns: OnceCell::new(),
        }
    }

    pub(crate) fn add_entry(&mut self, entry: &'a dyn UpdateEntry) {
        self.entries.push(entry);
        self.columns = OnceCell::new();
    }

    #[must_use]
    pub const fn table(&self) -> &TableName {
        &self.table
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.table.schema.as_deref()
    }

    #[must_use]
    pub const fn model(&self) -> &'a Model {
        self.model
    }

    #[must_use]
    pub fn entries(&self) -> &[&'a dyn UpdateEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn parameter_names(&self) -> &ParameterNames {
        &self.parameter_names
    }

    #[must_use]
    pub const fn sensitive_logging(&self) -> bool {
        self.sensitive_logging
    }

    /// Dominant state across the entries: all deleted is `Deleted`, any
    /// added is `Added`, anything else is `Modified`.
    #[must_use]
    pub fn entity_state(&self) -> EntityState {
        if self.entries.iter().all(|e| e.state() == EntityState::Deleted) {
            EntityState::Deleted
        } else if self.entries.iter().any(|e| e.state() == EntityState::Added) {
            EntityState::Added
        } else {
            EntityState::Modified
        }
    }

    pub fn column_modifications(&self) -> &[ColumnModification<'a>] {
        self.columns.get_or_init(|| self.build_columns())
    }

    #[must_use]
    pub fn has_write_columns(&self) -> bool {
        self.column_modifications().iter().any(ColumnModification::is_write)
    }

    /// True when any of `properties` maps to a column this command writes
    /// or reads back.
    pub(crate) fn writes_or_reads_any(&self, properties: &[PropertyId]) -> bool {
        let model = self.model;

        self.column_modifications().iter().any(|column| {
            (column.is_write() || column.is_read())
                && properties
                    .iter()
                    .any(|p| model.property(*p).column == column.column_name())
        })
    }

    /// Primary key values ordered by column name; the original projection
    /// for deletes and updates, the current one for inserts.
    #[must_use]
    pub fn key_values(&self) -> Vec<Value> {
        let source = match self.entity_state() {
            EntityState::Added => ValueSource::Current,
            _ => ValueSource::Original,
        };

        self.entries
            .first()
            .map(|entry| primary_key_values(self.model, *entry, source))
            .unwrap_or_default()
    }

    /// Check that the merged entries can form one row write.
    pub(crate) fn validate_shared_identity(&self) -> Result<(), InternalError> {
        if self.entries.len() < 2 {
            return Ok(());
        }

        let added = self.entries.iter().any(|e| e.state() == EntityState::Added);
        let deleted = self.entries.iter().filter(|e| e.state() == EntityState::Deleted).count();

        if added && deleted > 0 {
            return Err(self.identity_conflict(
                "an added entry and a deleted entry target the same row",
            ));
        }
        if deleted > 0 && deleted < self.entries.len() {
            return Err(self.identity_conflict(
                "a deleted entry shares the row with a modified entry",
            ));
        }

        for (idx, entry) in self.entries.iter().enumerate() {
            if self.entries[..idx]
                .iter()
                .any(|other| other.entity_type() == entry.entity_type())
            {
                let name = &self.model.entity_type(entry.entity_type()).name;

                return Err(self.identity_conflict(format!(
                    "entity type '{name}' appears more than once for the same row"
                )));
            }
        }

        Ok(())
    }

    /// Reject inserts that would send a placeholder value to the store.
    ///
    /// Queried live, so values propagated by an executor after earlier
    /// batches ran are seen here.
    pub(crate) fn validate_temporary_values(&self) -> Result<(), InternalError> {
        if self.entity_state() != EntityState::Added {
            return Ok(());
        }

        for column in self.column_modifications() {
            if !column.is_read() && column.is_temporary() {
                let property = column.property();
                let entity = self.model.entity_type(column.entry().entity_type());

                return Err(InternalError::temporary_value(&entity.name, &property.name));
            }
        }

        Ok(())
    }

    fn identity_conflict(&self, reason: impl Into<String>) -> InternalError {
        let mut reason = reason.into();
        if self.sensitive_logging {
            reason.push_str(&format!(" (key {})", format_values(&self.key_values())));
        }

        let entity_types = self
            .entries
            .iter()
            .map(|e| self.model.entity_type(e.entity_type()).name.clone())
            .collect();

        InternalError::shared_identity_conflict(self.table.to_string(), entity_types, reason)
    }

    fn build_columns(&self) -> Vec<ColumnModification<'a>> {
        let model = self.model;
        let mut columns: Vec<ColumnModification<'a>> = Vec::new();

        for entry in &self.entries {
            let entity = model.entity_type(entry.entity_type());
            let key = model.primary_key(entity.id);

            for property_id in entity.properties() {
                let is_key = key.properties.contains(property_id);
                let Some(column) =
                    ColumnModification::classify(*entry, model.property(*property_id), is_key)
                else {
                    continue;
                };

                match columns
                    .iter_mut()
                    .find(|existing| existing.column_name() == column.column_name())
                {
                    Some(existing) => existing.merge(&column),
                    None => columns.push(column),
                }
            }
        }

        columns
    }
}

impl fmt::Debug for ModificationCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModificationCommand")
            .field("table", &self.table)
            .field("state", &self.entity_state())
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModificationCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity_state(), self.table)?;
        if self.sensitive_logging {
            write!(f, " {}", format_values(&self.key_values()))?;
        }

        Ok(())
    }
}

/// Primary key values of `entry`, ordered by column name so entity types
/// sharing a table line up.
pub(crate) fn primary_key_values(
    model: &Model,
    entry: &dyn UpdateEntry,
    source: ValueSource,
) -> Vec<Value> {
    let key = model.primary_key(entry.entity_type());
    let mut columns: Vec<(&str, PropertyId)> = key
        .properties
        .iter()
        .map(|p| (model.property(*p).column.as_str(), *p))
        .collect();
    columns.sort_by(|a, b| a.0.cmp(b.0));

    columns
        .into_iter()
        .map(|(_, property)| source.read(entry, property))
        .collect()
}
