//! Module: update::sharing
//! Responsibility: row identity for entries, and the per-table identity
//! maps that merge entries of several root types onto one command.
//! Does not own: command contents or validation rules.
//! Boundary: factories are model-invariant and memoized by the preparer;
//! maps live for one `batch_commands` pass.


use crate::{
    model::{EntityTypeId, Model, TableName},
    update::{
        EntityState, TableAnnotationProvider, UpdateEntry, command::primary_key_values,
        key_value::ValueSource,
    },
    value::{Value, format_values},
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

///
/// RowKey
///
/// Physical row identity: primary key values ordered by column name.
/// Deleted entries are located by their original key, everything else by
/// the current one.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RowKey(Vec<Value>);

impl RowKey {
    /// Identity of the row `entry` writes, or `None` while the key is not
    /// known yet (a null or temporary component). Such entries never merge.
    #[must_use]
    pub fn for_entry(model: &Model, entry: &dyn UpdateEntry) -> Option<Self> {
        let source = if entry.state() == EntityState::Deleted {
            ValueSource::Original
        } else {
            let key = model.primary_key(entry.entity_type());
            if key.properties.iter().any(|p| entry.has_temporary_value(*p)) {
                return None;
            }
            ValueSource::Current
        };

        let values = primary_key_values(model, entry, source);
        if values.iter().any(Value::is_null) {
            return None;
        }

        Some(Self(values))
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_values(&self.0))
    }
}

///
/// IdentityMapFactory
///
/// One per physical table mapped by more than one root entity type.
///

#[derive(Clone, Debug)]
pub struct IdentityMapFactory {
    roots: Vec<EntityTypeId>,
}

impl IdentityMapFactory {
    /// Root entity types sharing the table, in model order.
    #[must_use]
    pub fn roots(&self) -> &[EntityTypeId] {
        &self.roots
    }

    /// Fresh map for one pass; maps are never reused across passes.
    #[must_use]
    #[expect(clippy::unused_self)]
    pub fn create(&self) -> IdentityMap {
        IdentityMap::default()
    }
}

///
/// IdentityMap
///
/// Row identity to command slot for one shared table and one pass.
/// Slots index the preparer's command arena.
///

#[derive(Debug, Default)]
pub struct IdentityMap {
    rows: HashMap<RowKey, usize>,
}

impl IdentityMap {
    /// Return the slot registered for `key`, registering `create()` if none.
    pub fn find_or_insert(&mut self, key: RowKey, create: impl FnOnce() -> usize) -> usize {
        *self.rows.entry(key).or_insert_with(create)
    }
}

/// Bucket every root entity type by its resolved table and keep the buckets
/// that hold more than one root.
#[must_use]
pub fn shared_table_factories(
    model: &Model,
    annotations: &dyn TableAnnotationProvider,
) -> BTreeMap<TableName, IdentityMapFactory> {
    let mut buckets: BTreeMap<TableName, Vec<EntityTypeId>> = BTreeMap::new();
    for root in model.roots() {
        buckets
            .entry(annotations.table(model, root.id))
            .or_default()
            .push(root.id);
    }

    buckets
        .into_iter()
        .filter(|(_, roots)| roots.len() > 1)
        .map(|(table, roots)| (table, IdentityMapFactory { roots }))
        .collect()
}
