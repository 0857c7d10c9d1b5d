use crate::{
    model::{ForeignKeyId, IndexId, Model, PropertyId},
    update::UpdateEntry,
    value::{Value, format_values},
};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

///
/// ValueSource
///
/// Which projection of an entry to read.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueSource {
    Current,
    Original,
}

impl ValueSource {
    pub(crate) fn read(self, entry: &dyn UpdateEntry, property: PropertyId) -> Value {
        match self {
            Self::Current => entry.current_value(property),
            Self::Original => entry.original_value(property),
        }
    }
}

///
/// ConstraintRef
///
/// Constraint a key value was built for. Principal and dependent values of
/// one foreign key share the same reference so they compare equal.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ConstraintRef {
    ForeignKey(ForeignKeyId),
    Index(IndexId),
}

///
/// KeyValueIndex
///
/// Resolved value list of a key or unique index on one entry.
/// Equality and hashing cover the constraint and the values only; the
/// projection it was read from is kept for diagnostics.
///

#[derive(Clone, Debug)]
pub struct KeyValueIndex {
    constraint: ConstraintRef,
    values: Vec<Value>,
    source: ValueSource,
}

impl KeyValueIndex {
    #[must_use]
    pub const fn new(constraint: ConstraintRef, values: Vec<Value>, source: ValueSource) -> Self {
        Self {
            constraint,
            values,
            source,
        }
    }

    #[must_use]
    pub const fn constraint(&self) -> ConstraintRef {
        self.constraint
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub const fn source(&self) -> ValueSource {
        self.source
    }
}

impl PartialEq for KeyValueIndex {
    fn eq(&self, other: &Self) -> bool {
        self.constraint == other.constraint && self.values == other.values
    }
}

impl Eq for KeyValueIndex {}

impl Hash for KeyValueIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.constraint.hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for KeyValueIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_values(&self.values))
    }
}

///
/// KeyValueIndexFactory
///
/// Builds comparable key values from entries. Every method returns `None`
/// when any component is null: a null reference has no principal row and a
/// null unique value never conflicts.
///

pub trait KeyValueIndexFactory {
    /// Principal-side value of `fk`, read from the principal key columns.
    fn principal_key_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        fk: ForeignKeyId,
        source: ValueSource,
    ) -> Option<KeyValueIndex>;

    /// Dependent-side value of `fk`, read from the foreign key columns.
    fn dependent_key_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        fk: ForeignKeyId,
        source: ValueSource,
    ) -> Option<KeyValueIndex>;

    fn index_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        index: IndexId,
        source: ValueSource,
    ) -> Option<KeyValueIndex>;
}

///
/// DefaultKeyValueIndexFactory
/// Compares values as they are, without normalization.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultKeyValueIndexFactory;

impl DefaultKeyValueIndexFactory {
    fn build(
        constraint: ConstraintRef,
        entry: &dyn UpdateEntry,
        properties: &[PropertyId],
        source: ValueSource,
    ) -> Option<KeyValueIndex> {
        let values = properties
            .iter()
            .map(|property| Some(source.read(entry, *property)).filter(|v| !v.is_null()))
            .collect::<Option<Vec<_>>>()?;

        Some(KeyValueIndex::new(constraint, values, source))
    }
}

impl KeyValueIndexFactory for DefaultKeyValueIndexFactory {
    fn principal_key_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        fk: ForeignKeyId,
        source: ValueSource,
    ) -> Option<KeyValueIndex> {
        let key = model.key(model.foreign_key(fk).principal_key);

        Self::build(ConstraintRef::ForeignKey(fk), entry, &key.properties, source)
    }

    fn dependent_key_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        fk: ForeignKeyId,
        source: ValueSource,
    ) -> Option<KeyValueIndex> {
        let fk_def = model.foreign_key(fk);

        Self::build(ConstraintRef::ForeignKey(fk), entry, &fk_def.properties, source)
    }

    fn index_value(
        &self,
        model: &Model,
        entry: &dyn UpdateEntry,
        index: IndexId,
        source: ValueSource,
    ) -> Option<KeyValueIndex> {
        let index_def = model.index(index);

        Self::build(ConstraintRef::Index(index), entry, &index_def.properties, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{TestEntry, accounts, parent_child};

    #[test]
    fn principal_and_dependent_values_of_one_foreign_key_compare_equal() {
        let f = parent_child();
        let parent = TestEntry::added(f.parent).with(f.parent_id, 3);
        let child = TestEntry::added(f.child).with(f.child_parent_id, 3);
        let factory = DefaultKeyValueIndexFactory;

        let principal = factory
            .principal_key_value(&f.model, &parent, f.fk, ValueSource::Current)
            .expect("non-null key");
        let dependent = factory
            .dependent_key_value(&f.model, &child, f.fk, ValueSource::Original)
            .expect("non-null reference");

        assert_eq!(principal, dependent);
        assert_eq!(principal.source(), ValueSource::Current);
        assert_eq!(dependent.to_string(), "{3}");
    }

    #[test]
    fn null_component_yields_no_value() {
        let f = parent_child();
        let orphan = TestEntry::added(f.child).with(f.child_id, 1);

        let value = DefaultKeyValueIndexFactory.dependent_key_value(
            &f.model,
            &orphan,
            f.fk,
            ValueSource::Current,
        );

        assert!(value.is_none());
    }

    #[test]
    fn index_values_read_the_requested_projection() {
        let f = accounts();
        let entry = TestEntry::modified(f.account)
            .with(f.id, 1)
            .with_change(f.email, "old@x", "new@x");
        let factory = DefaultKeyValueIndexFactory;

        let original = factory
            .index_value(&f.model, &entry, f.email_index, ValueSource::Original)
            .expect("value");
        let current = factory
            .index_value(&f.model, &entry, f.email_index, ValueSource::Current)
            .expect("value");

        assert_eq!(original.values(), [Value::from("old@x")]);
        assert_eq!(current.constraint(), ConstraintRef::Index(f.email_index));
        assert_ne!(original, current);
    }
}
