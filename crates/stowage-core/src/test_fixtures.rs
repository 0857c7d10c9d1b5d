//! Shared models and an in-memory `UpdateEntry` for unit tests.

use crate::{
    model::{
        EntityTypeId, ForeignKeyId, IndexId, Model, ModelBuilder, PropertyDef, PropertyId,
        TableName, ValueGenerated,
    },
    update::{EntityState, UpdateEntry},
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

/// Route `tracing` output to the test harness when `RUST_LOG` is set.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

///
/// TestEntry
///
/// Tracked entity backed by plain maps. Current values and temporary flags
/// sit behind `RefCell` so a test can play the executor and propagate a
/// generated key after an earlier batch ran.
///

pub(crate) struct TestEntry {
    entity: EntityTypeId,
    state: EntityState,
    current: RefCell<HashMap<PropertyId, Value>>,
    original: HashMap<PropertyId, Value>,
    temporary: RefCell<HashSet<PropertyId>>,
    modified: HashSet<PropertyId>,
}

impl TestEntry {
    pub(crate) fn new(entity: EntityTypeId, state: EntityState) -> Self {
        Self {
            entity,
            state,
            current: RefCell::new(HashMap::new()),
            original: HashMap::new(),
            temporary: RefCell::new(HashSet::new()),
            modified: HashSet::new(),
        }
    }

    pub(crate) fn added(entity: EntityTypeId) -> Self {
        Self::new(entity, EntityState::Added)
    }

    pub(crate) fn modified(entity: EntityTypeId) -> Self {
        Self::new(entity, EntityState::Modified)
    }

    pub(crate) fn deleted(entity: EntityTypeId) -> Self {
        Self::new(entity, EntityState::Deleted)
    }

    /// Same value in both projections, not modified.
    pub(crate) fn with(mut self, property: PropertyId, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.original.insert(property, value.clone());
        self.current.get_mut().insert(property, value);
        self
    }

    /// Changed value: `original` before, `current` now, marked modified.
    pub(crate) fn with_change(
        mut self,
        property: PropertyId,
        original: impl Into<Value>,
        current: impl Into<Value>,
    ) -> Self {
        self.original.insert(property, original.into());
        self.current.get_mut().insert(property, current.into());
        self.modified.insert(property);
        self
    }

    /// Placeholder value the store is expected to replace.
    pub(crate) fn with_temporary(mut self, property: PropertyId, value: impl Into<Value>) -> Self {
        self.current.get_mut().insert(property, value.into());
        self.temporary.get_mut().insert(property);
        self
    }

    /// What an executor does after reading back a generated value.
    pub(crate) fn propagate(&self, property: PropertyId, value: impl Into<Value>) {
        self.current.borrow_mut().insert(property, value.into());
        self.temporary.borrow_mut().remove(&property);
    }
}

impl UpdateEntry for TestEntry {
    fn entity_type(&self) -> EntityTypeId {
        self.entity
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn current_value(&self, property: PropertyId) -> Value {
        self.current.borrow().get(&property).cloned().unwrap_or_default()
    }

    fn original_value(&self, property: PropertyId) -> Value {
        self.original.get(&property).cloned().unwrap_or_default()
    }

    fn has_temporary_value(&self, property: PropertyId) -> bool {
        self.temporary.borrow().contains(&property)
    }

    fn is_modified(&self, property: PropertyId) -> bool {
        self.modified.contains(&property)
    }
}

///
/// ParentChild
///
/// `Parent { Id (generated on add), Name }` referenced by
/// `Child { Id, ParentId, Note }`.
///

pub(crate) struct ParentChild {
    pub(crate) model: Model,
    pub(crate) parent: EntityTypeId,
    pub(crate) parent_id: PropertyId,
    pub(crate) parent_name: PropertyId,
    pub(crate) child: EntityTypeId,
    pub(crate) child_id: PropertyId,
    pub(crate) child_parent_id: PropertyId,
    pub(crate) child_note: PropertyId,
    pub(crate) fk: ForeignKeyId,
}

pub(crate) fn parent_child() -> ParentChild {
    let mut builder = ModelBuilder::new();
    let parent = builder.entity_type("Parent", "Parents");
    let parent_id = builder.property_def(
        parent,
        PropertyDef::new("Id").generated(ValueGenerated::OnAdd),
    );
    let parent_name = builder.property(parent, "Name");
    let parent_key = builder.primary_key(parent, &[parent_id]);

    let child = builder.entity_type("Child", "Children");
    let child_id = builder.property(child, "Id");
    let child_parent_id = builder.property(child, "ParentId");
    let child_note = builder.property(child, "Note");
    builder.primary_key(child, &[child_id]);
    let fk = builder.foreign_key(child, &[child_parent_id], parent_key);

    ParentChild {
        model: builder.build().expect("parent/child model builds"),
        parent,
        parent_id,
        parent_name,
        child,
        child_id,
        child_parent_id,
        child_note,
        fk,
    }
}

///
/// Accounts
///
/// `Account { Id, Email, Name }` with `UNIQUE Account(Email)`.
///

pub(crate) struct Accounts {
    pub(crate) model: Model,
    pub(crate) account: EntityTypeId,
    pub(crate) id: PropertyId,
    pub(crate) email: PropertyId,
    pub(crate) name: PropertyId,
    pub(crate) email_index: IndexId,
}

pub(crate) fn accounts() -> Accounts {
    let mut builder = ModelBuilder::new();
    let account = builder.entity_type("Account", "Accounts");
    let id = builder.property(account, "Id");
    let email = builder.property(account, "Email");
    let name = builder.property(account, "Name");
    builder.primary_key(account, &[id]);
    let email_index = builder.unique_index(account, "IX_Account_Email", &[email]);

    Accounts {
        model: builder.build().expect("account model builds"),
        account,
        id,
        email,
        name,
        email_index,
    }
}

///
/// SharedTable
///
/// Two root types split over one `Vehicles` table: `Vehicle { Id, Name }`
/// and `Engine { Id, Power }`. Both keys map to the `Id` column.
///

pub(crate) struct SharedTable {
    pub(crate) model: Model,
    pub(crate) vehicle: EntityTypeId,
    pub(crate) vehicle_id: PropertyId,
    pub(crate) vehicle_name: PropertyId,
    pub(crate) engine: EntityTypeId,
    pub(crate) engine_id: PropertyId,
    pub(crate) engine_power: PropertyId,
}

pub(crate) fn shared_table() -> SharedTable {
    let mut builder = ModelBuilder::new();
    let vehicle = builder.entity_type("Vehicle", "Vehicles");
    let vehicle_id = builder.property(vehicle, "Id");
    let vehicle_name = builder.property(vehicle, "Name");
    builder.primary_key(vehicle, &[vehicle_id]);

    let engine = builder.entity_type("Engine", "Vehicles");
    let engine_id = builder.property(engine, "Id");
    let engine_power = builder.property(engine, "Power");
    builder.primary_key(engine, &[engine_id]);

    SharedTable {
        model: builder.build().expect("shared table model builds"),
        vehicle,
        vehicle_id,
        vehicle_name,
        engine,
        engine_id,
        engine_power,
    }
}

///
/// Hierarchy
///
/// `Base { Id, Name }` and `Derived : Base { Extra }`, both on table `T`.
///

pub(crate) struct Hierarchy {
    pub(crate) model: Model,
    pub(crate) base: EntityTypeId,
    pub(crate) derived: EntityTypeId,
    pub(crate) id: PropertyId,
    pub(crate) name: PropertyId,
    pub(crate) extra: PropertyId,
}

pub(crate) fn hierarchy() -> Hierarchy {
    let mut builder = ModelBuilder::new();
    let base = builder.entity_type("Base", TableName::new("T"));
    let id = builder.property(base, "Id");
    let name = builder.property(base, "Name");
    builder.primary_key(base, &[id]);

    let derived = builder.derived_type("Derived", base, None);
    let extra = builder.property(derived, "Extra");

    Hierarchy {
        model: builder.build().expect("hierarchy model builds"),
        base,
        derived,
        id,
        name,
        extra,
    }
}

/// Borrow a slice of entries as trait objects.
pub(crate) fn as_entries(entries: &[TestEntry]) -> Vec<&dyn UpdateEntry> {
    entries.iter().map(|e| e as &dyn UpdateEntry).collect()
}
