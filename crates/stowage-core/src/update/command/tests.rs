use crate::{
    model::{Model, ModelBuilder, PropertyDef, TableName, ValueGenerated},
    test_fixtures::{TestEntry, accounts, parent_child, shared_table},
    update::{
        EntityState, ModificationCommand, UpdateEntry,
        batch::{DefaultParameterNameGenerator, ParameterNames},
    },
    value::Value,
};

fn command<'a>(
    model: &'a Model,
    table: &str,
    entries: &[&'a dyn UpdateEntry],
) -> ModificationCommand<'a> {
    let names = ParameterNames::new(Box::new(DefaultParameterNameGenerator::new("p")));
    let mut command = ModificationCommand::new(model, TableName::new(table), names, false);
    for entry in entries {
        command.add_entry(*entry);
    }

    command
}

// (column, read, write, condition) for every materialized column.
fn flags<'c>(command: &'c ModificationCommand<'_>) -> Vec<(&'c str, bool, bool, bool)> {
    command
        .column_modifications()
        .iter()
        .map(|c| (c.column_name(), c.is_read(), c.is_write(), c.is_condition()))
        .collect()
}

#[test]
fn insert_writes_every_column_and_reads_back_generated_keys() {
    let f = parent_child();
    let entry = TestEntry::added(f.parent)
        .with_temporary(f.parent_id, -1)
        .with(f.parent_name, "p");

    let command = command(&f.model, "Parents", &[&entry]);

    assert_eq!(
        flags(&command),
        [("Id", true, false, false), ("Name", false, true, false)]
    );
    assert!(command.column_modifications()[0].is_key());
    assert!(command.validate_temporary_values().is_ok());
}

#[test]
fn generated_key_with_a_real_value_is_written() {
    let f = parent_child();
    let entry = TestEntry::added(f.parent).with(f.parent_id, 5);

    let command = command(&f.model, "Parents", &[&entry]);

    assert_eq!(flags(&command)[0], ("Id", false, true, false));
}

#[test]
fn update_writes_only_modified_non_key_columns() {
    let f = accounts();
    let entry = TestEntry::modified(f.account)
        .with(f.id, 1)
        .with(f.email, "a")
        .with_change(f.name, "old", "new");

    let command = command(&f.model, "Accounts", &[&entry]);

    assert_eq!(
        flags(&command),
        [("Id", false, false, true), ("Name", false, true, false)]
    );
    assert!(command.has_write_columns());
}

#[test]
fn delete_only_carries_conditions() {
    let f = accounts();
    let entry = TestEntry::deleted(f.account).with(f.id, 4).with(f.email, "a");

    let command = command(&f.model, "Accounts", &[&entry]);

    assert_eq!(flags(&command), [("Id", false, false, true)]);
    assert_eq!(command.entity_state(), EntityState::Deleted);
    assert_eq!(command.key_values(), vec![Value::Int(4)]);
}

#[test]
fn concurrency_token_becomes_a_condition_and_update_generated_column_is_read() {
    let mut builder = ModelBuilder::new();
    let doc = builder.entity_type("Doc", "Docs");
    let id = builder.property(doc, "Id");
    let body = builder.property(doc, "Body");
    let version = builder.property_def(doc, PropertyDef::new("Version").concurrency_token());
    let stamp = builder.property_def(
        doc,
        PropertyDef::new("Stamp")
            .column("updated_at")
            .generated(ValueGenerated::OnAddOrUpdate),
    );
    builder.primary_key(doc, &[id]);
    let model = builder.build().expect("model builds");

    let entry = TestEntry::modified(doc)
        .with(id, 1)
        .with(version, 3)
        .with(stamp, 0)
        .with_change(body, "a", "b");
    let command = command(&model, "Docs", &[&entry]);

    assert_eq!(
        flags(&command),
        [
            ("Id", false, false, true),
            ("Body", false, true, false),
            ("Version", false, false, true),
            ("updated_at", true, false, false),
        ]
    );
    assert!(command.column_modifications()[2].is_concurrency_token());
}

#[test]
fn shared_key_columns_merge_by_name() {
    let f = shared_table();
    let vehicle = TestEntry::modified(f.vehicle)
        .with(f.vehicle_id, 1)
        .with_change(f.vehicle_name, "a", "b");
    let engine = TestEntry::modified(f.engine)
        .with(f.engine_id, 1)
        .with_change(f.engine_power, 1, 2);

    let command = command(&f.model, "Vehicles", &[&vehicle, &engine]);

    assert_eq!(
        flags(&command),
        [
            ("Id", false, false, true),
            ("Name", false, true, false),
            ("Power", false, true, false),
        ]
    );
    assert!(command.validate_shared_identity().is_ok());
}

#[test]
fn any_added_entry_makes_the_command_an_insert() {
    let f = shared_table();
    let vehicle = TestEntry::modified(f.vehicle)
        .with(f.vehicle_id, 1)
        .with_change(f.vehicle_name, "a", "b");
    let engine = TestEntry::added(f.engine).with(f.engine_id, 1);

    let command = command(&f.model, "Vehicles", &[&vehicle, &engine]);

    assert_eq!(command.entity_state(), EntityState::Added);
}

#[test]
fn same_entity_type_twice_on_one_row_is_a_conflict() {
    let f = shared_table();
    let first = TestEntry::modified(f.vehicle)
        .with(f.vehicle_id, 1)
        .with_change(f.vehicle_name, "a", "b");
    let second = TestEntry::modified(f.vehicle)
        .with(f.vehicle_id, 1)
        .with_change(f.vehicle_name, "a", "c");

    let command = command(&f.model, "Vehicles", &[&first, &second]);
    let err = command.validate_shared_identity().expect_err("duplicate type");

    assert!(err.message.contains("'Vehicle' appears more than once"));
}

#[test]
fn temporary_value_on_a_written_column_is_rejected() {
    let f = parent_child();
    let entry = TestEntry::added(f.child)
        .with(f.child_id, 1)
        .with_temporary(f.child_parent_id, -1);

    let command = command(&f.model, "Children", &[&entry]);
    let err = command.validate_temporary_values().expect_err("stale");

    assert!(err.message.contains("'Child.ParentId'"));
}

#[test]
fn display_hides_key_values_unless_sensitive() {
    let f = accounts();
    let entry = TestEntry::deleted(f.account).with(f.id, 9);
    let names = ParameterNames::new(Box::new(DefaultParameterNameGenerator::new("p")));

    let mut plain =
        ModificationCommand::new(&f.model, TableName::new("Accounts"), names.clone(), false);
    plain.add_entry(&entry);
    let mut sensitive = ModificationCommand::new(&f.model, TableName::new("Accounts"), names, true);
    sensitive.add_entry(&entry);

    assert_eq!(plain.to_string(), "Deleted Accounts");
    assert_eq!(sensitive.to_string(), "Deleted Accounts {9}");
}
