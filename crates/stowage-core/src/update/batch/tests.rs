use crate::{
    model::{Model, TableName},
    test_fixtures::{TestEntry, accounts},
    update::{
        ModificationCommand, UpdateEntry,
        batch::{
            BoundedBatch, BoundedBatchFactory, CommandComparer, DefaultCommandComparer,
            DefaultParameterNameGenerator, DefaultParameterNameGeneratorFactory, ExecutionBatch,
            ExecutionBatchFactory, ParameterNameGenerator, ParameterNameGeneratorFactory,
            ParameterNames,
        },
    },
};
use std::cmp::Ordering;

fn command<'a>(
    model: &'a Model,
    table: TableName,
    entry: &'a dyn UpdateEntry,
) -> ModificationCommand<'a> {
    let names = ParameterNames::new(Box::new(DefaultParameterNameGenerator::new("p")));
    let mut command = ModificationCommand::new(model, table, names, false);
    command.add_entry(entry);

    command
}

#[test]
fn bounded_batch_hands_back_the_command_it_cannot_take() {
    let f = accounts();
    let one = TestEntry::added(f.account).with(f.id, 1);
    let two = TestEntry::added(f.account).with(f.id, 2);

    let mut batch = BoundedBatch::new(1);
    assert!(batch.try_add_command(command(&f.model, "Accounts".into(), &one)).is_ok());
    let rejected = batch
        .try_add_command(command(&f.model, "Accounts".into(), &two))
        .expect_err("full");

    assert_eq!(rejected.entries().len(), 1);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.capacity(), 1);
    assert_eq!(Box::new(batch).into_commands().len(), 1);
}

#[test]
fn bounded_factory_uses_its_capacity() {
    let f = accounts();
    let entries: Vec<TestEntry> = (1..=3)
        .map(|id| TestEntry::added(f.account).with(f.id, id))
        .collect();

    let mut batch = BoundedBatchFactory::new(2).create();
    let outcomes: Vec<bool> = entries
        .iter()
        .map(|e| batch.try_add_command(command(&f.model, "Accounts".into(), e)).is_ok())
        .collect();

    assert_eq!(outcomes, [true, true, false]);
    assert!(!batch.is_empty());
}

#[test]
fn parameter_names_count_up_and_reset() {
    let mut generator = DefaultParameterNameGenerator::new("@p");

    assert_eq!(generator.generate_next(), "@p0");
    assert_eq!(generator.generate_next(), "@p1");
    generator.reset();
    assert_eq!(generator.generate_next(), "@p0");
}

#[test]
fn parameter_names_handle_is_shared_between_clones() {
    let names = ParameterNames::new(DefaultParameterNameGeneratorFactory::new("v").create());
    let other = names.clone();

    assert_eq!(names.generate_next(), "v0");
    assert_eq!(other.generate_next(), "v1");
    other.reset();
    assert_eq!(names.generate_next(), "v0");
}

#[test]
fn comparer_orders_by_schema_table_state_then_key() {
    let f = accounts();
    let insert = TestEntry::added(f.account).with(f.id, 1);
    let delete_high = TestEntry::deleted(f.account).with(f.id, 9);
    let delete_low = TestEntry::deleted(f.account).with(f.id, 2);
    let update = TestEntry::modified(f.account)
        .with(f.id, 5)
        .with_change(f.email, "a", "b");

    let comparer = DefaultCommandComparer;
    let c_insert = command(&f.model, "Accounts".into(), &insert);
    let c_delete_high = command(&f.model, "Accounts".into(), &delete_high);
    let c_delete_low = command(&f.model, "Accounts".into(), &delete_low);
    let c_update = command(&f.model, "Accounts".into(), &update);
    let c_other_table = command(&f.model, "Archive".into(), &insert);
    let c_schema = command(&f.model, TableName::with_schema("dbo", "Accounts"), &delete_low);

    assert_eq!(comparer.compare(&c_delete_low, &c_delete_high), Ordering::Less);
    assert_eq!(comparer.compare(&c_delete_high, &c_update), Ordering::Less);
    assert_eq!(comparer.compare(&c_update, &c_insert), Ordering::Less);
    assert_eq!(comparer.compare(&c_other_table, &c_insert), Ordering::Greater);
    assert_eq!(comparer.compare(&c_insert, &c_schema), Ordering::Less);
    assert_eq!(comparer.compare(&c_insert, &c_insert), Ordering::Equal);
}
