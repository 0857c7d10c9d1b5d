use crate::{
    error::{ErrorClass, ErrorOrigin},
    model::{EntityTypeId, KeyId, ModelBuilder, PropertyDef, PropertyId, TableName, ValueGenerated},
};

fn vehicle_builder() -> ModelBuilder {
    let mut builder = ModelBuilder::new();
    let vehicle = builder.entity_type("Vehicle", TableName::with_schema("dbo", "Vehicles"));
    let id = builder.property_def(
        vehicle,
        PropertyDef::new("Id").generated(ValueGenerated::OnAdd),
    );
    builder.property(vehicle, "Name");
    builder.primary_key(vehicle, &[id]);

    builder
}

#[test]
fn derived_type_inherits_table_key_and_properties() {
    let mut builder = vehicle_builder();
    let car = builder.derived_type("Car", EntityTypeId(0), None);
    builder.property(car, "Doors");
    let model = builder.build().expect("model builds");

    let car = model.find_entity_type("Car").expect("car exists");
    let vehicle = model.find_entity_type("Vehicle").expect("vehicle exists");

    assert_eq!(car.table, vehicle.table);
    assert_eq!(car.root, vehicle.id);
    assert_eq!(car.primary_key, vehicle.primary_key);
    assert!(!car.is_root());

    let names: Vec<&str> = car
        .properties()
        .iter()
        .map(|p| model.property(*p).name.as_str())
        .collect();
    assert_eq!(names, ["Id", "Name", "Doors"]);
    assert_eq!(car.declared_properties.len(), 1);
    assert!(model.is_same_or_base_of(vehicle.id, car.id));
    assert!(!model.is_same_or_base_of(car.id, vehicle.id));
}

#[test]
fn foreign_keys_are_visible_from_both_sides() {
    let mut builder = ModelBuilder::new();
    let parent = builder.entity_type("Parent", "Parents");
    let parent_id = builder.property(parent, "Id");
    let parent_key = builder.primary_key(parent, &[parent_id]);

    let child = builder.entity_type("Child", "Children");
    let child_id = builder.property(child, "Id");
    let parent_ref = builder.property(child, "ParentId");
    builder.primary_key(child, &[child_id]);
    let fk = builder.foreign_key(child, &[parent_ref], parent_key);

    let model = builder.build().expect("model builds");

    assert_eq!(model.entity_type(child).foreign_keys(), [fk]);
    assert_eq!(model.entity_type(parent).referencing_foreign_keys(), [fk]);
    assert!(model.entity_type(parent).foreign_keys().is_empty());
    assert_eq!(model.foreign_key(fk).principal, parent);
    assert_eq!(
        model.describe_foreign_key(fk),
        "Child {ParentId} -> Parent {Id}"
    );
}

#[test]
fn unique_indexes_are_flattened_and_described() {
    let mut builder = ModelBuilder::new();
    let account = builder.entity_type("Account", "Accounts");
    let id = builder.property(account, "Id");
    let email = builder.property(account, "Email");
    let name = builder.property(account, "Name");
    builder.primary_key(account, &[id]);
    let unique = builder.unique_index(account, "IX_Email", &[email]);
    builder.index(account, "IX_Name", &[name]);

    let model = builder.build().expect("model builds");

    assert_eq!(model.entity_type(account).unique_indexes(), [unique]);
    assert_eq!(model.describe_index(unique), "UNIQUE Account(Email)");
}

#[test]
fn column_defaults_to_property_name() {
    let mut builder = ModelBuilder::new();
    let ty = builder.entity_type("Row", "Rows");
    let id = builder.property(ty, "Id");
    let renamed = builder.property_def(ty, PropertyDef::new("Label").column("label_text"));
    builder.primary_key(ty, &[id]);

    let model = builder.build().expect("model builds");

    assert_eq!(model.property(id).column, "Id");
    assert_eq!(model.property(renamed).column, "label_text");
    assert_eq!(model.roots().count(), 1);
}

#[test]
fn root_without_primary_key_is_rejected() {
    let mut builder = ModelBuilder::new();
    let ty = builder.entity_type("Keyless", "Keyless");
    builder.property(ty, "Value");

    let err = builder.build().expect_err("missing key must fail");

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Model);
    assert!(err.message.contains("no primary key"));
}

#[test]
fn derived_type_cannot_declare_primary_key() {
    let mut builder = vehicle_builder();
    let base = EntityTypeId(0);
    let car = builder.derived_type("Car", base, None);
    let doors = builder.property(car, "Doors");
    builder.primary_key(car, &[doors]);

    let err = builder.build().expect_err("derived key must fail");

    assert!(err.message.contains("cannot declare a primary key"));
}

#[test]
fn foreign_key_arity_must_match_principal_key() {
    let mut builder = ModelBuilder::new();
    let parent = builder.entity_type("Parent", "Parents");
    let a = builder.property(parent, "A");
    let b = builder.property(parent, "B");
    let key = builder.primary_key(parent, &[a, b]);

    let child = builder.entity_type("Child", "Children");
    let id = builder.property(child, "Id");
    let r = builder.property(child, "ParentA");
    builder.primary_key(child, &[id]);
    builder.foreign_key(child, &[r], key);

    let err = builder.build().expect_err("arity mismatch must fail");

    assert!(err.message.contains("has 1 properties but its principal key has 2"));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut builder = vehicle_builder();
    builder.entity_type("Vehicle", "Other");
    let err = builder.build().expect_err("duplicate entity must fail");
    assert!(err.message.contains("duplicate entity type name 'Vehicle'"));

    let mut builder = vehicle_builder();
    let base = EntityTypeId(0);
    let car = builder.derived_type("Car", base, None);
    builder.property(car, "Name");
    let err = builder.build().expect_err("shadowed property must fail");
    assert!(err.message.contains("duplicate property 'Name'"));
}

#[test]
fn members_must_belong_to_the_hierarchy() {
    let mut builder = ModelBuilder::new();
    let left = builder.entity_type("Left", "Left");
    let left_id = builder.property(left, "Id");
    builder.primary_key(left, &[left_id]);

    let right = builder.entity_type("Right", "Right");
    let right_id = builder.property(right, "Id");
    builder.primary_key(right, &[right_id]);
    builder.unique_index(right, "IX_Bad", &[left_id]);

    let err = builder.build().expect_err("foreign property must fail");

    assert!(err.message.contains("declared on another entity type"));
}

#[test]
fn unknown_principal_key_is_not_found() {
    let mut builder = vehicle_builder();
    let vehicle = EntityTypeId(0);
    let name = PropertyId(1);
    builder.foreign_key(vehicle, &[name], KeyId(9));

    let err = builder.build().expect_err("unknown key must fail");

    assert_eq!(err.class, ErrorClass::NotFound);
}
