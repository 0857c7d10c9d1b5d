use crate::{
    error::InternalError,
    model::{
        EntityType, EntityTypeId, ForeignKey, ForeignKeyId, Index, IndexId, Key, KeyId, Model,
        Property, PropertyDef, PropertyId, TableName,
    },
};
use std::collections::BTreeSet;

///
/// PendingEntityType
///

struct PendingEntityType {
    name: String,
    base: Option<EntityTypeId>,
    table: Option<TableName>,
}

///
/// PendingForeignKey
///

struct PendingForeignKey {
    declaring: EntityTypeId,
    properties: Vec<PropertyId>,
    principal_key: KeyId,
}

///
/// ModelBuilder
///
/// Collects entity metadata and validates it as a whole in `build`.
/// Builder methods never fail; every reference is checked once at the end
/// so callers can declare things in any convenient order.
///

#[derive(Default)]
pub struct ModelBuilder {
    entity_types: Vec<PendingEntityType>,
    properties: Vec<Property>,
    keys: Vec<Key>,
    foreign_keys: Vec<PendingForeignKey>,
    indexes: Vec<Index>,
}

impl ModelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root entity type mapped to `table`.
    pub fn entity_type(
        &mut self,
        name: impl Into<String>,
        table: impl Into<TableName>,
    ) -> EntityTypeId {
        self.push_entity_type(name.into(), None, Some(table.into()))
    }

    /// Declare a derived entity type; `table` defaults to the base type's table.
    pub fn derived_type(
        &mut self,
        name: impl Into<String>,
        base: EntityTypeId,
        table: Option<TableName>,
    ) -> EntityTypeId {
        self.push_entity_type(name.into(), Some(base), table)
    }

    /// Declare a plain property whose column shares its name.
    pub fn property(&mut self, entity: EntityTypeId, name: impl Into<String>) -> PropertyId {
        self.property_def(entity, PropertyDef::new(name))
    }

    pub fn property_def(&mut self, entity: EntityTypeId, def: PropertyDef) -> PropertyId {
        let id = PropertyId(self.properties.len());
        let column = def.column.unwrap_or_else(|| def.name.clone());
        self.properties.push(Property {
            id,
            name: def.name,
            declaring: entity,
            column,
            value_generated: def.value_generated,
            concurrency_token: def.concurrency_token,
        });

        id
    }

    pub fn primary_key(&mut self, entity: EntityTypeId, properties: &[PropertyId]) -> KeyId {
        self.push_key(entity, properties, true)
    }

    pub fn alternate_key(&mut self, entity: EntityTypeId, properties: &[PropertyId]) -> KeyId {
        self.push_key(entity, properties, false)
    }

    pub fn foreign_key(
        &mut self,
        declaring: EntityTypeId,
        properties: &[PropertyId],
        principal_key: KeyId,
    ) -> ForeignKeyId {
        let id = ForeignKeyId(self.foreign_keys.len());
        self.foreign_keys.push(PendingForeignKey {
            declaring,
            properties: properties.to_vec(),
            principal_key,
        });

        id
    }

    pub fn unique_index(
        &mut self,
        entity: EntityTypeId,
        name: impl Into<String>,
        properties: &[PropertyId],
    ) -> IndexId {
        self.push_index(entity, name.into(), properties, true)
    }

    pub fn index(
        &mut self,
        entity: EntityTypeId,
        name: impl Into<String>,
        properties: &[PropertyId],
    ) -> IndexId {
        self.push_index(entity, name.into(), properties, false)
    }

    /// Validate every declaration and freeze the model.
    pub fn build(self) -> Result<Model, InternalError> {
        // Phase 1: entity types, hierarchy, and table inheritance.
        let mut seen_names = BTreeSet::new();
        let mut roots = Vec::with_capacity(self.entity_types.len());
        let mut tables: Vec<TableName> = Vec::with_capacity(self.entity_types.len());
        for (idx, pending) in self.entity_types.iter().enumerate() {
            if !seen_names.insert(pending.name.as_str()) {
                return Err(InternalError::model_invariant(format!(
                    "duplicate entity type name '{}'",
                    pending.name
                )));
            }

            let (root, table) = match pending.base {
                None => {
                    let table = pending.table.clone().ok_or_else(|| {
                        InternalError::model_invariant(format!(
                            "root entity type '{}' has no table mapping",
                            pending.name
                        ))
                    })?;
                    (EntityTypeId(idx), table)
                }
                // Bases must be declared first, which also rules out cycles.
                Some(base) if base.0 < idx => {
                    let table = pending.table.clone().unwrap_or_else(|| tables[base.0].clone());
                    (roots[base.0], table)
                }
                Some(base) => {
                    return Err(InternalError::model_invariant(format!(
                        "entity type '{}' names base {base} which is not declared before it",
                        pending.name
                    )));
                }
            };
            roots.push(root);
            tables.push(table);
        }

        // Phase 2: declaring references for properties, keys, foreign keys, indexes.
        for property in &self.properties {
            self.check_entity(property.declaring, "property", &property.name)?;
        }
        for key in &self.keys {
            self.check_entity(key.declaring, "key", &key.id.to_string())?;
            self.check_members(key.declaring, &key.properties, "key")?;
            if key.primary && self.entity_types[key.declaring.0].base.is_some() {
                return Err(InternalError::model_invariant(format!(
                    "derived entity type '{}' cannot declare a primary key",
                    self.entity_types[key.declaring.0].name
                )));
            }
        }
        let mut foreign_keys = Vec::with_capacity(self.foreign_keys.len());
        for (idx, pending) in self.foreign_keys.iter().enumerate() {
            let label = format!("fk#{idx}");
            self.check_entity(pending.declaring, "foreign key", &label)?;
            self.check_members(pending.declaring, &pending.properties, "foreign key")?;
            let principal_key = self.keys.get(pending.principal_key.0).ok_or_else(|| {
                InternalError::model_not_found(format!(
                    "foreign key {label} references unknown {}",
                    pending.principal_key
                ))
            })?;
            if principal_key.properties.len() != pending.properties.len() {
                return Err(InternalError::model_invariant(format!(
                    "foreign key {label} on '{}' has {} properties but its principal key has {}",
                    self.entity_types[pending.declaring.0].name,
                    pending.properties.len(),
                    principal_key.properties.len()
                )));
            }
            foreign_keys.push(ForeignKey {
                id: ForeignKeyId(idx),
                declaring: pending.declaring,
                properties: pending.properties.clone(),
                principal: principal_key.declaring,
                principal_key: pending.principal_key,
            });
        }
        for index in &self.indexes {
            self.check_entity(index.declaring, "index", &index.name)?;
            self.check_members(index.declaring, &index.properties, "index")?;
        }

        // Phase 3: flatten inherited members, base first.
        let mut entity_types: Vec<EntityType> = Vec::with_capacity(self.entity_types.len());
        for (idx, pending) in self.entity_types.iter().enumerate() {
            let id = EntityTypeId(idx);
            let base = pending.base.map(|base| &entity_types[base.0]);

            let declared_properties: Vec<PropertyId> = self
                .properties
                .iter()
                .filter(|p| p.declaring == id)
                .map(|p| p.id)
                .collect();
            let mut properties = base.map(|b| b.properties.clone()).unwrap_or_default();
            for property in &declared_properties {
                let name = &self.properties[property.0].name;
                if properties
                    .iter()
                    .any(|existing| &self.properties[existing.0].name == name)
                {
                    return Err(InternalError::model_invariant(format!(
                        "duplicate property '{name}' on entity type '{}'",
                        pending.name
                    )));
                }
                properties.push(*property);
            }

            let primary_key = match base {
                Some(base) => base.primary_key,
                None => {
                    let mut primary = self.keys.iter().filter(|k| k.primary && k.declaring == id);
                    let key = primary.next().ok_or_else(|| {
                        InternalError::model_invariant(format!(
                            "root entity type '{}' has no primary key",
                            pending.name
                        ))
                    })?;
                    if primary.next().is_some() {
                        return Err(InternalError::model_invariant(format!(
                            "root entity type '{}' declares more than one primary key",
                            pending.name
                        )));
                    }
                    key.id
                }
            };

            let mut fks = base.map(|b| b.foreign_keys.clone()).unwrap_or_default();
            fks.extend(foreign_keys.iter().filter(|fk| fk.declaring == id).map(|fk| fk.id));

            let mut referencing = base
                .map(|b| b.referencing_foreign_keys.clone())
                .unwrap_or_default();
            referencing.extend(foreign_keys.iter().filter(|fk| fk.principal == id).map(|fk| fk.id));

            let mut unique_indexes = base.map(|b| b.unique_indexes.clone()).unwrap_or_default();
            unique_indexes.extend(
                self.indexes
                    .iter()
                    .filter(|ix| ix.unique && ix.declaring == id)
                    .map(|ix| ix.id),
            );

            entity_types.push(EntityType {
                id,
                name: pending.name.clone(),
                base: pending.base,
                root: roots[idx],
                table: tables[idx].clone(),
                declared_properties,
                primary_key,
                properties,
                foreign_keys: fks,
                referencing_foreign_keys: referencing,
                unique_indexes,
            });
        }

        Ok(Model {
            entity_types,
            properties: self.properties,
            keys: self.keys,
            foreign_keys,
            indexes: self.indexes,
        })
    }

    fn push_entity_type(
        &mut self,
        name: String,
        base: Option<EntityTypeId>,
        table: Option<TableName>,
    ) -> EntityTypeId {
        let id = EntityTypeId(self.entity_types.len());
        self.entity_types.push(PendingEntityType { name, base, table });

        id
    }

    fn push_key(
        &mut self,
        entity: EntityTypeId,
        properties: &[PropertyId],
        primary: bool,
    ) -> KeyId {
        let id = KeyId(self.keys.len());
        self.keys.push(Key {
            id,
            declaring: entity,
            properties: properties.to_vec(),
            primary,
        });

        id
    }

    fn push_index(
        &mut self,
        entity: EntityTypeId,
        name: String,
        properties: &[PropertyId],
        unique: bool,
    ) -> IndexId {
        let id = IndexId(self.indexes.len());
        self.indexes.push(Index {
            id,
            name,
            declaring: entity,
            properties: properties.to_vec(),
            unique,
        });

        id
    }

    fn check_entity(
        &self,
        entity: EntityTypeId,
        kind: &str,
        label: &str,
    ) -> Result<(), InternalError> {
        if entity.0 < self.entity_types.len() {
            Ok(())
        } else {
            Err(InternalError::model_not_found(format!(
                "{kind} '{label}' is declared on unknown {entity}"
            )))
        }
    }

    // Members must exist and be declared on the owner or one of its bases.
    fn check_members(
        &self,
        owner: EntityTypeId,
        properties: &[PropertyId],
        kind: &str,
    ) -> Result<(), InternalError> {
        let owner_name = &self.entity_types[owner.0].name;
        if properties.is_empty() {
            return Err(InternalError::model_invariant(format!(
                "{kind} on '{owner_name}' has no properties"
            )));
        }

        for property in properties {
            let declaring = self
                .properties
                .get(property.0)
                .map(|p| p.declaring)
                .ok_or_else(|| {
                    InternalError::model_not_found(format!(
                        "{kind} on '{owner_name}' references unknown {property}"
                    ))
                })?;
            if !self.in_hierarchy(declaring, owner) {
                return Err(InternalError::model_invariant(format!(
                    "{kind} on '{owner_name}' uses property '{}' declared on another entity type",
                    self.properties[property.0].name
                )));
            }
        }

        Ok(())
    }

    fn in_hierarchy(&self, ancestor: EntityTypeId, entity: EntityTypeId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entity_types.get(id.0).and_then(|ty| ty.base);
        }

        false
    }
}
