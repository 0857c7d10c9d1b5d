//! Module: model
//! Responsibility: immutable runtime description of entity types, keys,
//! foreign keys, and indexes consumed by the update pipeline.
//! Does not own: entry values or change tracking.
//! Boundary: built once through `ModelBuilder`, then shared read-only.

mod builder;
mod entity;
mod index;
mod key;
mod property;

#[cfg(test)]
mod tests;

use derive_more::Display;

pub use builder::ModelBuilder;
pub use entity::{EntityType, TableName};
pub use index::Index;
pub use key::{ForeignKey, Key};
pub use property::{Property, PropertyDef, ValueGenerated};

///
/// Ids
///
/// Arena indices handed out by `ModelBuilder`; only valid for the model
/// built by the same builder.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("entity#{_0}")]
pub struct EntityTypeId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("property#{_0}")]
pub struct PropertyId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("key#{_0}")]
pub struct KeyId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("fk#{_0}")]
pub struct ForeignKeyId(pub(crate) usize);

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("index#{_0}")]
pub struct IndexId(pub(crate) usize);

///
/// Model
///
/// Arena of entity metadata. All cross references are ids into this model.
///

#[derive(Clone, Debug)]
pub struct Model {
    pub(crate) entity_types: Vec<EntityType>,
    pub(crate) properties: Vec<Property>,
    pub(crate) keys: Vec<Key>,
    pub(crate) foreign_keys: Vec<ForeignKey>,
    pub(crate) indexes: Vec<Index>,
}

impl Model {
    #[must_use]
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    #[must_use]
    pub fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        &self.entity_types[id.0]
    }

    #[must_use]
    pub fn find_entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|ty| ty.name == name)
    }

    #[must_use]
    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.0]
    }

    /// Find a property by name on an entity type, inherited included.
    #[must_use]
    pub fn find_property(&self, entity: EntityTypeId, name: &str) -> Option<&Property> {
        self.entity_type(entity)
            .properties()
            .iter()
            .map(|id| self.property(*id))
            .find(|property| property.name == name)
    }

    #[must_use]
    pub fn key(&self, id: KeyId) -> &Key {
        &self.keys[id.0]
    }

    #[must_use]
    pub fn foreign_key(&self, id: ForeignKeyId) -> &ForeignKey {
        &self.foreign_keys[id.0]
    }

    #[must_use]
    pub fn index(&self, id: IndexId) -> &Index {
        &self.indexes[id.0]
    }

    /// Root entity types, in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &EntityType> {
        self.entity_types.iter().filter(|ty| ty.is_root())
    }

    /// Primary key of an entity type (declared on its root).
    #[must_use]
    pub fn primary_key(&self, entity: EntityTypeId) -> &Key {
        self.key(self.entity_type(entity).primary_key)
    }

    /// True when `ancestor` is `entity` or one of its base types.
    #[must_use]
    pub fn is_same_or_base_of(&self, ancestor: EntityTypeId, entity: EntityTypeId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entity_type(id).base;
        }

        false
    }

    /// Render a foreign key for diagnostics, e.g. `Child {ParentId} -> Parent {Id}`.
    #[must_use]
    pub fn describe_foreign_key(&self, id: ForeignKeyId) -> String {
        let fk = self.foreign_key(id);
        let principal_key = self.key(fk.principal_key);

        format!(
            "{} {} -> {} {}",
            self.entity_type(fk.declaring).name,
            self.describe_properties(&fk.properties),
            self.entity_type(fk.principal).name,
            self.describe_properties(&principal_key.properties),
        )
    }

    /// Render an index for diagnostics, e.g. `UNIQUE Account(Email)`.
    #[must_use]
    pub fn describe_index(&self, id: IndexId) -> String {
        let index = self.index(id);
        let columns: Vec<&str> = index
            .properties
            .iter()
            .map(|p| self.property(*p).name.as_str())
            .collect();
        let entity = &self.entity_type(index.declaring).name;

        if index.unique {
            format!("UNIQUE {entity}({})", columns.join(", "))
        } else {
            format!("{entity}({})", columns.join(", "))
        }
    }

    fn describe_properties(&self, properties: &[PropertyId]) -> String {
        let names: Vec<&str> = properties
            .iter()
            .map(|p| self.property(*p).name.as_str())
            .collect();

        format!("{{{}}}", names.join(", "))
    }
}
