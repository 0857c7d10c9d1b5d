use crate::model::{EntityTypeId, ForeignKeyId, IndexId, KeyId, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// TableName
///
/// Physical table identity: optional schema plus table name.
/// Ordering puts schema-less tables first, then compares schema and name.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

///
/// EntityType
///
/// Runtime descriptor for one entity type.
/// The flattened lists (`properties`, `foreign_keys`, ...) include everything
/// inherited from base types, base members first, and are filled in by
/// `ModelBuilder::build`.
///

#[derive(Clone, Debug)]
pub struct EntityType {
    pub id: EntityTypeId,
    pub name: String,
    pub base: Option<EntityTypeId>,
    pub root: EntityTypeId,
    pub table: TableName,
    pub declared_properties: Vec<PropertyId>,
    pub primary_key: KeyId,

    pub(crate) properties: Vec<PropertyId>,
    pub(crate) foreign_keys: Vec<ForeignKeyId>,
    pub(crate) referencing_foreign_keys: Vec<ForeignKeyId>,
    pub(crate) unique_indexes: Vec<IndexId>,
}

impl EntityType {
    /// True when the type has no base type.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// All properties, inherited first.
    #[must_use]
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Foreign keys declared on this type or any base type.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKeyId] {
        &self.foreign_keys
    }

    /// Foreign keys whose principal is this type or any base type.
    #[must_use]
    pub fn referencing_foreign_keys(&self) -> &[ForeignKeyId] {
        &self.referencing_foreign_keys
    }

    /// Unique indexes declared on this type or any base type.
    #[must_use]
    pub fn unique_indexes(&self) -> &[IndexId] {
        &self.unique_indexes
    }
}
