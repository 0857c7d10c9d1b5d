use crate::model::{EntityTypeId, IndexId, PropertyId};

///
/// Index
/// Runtime descriptor for an index; only unique indexes order writes.
///

#[derive(Clone, Debug)]
pub struct Index {
    pub id: IndexId,
    pub name: String,
    pub declaring: EntityTypeId,
    pub properties: Vec<PropertyId>,
    pub unique: bool,
}
