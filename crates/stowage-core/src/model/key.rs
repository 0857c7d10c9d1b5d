use crate::model::{EntityTypeId, ForeignKeyId, KeyId, PropertyId};

///
/// Key
/// Primary or alternate key; the principal side of foreign keys.
///

#[derive(Clone, Debug)]
pub struct Key {
    pub id: KeyId,
    pub declaring: EntityTypeId,
    pub properties: Vec<PropertyId>,
    pub primary: bool,
}

///
/// ForeignKey
///
/// Dependent-side relationship: `properties` on `declaring` reference
/// `principal_key` on `principal`. Property order matches the principal key.
///

#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub id: ForeignKeyId,
    pub declaring: EntityTypeId,
    pub properties: Vec<PropertyId>,
    pub principal: EntityTypeId,
    pub principal_key: KeyId,
}
