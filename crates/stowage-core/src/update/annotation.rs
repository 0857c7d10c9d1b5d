use crate::model::{EntityTypeId, Model, TableName};

///
/// TableAnnotationProvider
///
/// Resolves the physical table an entity type writes to.
///

pub trait TableAnnotationProvider {
    fn table(&self, model: &Model, entity: EntityTypeId) -> TableName;
}

///
/// ModelTableAnnotations
///
/// Reads the table mapping straight off the model, filling in
/// `default_schema` for tables mapped without one.
///

#[derive(Clone, Debug, Default)]
pub struct ModelTableAnnotations {
    default_schema: Option<String>,
}

impl ModelTableAnnotations {
    #[must_use]
    pub const fn new(default_schema: Option<String>) -> Self {
        Self { default_schema }
    }
}

impl TableAnnotationProvider for ModelTableAnnotations {
    fn table(&self, model: &Model, entity: EntityTypeId) -> TableName {
        let mut table = model.entity_type(entity).table.clone();
        if table.schema.is_none() {
            table.schema.clone_from(&self.default_schema);
        }

        table
    }
}
