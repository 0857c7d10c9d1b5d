use crate::model::{EntityTypeId, PropertyId};

///
/// ValueGenerated
///
/// When the store, rather than the application, supplies a property value.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValueGenerated {
    #[default]
    Never,
    OnAdd,
    OnUpdate,
    OnAddOrUpdate,
}

impl ValueGenerated {
    #[must_use]
    pub const fn for_add(self) -> bool {
        matches!(self, Self::OnAdd | Self::OnAddOrUpdate)
    }

    #[must_use]
    pub const fn for_update(self) -> bool {
        matches!(self, Self::OnUpdate | Self::OnAddOrUpdate)
    }
}

///
/// Property
///

#[derive(Clone, Debug)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub declaring: EntityTypeId,
    pub column: String,
    pub value_generated: ValueGenerated,
    pub concurrency_token: bool,
}

///
/// PropertyDef
///
/// Builder input for one property. `column` defaults to `name`.
///

#[derive(Clone, Debug, Default)]
pub struct PropertyDef {
    pub name: String,
    pub column: Option<String>,
    pub value_generated: ValueGenerated,
    pub concurrency_token: bool,
}

impl PropertyDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub const fn generated(mut self, value_generated: ValueGenerated) -> Self {
        self.value_generated = value_generated;
        self
    }

    #[must_use]
    pub const fn concurrency_token(mut self) -> Self {
        self.concurrency_token = true;
        self
    }
}
