use crate::update::{EntityState, ModificationCommand};
use std::cmp::Ordering;

///
/// CommandComparer
///
/// Total order used to make the command order inside one independent set
/// reproducible.
///

pub trait CommandComparer {
    fn compare(&self, left: &ModificationCommand<'_>, right: &ModificationCommand<'_>) -> Ordering;
}

///
/// DefaultCommandComparer
///
/// Orders by schema, table, state (deletes, then updates, then inserts),
/// then key values.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCommandComparer;

impl DefaultCommandComparer {
    const fn state_rank(state: EntityState) -> u8 {
        match state {
            EntityState::Deleted => 0,
            EntityState::Modified => 1,
            EntityState::Added => 2,
            EntityState::Unchanged => 3,
        }
    }
}

impl CommandComparer for DefaultCommandComparer {
    fn compare(&self, left: &ModificationCommand<'_>, right: &ModificationCommand<'_>) -> Ordering {
        left.schema()
            .cmp(&right.schema())
            .then_with(|| left.table_name().cmp(right.table_name()))
            .then_with(|| {
                Self::state_rank(left.entity_state()).cmp(&Self::state_rank(right.entity_state()))
            })
            .then_with(|| left.key_values().cmp(&right.key_values()))
    }
}
