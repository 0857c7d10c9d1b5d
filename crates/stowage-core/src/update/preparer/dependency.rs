use crate::{
    error::InternalError,
    model::{ForeignKeyId, IndexId, Model},
    update::{
        EntityState, ModificationCommand,
        graph::Multigraph,
        key_value::{KeyValueIndex, KeyValueIndexFactory, ValueSource},
    },
};
use std::collections::HashMap;
use tracing::trace;

///
/// Dependency
///
/// Edge label: the constraint that forces one write before another.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dependency {
    ForeignKey(ForeignKeyId),
    UniqueIndex(IndexId),
}

impl Dependency {
    #[must_use]
    pub fn describe(self, model: &Model) -> String {
        match self {
            Self::ForeignKey(fk) => model.describe_foreign_key(fk),
            Self::UniqueIndex(index) => model.describe_index(index),
        }
    }
}

type PredecessorMap = HashMap<KeyValueIndex, Vec<usize>>;

///
/// DependencyGraphBuilder
///
/// Builds the write-order graph over a command arena. Vertices are arena
/// slots.
///

pub(super) struct DependencyGraphBuilder<'p, 'a> {
    model: &'a Model,
    key_values: &'p dyn KeyValueIndexFactory,
    commands: &'p [ModificationCommand<'a>],
}

impl<'p, 'a> DependencyGraphBuilder<'p, 'a> {
    pub(super) const fn new(
        model: &'a Model,
        key_values: &'p dyn KeyValueIndexFactory,
        commands: &'p [ModificationCommand<'a>],
    ) -> Self {
        Self {
            model,
            key_values,
            commands,
        }
    }

    pub(super) fn build(&self) -> Result<Multigraph<usize, Dependency>, InternalError> {
        let mut graph = Multigraph::new();
        graph.add_vertices(0..self.commands.len());

        // Phase 1: who must run before a given key value can be referenced.
        let predecessors = self.key_value_predecessors();

        // Phase 2: foreign key edges, then unique index edges.
        self.add_foreign_key_edges(&mut graph, &predecessors)?;
        self.add_unique_index_edges(&mut graph)?;

        Ok(graph)
    }

    fn key_value_predecessors(&self) -> PredecessorMap {
        let model = self.model;
        let mut map = PredecessorMap::new();

        for (slot, command) in self.commands.iter().enumerate() {
            let state = command.entity_state();

            // Inserted or re-keyed principals.
            if matches!(state, EntityState::Added | EntityState::Modified) {
                for entry in command.entries() {
                    let entity = model.entity_type(entry.entity_type());
                    for fk in entity.referencing_foreign_keys() {
                        let principal_key = model.key(model.foreign_key(*fk).principal_key);
                        if state != EntityState::Added
                            && !command.writes_or_reads_any(&principal_key.properties)
                        {
                            continue;
                        }
                        if let Some(value) = self.key_values.principal_key_value(
                            model,
                            *entry,
                            *fk,
                            ValueSource::Current,
                        ) {
                            map.entry(value).or_default().push(slot);
                        }
                    }
                }
            }

            // Deleted or detached dependents.
            if matches!(state, EntityState::Modified | EntityState::Deleted) {
                for entry in command.entries() {
                    let entity = model.entity_type(entry.entity_type());
                    for fk in entity.foreign_keys() {
                        if state != EntityState::Deleted
                            && !command.writes_or_reads_any(&model.foreign_key(*fk).properties)
                        {
                            continue;
                        }
                        if let Some(value) = self.key_values.dependent_key_value(
                            model,
                            *entry,
                            *fk,
                            ValueSource::Original,
                        ) {
                            map.entry(value).or_default().push(slot);
                        }
                    }
                }
            }
        }

        map
    }

    fn add_foreign_key_edges(
        &self,
        graph: &mut Multigraph<usize, Dependency>,
        predecessors: &PredecessorMap,
    ) -> Result<(), InternalError> {
        let model = self.model;

        for (slot, command) in self.commands.iter().enumerate() {
            match command.entity_state() {
                EntityState::Added | EntityState::Modified => {
                    for entry in command.entries() {
                        let entity = model.entity_type(entry.entity_type());
                        for fk in entity.foreign_keys() {
                            let value = self.key_values.dependent_key_value(
                                model,
                                *entry,
                                *fk,
                                ValueSource::Current,
                            );
                            let label = Dependency::ForeignKey(*fk);
                            add_matching_edges(graph, predecessors, value, slot, label)?;
                        }
                    }
                }
                EntityState::Deleted => {
                    for entry in command.entries() {
                        let entity = model.entity_type(entry.entity_type());
                        for fk in entity.referencing_foreign_keys() {
                            let value = self.key_values.principal_key_value(
                                model,
                                *entry,
                                *fk,
                                ValueSource::Original,
                            );
                            let label = Dependency::ForeignKey(*fk);
                            add_matching_edges(graph, predecessors, value, slot, label)?;
                        }
                    }
                }
                EntityState::Unchanged => {}
            }
        }

        Ok(())
    }

    fn add_unique_index_edges(
        &self,
        graph: &mut Multigraph<usize, Dependency>,
    ) -> Result<(), InternalError> {
        let model = self.model;
        let mut vacated = PredecessorMap::new();

        // Values released by updates and deletes.
        for (slot, command) in self.commands.iter().enumerate() {
            if !matches!(
                command.entity_state(),
                EntityState::Modified | EntityState::Deleted
            ) {
                continue;
            }
            for entry in command.entries() {
                for index in model.entity_type(entry.entity_type()).unique_indexes() {
                    if entry.state() == EntityState::Modified
                        && !model.index(*index).properties.iter().any(|p| entry.is_modified(*p))
                    {
                        continue;
                    }
                    if let Some(value) =
                        self.key_values
                            .index_value(model, *entry, *index, ValueSource::Original)
                    {
                        vacated.entry(value).or_default().push(slot);
                    }
                }
            }
        }

        // Values claimed by inserts and updates.
        for (slot, command) in self.commands.iter().enumerate() {
            if !matches!(
                command.entity_state(),
                EntityState::Added | EntityState::Modified
            ) {
                continue;
            }
            for entry in command.entries() {
                for index in model.entity_type(entry.entity_type()).unique_indexes() {
                    if entry.state() == EntityState::Modified
                        && !model.index(*index).properties.iter().any(|p| entry.is_modified(*p))
                    {
                        continue;
                    }
                    let value =
                        self.key_values
                            .index_value(model, *entry, *index, ValueSource::Current);
                    let label = Dependency::UniqueIndex(*index);
                    add_matching_edges(graph, &vacated, value, slot, label)?;
                }
            }
        }

        Ok(())
    }
}

// Add `predecessor -> slot` for every other command registered under `value`.
fn add_matching_edges(
    graph: &mut Multigraph<usize, Dependency>,
    predecessors: &PredecessorMap,
    value: Option<KeyValueIndex>,
    slot: usize,
    label: Dependency,
) -> Result<(), InternalError> {
    let Some(candidates) = value.and_then(|value| predecessors.get(&value)) else {
        return Ok(());
    };

    for predecessor in candidates {
        if *predecessor != slot {
            graph.add_edge(predecessor, &slot, label)?;
            trace!(from = *predecessor, to = slot, label = ?label, "update.graph.edge_added");
        }
    }

    Ok(())
}
