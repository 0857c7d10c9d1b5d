use crate::{
    error::InternalError,
    model::{Model, TableName},
    obs::MetricsEvent,
    update::{
        EntityState, ModificationCommand, UpdateEntry,
        batch::ParameterNames,
        preparer::CommandBatchPreparer,
        sharing::{IdentityMap, RowKey},
    },
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

///
/// UnsharedCommands
///
/// Row identity to command slot for tables mapped by a single root, so two
/// entries of one hierarchy that land on the same row share a command.
/// Deletes and other writes are keyed apart: a row deleted and re-added in
/// one pass is two commands.
///

#[derive(Debug, Default)]
struct UnsharedCommands {
    rows: HashMap<(TableName, RowKey, bool), usize>,
}

impl UnsharedCommands {
    fn try_get_command(&self, table: &TableName, key: &RowKey, deleted: bool) -> Option<usize> {
        self.rows.get(&(table.clone(), key.clone(), deleted)).copied()
    }

    fn register(&mut self, table: TableName, key: RowKey, deleted: bool, slot: usize) {
        self.rows.insert((table, key, deleted), slot);
    }
}

impl<'m> CommandBatchPreparer<'m> {
    /// Build one command per physical row, validated and without no-op
    /// updates, in first-seen order.
    pub(super) fn create_modification_commands<'a>(
        &'a self,
        entries: &[&'a dyn UpdateEntry],
        parameter_names: &ParameterNames,
    ) -> Result<Vec<ModificationCommand<'a>>, InternalError> {
        let model: &'a Model = self.model;
        let sensitive = self.config.sensitive_data_logging;
        let shared = self.shared_tables();

        let mut commands: Vec<ModificationCommand<'a>> = Vec::new();
        let mut identity_maps: BTreeMap<TableName, IdentityMap> = BTreeMap::new();
        let mut unshared = UnsharedCommands::default();
        let mut merged = 0usize;

        // Phase 1: route each entry to the command for its row.
        for entry in entries {
            let state = entry.state();
            if state == EntityState::Unchanged {
                let entity = model.entity_type(entry.entity_type());

                return Err(InternalError::invalid_entity_state(
                    &entity.name,
                    state.to_string(),
                ));
            }

            let table = self.annotations.table(model, entry.entity_type());
            let deleted = state == EntityState::Deleted;
            let mut created = false;

            let slot = match (RowKey::for_entry(model, *entry), shared.get(&table)) {
                (None, _) => {
                    created = true;
                    push_command(&mut commands, model, &table, parameter_names, sensitive)
                }
                (Some(key), Some(factory)) => {
                    let map = identity_maps
                        .entry(table.clone())
                        .or_insert_with(|| factory.create());
                    map.find_or_insert(key, || {
                        created = true;
                        push_command(&mut commands, model, &table, parameter_names, sensitive)
                    })
                }
                (Some(key), None) => {
                    if let Some(slot) = unshared.try_get_command(&table, &key, deleted) {
                        slot
                    } else {
                        created = true;
                        let slot =
                            push_command(&mut commands, model, &table, parameter_names, sensitive);
                        unshared.register(table, key, deleted, slot);
                        slot
                    }
                }
            };

            if !created {
                merged += 1;
            }
            commands[slot].add_entry(*entry);
        }

        // Phase 2: merged rows must agree on state and identity.
        for command in &commands {
            command.validate_shared_identity()?;
        }

        // Phase 3: an update that writes nothing is not sent.
        let built = commands.len();
        commands.retain(|command| {
            let keep =
                command.entity_state() != EntityState::Modified || command.has_write_columns();
            if !keep {
                if sensitive {
                    warn!(table = %command.table(), key = %command, "update.batch.command_dropped");
                } else {
                    warn!(table = %command.table(), "update.batch.command_dropped");
                }
            }
            keep
        });
        let dropped = built - commands.len();

        self.metrics.record(MetricsEvent::CommandsBuilt {
            commands: commands.len() as u64,
            merged_entries: merged as u64,
            dropped: dropped as u64,
        });
        debug!(
            entries = entries.len(),
            commands = commands.len(),
            merged,
            dropped,
            shared_tables = identity_maps.len(),
            "update.batch.commands_built"
        );

        Ok(commands)
    }
}

fn push_command<'a>(
    commands: &mut Vec<ModificationCommand<'a>>,
    model: &'a Model,
    table: &TableName,
    parameter_names: &ParameterNames,
    sensitive: bool,
) -> usize {
    commands.push(ModificationCommand::new(
        model,
        table.clone(),
        parameter_names.clone(),
        sensitive,
    ));

    commands.len() - 1
}
