//! Module: update::preparer
//! Responsibility: turn tracked entries into ordered execution batches.
//! Does not own: SQL generation, execution, or change tracking.
//! Boundary: `batch_commands` is lazy; every error surfaces as an `Err`
//! item when the returned iterator is advanced.

mod commands;
mod dependency;


pub use dependency::Dependency;

use crate::{
    config::UpdateConfig,
    error::InternalError,
    model::{Model, TableName},
    obs::{MetricsEvent, MetricsSink, NoopMetricsSink},
    update::{
        ModificationCommand, UpdateEntry,
        annotation::{ModelTableAnnotations, TableAnnotationProvider},
        batch::{
            BoundedBatchFactory, CommandComparer, DefaultCommandComparer,
            DefaultParameterNameGeneratorFactory, ExecutionBatch, ExecutionBatchFactory,
            ParameterNameGeneratorFactory, ParameterNames,
        },
        graph::CycleFormatter,
        key_value::{DefaultKeyValueIndexFactory, KeyValueIndexFactory},
        sharing::{IdentityMapFactory, shared_table_factories},
    },
};
use dependency::DependencyGraphBuilder;
use std::{
    cell::OnceCell,
    collections::{BTreeMap, VecDeque},
    fmt,
    iter::FusedIterator,
    rc::Rc,
};
use tracing::{debug, warn};

/// Packed commands for one store round trip.
pub type BoxedExecutionBatch<'a> = Box<dyn ExecutionBatch<'a> + 'a>;

///
/// CommandBatchPreparer
///
/// Orders row writes so that foreign keys and unique indexes hold after
/// every execution batch, and packs independent writes together.
///
/// Collaborators are injected through the `with_*` methods; the defaults
/// read everything from the model and the config. The shared-table cache
/// is filled on first use and reused by later calls. Not `Sync`.
///

pub struct CommandBatchPreparer<'m> {
    model: &'m Model,
    config: UpdateConfig,
    annotations: Box<dyn TableAnnotationProvider + 'm>,
    key_values: Box<dyn KeyValueIndexFactory + 'm>,
    parameter_names: Box<dyn ParameterNameGeneratorFactory + 'm>,
    batch_factory: Box<dyn ExecutionBatchFactory + 'm>,
    comparer: Box<dyn CommandComparer + 'm>,
    metrics: Rc<dyn MetricsSink + 'm>,
    shared_tables: OnceCell<BTreeMap<TableName, IdentityMapFactory>>,
}

impl<'m> CommandBatchPreparer<'m> {
    /// Build a preparer with the bundled collaborators configured from
    /// `config`.
    pub fn new(model: &'m Model, config: UpdateConfig) -> Result<Self, InternalError> {
        config.validate()?;

        Ok(Self {
            model,
            annotations: Box::new(ModelTableAnnotations::new(config.default_schema.clone())),
            key_values: Box::new(DefaultKeyValueIndexFactory),
            parameter_names: Box::new(DefaultParameterNameGeneratorFactory::new(
                config.parameter_prefix.clone(),
            )),
            batch_factory: Box::new(BoundedBatchFactory::new(config.max_batch_size)),
            comparer: Box::new(DefaultCommandComparer),
            metrics: Rc::new(NoopMetricsSink),
            shared_tables: OnceCell::new(),
            config,
        })
    }

    #[must_use]
    pub fn with_table_annotations(
        mut self,
        annotations: impl TableAnnotationProvider + 'm,
    ) -> Self {
        self.annotations = Box::new(annotations);
        self.shared_tables = OnceCell::new();
        self
    }

    #[must_use]
    pub fn with_key_value_factory(mut self, factory: impl KeyValueIndexFactory + 'm) -> Self {
        self.key_values = Box::new(factory);
        self
    }

    #[must_use]
    pub fn with_parameter_names(
        mut self,
        factory: impl ParameterNameGeneratorFactory + 'm,
    ) -> Self {
        self.parameter_names = Box::new(factory);
        self
    }

    #[must_use]
    pub fn with_batch_factory(mut self, factory: impl ExecutionBatchFactory + 'm) -> Self {
        self.batch_factory = Box::new(factory);
        self
    }

    #[must_use]
    pub fn with_comparer(mut self, comparer: impl CommandComparer + 'm) -> Self {
        self.comparer = Box::new(comparer);
        self
    }

    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Rc<dyn MetricsSink + 'm>) -> Self {
        self.metrics = sink;
        self
    }

    #[must_use]
    pub const fn model(&self) -> &'m Model {
        self.model
    }

    #[must_use]
    pub const fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Tables mapped by more than one root entity type, computed once.
    pub fn shared_tables(&self) -> &BTreeMap<TableName, IdentityMapFactory> {
        self.shared_tables.get_or_init(|| {
            let factories = shared_table_factories(self.model, self.annotations.as_ref());
            for (table, factory) in &factories {
                debug!(%table, roots = factory.roots().len(), "update.sharing.table_shared");
            }
            factories
        })
    }

    /// Lazily produce the execution batches for `entries`.
    ///
    /// Nothing runs until the iterator is first advanced. Independent sets
    /// are packed one at a time, so an executor may act on earlier batches
    /// (for example propagating generated keys into the entries) before the
    /// commands of later sets are validated.
    pub fn batch_commands<'a>(&'a self, entries: &[&'a dyn UpdateEntry]) -> CommandBatches<'a> {
        CommandBatches {
            preparer: self,
            pending: Some(entries.to_vec()),
            parameter_names: None,
            sets: VecDeque::new(),
            current: VecDeque::new(),
            open: None,
            ready: VecDeque::new(),
            done: false,
        }
    }

    // Build commands, order them, and return the independent sets.
    fn prepare<'a>(
        &'a self,
        entries: &[&'a dyn UpdateEntry],
        parameter_names: &ParameterNames,
    ) -> Result<Vec<Vec<ModificationCommand<'a>>>, InternalError> {
        let model: &'a Model = self.model;
        self.metrics.record(MetricsEvent::PrepareStart {
            entries: entries.len() as u64,
        });

        let commands = self.create_modification_commands(entries, parameter_names)?;

        let graph =
            DependencyGraphBuilder::new(model, self.key_values.as_ref(), &commands).build()?;
        self.metrics.record(MetricsEvent::GraphBuilt {
            vertices: graph.len() as u64,
            edges: graph.edge_count() as u64,
        });

        let format_cycle: &CycleFormatter<'_, usize, Dependency> = &|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.labels.first())
                .map(|label| label.describe(model))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let order = graph
            .batching_topological_sort(Some(format_cycle))
            .inspect_err(|err| {
                if err.is_circular_dependency() {
                    self.metrics.record(MetricsEvent::CycleDetected);
                }
            })?;

        let mut slots: Vec<Option<ModificationCommand<'a>>> =
            commands.into_iter().map(Some).collect();
        let sets = order
            .into_iter()
            .map(|set| {
                set.into_iter()
                    .map(|slot| {
                        slots.get_mut(slot).and_then(Option::take).ok_or_else(|| {
                            InternalError::batch_internal(format!(
                                "command slot {slot} was sorted twice or never built"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            sets = sets.len(),
            edges = graph.edge_count(),
            "update.batch.sorted"
        );

        Ok(sets)
    }
}

impl fmt::Debug for CommandBatchPreparer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBatchPreparer")
            .field("config", &self.config)
            .field("shared_tables", &self.shared_tables.get().map(BTreeMap::len))
            .finish_non_exhaustive()
    }
}

///
/// CommandBatches
///
/// Pull-based execution batch stream returned by
/// [`CommandBatchPreparer::batch_commands`]. Fused after the first error.
///

pub struct CommandBatches<'a> {
    preparer: &'a CommandBatchPreparer<'a>,
    pending: Option<Vec<&'a dyn UpdateEntry>>,
    parameter_names: Option<ParameterNames>,
    sets: VecDeque<Vec<ModificationCommand<'a>>>,
    current: VecDeque<ModificationCommand<'a>>,
    open: Option<BoxedExecutionBatch<'a>>,
    ready: VecDeque<BoxedExecutionBatch<'a>>,
    done: bool,
}

impl<'a> CommandBatches<'a> {
    fn advance(&mut self) -> Result<Option<BoxedExecutionBatch<'a>>, InternalError> {
        if let Some(entries) = self.pending.take() {
            let names = ParameterNames::new(self.preparer.parameter_names.create());
            let sets = self.preparer.prepare(&entries, &names)?;
            self.sets = sets.into();
            self.parameter_names = Some(names);
        }

        loop {
            if let Some(batch) = self.ready.pop_front() {
                self.preparer.metrics.record(MetricsEvent::BatchEmitted {
                    commands: batch.len() as u64,
                });
                debug!(commands = batch.len(), "update.batch.emitted");

                return Ok(Some(batch));
            }

            if let Some(command) = self.current.pop_front() {
                command.validate_temporary_values()?;
                self.pack(command)?;
            } else if let Some(open) = self.open.take() {
                // An independent set never shares an execution batch with
                // the next one.
                self.finish(open)?;
            } else if let Some(mut set) = self.sets.pop_front() {
                let comparer = self.preparer.comparer.as_ref();
                set.sort_by(|left, right| comparer.compare(left, right));
                self.current = set.into();
            } else {
                return Ok(None);
            }
        }
    }

    fn pack(&mut self, command: ModificationCommand<'a>) -> Result<(), InternalError> {
        let mut batch = match self.open.take() {
            Some(batch) => batch,
            None => self.start_new_batch(),
        };

        let rejected = match batch.try_add_command(command) {
            Ok(()) => {
                self.open = Some(batch);
                return Ok(());
            }
            Err(rejected) if !batch.is_empty() => rejected,
            Err(_) => return Err(first_command_rejected()),
        };

        // Full: close it and retry on a fresh one.
        self.finish(batch)?;
        let mut fresh = self.start_new_batch();
        if fresh.try_add_command(rejected).is_err() {
            return Err(first_command_rejected());
        }
        self.open = Some(fresh);

        Ok(())
    }

    // Queue a completed batch, splitting it when it is below the minimum size.
    fn finish(&mut self, batch: BoxedExecutionBatch<'a>) -> Result<(), InternalError> {
        let min = self.preparer.config.min_batch_size;
        if batch.len() == 1 || batch.len() >= min {
            self.ready.push_back(batch);
            return Ok(());
        }

        let commands = batch.into_commands();
        self.preparer.metrics.record(MetricsEvent::BatchSplit {
            commands: commands.len() as u64,
        });
        warn!(
            commands = commands.len(),
            min_batch_size = min,
            "update.batch.split_below_minimum"
        );

        for command in commands {
            let mut single = self.start_new_batch();
            if single.try_add_command(command).is_err() {
                return Err(first_command_rejected());
            }
            self.ready.push_back(single);
        }

        Ok(())
    }

    fn start_new_batch(&self) -> BoxedExecutionBatch<'a> {
        if let Some(names) = &self.parameter_names {
            names.reset();
        }

        self.preparer.batch_factory.create()
    }
}

impl<'a> Iterator for CommandBatches<'a> {
    type Item = Result<BoxedExecutionBatch<'a>, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.advance() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for CommandBatches<'_> {}

fn first_command_rejected() -> InternalError {
    InternalError::batch_internal("a new execution batch rejected its first command")
}

impl fmt::Debug for CommandBatches<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBatches")
            .field("started", &self.pending.is_none())
            .field("remaining_sets", &self.sets.len())
            .field("ready", &self.ready.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
