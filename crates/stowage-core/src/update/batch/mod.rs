//! Module: update::batch
//! Responsibility: the accumulator seam between the preparer and the
//! executor, plus the bundled accumulators.
//! Does not own: ordering or validation of commands.
//! Boundary: commands move into an execution batch by value and come back
//! when the batch rejects them.

mod comparer;
mod parameter;

#[cfg(test)]
mod tests;

pub use comparer::{CommandComparer, DefaultCommandComparer};
pub use parameter::{
    DefaultParameterNameGenerator, DefaultParameterNameGeneratorFactory, ParameterNameGenerator,
    ParameterNameGeneratorFactory, ParameterNames,
};

use crate::{DEFAULT_MAX_BATCH_SIZE, update::ModificationCommand};
use std::fmt::Debug;

///
/// ExecutionBatch
///
/// Commands sent to the store in one round trip.
///

pub trait ExecutionBatch<'a>: Debug {
    /// Accept `command`, or hand it back when the batch is full or cannot
    /// take it.
    fn try_add_command(
        &mut self,
        command: ModificationCommand<'a>,
    ) -> Result<(), ModificationCommand<'a>>;

    fn commands(&self) -> &[ModificationCommand<'a>];

    /// Give the commands back, in the order they were accepted.
    fn into_commands(self: Box<Self>) -> Vec<ModificationCommand<'a>>;

    fn len(&self) -> usize {
        self.commands().len()
    }

    fn is_empty(&self) -> bool {
        self.commands().is_empty()
    }
}

///
/// ExecutionBatchFactory
///

pub trait ExecutionBatchFactory {
    fn create<'a>(&self) -> Box<dyn ExecutionBatch<'a> + 'a>;
}

///
/// BoundedBatch
/// Accepts commands until it holds `capacity` of them.
///

#[derive(Debug)]
pub struct BoundedBatch<'a> {
    commands: Vec<ModificationCommand<'a>>,
    capacity: usize,
}

impl BoundedBatch<'_> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity.min(DEFAULT_MAX_BATCH_SIZE)),
            capacity,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<'a> ExecutionBatch<'a> for BoundedBatch<'a> {
    fn try_add_command(
        &mut self,
        command: ModificationCommand<'a>,
    ) -> Result<(), ModificationCommand<'a>> {
        if self.commands.len() >= self.capacity {
            return Err(command);
        }
        self.commands.push(command);

        Ok(())
    }

    fn commands(&self) -> &[ModificationCommand<'a>] {
        &self.commands
    }

    fn into_commands(self: Box<Self>) -> Vec<ModificationCommand<'a>> {
        self.commands
    }
}

///
/// BoundedBatchFactory
///

#[derive(Clone, Copy, Debug)]
pub struct BoundedBatchFactory {
    capacity: usize,
}

impl BoundedBatchFactory {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for BoundedBatchFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE)
    }
}

impl ExecutionBatchFactory for BoundedBatchFactory {
    fn create<'a>(&self) -> Box<dyn ExecutionBatch<'a> + 'a> {
        Box::new(BoundedBatch::new(self.capacity))
    }
}
