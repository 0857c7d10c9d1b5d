//! Module: update
//! Responsibility: the write-ordering pipeline from tracked entries to
//! execution batches.
//! Does not own: change tracking, SQL generation, or execution.
//! Boundary: callers implement `UpdateEntry` and pull batches from
//! `CommandBatchPreparer::batch_commands`.

mod annotation;
pub mod batch;
mod command;
mod entry;
pub mod graph;
mod key_value;
mod preparer;
pub mod sharing;

pub use annotation::{ModelTableAnnotations, TableAnnotationProvider};
pub use command::{ColumnModification, ModificationCommand};
pub use entry::{EntityState, UpdateEntry};
pub use key_value::{
    ConstraintRef, DefaultKeyValueIndexFactory, KeyValueIndex, KeyValueIndexFactory, ValueSource,
};
pub use preparer::{BoxedExecutionBatch, CommandBatchPreparer, CommandBatches, Dependency};
