//! ## Crate layout
//! - `core`: entity model, values, the update pipeline, observability, and
//!   configuration.
//! - `error`: the stable public error taxonomy.
//!
//! The `prelude` module mirrors what an executor needs to turn tracked
//! entries into ordered execution batches.

pub use stowage_core as core;

pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        config::UpdateConfig,
        model::{
            EntityTypeId, Model, ModelBuilder, PropertyDef, PropertyId, TableName, ValueGenerated,
        },
        update::{
            BoxedExecutionBatch, CommandBatchPreparer, EntityState, ModificationCommand,
            UpdateEntry,
            batch::{ExecutionBatch, ExecutionBatchFactory},
        },
        value::Value,
    };
    pub use crate::error::{Error, ErrorKind, ErrorOrigin, UpdateErrorKind};
}
