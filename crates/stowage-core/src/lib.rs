//! Core runtime for Stowage: the entity model, values, the update pipeline
//! that orders row writes, observability, and configuration.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod model;
pub mod obs;
pub mod update;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Default number of commands the bundled execution batch accepts.
///
/// Sized so a batch of narrow rows stays under the parameter limits of
/// common stores.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 42;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, accumulators, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{EntityTypeId, Model, ModelBuilder, TableName},
        update::{CommandBatchPreparer, EntityState, ModificationCommand, UpdateEntry},
        value::Value,
    };
}
