//! Domain layer: pure models, port traits, and the error taxonomy.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ExecutionError, ValidationError};
