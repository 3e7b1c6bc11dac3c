//! Infrastructure adapters: HTTP clients, persistence, configuration,
//! logging.

pub mod api;
pub mod config;
pub mod database;
pub mod logging;
