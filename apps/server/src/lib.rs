//! FHIR MongoDB operation guard
//!
//! Watches the document store for client operations (searches, cursors)
//! that have been running longer than allowed and terminates them, so one
//! expensive query cannot degrade the whole server.
//! - Operation classification against namespace, timeout and kind
//! - Cancellable periodic guard loop over `currentOp`/`killOp`
//! - Layered configuration, structured logging and Prometheus counters
//!
//! The extension value codec lives in the `fhirmongo-format` crate.

pub mod background;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod workers;

pub use config::Config;
pub use error::{Error, Result};
