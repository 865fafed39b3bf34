//! Configuration loading and schema.
//!
//! See [`ConfigLoader`] for the layering rules and [`GatewireConfig`] for
//! the schema.

mod loader;
mod schema;

pub use loader::{ConfigLoader, Profile};
pub use schema::{GatewireConfig, LogFormat, LogLevel, LogOutput, LoggingConfig};
