//! # Gatewire Runtime
//!
//! Orchestration layer of the gatewire routing framework.
//!
//! Responsibilities:
//!
//! - **Configuration**: figment-based layered loading
//!   ([`config::ConfigLoader`]) of defaults, TOML files, and `GATEWIRE_*`
//!   environment variables.
//! - **Logging**: tracing-subscriber setup from configuration
//!   ([`logging::LoggingBuilder`]).
//! - **Lifecycle**: [`GatewireRuntime`] boots the network client through an
//!   async factory, runs the dispatch wiring pass, and tears everything down
//!   on Ctrl+C/SIGTERM.
//!
//! ```rust,ignore
//! use gatewire_runtime::GatewireRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = GatewireRuntime::new();
//!     runtime.set_client_factory(|options| async move {
//!         Ok(EdgeClient::connect(options).await?)
//!     }).await;
//!     runtime.register(Arc::new(TempGateway::default()));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

mod runtime;

pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use runtime::{ClientFactory, GatewireRuntime, RuntimeBuilder};
