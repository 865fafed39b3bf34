//! # Gatewire
//!
//! A typed message-routing framework: application "gateway" objects declare,
//! through explicit registration tables, which class of inbound network
//! event each handler method receives — a named payload signature, a named
//! stream, or a named client event — and the framework discovers those
//! declarations, binds them to a live client, and dispatches incoming
//! messages with correctly ordered arguments.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────────────┐     ┌──────────────────────────────┐
//! │ Registry │────▶│ MetadataExplorer │────▶│ DispatchService              │
//! │          │     │  (discovery)     │     │  payload / stream / event    │──▶ handlers
//! └──────────┘     └──────────────────┘     └──────────────────────────────┘
//!                                                      ▲
//!                                              NetworkClient sources
//! ```
//!
//! - **gatewire-core**: mapping model, capability traits, client interface
//! - **gatewire-framework**: explorer and dispatch service
//! - **gatewire-runtime**: config, logging, and lifecycle orchestration
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gatewire::prelude::*;
//!
//! struct TempGateway;
//!
//! impl Gateway for TempGateway {
//!     fn gateway_name(&self) -> &'static str {
//!         "TempGateway"
//!     }
//!
//!     fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec> {
//!         let this = Arc::clone(&self);
//!         vec![
//!             HandlerSpec::new("on_temp")
//!                 .payload("temp.read")
//!                 .param(0, ParamRole::Context)
//!                 .param(1, ParamRole::Payload)
//!                 .handler(move |args| { /* … */ async { Ok(()) } }),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = GatewireRuntime::new();
//!     runtime.set_client_factory(|options| async move {
//!         Ok(EdgeClient::connect(options).await?)
//!     }).await;
//!     runtime.register(Arc::new(TempGateway));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub use gatewire_core as core;
pub use gatewire_framework as framework;
pub use gatewire_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gatewire::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use gatewire_runtime::{GatewireRuntime, RuntimeBuilder};

    // Registration layer - how gateways declare handlers
    pub use gatewire_core::{
        ClientConsumer, ClientSlot, Gateway, HandlerSpec, InstanceRegistry, ParamRole, Registrant,
    };

    // Client interface - what the dispatch service wires against
    pub use gatewire_core::{BoxedClient, NetworkClient, PayloadEnvelope};

    // Routing layer - discovery and dispatch
    pub use gatewire_framework::{DispatchService, MetadataExplorer};

    // Shared aliases
    pub use gatewire_core::{BoxError, MappingKind, MessageMapping};
}
