//! # Gatewire Core
//!
//! Foundation layer of the gatewire routing framework.
//!
//! This crate defines the shared shapes the rest of the framework builds on:
//!
//! - **Mapping model**: the resolved description of one handler subscription
//!   ([`MessageMapping`], [`MappingKind`], [`ParamOrder`])
//! - **Registration layer**: explicit handler declaration tables and the
//!   capability traits gateways implement ([`HandlerSpec`], [`Gateway`],
//!   [`ClientConsumer`], [`Registrant`])
//! - **Client interface**: the three message-source primitives the dispatch
//!   service wires handlers against ([`NetworkClient`])
//! - **Instance registry**: the insertion-ordered population discovery runs
//!   over ([`InstanceRegistry`])
//!
//! ## Control flow
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────────────┐
//! │ Registry │────▶│ Explorer │────▶│ Dispatch Service │──▶ handler calls
//! └──────────┘     └──────────┘     └──────────────────┘
//!   population       discovery        binding + fan-out
//! ```
//!
//! Discovery and dispatch themselves live in `gatewire-framework`; this crate
//! has no wiring logic of its own.

pub mod client;
pub mod gateway;
pub mod mapping;
pub mod registry;

pub use client::{
    BoxedClient, ClientError, ClientResult, EventArgs, NetworkClient, PayloadEnvelope,
    SourceReceiver,
};
pub use gateway::{ClientConsumer, ClientSlot, Gateway, HandlerSpec, Registrant};
pub use mapping::{
    BoxError, HandlerCallback, HandlerFuture, MappingKind, MessageMapping, ParamOrder,
    ParamOrderError, ParamRole,
};
pub use registry::InstanceRegistry;
