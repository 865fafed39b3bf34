//! # Gatewire Framework
//!
//! Routing layer of the gatewire framework: handler discovery and dispatch.
//!
//! - [`MetadataExplorer`] scans the instance registry, filters out
//!   gateway-capable and client-consuming instances, and classifies their
//!   handler declarations into validated [`MessageMapping`]s.
//! - [`DispatchService`] runs the one-time wiring pass: one subscription per
//!   mapping against the live client, one forwarding task per subscription,
//!   and a single client injection into every consumer slot.
//!
//! ```text
//! Registry ──▶ MetadataExplorer ──▶ DispatchService ──▶ handler invocations
//!               (discovery)          (binding + runtime fan-out)
//! ```
//!
//! Discovery never aborts for one malformed declaration; subscription setup
//! failures abort the whole pass. See [`error`] for the taxonomy.
//!
//! [`MessageMapping`]: gatewire_core::MessageMapping

pub mod dispatch;
pub mod error;
pub mod explorer;

pub use dispatch::DispatchService;
pub use error::{DiscoveryError, DispatchError, DispatchResult};
pub use explorer::MetadataExplorer;
