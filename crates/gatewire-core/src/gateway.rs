//! Gateway and client-consumer capability traits.
//!
//! Handler declarations are explicit registration tables rather than runtime
//! reflection: a gateway type implements [`Gateway`] and returns one
//! [`HandlerSpec`] per handler method from
//! [`handler_specs`](Gateway::handler_specs). The spec builder records the
//! declaration verbatim — which event family the method subscribes to and
//! where each parameter slot sits — and performs **no** validation;
//! classifying and validating specs is the explorer's job.
//!
//! # Example
//!
//! ```rust,ignore
//! struct TempGateway { /* … */ }
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
//!                 .handler(move |args| {
//!                     let this = Arc::clone(&this);
//!                     async move { this.on_temp(args).await }
//!                 }),
//!         ]
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::client::BoxedClient;
use crate::mapping::{BoxError, HandlerCallback, ParamRole};

// =============================================================================
// HandlerSpec
// =============================================================================

/// The raw, unvalidated declaration of one handler method.
///
/// Mirrors what method/parameter annotations would record at declaration
/// time: presence of an event-family marker plus its path, and the role of
/// each positional parameter. Write-once at construction, read-many at
/// discovery.
pub struct HandlerSpec {
    method_name: &'static str,
    payload_signature: Option<String>,
    stream_name: Option<String>,
    event_name: Option<String>,
    params: Vec<(usize, ParamRole)>,
    callback: Option<HandlerCallback>,
}

impl HandlerSpec {
    /// Starts a declaration for the method called `method_name`.
    ///
    /// The name is used for diagnostics only; it carries no routing meaning.
    pub fn new(method_name: &'static str) -> Self {
        Self {
            method_name,
            payload_signature: None,
            stream_name: None,
            event_name: None,
            params: Vec::new(),
            callback: None,
        }
    }

    /// Declares this method a payload handler for `signature`.
    pub fn payload(mut self, signature: impl Into<String>) -> Self {
        self.payload_signature = Some(signature.into());
        self
    }

    /// Declares this method a stream handler for the stream called `name`.
    pub fn stream(mut self, name: impl Into<String>) -> Self {
        self.stream_name = Some(name.into());
        self
    }

    /// Declares this method a client-event handler for `event`.
    pub fn client_event(mut self, event: impl Into<String>) -> Self {
        self.event_name = Some(event.into());
        self
    }

    /// Declares the parameter at positional `index` to carry `role`.
    ///
    /// Parameters without a declared role receive `Value::Null` at dispatch.
    pub fn param(mut self, index: usize, role: ParamRole) -> Self {
        self.params.push((index, role));
        self
    }

    /// Attaches the handler body.
    ///
    /// The closure receives the positional argument list assembled by the
    /// dispatch service. Capture an `Arc` of the declaring instance to keep
    /// receiver semantics.
    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.callback = Some(Arc::new(move |args| Box::pin(f(args))));
        self
    }

    /// Declared method name.
    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// Declared payload signature, if any.
    pub fn payload_signature(&self) -> Option<&str> {
        self.payload_signature.as_deref()
    }

    /// Declared stream name, if any.
    pub fn stream_name(&self) -> Option<&str> {
        self.stream_name.as_deref()
    }

    /// Declared client-event name, if any.
    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    /// Declared `(index, role)` pairs, in declaration order.
    pub fn params(&self) -> &[(usize, ParamRole)] {
        &self.params
    }

    /// The attached handler body, if any.
    pub fn callback(&self) -> Option<&HandlerCallback> {
        self.callback.as_ref()
    }
}

impl std::fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("method_name", &self.method_name)
            .field("payload_signature", &self.payload_signature)
            .field("stream_name", &self.stream_name)
            .field("event_name", &self.event_name)
            .field("params", &self.params)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Capability trait for objects that declare network-event handlers.
///
/// Implementors own their handler table; the framework never constructs or
/// destroys gateway instances, it only reads their specs and invokes the
/// attached callbacks.
pub trait Gateway: Send + Sync + 'static {
    /// Display name of the gateway, used in subscription logs.
    fn gateway_name(&self) -> &'static str;

    /// Returns one spec per handler method.
    ///
    /// Takes `Arc<Self>` so callbacks can capture the declaring instance.
    fn handler_specs(self: Arc<Self>) -> Vec<HandlerSpec>;
}

// =============================================================================
// ClientSlot / ClientConsumer
// =============================================================================

/// A once-writable property slot that receives the live client handle.
///
/// The empty state is the declaration-time pre-state; the dispatch service
/// performs the single write before the application is considered ready.
#[derive(Default)]
pub struct ClientSlot {
    cell: OnceLock<BoxedClient>,
}

impl ClientSlot {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the injected client, if the slot has been populated.
    pub fn get(&self) -> Option<BoxedClient> {
        self.cell.get().cloned()
    }

    /// Populates the slot. Fails when the slot was already written.
    pub fn set(&self, client: BoxedClient) -> Result<(), BoxedClient> {
        self.cell.set(client)
    }

    /// Whether the slot has been populated.
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl std::fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSlot")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Capability trait for objects that want the live client injected into
/// named slots before dispatch starts.
pub trait ClientConsumer: Send + Sync + 'static {
    /// Named slots to populate, in declaration order.
    fn client_slots(&self) -> Vec<(&'static str, &ClientSlot)>;
}

// =============================================================================
// Registrant
// =============================================================================

/// Capability umbrella for anything placed in the instance registry.
///
/// Default implementations return `None`, so a registrant opts into each
/// capability by overriding the corresponding upcast — the registry never
/// inspects concrete types.
pub trait Registrant: Send + Sync + 'static {
    /// Upcast to the gateway capability, when implemented.
    fn as_gateway(self: Arc<Self>) -> Option<Arc<dyn Gateway>> {
        None
    }

    /// Upcast to the client-consumer capability, when implemented.
    fn as_client_consumer(self: Arc<Self>) -> Option<Arc<dyn ClientConsumer>> {
        None
    }
}
