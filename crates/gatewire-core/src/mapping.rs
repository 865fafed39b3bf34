//! Mapping model for discovered handler bindings.
//!
//! A [`MessageMapping`] is the resolved description of one handler
//! subscription: which class of inbound event it listens to
//! ([`MappingKind`]), the topic/signature it subscribes to (`path`), the
//! bound callback, and where each logical argument lands in the handler's
//! parameter list ([`ParamOrder`]).
//!
//! Mappings are produced by the explorer in `gatewire-framework` and consumed
//! by the dispatch service; this module only defines the shared shapes.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

/// Boxed error type returned by handler callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a handler callback.
pub type HandlerFuture = BoxFuture<'static, Result<(), BoxError>>;

/// A bound handler callback.
///
/// Callbacks receive a positional argument list and close over the declaring
/// gateway instance (`Arc<Self>`), so invoking one is equivalent to calling
/// the method on its owning instance.
pub type HandlerCallback = Arc<dyn Fn(Vec<Value>) -> HandlerFuture + Send + Sync>;

// =============================================================================
// MappingKind / ParamRole
// =============================================================================

/// Classification of a discovered handler method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    /// Request/acknowledgement-style message identified by a signature,
    /// delivered as an `(error, context, data)` triple.
    Payload,
    /// Continuous named sequence of messages with no request/response
    /// semantics.
    Stream,
    /// Generic client-emitted event with free-form arguments.
    ClientEvent,
    /// The method is not a handler. Never emitted by the explorer and never
    /// forwarded to dispatch.
    Unknown,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Payload => "payload",
            Self::Stream => "stream",
            Self::ClientEvent => "client-event",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Logical argument slot a handler parameter can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// The error delivered alongside a payload event, if any.
    Error,
    /// The execution context of a payload event.
    Context,
    /// The payload data itself.
    Payload,
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Context => "context",
            Self::Payload => "payload",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// ParamOrder
// =============================================================================

/// Maps each logical slot to its positional index in the handler's parameter
/// list.
///
/// A slot with no entry is not requested by the handler and does not receive
/// an argument. Indices need not be contiguous or start at 0; positions that
/// no slot claims are filled with `Value::Null` at dispatch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamOrder {
    error: Option<usize>,
    context: Option<usize>,
    payload: Option<usize>,
}

impl ParamOrder {
    /// An order with no declared slots.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records `role` at positional `index`.
    ///
    /// Fails when the role was already assigned or when another role already
    /// claims the same index — no two slots may share a position.
    pub fn assign(&mut self, role: ParamRole, index: usize) -> Result<(), ParamOrderError> {
        if self.index_of(role).is_some() {
            return Err(ParamOrderError::DuplicateRole { role });
        }
        for other in [ParamRole::Error, ParamRole::Context, ParamRole::Payload] {
            if self.index_of(other) == Some(index) {
                return Err(ParamOrderError::DuplicateIndex { index, role, other });
            }
        }
        let slot = match role {
            ParamRole::Error => &mut self.error,
            ParamRole::Context => &mut self.context,
            ParamRole::Payload => &mut self.payload,
        };
        *slot = Some(index);
        Ok(())
    }

    /// Returns the declared index for `role`, if any.
    pub fn index_of(&self, role: ParamRole) -> Option<usize> {
        match role {
            ParamRole::Error => self.error,
            ParamRole::Context => self.context,
            ParamRole::Payload => self.payload,
        }
    }

    /// Returns `true` when no slot is declared.
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.context.is_none() && self.payload.is_none()
    }

    /// Length of the argument list to build: highest declared index + 1,
    /// or 0 when nothing is declared.
    pub fn width(&self) -> usize {
        [self.error, self.context, self.payload]
            .into_iter()
            .flatten()
            .map(|i| i + 1)
            .max()
            .unwrap_or(0)
    }

    /// Builds the positional argument list for a payload delivery.
    ///
    /// Each declared slot receives its value at the declared position; every
    /// other position is `Value::Null`. Values for undeclared slots are
    /// dropped — an error with no declared `error` slot simply has nowhere
    /// to land.
    pub fn arrange(&self, error: Value, context: Value, data: Value) -> Vec<Value> {
        let mut args = vec![Value::Null; self.width()];
        if let Some(i) = self.context {
            args[i] = context;
        }
        if let Some(i) = self.payload {
            args[i] = data;
        }
        if let Some(i) = self.error {
            args[i] = error;
        }
        args
    }
}

/// Errors raised while assembling a [`ParamOrder`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParamOrderError {
    /// The same role was declared twice.
    #[error("parameter role '{role}' declared more than once")]
    DuplicateRole {
        /// The duplicated role.
        role: ParamRole,
    },

    /// Two roles claim the same positional index.
    #[error("parameter index {index} claimed by both '{role}' and '{other}'")]
    DuplicateIndex {
        /// The contested index.
        index: usize,
        /// The role being assigned.
        role: ParamRole,
        /// The role that already holds the index.
        other: ParamRole,
    },
}

// =============================================================================
// MessageMapping
// =============================================================================

/// The resolved description of one handler's subscription.
///
/// Produced by the explorer; invariant: `kind` is never
/// [`MappingKind::Unknown`], `path` is non-empty, and `callback` is set.
#[derive(Clone)]
pub struct MessageMapping {
    /// Which class of inbound event this handler receives.
    pub kind: MappingKind,
    /// Topic/signature/event name to subscribe to. Immutable once discovered.
    pub path: String,
    /// The bound handler callback.
    pub callback: HandlerCallback,
    /// Declared method name, for diagnostics only.
    pub method_name: &'static str,
    /// Positional slot layout for payload dispatch.
    pub param_order: ParamOrder,
}

impl fmt::Debug for MessageMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageMapping")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("method_name", &self.method_name)
            .field("param_order", &self.param_order)
            .finish_non_exhaustive()
    }
}
