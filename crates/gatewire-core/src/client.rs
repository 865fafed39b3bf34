//! Network client interface.
//!
//! The routing core never owns connection or transport logic; it consumes a
//! [`NetworkClient`] purely through three message-source primitives keyed by
//! a string path. Each `subscribe_*` call hands back an unbounded receiver
//! that the dispatch service drains from its own forwarding task, so the
//! client's I/O layer stays in charge of delivery order per topic.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Free-form argument list carried by a generic client event.
pub type EventArgs = Vec<Value>;

/// One request/acknowledgement delivery: the `(error, context, data)` triple.
///
/// `error` is `Value::Null` when the acknowledgement carried no error.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PayloadEnvelope {
    /// Error delivered alongside the payload, or null.
    #[serde(default)]
    pub error: Value,
    /// Execution context for this delivery.
    #[serde(default)]
    pub context: Value,
    /// The payload data itself.
    #[serde(default)]
    pub data: Value,
}

/// Receiver side of a subscribed message source.
pub type SourceReceiver<T> = mpsc::UnboundedReceiver<T>;

// =============================================================================
// NetworkClient
// =============================================================================

/// The live network client the dispatch service wires handlers against.
///
/// Implementations own the connection state machine and wire format; the
/// routing core only asks them to fan a named source into a channel. A
/// subscription, once handed out, lives until the receiver is dropped.
#[async_trait]
pub trait NetworkClient: Send + Sync + 'static {
    /// Attaches to the generic event source keyed by `path`.
    ///
    /// Every event emitted on `path` is delivered as its verbatim argument
    /// list.
    fn subscribe_events(&self, path: &str) -> ClientResult<SourceReceiver<EventArgs>>;

    /// Attaches to the request/acknowledgement source keyed by `signature`.
    fn subscribe_payloads(&self, signature: &str) -> ClientResult<SourceReceiver<PayloadEnvelope>>;

    /// Attaches to the named stream source.
    ///
    /// A stream is a lazy, unbounded, non-restartable sequence of messages;
    /// arrival order across streams is not defined.
    fn subscribe_stream(&self, name: &str) -> ClientResult<SourceReceiver<Value>>;

    /// Shuts the client down. Called once by the surrounding runtime's
    /// shutdown hook, never by the dispatch service itself.
    async fn shutdown(&self) -> ClientResult<()>;
}

/// Shared handle to a network client.
pub type BoxedClient = std::sync::Arc<dyn NetworkClient>;

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by [`NetworkClient`] operations.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The named source does not exist on this client.
    #[error("unknown source '{path}'")]
    UnknownSource {
        /// The path that failed to resolve.
        path: String,
    },

    /// Attaching to a source failed.
    #[error("failed to attach to '{path}': {reason}")]
    AttachFailed {
        /// The path being attached.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The client is not connected.
    #[error("client not connected")]
    NotConnected,

    /// Shutdown failed.
    #[error("shutdown failed: {0}")]
    ShutdownFailed(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
