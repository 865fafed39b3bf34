//! Framework error types.
//!
//! Discovery-level issues are recovered locally (the offending record is
//! dropped and the pass continues); subscription setup failures are fatal
//! and abort the whole wiring pass.

use thiserror::Error;

use gatewire_core::{ClientError, ParamOrderError};

/// Per-method validation failures raised during discovery.
///
/// Never aborts a discovery pass: the explorer logs the failure and drops
/// the record.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The method declares no event family at all — ordinary behaviour,
    /// not a handler.
    #[error("method '{method}' is not a handler")]
    NotAHandler {
        /// The undeclared method.
        method: &'static str,
    },

    /// The method declares more than one event family. Registration-time
    /// validation error; never resolved by precedence.
    #[error("method '{method}' declares more than one event family")]
    AmbiguousKind {
        /// The ambiguous method.
        method: &'static str,
    },

    /// The method declares an event family but carries no handler body.
    #[error("method '{method}' has no handler attached")]
    MissingCallback {
        /// The incomplete method.
        method: &'static str,
    },

    /// The method's parameter declarations conflict.
    #[error("method '{method}': {source}")]
    ParamOrder {
        /// The misdeclared method.
        method: &'static str,
        /// The underlying slot conflict.
        #[source]
        source: ParamOrderError,
    },
}

/// Errors raised by the dispatch service's wiring pass.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `subscribe()` was already called on this service.
    #[error("dispatch service is already subscribed")]
    AlreadySubscribed,

    /// Attaching a mapping to a client source failed. Fatal: a
    /// partially-wired gateway set is an inconsistent state.
    #[error("failed to subscribe '{path}': {source}")]
    Subscription {
        /// The path that failed to attach.
        path: String,
        /// The underlying client failure.
        #[source]
        source: ClientError,
    },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
