//! Runtime error types.

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: String,
    },

    /// The merged sources failed to extract into the schema.
    #[error("invalid configuration: {0}")]
    Extract(#[from] figment::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during runtime lifecycle operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `start` was called without a client factory.
    #[error("no client factory configured")]
    NoClientFactory,

    /// The runtime is already running.
    #[error("runtime is already running")]
    AlreadyRunning,

    /// The client factory failed to boot the client.
    #[error("client boot failed: {0}")]
    ClientBoot(String),

    /// The wiring pass failed.
    #[error(transparent)]
    Dispatch(#[from] gatewire_framework::DispatchError),

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
