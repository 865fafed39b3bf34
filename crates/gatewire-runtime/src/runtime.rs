//! Runtime orchestration.
//!
//! [`GatewireRuntime`] owns the instance registry and the client factory.
//! `run()` boots the client (awaited once), builds the dispatch service,
//! runs the wiring pass, then waits for a shutdown signal; on shutdown the
//! forwarding tasks are stopped and the client's own shutdown primitive is
//! invoked.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gatewire_runtime::GatewireRuntime;
//!
//! let runtime = GatewireRuntime::new();
//! runtime.set_client_factory(|options| async move {
//!     Ok(EdgeClient::connect(options).await?)
//! });
//! runtime.register(Arc::new(TempGateway::default()));
//! runtime.run().await?;
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::{ConfigLoader, GatewireConfig};
use crate::error::{ConfigResult, RuntimeError, RuntimeResult};
use crate::logging;
use gatewire_core::{BoxError, BoxedClient, InstanceRegistry, Registrant};
use gatewire_framework::DispatchService;

/// Async factory that boots the network client from the config's opaque
/// `client` section.
pub type ClientFactory = Arc<
    dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<BoxedClient, BoxError>> + Send + Sync,
>;

/// The main runtime: registry, client boot, wiring, and signal-driven
/// shutdown.
pub struct GatewireRuntime {
    config: GatewireConfig,
    registry: Arc<InstanceRegistry>,
    client_factory: RwLock<Option<ClientFactory>>,
    active: RwLock<Option<ActiveState>>,
}

struct ActiveState {
    client: BoxedClient,
    dispatch: Arc<DispatchService>,
}

impl GatewireRuntime {
    /// Creates a runtime with automatic configuration loading.
    ///
    /// Searches the current directory for `gatewire.toml`, falls back to
    /// defaults when nothing is found, and initializes logging.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: failed to load config ({e}), using defaults");
                GatewireConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a pre-loaded configuration.
    pub fn from_config(config: &GatewireConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = config.logging.level.as_str(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            registry: Arc::new(InstanceRegistry::new()),
            client_factory: RwLock::new(None),
            active: RwLock::new(None),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &GatewireConfig {
        &self.config
    }

    /// Returns the instance registry.
    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Registers an application instance with the registry.
    pub fn register(&self, instance: Arc<dyn Registrant>) {
        self.registry.register(instance);
    }

    /// Installs the client factory used by [`start`](Self::start).
    pub async fn set_client_factory<F, Fut>(&self, factory: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<BoxedClient, BoxError>> + Send + 'static,
    {
        let factory: ClientFactory = Arc::new(move |options| Box::pin(factory(options)));
        *self.client_factory.write().await = Some(factory);
    }

    /// Whether the runtime has started.
    pub async fn is_running(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Boots the client and runs the wiring pass.
    ///
    /// The factory is awaited once; only after it resolves does the dispatch
    /// service subscribe, so handlers never see a half-constructed client.
    pub async fn start(&self) -> RuntimeResult<()> {
        let mut active = self.active.write().await;
        if active.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let factory = self
            .client_factory
            .read()
            .await
            .clone()
            .ok_or(RuntimeError::NoClientFactory)?;

        info!("Booting network client");
        let client = factory(self.config.client.clone())
            .await
            .map_err(|e| RuntimeError::ClientBoot(e.to_string()))?;

        let dispatch = Arc::new(DispatchService::new(
            Arc::clone(&client),
            Arc::clone(&self.registry),
        ));
        dispatch.subscribe()?;

        info!(
            subscriptions = dispatch.subscription_count(),
            "Runtime started"
        );
        *active = Some(ActiveState { client, dispatch });
        Ok(())
    }

    /// Stops forwarding and shuts the client down.
    ///
    /// Client shutdown failures are logged, not propagated — mirroring the
    /// rest of teardown, which must always complete.
    pub async fn stop(&self) {
        let Some(state) = self.active.write().await.take() else {
            return;
        };

        info!("Stopping runtime");
        state.dispatch.shutdown().await;
        if let Err(e) = state.client.shutdown().await {
            error!(error = %e, "Client shutdown failed");
        }
        info!("Runtime stopped");
    }

    /// Runs until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Gatewire runtime is now running. Press Ctrl+C to stop.");
        Self::wait_for_shutdown().await;

        self.stop().await;
        Ok(())
    }

    /// Runs until the given future resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }

    /// Waits for Ctrl+C or SIGTERM.
    async fn wait_for_shutdown() {
        #[cfg(unix)]
        {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "Failed to register SIGTERM handler");
                    let _ = signal::ctrl_c().await;
                    return;
                }
            };

            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
        }
    }
}

impl Default for GatewireRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`GatewireRuntime`] with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = GatewireRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables environment variable overrides.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<GatewireRuntime> {
        let config = self.config_loader.load()?;
        Ok(GatewireRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
