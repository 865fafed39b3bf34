//! Configuration loader using figment.
//!
//! Layered loading, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`gatewire.{profile}.toml`)
//! 3. Main config file (`gatewire.toml`)
//! 4. Environment variables (`GATEWIRE_*`, `__` as path separator)
//!
//! # Example
//!
//! ```rust,ignore
//! use gatewire_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_current_dir().load()?;
//!
//! let config = ConfigLoader::new()
//!     .file("./config/gatewire.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::debug;

use super::schema::GatewireConfig;
use crate::error::{ConfigError, ConfigResult};

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Creates a profile from `GATEWIRE_PROFILE` or defaults to development.
    pub fn from_env() -> Self {
        std::env::var("GATEWIRE_PROFILE")
            .map(|p| match p.to_lowercase().as_str() {
                "production" | "prod" => Self::Production,
                "development" | "dev" => Self::Development,
                other => Self::Custom(other.to_string()),
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
    explicit_file: Option<PathBuf>,
    profile: Profile,
    use_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with no search paths and env vars enabled.
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            explicit_file: None,
            profile: Profile::from_env(),
            use_env: true,
        }
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(mut self) -> Self {
        self.search_paths.push(PathBuf::from("."));
        self
    }

    /// Adds a directory to search for `gatewire.toml`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads a specific file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        let name = profile.into();
        self.profile = match name.as_str() {
            "development" => Profile::Development,
            "production" => Profile::Production,
            _ => Profile::Custom(name),
        };
        self
    }

    /// Enables environment variable overrides (the default).
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Disables environment variable overrides.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Loads and merges all configured sources.
    pub fn load(self) -> ConfigResult<GatewireConfig> {
        let mut figment = Figment::from(Serialized::defaults(GatewireConfig::default()));

        if let Some(file) = &self.explicit_file {
            if !file.exists() {
                return Err(ConfigError::FileNotFound {
                    path: file.display().to_string(),
                });
            }
            figment = figment.merge(Toml::file(file));
        } else {
            for dir in &self.search_paths {
                let profiled = dir.join(format!("gatewire.{}.toml", self.profile));
                if profiled.exists() {
                    debug!(file = %profiled.display(), "Merging profile config file");
                    figment = figment.merge(Toml::file(profiled));
                }
                let main = dir.join("gatewire.toml");
                if main.exists() {
                    debug!(file = %main.display(), "Merging config file");
                    figment = figment.merge(Toml::file(main));
                }
            }
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed("GATEWIRE_").split("__"));
        }

        figment.extract().map_err(ConfigError::from)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
