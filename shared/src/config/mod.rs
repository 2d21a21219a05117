//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Verification record store backend and Redis connection
//! - `environment` - Environment detection and logging configuration
//! - `mail` - Outgoing mail transport
//! - `server` - HTTP server and CORS configuration
//! - `verification` - Code lifetime, reissue policy and lockout thresholds
//!
//! Configuration is layered: built-in defaults for the detected environment,
//! then an optional `config/config.<environment>.toml` file, then environment
//! variables prefixed with `SAFEVOICE__` (for example
//! `SAFEVOICE__VERIFICATION__CODE_TTL_SECONDS=300`).

pub mod cache;
pub mod environment;
pub mod mail;
pub mod server;
pub mod verification;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use cache::{CacheConfig, StoreBackend, StoreConfig};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use mail::{MailConfig, MailTransportKind};
pub use server::{CorsConfig, ServerConfig};
pub use verification::VerificationConfig;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "SAFEVOICE";

/// Directory searched for per-environment configuration files
pub const CONFIG_DIR: &str = "config";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Verification code policy
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Verification record store
    #[serde(default)]
    pub store: StoreConfig,

    /// Outgoing mail
    #[serde(default)]
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Built-in defaults for an environment
    pub fn for_environment(environment: Environment) -> Self {
        let server = if environment.is_production() {
            ServerConfig::new("0.0.0.0", 8080)
        } else {
            ServerConfig::new("127.0.0.1", 3000)
        };

        Self {
            environment,
            server,
            cors: CorsConfig::default(),
            logging: LoggingConfig::for_environment(environment),
            verification: VerificationConfig::default(),
            store: StoreConfig::default(),
            mail: MailConfig::for_environment(environment),
        }
    }

    /// Load configuration for the current process
    ///
    /// Reads `.env` and the environment specific `.env.<environment>` file
    /// first, then layers defaults, the optional TOML file and `SAFEVOICE__*`
    /// variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let environment = Environment::from_env();
        dotenvy::from_filename(environment.env_file()).ok();

        Self::load_from(environment, Path::new(CONFIG_DIR))
    }

    /// Load configuration for an explicit environment and config directory
    pub fn load_from(environment: Environment, config_dir: &Path) -> Result<Self, ConfigError> {
        let defaults = Self::for_environment(environment);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(
                config::File::from(config_dir.join(environment.config_file())).required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers"),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;

        // Hosting platforms commonly hand out the listen port as PORT
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.verification.validate().map_err(ConfigError::Invalid)?;
        self.mail.validate().map_err(ConfigError::Invalid)?;
        self.store.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
