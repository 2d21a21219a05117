//! Verification record store configuration module

use serde::{Deserialize, Serialize};

/// Where verification records, failure counters and locks live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local maps; pending codes are lost on restart
    Memory,
    /// Redis with native key expiry
    Redis,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Memory
    }
}

/// Store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Selected backend
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection settings, used when `backend = "redis"`
    #[serde(default)]
    pub cache: CacheConfig,

    /// How often the memory store evicts dead entries, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            cache: CacheConfig::default(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Redis && self.cache.url.trim().is_empty() {
            return Err("store.cache.url is required for the redis backend".to_string());
        }
        if self.sweep_interval_seconds == 0 {
            return Err("store.sweep_interval_seconds must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Prefix prepended to every key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Retries for failed commands
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds, doubled per attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            connection_timeout: default_connection_timeout(),
            key_prefix: default_key_prefix(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build a full key with the configured prefix
    pub fn build_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_key_prefix() -> String {
    String::from("safevoice")
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_build_key() {
        let config = CacheConfig::default();
        assert_eq!(config.build_key("verification:lock:a"), "safevoice:verification:lock:a");

        let bare = CacheConfig {
            key_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.build_key("k"), "k");
    }

    #[test]
    fn test_store_defaults_to_memory() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            cache: CacheConfig::new(" "),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
