//! Redis cache client implementation
//!
//! This module provides a Redis client with a multiplexed connection, retry
//! logic, and the cache operations the verification store is built on:
//! expiring values, atomic get-and-delete, per-email index sets and
//! expiring counters.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError, RedisResult};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::cache::CacheConfig;
use crate::InfrastructureError;

type RedisFuture<T> = std::pin::Pin<Box<dyn std::future::Future<Output = RedisResult<T>> + Send>>;

/// Redis cache client with retry logic
///
/// Cloning is cheap; clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
}

impl RedisClient {
    /// Create a new Redis client, retrying the initial connection
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            max_retries = config.max_retries,
            "Creating Redis client"
        );

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(client, &config).await?;

        info!("Redis client created successfully");

        Ok(Self { connection, config })
    }

    /// Create multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        config: &CacheConfig,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let connect_timeout = Duration::from_secs(config.connection_timeout.max(1));
        let max_attempts = config.max_retries.max(1);
        let mut attempts = 0;
        let mut delay = config.retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let outcome = match timeout(connect_timeout, client.get_multiplexed_async_connection()).await {
                Ok(result) => result.map_err(InfrastructureError::Cache),
                Err(_) => Err(InfrastructureError::Config(format!(
                    "Timed out connecting to Redis after {}s",
                    connect_timeout.as_secs()
                ))),
            };

            match outcome {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_attempts => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_attempts, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        }
    }

    /// Full key with the configured prefix
    pub fn key(&self, key: &str) -> String {
        self.config.build_key(key)
    }

    /// Set a value with expiration time
    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!("Setting key '{}' with expiry {}s", key, expiry_seconds);

        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let key = key.to_string();
            let value = value.to_string();
            Box::pin(async move { conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to set key '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Atomically read and delete a value (GETDEL, Redis 6.2+)
    ///
    /// Of several concurrent callers at most one receives the value. The
    /// command is never resent: a reply lost after the delete would make a
    /// second attempt report the value as missing.
    pub async fn get_del(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        debug!("Taking key '{}'", key);

        self.execute(RetryPolicy::Once, |mut conn| {
            let key = key.to_string();
            Box::pin(async move {
                redis::cmd("GETDEL")
                    .arg(key)
                    .query_async::<_, Option<String>>(&mut conn)
                    .await
            })
        })
        .await
        .map_err(|e| {
            error!("Failed to take key '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Get several values at once; missing keys come back as `None`
    pub async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, InfrastructureError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Getting {} keys", keys.len());

        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let keys = keys.to_vec();
            Box::pin(async move {
                redis::cmd("MGET")
                    .arg(keys)
                    .query_async::<_, Vec<Option<String>>>(&mut conn)
                    .await
            })
        })
        .await
        .map_err(|e| {
            error!("Failed to get keys: {}", e);
            InfrastructureError::Cache(e)
        })
    }

    /// Delete a key from cache, returning whether it existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        Ok(self.delete_many(&[key.to_string()]).await? > 0)
    }

    /// Delete several keys, returning how many existed
    pub async fn delete_many(&self, keys: &[String]) -> Result<u64, InfrastructureError> {
        if keys.is_empty() {
            return Ok(0);
        }
        debug!("Deleting {} keys", keys.len());

        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let keys = keys.to_vec();
            Box::pin(async move { conn.del::<_, u64>(keys).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to delete keys: {}", e);
            InfrastructureError::Cache(e)
        })
    }

    /// Add a member to a set and refresh the set's expiry
    pub async fn add_to_set(
        &self,
        key: &str,
        member: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        debug!("Adding member to set '{}'", key);

        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let key = key.to_string();
            let member = member.to_string();
            Box::pin(async move {
                conn.sadd::<_, _, ()>(&key, member).await?;
                conn.expire::<_, ()>(&key, expiry_seconds as i64).await
            })
        })
        .await
        .map_err(|e| {
            error!("Failed to add to set '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Members of a set (empty when the set does not exist)
    pub async fn set_members(&self, key: &str) -> Result<Vec<String>, InfrastructureError> {
        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let key = key.to_string();
            Box::pin(async move { conn.smembers::<_, Vec<String>>(key).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to read set '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Remove members from a set
    pub async fn remove_from_set(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<(), InfrastructureError> {
        if members.is_empty() {
            return Ok(());
        }

        self.execute(RetryPolicy::Idempotent, |mut conn| {
            let key = key.to_string();
            let members = members.to_vec();
            Box::pin(async move { conn.srem::<_, _, ()>(key, members).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to remove from set '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Delete every key listed in a set, then store a value and make its key
    /// the only set member, in one server-side step
    ///
    /// # Returns
    /// * `Result<u64, InfrastructureError>` - how many listed keys existed
    pub async fn replace_indexed(
        &self,
        index_key: &str,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<u64, InfrastructureError> {
        debug!("Replacing keys indexed by '{}'", index_key);

        self.execute(RetryPolicy::Once, |mut conn| {
            let script = redis::Script::new(REPLACE_INDEXED_SCRIPT);
            let index_key = index_key.to_string();
            let key = key.to_string();
            let value = value.to_string();
            Box::pin(async move {
                let removed: u64 = script
                    .key(index_key)
                    .key(key)
                    .arg(value)
                    .arg(expiry_seconds)
                    .invoke_async(&mut conn)
                    .await?;
                Ok(removed)
            })
        })
        .await
        .map_err(|e| {
            error!("Failed to replace keys indexed by '{}': {}", index_key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Increment a counter, setting its expiry on the first increment
    ///
    /// Useful for rate limiting and counting operations. Not resent on
    /// failure, so a lost reply never counts twice.
    pub async fn increment(
        &self,
        key: &str,
        expiry_seconds: Option<u64>,
    ) -> Result<i64, InfrastructureError> {
        debug!("Incrementing counter '{}'", key);

        let result = self
            .execute(RetryPolicy::Once, |mut conn| {
                let key = key.to_string();

                Box::pin(async move {
                    let count: i64 = conn.incr(&key, 1).await?;

                    // Set expiry if this is the first increment
                    if count == 1 {
                        if let Some(ttl) = expiry_seconds {
                            conn.expire::<_, ()>(&key, ttl as i64).await?;
                        }
                    }

                    Ok(count)
                })
            })
            .await;

        match result {
            Ok(count) => {
                debug!("Counter '{}' incremented to {}", key, count);
                Ok(count)
            }
            Err(e) => {
                error!("Failed to increment counter '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Get time-to-live for a key
    ///
    /// # Returns
    /// * `Result<Option<i64>, InfrastructureError>` - TTL in seconds, None if
    ///   the key doesn't exist or has no expiry
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>, InfrastructureError> {
        debug!("Getting TTL for key '{}'", key);

        let result = self
            .execute(RetryPolicy::Idempotent, |mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.ttl::<_, i64>(key).await })
            })
            .await;

        match result {
            Ok(ttl) if ttl >= 0 => Ok(Some(ttl)),
            Ok(_) => Ok(None),
            Err(e) => {
                error!("Failed to get TTL for key '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let result = self
            .execute(RetryPolicy::Idempotent, |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await;

        match result {
            Ok(response) if response == "PONG" => Ok(true),
            Ok(response) => {
                warn!("Redis health check returned unexpected response: {}", response);
                Ok(false)
            }
            Err(e) => {
                error!("Redis health check failed: {}", e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Execute a Redis operation, retrying transient failures when the
    /// policy allows it
    ///
    /// Retries use exponential backoff.
    async fn execute<F, T>(&self, policy: RetryPolicy, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;
        let mut delay = self.config.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            match operation(conn).await {
                Ok(result) => return Ok(result),
                Err(e) if policy.allows_retry(&e, attempts, max_attempts) => {
                    warn!(
                        "Redis operation failed (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_attempts, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Removes the keys listed in KEYS[1], stores ARGV[1] at KEYS[2] for ARGV[2]
/// seconds and leaves KEYS[2] as the only member of KEYS[1]
const REPLACE_INDEXED_SCRIPT: &str = r"
local removed = 0
for _, member in ipairs(redis.call('SMEMBERS', KEYS[1])) do
    removed = removed + redis.call('DEL', member)
end
redis.call('DEL', KEYS[1])
redis.call('SET', KEYS[2], ARGV[1], 'EX', ARGV[2])
redis.call('SADD', KEYS[1], KEYS[2])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return removed
";

/// Whether a command may be sent again after a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryPolicy {
    /// Sending the command twice leaves the same state behind
    Idempotent,
    /// The command may have taken effect before the error surfaced
    Once,
}

impl RetryPolicy {
    pub(crate) fn allows_retry(self, error: &RedisError, attempts: u32, max_attempts: u32) -> bool {
        self == RetryPolicy::Idempotent && attempts < max_attempts && is_retriable_error(error)
    }
}

/// Check if a Redis error is transient and the operation should be retried
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError | redis::ErrorKind::BusyLoadingError | redis::ErrorKind::TryAgain
    )
}

/// Mask credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
