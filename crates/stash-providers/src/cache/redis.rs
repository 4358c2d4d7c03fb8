//! Redis engine
//!
//! Talks to a Redis server (or a protocol-compatible one) through a
//! [`ConnectionManager`], which multiplexes commands over one connection and
//! reconnects on its own after transient failures.
//!
//! ## Features
//!
//! - Server-side expiry via `SET .. EX` and `EXPIRE`
//! - ACL username/password, logical database selection
//! - TLS (`rediss://`), optionally trusting an extra root certificate
//! - Namespace clearing with non-blocking `SCAN` plus batched `DEL`
//!
//! ## Example
//!
//! ```ignore
//! use stash_domain::{CacheName, CacheOptions, EngineConfig};
//! use stash_providers::cache::RedisEngine;
//!
//! let name = CacheName::new("sessions")?;
//! let config = CacheOptions::redis("localhost").resolve(&name)?;
//! if let EngineConfig::Redis(redis) = config.engine() {
//!     let engine = RedisEngine::new(name, redis.clone());
//! }
//! ```

use super::lifecycle::Lifecycle;
use crate::constants::{REDIS_SCAN_COUNT, REDIS_TLS_URL_SCHEME, REDIS_URL_SCHEME};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, TlsCertificates};
use stash_domain::{CacheEngine, CacheName, EngineKind, EngineState, Error, RedisConfig, Result};
use tracing::debug;
use url::Url;

/// Redis engine
pub struct RedisEngine {
    lifecycle: Lifecycle<ConnectionManager>,
    config: RedisConfig,
}

impl RedisEngine {
    /// Create a closed engine; nothing connects until first use or `init`
    pub fn new(name: CacheName, config: RedisConfig) -> Self {
        Self {
            lifecycle: Lifecycle::new(EngineKind::Redis, name),
            config,
        }
    }

    /// Server address with any password masked
    pub fn server_address(&self) -> String {
        connection_url(&self.config).map_or_else(
            |_| format!("{}:{}", self.config.host, self.config.port),
            |url| redact_url(&url),
        )
    }

    async fn link(&self) -> Result<ConnectionManager> {
        self.lifecycle.connect(|| self.open()).await
    }

    async fn open(&self) -> Result<ConnectionManager> {
        let url = connection_url(&self.config).map_err(|message| {
            Error::connection(message, self.lifecycle.metadata().config("host", &self.config.host))
        })?;

        let client = match &self.config.tls_cert_path {
            Some(path) => {
                let root_cert = tokio::fs::read(path).await.map_err(|e| {
                    Error::connection_with_source(
                        format!("cannot read TLS certificate {}", path.display()),
                        self.lifecycle
                            .metadata()
                            .config("tls_cert_path", path.display()),
                        e,
                    )
                })?;
                Client::build_with_tls(
                    url.as_str(),
                    TlsCertificates {
                        client_tls: None,
                        root_cert: Some(root_cert),
                    },
                )
            }
            None => Client::open(url.as_str()),
        }
        .map_err(|e| {
            Error::connection_with_source(
                format!("invalid Redis connection settings for {}", redact_url(&url)),
                self.lifecycle.metadata(),
                e,
            )
        })?;

        let timeout = self.config.connect_timeout;
        let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                Error::connection(
                    format!(
                        "timed out after {}s connecting to {}",
                        timeout.as_secs(),
                        redact_url(&url)
                    ),
                    self.lifecycle.metadata(),
                )
            })?
            .map_err(|e| {
                Error::connection_with_source(
                    format!("failed to connect to {}", redact_url(&url)),
                    self.lifecycle.metadata(),
                    e,
                )
            })?;

        debug!(url = %redact_url(&url), "Redis connection established");
        Ok(manager)
    }
}

impl std::fmt::Debug for RedisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEngine")
            .field("instance", &self.lifecycle.name().as_str())
            .field("server", &self.server_address())
            .field("tls", &self.config.tls)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

#[async_trait]
impl CacheEngine for RedisEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Redis
    }

    fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    async fn init(&self) -> Result<()> {
        self.link().await.map(|_| ())
    }

    async fn finalize(&self) -> Result<()> {
        // Dropping the last manager clone closes the connection
        self.lifecycle.disconnect().await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.link().await?;
        let count: u64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source(format!("Redis EXISTS failed: {e}"), e))?;
        Ok(count > 0)
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.link().await?;
        let payload: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source(format!("Redis GET failed: {e}"), e))?;

        if payload.is_some() {
            debug!(key = key, "Cache HIT (redis)");
        } else {
            debug!(key = key, "Cache MISS (redis)");
        }
        Ok(payload)
    }

    async fn write(&self, key: &str, payload: &str, expiry: u64) -> Result<()> {
        let mut conn = self.link().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(payload);
        if expiry > 0 {
            cmd.arg("EX").arg(expiry);
        }
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source(format!("Redis SET failed: {e}"), e))?;

        debug!(key = key, expiry_seconds = expiry, "Cache SET (redis)");
        Ok(())
    }

    async fn renew(&self, key: &str, _payload: &str, expiry: u64) -> Result<()> {
        let mut conn = self.link().await?;
        // 0 when the key vanished between the read and the renewal
        let renewed: u64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(expiry)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source(format!("Redis EXPIRE failed: {e}"), e))?;

        debug!(key = key, renewed = renewed > 0, "Cache EXPIRE (redis)");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.link().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::backend_with_source(format!("Redis DEL failed: {e}"), e))?;

        debug!(key = key, "Cache DEL (redis)");
        Ok(())
    }

    async fn clear(&self, prefix: &str) -> Result<u64> {
        let mut conn = self.link().await?;
        let pattern = format!("{}*", escape_glob(prefix));
        let mut deleted: u64 = 0;
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(REDIS_SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::backend_with_source(format!("Redis SCAN failed: {e}"), e))?;

            if !keys.is_empty() {
                let count: u64 = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| {
                        Error::backend_with_source(format!("Redis DEL (batch) failed: {e}"), e)
                    })?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = deleted, "Cache namespace DEL (redis)");
        Ok(deleted)
    }
}

/// Build the `redis://` / `rediss://` URL for `config`.
///
/// Credentials go through [`Url`] so reserved characters are percent-encoded.
pub(crate) fn connection_url(config: &RedisConfig) -> std::result::Result<Url, String> {
    let scheme = if config.tls {
        REDIS_TLS_URL_SCHEME
    } else {
        REDIS_URL_SCHEME
    };
    let mut url = Url::parse(&format!("{scheme}://localhost"))
        .map_err(|e| format!("invalid Redis URL scheme: {e}"))?;

    let host = if config.host.contains(':') && !config.host.starts_with('[') {
        format!("[{}]", config.host)
    } else {
        config.host.clone()
    };
    url.set_host(Some(&host))
        .map_err(|e| format!("invalid Redis host '{}': {e}", config.host))?;
    url.set_port(Some(config.port))
        .map_err(|()| format!("invalid Redis port {}", config.port))?;

    if let Some(username) = &config.username {
        url.set_username(username)
            .map_err(|()| "cannot set Redis username".to_string())?;
    }
    if let Some(password) = &config.password {
        url.set_password(Some(password.expose()))
            .map_err(|()| "cannot set Redis password".to_string())?;
    }
    url.set_path(&format!("/{}", config.db));

    Ok(url)
}

/// Render a Redis URL for logging with the password masked
pub(crate) fn redact_url(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.password().is_some() && redacted.set_password(Some("***")).is_err() {
        return format!("{}://***", url.scheme());
    }
    redacted.to_string()
}

/// Escape glob metacharacters so a prefix matches itself literally in `SCAN MATCH`
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
