//! Cache configuration types
//!
//! [`CacheOptions`] is the flat, serde-friendly declaration read from TOML or
//! built in code. [`CacheOptions::resolve`] merges defaults and validates each
//! option, producing the typed [`CacheConfig`] whose [`EngineConfig`] variant
//! carries only the fields its engine understands.

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_EXPIRY_SECS, MEMCACHED_DEFAULT_PORT, REDIS_DEFAULT_PORT,
};
use crate::error::{Error, ErrorMetadata, Operation, Result};
use crate::value_objects::name::CacheName;
use crate::value_objects::options::expiry_in_bounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Backend storage technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineKind {
    /// In-process map with per-key timers
    Memory,
    /// Redis (or protocol-compatible) server
    Redis,
    /// Memcached server
    Memcached,
}

impl EngineKind {
    /// Lowercase name used in logs and error metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Memcached => "memcached",
        }
    }

    /// Default port for network engines
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Memory => None,
            Self::Redis => Some(REDIS_DEFAULT_PORT),
            Self::Memcached => Some(MEMCACHED_DEFAULT_PORT),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MEMORY" => Ok(Self::Memory),
            "REDIS" => Ok(Self::Redis),
            "MEMCACHED" => Ok(Self::Memcached),
            other => Err(format!("unknown engine '{other}'")),
        }
    }
}

/// A secret string that never appears in logs or debug output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Access the raw value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Flat cache declaration with defaults.
///
/// # Example
///
/// ```toml
/// [caches.sessions]
/// engine = "REDIS"
/// default_expiry = 600
/// host = "cache.internal"
/// db = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// MEMORY, REDIS or MEMCACHED (case-insensitive)
    pub engine: String,
    /// Expiry applied when a write sets none, in seconds
    pub default_expiry: i64,
    /// Server host (network engines)
    pub host: Option<String>,
    /// Server port, defaults per engine
    pub port: Option<u16>,
    /// ACL username (Redis)
    pub username: Option<String>,
    /// Password (Redis)
    pub password: Option<Secret>,
    /// Logical database index (Redis)
    pub db: Option<i64>,
    /// Connect over TLS (Redis)
    pub tls: bool,
    /// Extra root certificate in PEM form (Redis); implies TLS
    pub tls_cert_path: Option<PathBuf>,
    /// Upper bound for establishing the connection
    pub connect_timeout_secs: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            engine: String::new(),
            default_expiry: DEFAULT_EXPIRY_SECS,
            host: None,
            port: None,
            username: None,
            password: None,
            db: None,
            tls: false,
            tls_cert_path: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

// Builder methods
impl CacheOptions {
    /// Options for the given engine name
    pub fn new<S: Into<String>>(engine: S) -> Self {
        Self {
            engine: engine.into(),
            ..Default::default()
        }
    }

    /// In-process memory engine
    pub fn memory() -> Self {
        Self::new("MEMORY")
    }

    /// Redis engine at `host`
    pub fn redis<S: Into<String>>(host: S) -> Self {
        Self::new("REDIS").with_host(host)
    }

    /// Memcached engine at `host`
    pub fn memcached<S: Into<String>>(host: S) -> Self {
        Self::new("MEMCACHED").with_host(host)
    }

    /// Set the default expiry in seconds
    #[must_use]
    pub fn with_default_expiry(mut self, secs: i64) -> Self {
        self.default_expiry = secs;
        self
    }

    /// Set the host
    #[must_use]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set username and password
    #[must_use]
    pub fn with_credentials<U: Into<String>, P: Into<String>>(
        mut self,
        username: U,
        password: P,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(Secret::new(password));
        self
    }

    /// Set the password only
    #[must_use]
    pub fn with_password<P: Into<String>>(mut self, password: P) -> Self {
        self.password = Some(Secret::new(password));
        self
    }

    /// Set the logical database
    #[must_use]
    pub fn with_db(mut self, db: i64) -> Self {
        self.db = Some(db);
        self
    }

    /// Enable TLS
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Set an extra root certificate (implies TLS)
    #[must_use]
    pub fn with_tls_cert_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tls_cert_path = Some(path.into());
        self
    }

    /// Set the connect timeout in seconds
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

// Validation
impl CacheOptions {
    /// Merge defaults and validate every option for the named instance
    pub fn resolve(&self, name: &CacheName) -> Result<CacheConfig> {
        let meta = || {
            ErrorMetadata::new()
                .instance(name.as_str())
                .operation(Operation::Register)
        };

        let raw_engine = self.engine.trim();
        if raw_engine.is_empty() {
            return Err(Error::config(
                "engine is required",
                meta().config("engine", raw_engine),
            ));
        }
        let kind: EngineKind = raw_engine.parse().map_err(|message: String| {
            Error::unsupported(message, meta().config("engine", raw_engine))
        })?;

        let default_expiry = expiry_in_bounds(self.default_expiry).ok_or_else(|| {
            Error::config(
                "default_expiry must lie in [0, 216000] seconds",
                meta()
                    .engine(kind)
                    .config("default_expiry", self.default_expiry),
            )
        })?;

        let engine = match kind {
            EngineKind::Memory => EngineConfig::Memory,
            EngineKind::Redis => EngineConfig::Redis(self.resolve_redis(kind, &meta)?),
            EngineKind::Memcached => {
                EngineConfig::Memcached(self.resolve_memcached(kind, &meta)?)
            }
        };

        Ok(CacheConfig {
            default_expiry,
            engine,
        })
    }

    fn resolve_endpoint<M>(&self, kind: EngineKind, meta: &M) -> Result<(String, u16, Duration)>
    where
        M: Fn() -> ErrorMetadata,
    {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                Error::config(
                    format!("host is required for {kind}"),
                    meta()
                        .engine(kind)
                        .config("host", self.host.as_deref().unwrap_or_default()),
                )
            })?;

        let port = self
            .port
            .or_else(|| kind.default_port())
            .unwrap_or_default();
        if port == 0 {
            return Err(Error::config(
                "port cannot be 0",
                meta().engine(kind).config("port", port),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(Error::config(
                "connect_timeout_secs must be at least 1",
                meta()
                    .engine(kind)
                    .config("connect_timeout_secs", self.connect_timeout_secs),
            ));
        }

        Ok((
            host.to_string(),
            port,
            Duration::from_secs(self.connect_timeout_secs),
        ))
    }

    fn resolve_redis<M>(&self, kind: EngineKind, meta: &M) -> Result<RedisConfig>
    where
        M: Fn() -> ErrorMetadata,
    {
        let (host, port, connect_timeout) = self.resolve_endpoint(kind, meta)?;

        let db = match self.db {
            None => 0,
            Some(db) => u32::try_from(db).map_err(|_| {
                Error::config(
                    "db must be a non-negative database index",
                    meta().engine(kind).config("db", db),
                )
            })?,
        };

        Ok(RedisConfig {
            host,
            port,
            username: self.username.clone().filter(|u| !u.is_empty()),
            password: self.password.clone(),
            db,
            tls: self.tls || self.tls_cert_path.is_some(),
            tls_cert_path: self.tls_cert_path.clone(),
            connect_timeout,
        })
    }

    fn resolve_memcached<M>(&self, kind: EngineKind, meta: &M) -> Result<MemcachedConfig>
    where
        M: Fn() -> ErrorMetadata,
    {
        let (host, port, connect_timeout) = self.resolve_endpoint(kind, meta)?;

        let unsupported = [
            ("db", self.db.is_some()),
            ("tls", self.tls),
            ("tls_cert_path", self.tls_cert_path.is_some()),
            ("username", self.username.is_some()),
            ("password", self.password.is_some()),
        ];
        if let Some((option, _)) = unsupported.iter().find(|(_, set)| *set) {
            return Err(Error::config(
                format!("{option} is not supported by the memcached text protocol"),
                meta().engine(kind).config(*option, "set"),
            ));
        }

        Ok(MemcachedConfig {
            host,
            port,
            connect_timeout,
        })
    }
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// ACL username
    pub username: Option<String>,
    /// Password
    pub password: Option<Secret>,
    /// Logical database index
    pub db: u32,
    /// Connect with `rediss://`
    pub tls: bool,
    /// Extra root certificate (PEM)
    pub tls_cert_path: Option<PathBuf>,
    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,
}

/// Memcached connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcachedConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,
}

/// Engine selection with the settings each engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineConfig {
    /// In-process memory engine
    Memory,
    /// Redis engine
    Redis(RedisConfig),
    /// Memcached engine
    Memcached(MemcachedConfig),
}

impl EngineConfig {
    /// Engine kind of this variant
    pub fn kind(&self) -> EngineKind {
        match self {
            Self::Memory => EngineKind::Memory,
            Self::Redis(_) => EngineKind::Redis,
            Self::Memcached(_) => EngineKind::Memcached,
        }
    }
}

/// Validated configuration bound to one cache instance for its lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    default_expiry: u64,
    engine: EngineConfig,
}

impl CacheConfig {
    /// Expiry applied when a write sets none
    pub fn default_expiry(&self) -> u64 {
        self.default_expiry
    }

    /// Engine settings
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Engine kind
    pub fn kind(&self) -> EngineKind {
        self.engine.kind()
    }
}
