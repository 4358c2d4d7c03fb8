//! Error handling types
//!
//! Every failure that reaches a caller is one of six taxonomy kinds
//! (configuration, connection, operation, not-found, duplicate, unsupported)
//! and carries [`ErrorMetadata`] so an operator can attribute it to an engine,
//! an instance, an operation and a key without parsing the message.
//!
//! Engines additionally produce [`Error::Backend`] for raw client failures.
//! The cache contract rewraps those into [`Error::Operation`] with full
//! metadata; already-typed errors pass through unchanged.

use crate::value_objects::EngineKind;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error
type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Cache operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Engine connect
    Init,
    /// Engine disconnect
    Finalize,
    /// Existence check
    Has,
    /// Read
    Get,
    /// Write
    Set,
    /// Single key removal
    Delete,
    /// Namespace removal
    Clear,
    /// Registry declaration
    Register,
    /// Registry lookup
    Lookup,
}

impl Operation {
    /// Lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Finalize => "finalize",
            Self::Has => "has",
            Self::Get => "get",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Clear => "clear",
            Self::Register => "register",
            Self::Lookup => "lookup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context attached to every taxonomy error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMetadata {
    /// When the error was raised
    pub timestamp: DateTime<Utc>,
    /// Engine kind, when known
    pub engine: Option<EngineKind>,
    /// Normalized instance name
    pub instance: Option<String>,
    /// Operation in flight
    pub operation: Option<Operation>,
    /// Caller key (normalized, without namespace prefix)
    pub key: Option<String>,
    /// Offending configuration option
    pub config_key: Option<String>,
    /// Offending configuration value, rendered as text
    pub config_value: Option<String>,
}

impl ErrorMetadata {
    /// Empty metadata stamped with the current time
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            engine: None,
            instance: None,
            operation: None,
            key: None,
            config_key: None,
            config_value: None,
        }
    }

    /// Set the engine kind
    #[must_use]
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the instance name
    #[must_use]
    pub fn instance<S: Into<String>>(mut self, instance: S) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the operation
    #[must_use]
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Set the caller key
    #[must_use]
    pub fn key<S: Into<String>>(mut self, key: S) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the offending configuration option and its value
    #[must_use]
    pub fn config<K: Into<String>, V: fmt::Display>(mut self, config_key: K, value: V) -> Self {
        self.config_key = Some(config_key.into());
        self.config_value = Some(value.to_string());
        self
    }
}

impl Default for ErrorMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at={}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        )?;
        if let Some(engine) = &self.engine {
            write!(f, " engine={engine}")?;
        }
        if let Some(instance) = &self.instance {
            write!(f, " instance={instance}")?;
        }
        if let Some(operation) = &self.operation {
            write!(f, " operation={operation}")?;
        }
        if let Some(key) = &self.key {
            write!(f, " key={key:?}")?;
        }
        if let Some(config_key) = &self.config_key {
            write!(f, " config_key={config_key}")?;
        }
        if let Some(config_value) = &self.config_value {
            write!(f, " config_value={config_value:?}")?;
        }
        Ok(())
    }
}

/// Error kind, for matching without destructuring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing option
    Config,
    /// Backend link could not be established or maintained
    Connection,
    /// A call on a live connection failed
    Operation,
    /// Registry lookup of an unregistered name
    NotFound,
    /// Conflicting re-registration
    Duplicate,
    /// Unknown or unavailable engine kind
    Unsupported,
    /// Raw backend failure not yet attributed
    Backend,
}

/// Main error type for the cache stack
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing option (expiry out of bounds, missing host, ...)
    #[error("Configuration error: {message} [{metadata}]")]
    Config {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
    },

    /// Backend link could not be established or maintained
    #[error("Connection error: {message} [{metadata}]")]
    Connection {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// has/get/set/delete/clear failed on a live connection
    #[error("Operation error: {message} [{metadata}]")]
    Operation {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// Registry lookup of an unregistered name
    #[error("Not found: {message} [{metadata}]")]
    NotFound {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
    },

    /// Re-registration of a name with a different configuration
    #[error("Duplicate: {message} [{metadata}]")]
    Duplicate {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
    },

    /// Unknown engine kind, or one compiled out of this build
    #[error("Unsupported: {message} [{metadata}]")]
    Unsupported {
        /// Description of the problem
        message: String,
        /// Attribution
        metadata: ErrorMetadata,
    },

    /// Raw backend failure, attributed by the cache contract
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the problem
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },
}

// Taxonomy error creation methods
impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S, metadata: ErrorMetadata) -> Self {
        Self::Config {
            message: message.into(),
            metadata,
        }
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S, metadata: ErrorMetadata) -> Self {
        Self::Connection {
            message: message.into(),
            metadata,
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source<S, E>(message: S, metadata: ErrorMetadata, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            metadata,
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation error
    pub fn operation<S: Into<String>>(message: S, metadata: ErrorMetadata) -> Self {
        Self::Operation {
            message: message.into(),
            metadata,
            source: None,
        }
    }

    /// Create an operation error with source
    pub fn operation_with_source<S, E>(message: S, metadata: ErrorMetadata, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Operation {
            message: message.into(),
            metadata,
            source: Some(Box::new(source)),
        }
    }

    /// Create a not found error for an instance name
    pub fn not_found(instance: &str) -> Self {
        Self::NotFound {
            message: format!("no cache registered under '{instance}'"),
            metadata: ErrorMetadata::new()
                .instance(instance)
                .operation(Operation::Lookup),
        }
    }

    /// Create a duplicate registration error
    pub fn duplicate(instance: &str, engine: EngineKind) -> Self {
        Self::Duplicate {
            message: format!(
                "cache '{instance}' is already registered with a different configuration"
            ),
            metadata: ErrorMetadata::new()
                .engine(engine)
                .instance(instance)
                .operation(Operation::Register),
        }
    }

    /// Create an unsupported engine error
    pub fn unsupported<S: Into<String>>(message: S, metadata: ErrorMetadata) -> Self {
        Self::Unsupported {
            message: message.into(),
            metadata,
        }
    }
}

// Backend error creation methods
impl Error {
    /// Create an unattributed backend error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unattributed backend error with source
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Inspection and attribution
impl Error {
    /// The taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Operation { .. } => ErrorKind::Operation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Structured metadata, absent only for unattributed backend errors
    pub fn metadata(&self) -> Option<&ErrorMetadata> {
        match self {
            Self::Config { metadata, .. }
            | Self::Connection { metadata, .. }
            | Self::Operation { metadata, .. }
            | Self::NotFound { metadata, .. }
            | Self::Duplicate { metadata, .. }
            | Self::Unsupported { metadata, .. } => Some(metadata),
            Self::Backend { .. } => None,
        }
    }

    /// Bare message without metadata
    pub fn message(&self) -> &str {
        match self {
            Self::Config { message, .. }
            | Self::Connection { message, .. }
            | Self::Operation { message, .. }
            | Self::NotFound { message, .. }
            | Self::Duplicate { message, .. }
            | Self::Unsupported { message, .. }
            | Self::Backend { message, .. } => message,
        }
    }

    /// Turn an unattributed backend error into an operation error.
    ///
    /// Taxonomy errors are returned unchanged so they are never wrapped twice.
    #[must_use]
    pub fn attribute<F>(self, metadata: F) -> Self
    where
        F: FnOnce() -> ErrorMetadata,
    {
        match self {
            Self::Backend { message, source } => Self::Operation {
                message,
                metadata: metadata(),
                source,
            },
            other => other,
        }
    }
}
