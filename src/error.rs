//! Error types for document loading, client construction and request dispatch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading an API document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("document producer failed: {message}")]
    Producer { message: String },

    // Shape errors (exit code 2)
    #[error("document must be a JSON object, got {actual}")]
    NotAnObject { actual: String },

    #[error("document is missing required sections: {}", sections.join(", "))]
    MissingSections { sections: Vec<&'static str> },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }

    /// True for failures of the document's shape rather than its source.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            LoadError::NotAnObject { .. } | LoadError::MissingSections { .. }
        )
    }
}

/// Errors while computing the base URI at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scheme \"{scheme}\" is not allowed by the document (allowed: {})", allowed.join(", "))]
    InvalidScheme {
        scheme: String,
        allowed: Vec<String>,
    },

    #[error("no scheme given and the document allows several: {}", candidates.join(", "))]
    AmbiguousScheme { candidates: Vec<String> },

    #[error("no host: the document declares none and no override was given")]
    MissingHost,
}

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[cfg(feature = "remote")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransportError::InvalidRequest { .. } => 2,
            #[cfg(feature = "remote")]
            TransportError::Http(e) if e.is_status() => 4,
            _ => 3,
        }
    }
}

/// Errors while preparing or dispatching a single request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Unknown `METHOD path` pair or unknown operationId.
    #[error("operation not found: {operation}")]
    OperationNotFound { operation: String },

    #[error("unsupported reference \"{reference}\": only same-document references are resolved")]
    UnsupportedRef { reference: String },

    #[error("reference \"{reference}\" not found: no segment \"{segment}\"")]
    RefNotFound { reference: String, segment: String },

    #[error("missing required parameter \"{name}\" for {operation}")]
    MissingRequiredParameter { name: String, operation: String },

    #[error("unrecognized location \"{location}\" for parameter \"{name}\"")]
    UnrecognizedParameterLocation { location: String, name: String },

    #[error("malformed parameter definition in {operation}: {message}")]
    MalformedParameter { operation: String, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestError::Transport(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build transport: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Load(e) => e.exit_code(),
            ClientError::Config(_) => 2,
            ClientError::Transport(e) => e.exit_code(),
        }
    }
}
