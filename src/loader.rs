//! Document loading from various sources.
//!
//! Handles loading API documents from files, strings, HTTP URLs, producer
//! callbacks and already-decoded values.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for fetching a document over HTTP (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed error returned by a document producer.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// Zero-argument callback returning the decoded document.
pub type Producer = Box<dyn FnOnce() -> Result<Value, ProducerError> + Send>;

/// Where the API document comes from.
pub enum DocumentSource {
    /// File path or `http(s)://` URL, read synchronously and parsed as JSON.
    Location(String),
    /// Callback invoked exactly once at construction.
    Producer(Producer),
    /// Already-decoded document.
    Decoded(Value),
}

impl DocumentSource {
    /// Wrap a producer callback.
    pub fn producer<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<Value, ProducerError> + Send + 'static,
    {
        DocumentSource::Producer(Box::new(producer))
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Location(location) => {
                f.debug_tuple("Location").field(location).finish()
            }
            DocumentSource::Producer(_) => f.write_str("Producer(..)"),
            DocumentSource::Decoded(value) => f.debug_tuple("Decoded").field(value).finish(),
        }
    }
}

impl From<&str> for DocumentSource {
    fn from(location: &str) -> Self {
        DocumentSource::Location(location.to_string())
    }
}

impl From<String> for DocumentSource {
    fn from(location: String) -> Self {
        DocumentSource::Location(location)
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Location(path.to_string_lossy().into_owned())
    }
}

impl From<Value> for DocumentSource {
    fn from(value: Value) -> Self {
        DocumentSource::Decoded(value)
    }
}

/// Load the raw document tree from any source.
///
/// # Errors
///
/// Returns the `LoadError` of the underlying reader, or
/// `LoadError::Producer` if a producer callback fails.
pub fn load_document(source: DocumentSource) -> Result<Value, LoadError> {
    match source {
        DocumentSource::Location(location) => load_document_auto(&location),
        DocumentSource::Producer(producer) => producer().map_err(|e| LoadError::Producer {
            message: e.to_string(),
        }),
        DocumentSource::Decoded(value) => Ok(value),
    }
}

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_document_file(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails,
/// or `LoadError::InvalidJson` if the response isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)?;

    load_document_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: PathBuf::from(source),
            })
        }
    } else {
        load_document_file(Path::new(source))
    }
}
