//! Base URI computation from document defaults and caller overrides.

use std::fmt;

use crate::document::ApiDocument;
use crate::error::ConfigError;

/// Scheme, host and path prefix every request path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUri {
    pub scheme: String,
    pub host: String,
    /// Empty, or ending with exactly one `/`.
    pub path_prefix: String,
}

impl BaseUri {
    /// Compute the base URI for `document`.
    ///
    /// `scheme` must be one of the document's schemes; when absent, the
    /// document must declare exactly one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidScheme`, `ConfigError::AmbiguousScheme`
    /// or `ConfigError::MissingHost`.
    pub fn from_document(
        document: &ApiDocument,
        scheme: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let allowed = document.schemes();

        let scheme = match scheme {
            Some(scheme) => {
                if !allowed.iter().any(|s| s == scheme) {
                    return Err(ConfigError::InvalidScheme {
                        scheme: scheme.to_string(),
                        allowed,
                    });
                }
                scheme.to_string()
            }
            None => match allowed.as_slice() {
                [only] => only.clone(),
                _ => {
                    return Err(ConfigError::AmbiguousScheme {
                        candidates: allowed,
                    })
                }
            },
        };

        let host = match document.host() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(ConfigError::MissingHost),
        };

        Ok(Self {
            scheme,
            host,
            path_prefix: normalize_base_path(document.base_path().unwrap_or("")),
        })
    }
}

impl fmt::Display for BaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}",
            self.scheme,
            self.host,
            self.path_prefix.trim_start_matches('/')
        )
    }
}

/// Strip trailing slashes and append exactly one; empty stays empty.
pub fn normalize_base_path(base_path: &str) -> String {
    if base_path.is_empty() {
        return String::new();
    }
    format!("{}/", base_path.trim_end_matches('/'))
}

/// The effective base URI string: an explicit override verbatim, else the
/// value computed from the document.
pub fn resolve_base_uri(
    document: &ApiDocument,
    scheme: Option<&str>,
    base_uri: Option<&str>,
) -> Result<String, ConfigError> {
    if let Some(base_uri) = base_uri {
        return Ok(base_uri.to_string());
    }
    BaseUri::from_document(document, scheme).map(|uri| uri.to_string())
}
