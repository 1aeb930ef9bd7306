//! The loaded API document.
//!
//! An [`ApiDocument`] is validated and normalized once, then only read.

use serde_json::{Map, Value};

use crate::error::{LoadError, RequestError};
use crate::loader::{load_document, DocumentSource};
use crate::types::{json_type_name, Method};

/// Top-level sections every document must carry.
pub const REQUIRED_SECTIONS: &[&str] = &["swagger", "info", "paths"];

/// Scheme used when a document declares none.
pub const DEFAULT_SCHEME: &str = "https";

/// Key under a path item holding parameters shared by all its operations.
pub const PATH_PARAMETERS_KEY: &str = "parameters";

/// Host and basePath overrides applied during normalization.
#[derive(Debug, Clone, Default)]
pub struct DocumentOverrides {
    pub host: Option<String>,
    pub base_path: Option<String>,
}

/// One operation as it appears under `paths`.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub operation: &'a Value,
}

impl<'a> OperationRef<'a> {
    pub fn operation_id(&self) -> Option<&'a str> {
        self.operation.get("operationId").and_then(Value::as_str)
    }

    /// `METHOD path` label for error messages.
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.path)
    }
}

/// A validated, normalized API document.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    root: Value,
}

impl ApiDocument {
    /// Load a document from `source`, validate its shape and normalize it.
    ///
    /// # Errors
    ///
    /// Returns a source `LoadError` if the document can't be read, or
    /// `LoadError::MissingSections` if `swagger`, `info` or `paths` is absent.
    pub fn load(source: DocumentSource, overrides: &DocumentOverrides) -> Result<Self, LoadError> {
        let root = load_document(source)?;
        Self::from_value(root, overrides)
    }

    /// Validate and normalize an already-decoded document.
    pub fn from_value(mut root: Value, overrides: &DocumentOverrides) -> Result<Self, LoadError> {
        match &mut root {
            Value::Object(map) => {
                let missing: Vec<&'static str> = REQUIRED_SECTIONS
                    .iter()
                    .copied()
                    .filter(|key| map.get(*key).map_or(true, Value::is_null))
                    .collect();
                if !missing.is_empty() {
                    return Err(LoadError::MissingSections { sections: missing });
                }
                normalize(map, overrides);
            }
            other => {
                return Err(LoadError::NotAnObject {
                    actual: json_type_name(other).to_string(),
                })
            }
        }

        Ok(Self { root })
    }

    /// The whole document tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Safe lookup by a sequence of object keys.
    ///
    /// Returns `None` as soon as any key is missing.
    pub fn get(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().try_fold(&self.root, |node, key| node.get(*key))
    }

    /// Allowed schemes, in document order.
    pub fn schemes(&self) -> Vec<String> {
        self.get(&["schemes"])
            .and_then(Value::as_array)
            .map(|schemes| {
                schemes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn host(&self) -> Option<&str> {
        self.get(&["host"]).and_then(Value::as_str)
    }

    pub fn base_path(&self) -> Option<&str> {
        self.get(&["basePath"]).and_then(Value::as_str)
    }

    /// Resolve a `#/a/b/c` reference within this document.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::UnsupportedRef` for references into another
    /// document, or `RequestError::RefNotFound` naming the first missing segment.
    pub fn resolve_ref(&self, reference: &str) -> Result<&Value, RequestError> {
        let (uri, fragment) = match reference.find('#') {
            Some(idx) => (&reference[..idx], &reference[idx + 1..]),
            None => (reference, ""),
        };
        if !uri.is_empty() {
            return Err(RequestError::UnsupportedRef {
                reference: reference.to_string(),
            });
        }

        let path = fragment.trim_start_matches('/');
        if path.is_empty() {
            return Ok(&self.root);
        }

        let mut current = &self.root;
        for part in path.split('/') {
            // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
            let key = part.replace("~1", "/").replace("~0", "~");
            let next = match current {
                Value::Object(map) => map.get(&key),
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| RequestError::RefNotFound {
                reference: reference.to_string(),
                segment: key.clone(),
            })?;
        }
        Ok(current)
    }

    /// The path item for a template, if declared.
    pub fn path_item(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(&["paths", path]).and_then(Value::as_object)
    }

    /// The operation at `paths[path][method]`.
    ///
    /// `method` must already be lowercase.
    pub fn operation(&self, path: &str, method: &str) -> Option<OperationRef<'_>> {
        let (path, item) = self
            .get(&["paths"])
            .and_then(Value::as_object)?
            .get_key_value(path)?;
        operation_in(path, item, method)
    }

    /// Every operation in document order.
    pub fn operations(&self) -> Vec<OperationRef<'_>> {
        let Some(paths) = self.get(&["paths"]).and_then(Value::as_object) else {
            return Vec::new();
        };

        paths
            .iter()
            .flat_map(|(path, item)| {
                item.as_object()
                    .into_iter()
                    .flat_map(|methods| methods.keys())
                    .filter_map(move |method| operation_in(path, item, method))
            })
            .collect()
    }
}

/// Only the seven lowercase verb keys name operations; `parameters`, `$ref`
/// and `x-*` extensions do not.
fn operation_in<'a>(path: &'a str, item: &'a Value, method: &str) -> Option<OperationRef<'a>> {
    if !Method::ALL.iter().any(|m| m.as_str() == method) {
        return None;
    }
    let (method, operation) = item.as_object()?.get_key_value(method)?;
    operation.is_object().then_some(OperationRef {
        path,
        method,
        operation,
    })
}

/// Fill in defaults and apply overrides.
///
/// An override replaces the document's value when it is non-empty, or when
/// the document has no value of its own.
fn normalize(map: &mut Map<String, Value>, overrides: &DocumentOverrides) {
    if map.get("schemes").map_or(true, Value::is_null) {
        map.insert("schemes".to_string(), Value::from(vec![DEFAULT_SCHEME]));
    }

    apply_override(map, "host", overrides.host.as_deref());
    apply_override(map, "basePath", overrides.base_path.as_deref());
}

fn apply_override(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    let absent = map.get(key).map_or(true, Value::is_null);
    let truthy = value.is_some_and(|v| !v.is_empty());

    if truthy || absent {
        match value {
            Some(v) => {
                map.insert(key.to_string(), Value::String(v.to_string()));
            }
            None => {
                map.remove(key);
            }
        }
    }
}
