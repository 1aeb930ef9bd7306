//! Core types shared by the document, mapper and client.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Reserved input key carrying raw transport options.
pub const RAW_OPTIONS_KEY: &str = "@http";

/// Suffix on a dispatch name that selects the asynchronous flavor.
pub const ASYNC_SUFFIX: &str = "Async";

/// Option sections filled by parameter routing.
pub const QUERY: &str = "query";
pub const HEADERS: &str = "headers";
pub const FORM_PARAMS: &str = "form_params";
pub const JSON: &str = "json";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The standard HTTP verbs with a dedicated client method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Put,
    Post,
    Head,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Head,
        Method::Patch,
        Method::Delete,
        Method::Options,
    ];

    /// Lowercase name, as used for keys under `paths`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Options => "options",
        }
    }

    /// Parse a verb, ignoring case.
    ///
    /// Returns `None` for anything outside the seven verbs.
    pub fn parse(s: &str) -> Option<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter value goes in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    FormData,
    Body,
}

impl ParameterLocation {
    /// Parse the `in` field of a parameter definition.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "path" => Some(ParameterLocation::Path),
            "formData" => Some(ParameterLocation::FormData),
            "body" => Some(ParameterLocation::Body),
            _ => None,
        }
    }
}

/// A parameter definition after reference resolution.
///
/// `location` keeps the raw `in` value; it is only checked when a value
/// for the parameter is actually routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDef {
    pub name: String,
    pub location: String,
    pub required: bool,
}

/// Caller-supplied values for one request, keyed by parameter name.
///
/// The reserved [`RAW_OPTIONS_KEY`] entry holds raw transport options that
/// bypass parameter mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInput(Map<String, Value>);

impl RequestInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style parameter insertion.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Set the raw transport options (`@http`).
    pub fn http(mut self, options: Value) -> Self {
        self.0.insert(RAW_OPTIONS_KEY.to_string(), options);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove and return the raw transport options, if any.
    pub fn take_raw_options(&mut self) -> Option<Value> {
        self.0.remove(RAW_OPTIONS_KEY)
    }

    /// Build input from a JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RequestInput {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Per-request transport options.
///
/// Seeded verbatim from `@http`, then filled by parameter routing into the
/// `query`, `headers`, `form_params` and `json` sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestOptions(Map<String, Value>);

impl RequestOptions {
    /// Seed options from a raw `@http` value. Non-object values carry no options.
    pub fn from_raw(raw: Option<Value>) -> Self {
        match raw {
            Some(Value::Object(map)) => Self(map),
            Some(other) => {
                tracing::warn!(
                    "ignoring {} value of type {}: expected object",
                    RAW_OPTIONS_KEY,
                    json_type_name(&other)
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Insert `name = value` into an object-valued section, creating it if needed.
    pub fn insert_into(&mut self, section: &str, name: &str, value: Value) {
        let entry = self
            .0
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(name.to_string(), value);
        }
    }

    /// Replace the JSON body.
    pub fn set_json(&mut self, value: Value) {
        self.0.insert(JSON.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn query(&self) -> Option<&Map<String, Value>> {
        self.section(QUERY)
    }

    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.section(HEADERS)
    }

    pub fn form_params(&self) -> Option<&Map<String, Value>> {
        self.section(FORM_PARAMS)
    }

    pub fn json(&self) -> Option<&Value> {
        self.0.get(JSON)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }
}

/// A fully assembled request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRequest {
    /// Lowercase method, as keyed in the document.
    pub method: String,
    /// Expanded path relative to the base URI (no leading slash).
    pub path: String,
    pub options: RequestOptions,
}

impl PreparedRequest {
    /// Resolve the relative path against a base URI.
    pub fn url(&self, base: &url::Url) -> Result<url::Url, url::ParseError> {
        base.join(&self.path)
    }
}

/// A call routed by name: a verb becomes a request, anything else is an
/// operationId. A trailing `Async` selects the asynchronous flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Request { method: Method, asynchronous: bool },
    Execute { operation_id: String, asynchronous: bool },
}

impl Call {
    pub fn parse(name: &str) -> Self {
        let (base, asynchronous) = match name.strip_suffix(ASYNC_SUFFIX) {
            Some(base) if !base.is_empty() => (base, true),
            _ => (name, false),
        };

        match Method::parse(base) {
            Some(method) => Call::Request {
                method,
                asynchronous,
            },
            None => Call::Execute {
                operation_id: base.to_string(),
                asynchronous,
            },
        }
    }

    pub fn is_async(&self) -> bool {
        match self {
            Call::Request { asynchronous, .. } | Call::Execute { asynchronous, .. } => {
                *asynchronous
            }
        }
    }
}
