//! HTTP transport seam.
//!
//! The client hands every [`PreparedRequest`] to a transport and passes the
//! transport's response back untouched. [`ReqwestTransport`] is the default
//! implementation (requires the `remote` feature).

use std::future::Future;
use std::pin::Pin;

use crate::error::TransportError;
use crate::types::PreparedRequest;

/// Boxed, sendable future used by transports that cannot name their future type.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A transport performing requests synchronously.
pub trait Transport {
    type Response;

    /// Perform `request`, blocking until the exchange settles.
    fn perform(&self, request: PreparedRequest) -> Result<Self::Response, TransportError>;
}

/// A transport performing requests asynchronously.
pub trait AsyncTransport {
    type Response;
    type Future: Future<Output = Result<Self::Response, TransportError>> + Send + 'static;

    /// Start `request` and return a handle that settles with its outcome.
    fn perform_async(&self, request: PreparedRequest) -> Self::Future;
}

#[cfg(feature = "remote")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "remote")]
mod reqwest_transport {
    use std::sync::OnceLock;
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde_json::{Map, Value};
    use url::Url;

    use super::{AsyncTransport, BoxFuture, Transport};
    use crate::error::TransportError;
    use crate::types::{PreparedRequest, FORM_PARAMS, HEADERS, JSON, QUERY};

    const TIMEOUT: &str = "timeout";
    const AUTH: &str = "auth";
    const HTTP_ERRORS: &str = "http_errors";

    /// Option keys understood per request; anything else is ignored.
    const KNOWN_OPTIONS: &[&str] = &[QUERY, HEADERS, JSON, FORM_PARAMS, TIMEOUT, AUTH, HTTP_ERRORS];

    /// Default transport backed by reqwest.
    ///
    /// Construction options (all optional): `timeout` in seconds, `headers`
    /// sent with every request, `auth` as `[user, password]` for basic auth,
    /// and `http_errors` (default `true`) turning non-2xx statuses into
    /// errors. The same keys may be given per request through `@http`.
    #[derive(Debug)]
    pub struct ReqwestTransport {
        base: Url,
        defaults: Settings,
        client: reqwest::Client,
        blocking: OnceLock<reqwest::blocking::Client>,
    }

    #[derive(Debug, Clone, Default)]
    struct Settings {
        timeout: Option<Duration>,
        headers: Map<String, Value>,
        auth: Option<(String, Option<String>)>,
        http_errors: Option<bool>,
    }

    impl Settings {
        fn parse(options: &Map<String, Value>) -> Result<Self, TransportError> {
            let timeout = match options.get(TIMEOUT) {
                None | Some(Value::Null) => None,
                Some(value) => {
                    let secs = value
                        .as_f64()
                        .filter(|secs| secs.is_finite() && *secs >= 0.0)
                        .ok_or_else(|| invalid(format!("timeout must be seconds, got {}", value)))?;
                    Some(Duration::from_secs_f64(secs))
                }
            };

            let auth = match options.get(AUTH) {
                None | Some(Value::Null) => None,
                Some(Value::Array(parts)) => match parts.as_slice() {
                    [Value::String(user)] => Some((user.clone(), None)),
                    [Value::String(user), Value::String(password), ..] => {
                        Some((user.clone(), Some(password.clone())))
                    }
                    _ => return Err(invalid("auth must be [user, password]".to_string())),
                },
                Some(_) => return Err(invalid("auth must be [user, password]".to_string())),
            };

            Ok(Self {
                timeout,
                headers: options
                    .get(HEADERS)
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
                auth,
                http_errors: options.get(HTTP_ERRORS).and_then(Value::as_bool),
            })
        }

        /// Layer per-request settings over these defaults.
        fn overlay(&self, request: Settings) -> Settings {
            let mut headers = self.headers.clone();
            headers.extend(request.headers);
            Settings {
                timeout: request.timeout.or(self.timeout),
                headers,
                auth: request.auth.or_else(|| self.auth.clone()),
                http_errors: request.http_errors.or(self.http_errors),
            }
        }
    }

    /// Everything needed to issue one request with either reqwest client.
    struct Parts {
        method: reqwest::Method,
        url: Url,
        headers: HeaderMap,
        query: Vec<(String, String)>,
        form: Option<Vec<(String, String)>>,
        json: Option<Value>,
        timeout: Option<Duration>,
        auth: Option<(String, Option<String>)>,
        http_errors: bool,
    }

    impl ReqwestTransport {
        /// Build a transport for `base_uri` with passthrough `options`.
        ///
        /// # Errors
        ///
        /// Returns `TransportError::InvalidRequest` for an unparseable base URI
        /// or malformed options.
        pub fn new(base_uri: &str, options: &Map<String, Value>) -> Result<Self, TransportError> {
            let base = Url::parse(base_uri)
                .map_err(|e| invalid(format!("base URI \"{}\": {}", base_uri, e)))?;
            let client = reqwest::Client::builder().build()?;

            Ok(Self {
                base,
                defaults: Settings::parse(options)?,
                client,
                blocking: OnceLock::new(),
            })
        }

        pub fn base(&self) -> &Url {
            &self.base
        }

        /// The blocking client, created on first synchronous use.
        fn blocking_client(&self) -> Result<reqwest::blocking::Client, TransportError> {
            if let Some(client) = self.blocking.get() {
                return Ok(client.clone());
            }
            let client = reqwest::blocking::Client::builder().build()?;
            // Concurrent first uses may each build one; the first stored is kept.
            let _ = self.blocking.set(client.clone());
            Ok(client)
        }

        fn parts(&self, request: PreparedRequest) -> Result<Parts, TransportError> {
            let options = request.options.as_map();
            for key in options.keys() {
                if !KNOWN_OPTIONS.contains(&key.as_str()) {
                    tracing::warn!(option = %key, "ignoring unsupported request option");
                }
            }

            let settings = self.defaults.overlay(Settings::parse(options)?);
            let method = reqwest::Method::from_bytes(request.method.to_uppercase().as_bytes())
                .map_err(|e| invalid(format!("method \"{}\": {}", request.method, e)))?;
            let url = request
                .url(&self.base)
                .map_err(|e| invalid(format!("path \"{}\": {}", request.path, e)))?;

            Ok(Parts {
                method,
                url,
                headers: header_map(&settings.headers)?,
                query: pairs(options.get(QUERY)),
                form: options.get(FORM_PARAMS).map(|form| pairs(Some(form))),
                json: options.get(JSON).cloned(),
                timeout: settings.timeout,
                auth: settings.auth,
                http_errors: settings.http_errors.unwrap_or(true),
            })
        }
    }

    impl Transport for ReqwestTransport {
        type Response = reqwest::blocking::Response;

        fn perform(&self, request: PreparedRequest) -> Result<Self::Response, TransportError> {
            let parts = self.parts(request)?;
            tracing::debug!(method = %parts.method, url = %parts.url, "sending request");

            let mut builder = self
                .blocking_client()?
                .request(parts.method, parts.url)
                .headers(parts.headers)
                .query(&parts.query);
            if let Some(form) = &parts.form {
                builder = builder.form(form);
            }
            if let Some(json) = &parts.json {
                builder = builder.json(json);
            }
            if let Some(timeout) = parts.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some((user, password)) = parts.auth {
                builder = builder.basic_auth(user, password);
            }

            let response = builder.send()?;
            if parts.http_errors {
                Ok(response.error_for_status()?)
            } else {
                Ok(response)
            }
        }
    }

    impl AsyncTransport for ReqwestTransport {
        type Response = reqwest::Response;
        type Future = BoxFuture<Result<reqwest::Response, TransportError>>;

        fn perform_async(&self, request: PreparedRequest) -> Self::Future {
            let prepared = self.parts(request).map(|parts| {
                tracing::debug!(method = %parts.method, url = %parts.url, "sending request");

                let mut builder = self
                    .client
                    .request(parts.method, parts.url)
                    .headers(parts.headers)
                    .query(&parts.query);
                if let Some(form) = &parts.form {
                    builder = builder.form(form);
                }
                if let Some(json) = &parts.json {
                    builder = builder.json(json);
                }
                if let Some(timeout) = parts.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some((user, password)) = parts.auth {
                    builder = builder.basic_auth(user, password);
                }
                (builder, parts.http_errors)
            });

            Box::pin(async move {
                let (builder, http_errors) = prepared?;
                let response = builder.send().await?;
                if http_errors {
                    Ok(response.error_for_status()?)
                } else {
                    Ok(response)
                }
            })
        }
    }

    fn invalid(message: String) -> TransportError {
        TransportError::InvalidRequest { message }
    }

    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Flatten an object section into `key=value` pairs.
    fn pairs(section: Option<&Value>) -> Vec<(String, String)> {
        section
            .and_then(Value::as_object)
            .map(pairs_of)
            .unwrap_or_default()
    }

    fn header_map(headers: &Map<String, Value>) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in pairs_of(headers) {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("header name \"{}\": {}", name, e)))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| invalid(format!("header \"{}\": {}", name, e)))?;
            map.append(header, value);
        }
        Ok(map)
    }

    /// Arrays repeat the key; nulls are dropped.
    fn pairs_of(map: &Map<String, Value>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items.iter().filter(|item| !item.is_null()) {
                        out.push((key.clone(), text(item)));
                    }
                }
                other => out.push((key.clone(), text(other))),
            }
        }
        out
    }

}
