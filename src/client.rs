//! The document-driven client.
//!
//! A [`Client`] loads its document and computes its base URI once, then
//! turns `(method, path, input)` or `(operationId, input)` calls into
//! [`PreparedRequest`]s for its transport. Every setup failure is raised
//! before the transport is involved, for both the sync and async flavors.

use serde_json::{Map, Value};

use crate::base_uri::resolve_base_uri;
use crate::document::{ApiDocument, DocumentOverrides, OperationRef};
use crate::error::{ClientError, RequestError, TransportError};
use crate::index::{OperationIndex, OperationTarget};
use crate::loader::DocumentSource;
use crate::mapper::map_parameters;
use crate::template;
use crate::transport::{AsyncTransport, Transport};
use crate::types::{Call, Method, PreparedRequest, RequestInput};

#[cfg(feature = "remote")]
use crate::transport::ReqwestTransport;

/// Path used when a verb call gives none.
pub const DEFAULT_PATH: &str = "/";

/// Construction options.
#[derive(Debug)]
pub struct ClientConfig {
    /// Where the document comes from.
    pub swagger: DocumentSource,
    /// Scheme to use; optional when the document allows exactly one.
    pub scheme: Option<String>,
    /// Host override.
    pub host: Option<String>,
    /// basePath override.
    pub base_path: Option<String>,
    /// Full base URI; skips scheme/host/basePath computation when set.
    pub base_uri: Option<String>,
    /// Opaque options forwarded to the transport builder.
    pub transport: Map<String, Value>,
}

impl ClientConfig {
    pub fn new(swagger: impl Into<DocumentSource>) -> Self {
        Self {
            swagger: swagger.into(),
            scheme: None,
            host: None,
            base_path: None,
            base_uri: None,
            transport: Map::new(),
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Add one transport passthrough option.
    pub fn transport_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.transport.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a call routed by name: a settled response or a pending one.
pub enum Dispatch<T: Transport + AsyncTransport> {
    Ready(<T as Transport>::Response),
    Pending(<T as AsyncTransport>::Future),
}

/// Client for one API document.
///
/// The document, base URI and operation index are read-only after
/// construction, so a client can be shared across threads and in-flight
/// async requests.
#[derive(Debug)]
pub struct Client<T> {
    document: ApiDocument,
    index: OperationIndex,
    base_uri: String,
    transport: T,
}

#[cfg(feature = "remote")]
impl Client<ReqwestTransport> {
    /// Build a client using the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the document can't be loaded, the base URI
    /// can't be computed, or the transport rejects its options.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, ReqwestTransport::new)
    }
}

impl<T> Client<T> {
    /// Build a client whose transport is created by `build` from the
    /// computed base URI and the passthrough options.
    pub fn with_transport<F>(config: ClientConfig, build: F) -> Result<Self, ClientError>
    where
        F: FnOnce(&str, &Map<String, Value>) -> Result<T, TransportError>,
    {
        let ClientConfig {
            swagger,
            scheme,
            host,
            base_path,
            base_uri,
            transport,
        } = config;

        let overrides = DocumentOverrides { host, base_path };
        let document = ApiDocument::load(swagger, &overrides)?;
        let base_uri = resolve_base_uri(&document, scheme.as_deref(), base_uri.as_deref())?;
        tracing::debug!(%base_uri, "client configured");
        let transport = build(&base_uri, &transport)?;

        Ok(Self {
            document,
            index: OperationIndex::new(),
            base_uri,
            transport,
        })
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of operationId scans performed so far.
    pub fn index_scans(&self) -> usize {
        self.index.scan_count()
    }

    /// Every operation in document order.
    pub fn operations(&self) -> Vec<OperationRef<'_>> {
        self.document.operations()
    }

    /// Resolve an operationId to its path and method.
    pub fn resolve_operation(&self, operation_id: &str) -> Result<OperationTarget, RequestError> {
        self.index.resolve(&self.document, operation_id)
    }

    /// Assemble the request for `method` and `path` without sending it.
    ///
    /// `method` is lowercased and `path` given exactly one leading `/` before
    /// the operation lookup.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::OperationNotFound` if the document has no such
    /// operation, or any parameter mapping error.
    pub fn prepare(
        &self,
        method: &str,
        path: &str,
        input: RequestInput,
    ) -> Result<PreparedRequest, RequestError> {
        let method = method.to_lowercase();
        let path = format!("/{}", path.trim_start_matches('/'));

        let op = self.document.operation(&path, &method).ok_or_else(|| {
            RequestError::OperationNotFound {
                operation: format!("{} {}", method.to_uppercase(), path),
            }
        })?;
        let mapped = map_parameters(&self.document, op, input)?;

        let expanded = if mapped.path_params.is_empty() {
            path
        } else {
            template::expand(&path, &mapped.path_params)
        };
        let relative = expanded.strip_prefix('/').unwrap_or(&expanded).to_string();

        Ok(PreparedRequest {
            method,
            path: relative,
            options: mapped.options,
        })
    }

    /// Assemble the request for an operationId without sending it.
    pub fn prepare_operation(
        &self,
        operation_id: &str,
        input: RequestInput,
    ) -> Result<PreparedRequest, RequestError> {
        let target = self.resolve_operation(operation_id)?;
        self.prepare(&target.method, &target.path, input)
    }

    /// Prepare a call routed by name, substituting `/` for a missing path
    /// and empty input for missing input.
    ///
    /// `path` only applies to verb calls. An operationId call takes its path
    /// from the document, so a supplied `path` is ignored (logged at debug).
    pub fn prepare_call(
        &self,
        call: &Call,
        path: Option<&str>,
        input: Option<RequestInput>,
    ) -> Result<PreparedRequest, RequestError> {
        let input = input.unwrap_or_default();
        match call {
            Call::Request { method, .. } => {
                self.prepare(method.as_str(), path.unwrap_or(DEFAULT_PATH), input)
            }
            Call::Execute { operation_id, .. } => {
                if let Some(path) = path {
                    tracing::debug!(%operation_id, path, "ignoring path for operationId call");
                }
                self.prepare_operation(operation_id, input)
            }
        }
    }
}

impl<T: Transport> Client<T> {
    /// Send a request and block until the transport settles.
    pub fn request(
        &self,
        method: &str,
        path: &str,
        input: RequestInput,
    ) -> Result<T::Response, RequestError> {
        let prepared = self.prepare(method, path, input)?;
        self.send(prepared)
    }

    /// Send the request for an operationId and block until it settles.
    pub fn execute(
        &self,
        operation_id: &str,
        input: RequestInput,
    ) -> Result<T::Response, RequestError> {
        let prepared = self.prepare_operation(operation_id, input)?;
        self.send(prepared)
    }

    pub fn get(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Get.as_str(), path, input)
    }

    pub fn put(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Put.as_str(), path, input)
    }

    pub fn post(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Post.as_str(), path, input)
    }

    pub fn head(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Head.as_str(), path, input)
    }

    pub fn patch(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Patch.as_str(), path, input)
    }

    pub fn delete(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Delete.as_str(), path, input)
    }

    pub fn options(&self, path: &str, input: RequestInput) -> Result<T::Response, RequestError> {
        self.request(Method::Options.as_str(), path, input)
    }

    fn send(&self, prepared: PreparedRequest) -> Result<T::Response, RequestError> {
        tracing::debug!(method = %prepared.method, path = %prepared.path, "dispatching request");
        Ok(self.transport.perform(prepared)?)
    }
}

impl<T: AsyncTransport> Client<T> {
    /// Start a request; setup errors are returned immediately, transport
    /// errors through the returned future.
    pub fn request_async(
        &self,
        method: &str,
        path: &str,
        input: RequestInput,
    ) -> Result<T::Future, RequestError> {
        let prepared = self.prepare(method, path, input)?;
        Ok(self.send_async(prepared))
    }

    /// Start the request for an operationId.
    pub fn execute_async(
        &self,
        operation_id: &str,
        input: RequestInput,
    ) -> Result<T::Future, RequestError> {
        let prepared = self.prepare_operation(operation_id, input)?;
        Ok(self.send_async(prepared))
    }

    pub fn get_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Get.as_str(), path, input)
    }

    pub fn put_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Put.as_str(), path, input)
    }

    pub fn post_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Post.as_str(), path, input)
    }

    pub fn head_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Head.as_str(), path, input)
    }

    pub fn patch_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Patch.as_str(), path, input)
    }

    pub fn delete_async(&self, path: &str, input: RequestInput) -> Result<T::Future, RequestError> {
        self.request_async(Method::Delete.as_str(), path, input)
    }

    pub fn options_async(
        &self,
        path: &str,
        input: RequestInput,
    ) -> Result<T::Future, RequestError> {
        self.request_async(Method::Options.as_str(), path, input)
    }

    fn send_async(&self, prepared: PreparedRequest) -> T::Future {
        tracing::debug!(
            method = %prepared.method,
            path = %prepared.path,
            "dispatching async request"
        );
        self.transport.perform_async(prepared)
    }
}

impl<T: Transport + AsyncTransport> Client<T> {
    /// Route a call by name.
    ///
    /// A verb name (`get`, `postAsync`, ...) sends `path` (default `/`); any
    /// other name executes that operationId. Unlike the verb form, the
    /// operationId form has no path argument of its own: `input` is its only
    /// payload and a supplied `path` is ignored. An `Async` suffix returns a
    /// pending handle instead of a settled response.
    pub fn call(
        &self,
        name: &str,
        path: Option<&str>,
        input: Option<RequestInput>,
    ) -> Result<Dispatch<T>, RequestError> {
        let call = Call::parse(name);
        let prepared = self.prepare_call(&call, path, input)?;

        if call.is_async() {
            Ok(Dispatch::Pending(self.send_async(prepared)))
        } else {
            self.send(prepared).map(Dispatch::Ready)
        }
    }
}
