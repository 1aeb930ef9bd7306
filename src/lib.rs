//! Swagger Client
//!
//! Runtime HTTP client driven by a Swagger 2.0 API document.
//!
//! No code is generated: the document is loaded once, and each call's input
//! map is routed to the query string, headers, path template, form fields or
//! JSON body according to the operation's parameter definitions.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use swagger_client::{
//!     Client, ClientConfig, PreparedRequest, RequestInput, Transport, TransportError,
//! };
//!
//! // A transport that answers with the request it was given.
//! struct Echo;
//!
//! impl Transport for Echo {
//!     type Response = PreparedRequest;
//!
//!     fn perform(&self, request: PreparedRequest) -> Result<PreparedRequest, TransportError> {
//!         Ok(request)
//!     }
//! }
//!
//! let document = json!({
//!     "swagger": "2.0",
//!     "info": { "title": "Items", "version": "1" },
//!     "host": "api.example.com",
//!     "basePath": "/v1",
//!     "paths": {
//!         "/items/{id}": {
//!             "get": {
//!                 "operationId": "getItem",
//!                 "parameters": [
//!                     { "name": "id", "in": "path", "required": true },
//!                     { "name": "fields", "in": "query" }
//!                 ]
//!             }
//!         }
//!     }
//! });
//!
//! let client = Client::with_transport(ClientConfig::new(document), |_, _| Ok(Echo)).unwrap();
//! let input = RequestInput::new().param("id", 42).param("fields", "name");
//! let sent = client.execute("getItem", input).unwrap();
//!
//! assert_eq!(client.base_uri(), "https://api.example.com/v1/");
//! assert_eq!(sent.path, "items/42");
//! assert_eq!(sent.options.query().unwrap()["fields"], "name");
//! ```
//!
//! # Parameter Routing
//!
//! | `in` | Request option |
//! |------|----------------|
//! | `query` | `query` object |
//! | `header` | `headers` object |
//! | `path` | path template expansion |
//! | `formData` | `form_params` object |
//! | `body` | `json` body |
//!
//! Input keys matching no definition are dropped. The reserved `@http` key
//! carries raw transport options, merged in before routing.

mod base_uri;
mod client;
mod document;
mod error;
mod index;
mod linter;
mod loader;
mod mapper;
mod template;
mod transport;
mod types;

pub use base_uri::{normalize_base_path, resolve_base_uri, BaseUri};
pub use client::{Client, ClientConfig, Dispatch, DEFAULT_PATH};
pub use document::{ApiDocument, DocumentOverrides, OperationRef, DEFAULT_SCHEME};
pub use error::{ClientError, ConfigError, LoadError, RequestError, TransportError};
pub use index::{OperationIndex, OperationTarget};
pub use linter::{lint, Diagnostic, LintResult, Severity};
pub use loader::{
    is_url, load_document, load_document_auto, load_document_file, load_document_str,
    DocumentSource, Producer, ProducerError,
};
pub use mapper::{map_parameters, merged_parameters, MappedRequest};
pub use template::expand;
pub use transport::{AsyncTransport, BoxFuture, Transport};
pub use types::{
    Call, Method, ParameterDef, ParameterLocation, PreparedRequest, RequestInput, RequestOptions,
    RAW_OPTIONS_KEY,
};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
#[cfg(feature = "remote")]
pub use transport::ReqwestTransport;
