//! Library integration tests: construction, operation lookup, parameter
//! mapping and dispatch against an in-memory transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};
use swagger_client::{
    AsyncTransport, BoxFuture, Client, ClientConfig, ClientError, ConfigError, Dispatch,
    DocumentSource, LoadError, PreparedRequest, RequestError, RequestInput, Transport,
    TransportError,
};

/// Records every request and answers with it.
#[derive(Debug, Default)]
struct Recorder {
    sent: Mutex<Vec<PreparedRequest>>,
    async_calls: AtomicUsize,
}

impl Recorder {
    fn sent(&self) -> Vec<PreparedRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    type Response = PreparedRequest;

    fn perform(&self, request: PreparedRequest) -> Result<PreparedRequest, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(request)
    }
}

impl AsyncTransport for Recorder {
    type Response = PreparedRequest;
    type Future = BoxFuture<Result<PreparedRequest, TransportError>>;

    fn perform_async(&self, request: PreparedRequest) -> Self::Future {
        self.async_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(request.clone());
        Box::pin(async move { Ok(request) })
    }
}

/// Fails every exchange.
struct Unreachable;

impl Transport for Unreachable {
    type Response = ();

    fn perform(&self, _request: PreparedRequest) -> Result<(), TransportError> {
        Err(TransportError::Custom("connection refused".into()))
    }
}

impl AsyncTransport for Unreachable {
    type Response = ();
    type Future = std::future::Ready<Result<(), TransportError>>;

    fn perform_async(&self, request: PreparedRequest) -> Self::Future {
        std::future::ready(self.perform(request))
    }
}

fn document(paths: Value) -> Value {
    json!({
        "swagger": "2.0",
        "info": { "title": "Items", "version": "1" },
        "host": "api.example.com",
        "basePath": "/v1",
        "paths": paths,
        "parameters": {
            "Foo": { "name": "foo", "in": "header", "required": false },
            "Limit": { "name": "limit", "in": "query" }
        }
    })
}

fn client_for(doc: Value) -> Client<Recorder> {
    Client::with_transport(ClientConfig::new(doc), |_, _| Ok(Recorder::default())).unwrap()
}

fn build(config: ClientConfig) -> Result<Client<Recorder>, ClientError> {
    Client::with_transport(config, |_, _| Ok(Recorder::default()))
}

mod construction {
    use super::*;

    #[test]
    fn missing_sections_are_shape_errors() {
        for missing in ["swagger", "info", "paths"] {
            let mut doc = document(json!({}));
            doc.as_object_mut().unwrap().remove(missing);

            match build(ClientConfig::new(doc)) {
                Err(ClientError::Load(e)) => {
                    assert!(e.is_shape_error(), "{} should be a shape error", missing);
                    assert!(e.to_string().contains(missing));
                }
                other => panic!("expected load error for {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn null_section_counts_as_missing() {
        let mut doc = document(json!({}));
        doc["info"] = Value::Null;
        assert!(matches!(
            build(ClientConfig::new(doc)),
            Err(ClientError::Load(LoadError::MissingSections { .. }))
        ));
    }

    #[test]
    fn producer_is_invoked_once() {
        let config = ClientConfig::new(DocumentSource::producer(|| {
            Ok(document(json!({ "/items": { "get": { "operationId": "listItems" } } })))
        }));
        let client = build(config).unwrap();
        assert_eq!(client.operations().len(), 1);
    }

    #[test]
    fn failing_producer_is_a_load_error() {
        let config = ClientConfig::new(DocumentSource::producer(|| Err("offline".into())));
        match build(config) {
            Err(ClientError::Load(LoadError::Producer { message })) => {
                assert_eq!(message, "offline");
            }
            other => panic!("expected producer error, got {:?}", other),
        }
    }

    #[test]
    fn single_scheme_is_used_implicitly() {
        let mut doc = document(json!({}));
        doc["schemes"] = json!(["http"]);
        let client = client_for(doc);
        assert_eq!(client.base_uri(), "http://api.example.com/v1/");
    }

    #[test]
    fn absent_schemes_default_to_https() {
        let client = client_for(document(json!({})));
        assert_eq!(client.base_uri(), "https://api.example.com/v1/");
    }

    #[test]
    fn null_schemes_default_to_https() {
        let mut doc = document(json!({}));
        doc["schemes"] = Value::Null;
        let client = client_for(doc);
        assert_eq!(client.base_uri(), "https://api.example.com/v1/");
    }

    #[test]
    fn several_schemes_without_choice_are_ambiguous() {
        let mut doc = document(json!({}));
        doc["schemes"] = json!(["http", "https"]);

        match build(ClientConfig::new(doc.clone())) {
            Err(ClientError::Config(ConfigError::AmbiguousScheme { candidates })) => {
                assert_eq!(candidates, vec!["http", "https"]);
            }
            other => panic!("expected ambiguous scheme, got {:?}", other),
        }

        let client = build(ClientConfig::new(doc).scheme("http")).unwrap();
        assert_eq!(client.base_uri(), "http://api.example.com/v1/");
    }

    #[test]
    fn undeclared_scheme_is_rejected() {
        let result = build(ClientConfig::new(document(json!({}))).scheme("ftp"));
        assert!(matches!(
            result,
            Err(ClientError::Config(ConfigError::InvalidScheme { .. }))
        ));
    }

    #[test]
    fn missing_host_is_rejected() {
        let mut doc = document(json!({}));
        doc.as_object_mut().unwrap().remove("host");
        assert!(matches!(
            build(ClientConfig::new(doc)),
            Err(ClientError::Config(ConfigError::MissingHost))
        ));
    }

    #[test]
    fn overrides_follow_document_precedence() {
        // Non-empty override replaces the document value
        let client = build(
            ClientConfig::new(document(json!({})))
                .host("staging.example.com")
                .base_path("/v2//"),
        )
        .unwrap();
        assert_eq!(client.base_uri(), "https://staging.example.com/v2/");

        // Empty override keeps a present document value
        let client = build(ClientConfig::new(document(json!({}))).base_path("")).unwrap();
        assert_eq!(client.base_uri(), "https://api.example.com/v1/");

        // Empty override fills an absent one
        let mut doc = document(json!({}));
        doc.as_object_mut().unwrap().remove("basePath");
        let client = build(ClientConfig::new(doc).base_path("")).unwrap();
        assert_eq!(client.base_uri(), "https://api.example.com/");
    }

    #[test]
    fn base_uri_override_skips_computation() {
        let mut doc = document(json!({}));
        doc["schemes"] = json!(["http", "https"]);
        doc.as_object_mut().unwrap().remove("host");

        let client = build(ClientConfig::new(doc).base_uri("http://localhost:8080/api/")).unwrap();
        assert_eq!(client.base_uri(), "http://localhost:8080/api/");
    }

    #[test]
    fn transport_build_failure_is_reported() {
        let config = ClientConfig::new(document(json!({})));
        let result = Client::<Recorder>::with_transport(config, |_, _| {
            Err(TransportError::InvalidRequest {
                message: "bad timeout".to_string(),
            })
        });
        match result {
            Err(e @ ClientError::Transport(_)) => assert!(e.to_string().contains("bad timeout")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}

mod operations {
    use super::*;

    #[test]
    fn resolution_scans_once() {
        let client = client_for(document(json!({
            "/items": {
                "get": { "operationId": "listItems" },
                "post": { "operationId": "createItem" }
            }
        })));

        let first = client.resolve_operation("createItem").unwrap();
        let second = client.resolve_operation("createItem").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path, "/items");
        assert_eq!(first.method, "post");
        assert_eq!(client.index_scans(), 1);

        // Ids seen during the first scan are already cached
        client.resolve_operation("listItems").unwrap();
        assert_eq!(client.index_scans(), 1);
    }

    #[test]
    fn unknown_operation_id() {
        let client = client_for(document(json!({ "/items": { "get": {} } })));
        match client.execute("nope", RequestInput::new()) {
            Err(RequestError::OperationNotFound { operation }) => {
                assert_eq!(operation, "operationId \"nope\"")
            }
            other => panic!("expected OperationNotFound, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_ids_resolve_to_first_declaration() {
        let client = client_for(document(json!({
            "/a": { "get": { "operationId": "list" } },
            "/b": { "get": { "operationId": "list" } }
        })));
        assert_eq!(client.resolve_operation("list").unwrap().path, "/a");
    }

    #[test]
    fn extension_keys_are_not_dispatched() {
        let client = client_for(document(json!({
            "/items": {
                "x-meta": { "operationId": "meta" },
                "get": { "operationId": "listItems" }
            }
        })));

        assert_eq!(client.operations().len(), 1);
        assert!(matches!(
            client.request("x-meta", "/items", RequestInput::new()),
            Err(RequestError::OperationNotFound { .. })
        ));
        assert!(matches!(
            client.resolve_operation("meta"),
            Err(RequestError::OperationNotFound { .. })
        ));
    }

    #[test]
    fn execute_resolves_to_path_and_method() {
        let client = client_for(document(json!({
            "/items": { "get": { "operationId": "listItems" } }
        })));

        let sent = client.execute("listItems", RequestInput::new()).unwrap();
        assert_eq!(sent.method, "get");
        assert_eq!(sent.path, "items");
    }
}

mod mapping {
    use super::*;

    #[test]
    fn operation_level_definition_wins() {
        let client = client_for(document(json!({
            "/items": {
                "parameters": [{ "name": "x", "in": "query", "required": true }],
                "get": { "parameters": [{ "name": "x", "in": "header" }] }
            }
        })));

        // Optional at operation level: missing is fine
        client.get("/items", RequestInput::new()).unwrap();

        let sent = client.get("/items", RequestInput::new().param("x", "1")).unwrap();
        assert_eq!(sent.options.headers().unwrap()["x"], "1");
        assert!(sent.options.query().is_none());
    }

    #[test]
    fn local_fields_override_reference() {
        let client = client_for(document(json!({
            "/items": {
                "get": { "parameters": [{ "$ref": "#/parameters/Foo", "required": true }] }
            }
        })));

        match client.get("/items", RequestInput::new()) {
            Err(RequestError::MissingRequiredParameter { name, .. }) => assert_eq!(name, "foo"),
            other => panic!("expected MissingRequiredParameter, got {:?}", other),
        }

        let sent = client.get("/items", RequestInput::new().param("foo", "bar")).unwrap();
        assert_eq!(sent.options.headers().unwrap()["foo"], "bar");
    }

    #[test]
    fn cross_document_reference_is_unsupported() {
        let client = client_for(document(json!({
            "/items": { "get": { "parameters": [{ "$ref": "other.json#/parameters/Foo" }] } }
        })));
        assert!(matches!(
            client.get("/items", RequestInput::new()),
            Err(RequestError::UnsupportedRef { .. })
        ));
    }

    #[test]
    fn dangling_reference_names_segment() {
        let client = client_for(document(json!({
            "/items": { "get": { "parameters": [{ "$ref": "#/parameters/Nope" }] } }
        })));
        match client.get("/items", RequestInput::new()) {
            Err(RequestError::RefNotFound { segment, .. }) => assert_eq!(segment, "Nope"),
            other => panic!("expected RefNotFound, got {:?}", other),
        }
    }

    #[test]
    fn required_path_parameter_missing() {
        let client = client_for(document(json!({
            "/items/{id}": {
                "get": {
                    "operationId": "getItem",
                    "parameters": [{ "name": "id", "in": "path", "required": true }]
                }
            }
        })));

        let err = client.execute("getItem", RequestInput::new()).unwrap_err();
        assert!(
            matches!(err, RequestError::MissingRequiredParameter { ref name, .. } if name == "id")
        );
        assert!(err.to_string().contains("GET /items/{id}"));
        assert!(client.transport().sent().is_empty());
    }

    #[test]
    fn path_substitution_with_raw_headers() {
        let client = client_for(document(json!({
            "/items/{id}": { "get": { "parameters": [{ "name": "id", "in": "path" }] } }
        })));

        let input = RequestInput::from_value(json!({
            "id": "42",
            "@http": { "headers": { "X-Trace": "abc" } }
        }))
        .unwrap();
        let sent = client.get("/items/{id}", input).unwrap();

        assert_eq!(sent.path, "items/42");
        assert_eq!(sent.options.headers().unwrap()["X-Trace"], "abc");
        assert!(sent.options.query().is_none());
        assert!(sent.options.json().is_none());
        assert!(sent.options.form_params().is_none());

        let base = url::Url::parse(client.base_uri()).unwrap();
        assert_eq!(
            sent.url(&base).unwrap().as_str(),
            "https://api.example.com/v1/items/42"
        );
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let client = client_for(document(json!({
            "/items": { "get": { "parameters": [{ "$ref": "#/parameters/Limit" }] } }
        })));

        let sent = client
            .get(
                "/items",
                RequestInput::new().param("limit", 5).param("color", "blue"),
            )
            .unwrap();
        assert_eq!(sent.options.as_map().len(), 1);
        assert_eq!(sent.options.query().unwrap()["limit"], 5);
    }

    #[test]
    fn every_location_is_routed() {
        let client = client_for(document(json!({
            "/items": {
                "post": {
                    "parameters": [
                        { "name": "q", "in": "query" },
                        { "name": "h", "in": "header" },
                        { "name": "f", "in": "formData" },
                        { "name": "item", "in": "body" }
                    ]
                }
            }
        })));

        let input = RequestInput::new()
            .param("q", "a")
            .param("h", "b")
            .param("f", "c")
            .param("item", json!({ "name": "lamp" }));
        let sent = client.post("/items", input).unwrap();

        assert_eq!(sent.options.query().unwrap()["q"], "a");
        assert_eq!(sent.options.headers().unwrap()["h"], "b");
        assert_eq!(sent.options.form_params().unwrap()["f"], "c");
        assert_eq!(sent.options.json().unwrap()["name"], "lamp");
    }

    #[test]
    fn unrecognized_location_with_value() {
        let client = client_for(document(json!({
            "/items": { "get": { "parameters": [{ "name": "s", "in": "cookie" }] } }
        })));

        client.get("/items", RequestInput::new()).unwrap();

        match client.get("/items", RequestInput::new().param("s", "1")) {
            Err(RequestError::UnrecognizedParameterLocation { location, name }) => {
                assert_eq!(location, "cookie");
                assert_eq!(name, "s");
            }
            other => panic!("expected UnrecognizedParameterLocation, got {:?}", other),
        }
    }

    #[test]
    fn raw_options_merge_with_mapped_values() {
        let client = client_for(document(json!({
            "/items": { "get": { "parameters": [{ "name": "h", "in": "header" }] } }
        })));

        let input = RequestInput::new()
            .param("h", "mapped")
            .http(json!({ "headers": { "X-Trace": "abc" }, "timeout": 3 }));
        let sent = client.get("/items", input).unwrap();

        let headers = sent.options.headers().unwrap();
        assert_eq!(headers["X-Trace"], "abc");
        assert_eq!(headers["h"], "mapped");
        assert_eq!(sent.options.get("timeout"), Some(&json!(3)));
    }
}

mod dispatch {
    use super::*;

    fn items_client() -> Client<Recorder> {
        client_for(document(json!({
            "/": { "get": {} },
            "/items": {
                "get": { "operationId": "listItems" },
                "delete": { "operationId": "clearItems" }
            }
        })))
    }

    #[test]
    fn method_and_path_are_normalized() {
        let client = items_client();
        let sent = client.request("GET", "items", RequestInput::new()).unwrap();
        assert_eq!(sent.method, "get");
        assert_eq!(sent.path, "items");
    }

    #[test]
    fn unknown_method_on_known_path() {
        match items_client().put("/items", RequestInput::new()) {
            Err(RequestError::OperationNotFound { operation }) => {
                assert_eq!(operation, "PUT /items");
            }
            other => panic!("expected OperationNotFound, got {:?}", other),
        }
    }

    #[test]
    fn verb_call_defaults_path_and_input() {
        let client = items_client();
        match client.call("get", None, None).unwrap() {
            Dispatch::Ready(sent) => assert_eq!(sent.path, ""),
            Dispatch::Pending(_) => panic!("expected settled response"),
        }
    }

    #[test]
    fn operation_call_ignores_path() {
        let client = items_client();
        match client.call("clearItems", Some("/ignored"), None).unwrap() {
            Dispatch::Ready(sent) => {
                assert_eq!(sent.method, "delete");
                assert_eq!(sent.path, "items");
            }
            Dispatch::Pending(_) => panic!("expected settled response"),
        }
    }

    #[test]
    fn transport_failure_propagates() {
        let config = ClientConfig::new(document(json!({ "/items": { "get": {} } })));
        let client = Client::with_transport(config, |_, _| Ok(Unreachable)).unwrap();

        let err = client.get("/items", RequestInput::new()).unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn async_flavor_settles_through_future() {
        let client = items_client();
        let pending = client.execute_async("listItems", RequestInput::new()).unwrap();
        let sent = pending.await.unwrap();
        assert_eq!(sent.method, "get");
        assert_eq!(sent.path, "items");
    }

    #[tokio::test]
    async fn async_suffix_returns_pending_handle() {
        let client = items_client();
        match client.call("deleteAsync", Some("/items"), None).unwrap() {
            Dispatch::Pending(future) => assert_eq!(future.await.unwrap().method, "delete"),
            Dispatch::Ready(_) => panic!("expected pending handle"),
        }
    }

    #[tokio::test]
    async fn async_setup_errors_are_raised_eagerly() {
        let client = items_client();

        let err = client
            .post_async("/items", RequestInput::new())
            .err()
            .expect("setup should fail before dispatch");
        assert!(matches!(err, RequestError::OperationNotFound { .. }));

        assert!(client.execute_async("nope", RequestInput::new()).is_err());
        assert_eq!(client.transport().async_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn async_transport_failure_surfaces_through_handle() {
        let config = ClientConfig::new(document(json!({ "/items": { "get": {} } })));
        let client = Client::with_transport(config, |_, _| Ok(Unreachable)).unwrap();

        let pending = client.get_async("/items", RequestInput::new()).unwrap();
        assert!(pending.await.is_err());
    }

    #[tokio::test]
    async fn concurrent_async_calls_share_client() {
        let client = std::sync::Arc::new(items_client());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .execute_async("listItems", RequestInput::new())
                        .unwrap()
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().path, "items");
        }
        assert_eq!(client.transport().sent().len(), 8);
        assert!(client.index_scans() >= 1);
    }
}
