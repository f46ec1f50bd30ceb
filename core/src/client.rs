//! REST client bound to a base address.
//!
//! # Design
//! `ApiClient` holds only its `ClientConfig` and a transport; it carries no
//! mutable state between calls. Each verb method returns a [`Call`] that
//! collects per-call overrides (headers, query, timeout) and is finished with
//! [`Call::send`]. The call resolves its path, freezes a `RequestSpec` and
//! hands it to the transport, returning exactly what the transport returns.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::http::{Headers, Method, RequestSpec, ResponseResult};
use crate::transport::{HttpTransport, Transport};

#[derive(Debug, Clone)]
pub struct ApiClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<HttpTransport> {
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, RequestError> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get(&self, path: &str) -> Call<'_, T> {
        self.call(Method::Get, path)
    }

    pub fn post<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Call<'_, T> {
        self.call(Method::Post, path).json(payload)
    }

    pub fn put<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Call<'_, T> {
        self.call(Method::Put, path).json(payload)
    }

    pub fn patch<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Call<'_, T> {
        self.call(Method::Patch, path).json(payload)
    }

    pub fn delete(&self, path: &str) -> Call<'_, T> {
        self.call(Method::Delete, path)
    }

    /// Start a call with an arbitrary method and no payload.
    pub fn call(&self, method: Method, path: &str) -> Call<'_, T> {
        Call {
            client: self,
            method,
            url: self.resolve(path),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            timeout: self.config.default_timeout(),
            error: None,
        }
    }

    /// Absolute `http(s)` URLs (scheme matched case-insensitively) are used
    /// as-is; anything else is joined to the base URL with a single slash.
    pub fn resolve(&self, path: &str) -> String {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return url.into();
            }
        }
        format!(
            "{}/{}",
            self.config.base_url(),
            path.trim_start_matches('/')
        )
    }
}

/// A pending request with its per-call overrides.
pub struct Call<'a, T> {
    client: &'a ApiClient<T>,
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: Headers,
    body: Option<Vec<u8>>,
    timeout: Duration,
    // Payload encoding failure, surfaced when the call is built.
    error: Option<RequestError>,
}

impl<'a, T: Transport> Call<'a, T> {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Encode `payload` as the JSON body and set `content-type`. A header set
    /// afterwards replaces the content type.
    pub fn json<B: Serialize + ?Sized>(mut self, payload: &B) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => {
                self.body = Some(body);
                self.headers.insert("content-type", "application/json");
            }
            Err(e) => {
                self.error = Some(RequestError::InvalidRequest(format!(
                    "failed to encode payload: {e}"
                )));
            }
        }
        self
    }

    /// Raw body bytes, sent as-is.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Freeze the call into the `RequestSpec` the transport will receive.
    pub fn build(self) -> Result<RequestSpec, RequestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut url = Url::parse(&self.url)
            .map_err(|e| RequestError::InvalidRequest(format!("{}: {e}", self.url)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        let mut builder = RequestSpec::builder(self.method, url)
            .headers(self.headers)
            .timeout(self.timeout);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        builder.build()
    }

    pub async fn send(self) -> Result<ResponseResult, RequestError> {
        let client = self.client;
        let spec = self.build()?;
        client.transport.send(spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, RawResponse};
    use crate::transport::classify;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records every spec and answers with a JSON description of it.
    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<RequestSpec>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, spec: RequestSpec) -> Result<ResponseResult, RequestError> {
            let description = json!({
                "method": spec.method().as_str(),
                "url": spec.url().as_str(),
            });
            self.sent.lock().unwrap().push(spec);
            classify(RawResponse {
                status: 200,
                headers: Headers::from_iter([("content-type", "application/json")]),
                body: serde_json::to_vec(&description).unwrap(),
            })
        }
    }

    fn client() -> ApiClient<Recorder> {
        ApiClient::with_transport(ClientConfig::new("http://localhost:3000"), Recorder::default())
    }

    fn last_sent(client: &ApiClient<Recorder>) -> RequestSpec {
        client.transport().sent.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let c = client();
        assert_eq!(c.resolve("/users/1"), "http://localhost:3000/users/1");
        assert_eq!(c.resolve("users/1"), "http://localhost:3000/users/1");
    }

    #[test]
    fn absolute_paths_are_used_as_is() {
        let c = client();
        assert_eq!(
            c.resolve("https://jsonplaceholder.typicode.com/todos/1"),
            "https://jsonplaceholder.typicode.com/todos/1"
        );
    }

    #[test]
    fn absolute_scheme_is_matched_case_insensitively() {
        let c = client();
        assert_eq!(c.resolve("HTTPS://other.test/x"), "https://other.test/x");
        assert_eq!(c.resolve("Http://other.test/y?z=1"), "http://other.test/y?z=1");
    }

    #[test]
    fn non_http_scheme_is_treated_as_a_path() {
        let c = client();
        assert_eq!(c.resolve("mailto:someone"), "http://localhost:3000/mailto:someone");
    }

    #[test]
    fn get_builds_bodyless_spec_with_default_timeout() {
        let spec = client().get("/users/1").build().unwrap();
        assert_eq!(spec.method(), Method::Get);
        assert_eq!(spec.url().as_str(), "http://localhost:3000/users/1");
        assert!(spec.body().is_none());
        assert!(spec.headers().is_empty());
        assert_eq!(spec.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn post_encodes_json_payload() {
        let spec = client()
            .post("/posts", &json!({"title": "foo", "userId": 1}))
            .build()
            .unwrap();
        assert_eq!(spec.method(), Method::Post);
        assert_eq!(spec.headers().get("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(spec.body().unwrap()).unwrap();
        assert_eq!(body["title"], "foo");
        assert_eq!(body["userId"], 1);
    }

    #[test]
    fn put_and_patch_carry_payload_delete_does_not() {
        let c = client();
        let payload = json!({"title": "x"});
        assert!(c.put("/posts/1", &payload).build().unwrap().body().is_some());
        assert!(c.patch("/posts/1", &payload).build().unwrap().body().is_some());
        let delete = c.delete("/posts/1").build().unwrap();
        assert_eq!(delete.method(), Method::Delete);
        assert!(delete.body().is_none());
    }

    #[test]
    fn per_call_overrides_layer_over_defaults() {
        let spec = client()
            .post("/posts", &json!({}))
            .header("Content-Type", "application/vnd.custom+json")
            .header("X-Trace", "1")
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(spec.headers().get("content-type"), Some("application/vnd.custom+json"));
        assert_eq!(spec.headers().get("x-trace"), Some("1"));
        assert_eq!(spec.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn client_default_timeout_comes_from_config() {
        let c = ApiClient::with_transport(
            ClientConfig::new("http://localhost:3000").with_default_timeout(Duration::from_secs(1)),
            Recorder::default(),
        );
        assert_eq!(c.get("/").build().unwrap().timeout(), Duration::from_secs(1));
    }

    #[test]
    fn query_pairs_are_encoded() {
        let spec = client()
            .get("/posts")
            .query("userId", 7)
            .query("q", "a b&c")
            .build()
            .unwrap();
        assert_eq!(
            spec.url().as_str(),
            "http://localhost:3000/posts?userId=7&q=a+b%26c"
        );
    }

    #[test]
    fn unencodable_payload_is_invalid_request() {
        let mut payload = BTreeMap::new();
        payload.insert((1, 2), "tuple keys are not JSON object keys");
        let err = client().post("/posts", &payload).build().unwrap_err();
        assert!(matches!(err, RequestError::InvalidRequest(_)));
    }

    #[test]
    fn bad_base_url_is_invalid_request() {
        let c = ApiClient::with_transport(ClientConfig::new("not a url"), Recorder::default());
        let err = c.get("/users").build().unwrap_err();
        assert!(matches!(err, RequestError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn send_delegates_to_transport_once() {
        let c = client();
        let response = c.delete("/posts/3").send().await.unwrap();
        assert_eq!(
            response.body,
            Body::Json(json!({"method": "DELETE", "url": "http://localhost:3000/posts/3"}))
        );
        assert_eq!(c.transport().sent.lock().unwrap().len(), 1);
        assert_eq!(last_sent(&c).method(), Method::Delete);
    }

    #[tokio::test]
    async fn build_failure_never_reaches_transport() {
        let c = client();
        let err = c.get("/").timeout(Duration::ZERO).send().await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidRequest(_)));
        assert!(c.transport().sent.lock().unwrap().is_empty());
    }
}
