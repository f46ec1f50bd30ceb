//! Single-exchange transport.
//!
//! # Design
//! A transport performs the I/O for exactly one `RequestSpec` and yields a
//! `RawResponse`. Everything after that point (success range, content-type
//! sniffing, JSON decoding) lives in [`classify`], a pure function shared by
//! every transport implementation, so it can be tested on plain data.
//!
//! The timeout covers the whole exchange including the body read. When it
//! fires the in-flight future is dropped, which closes the connection on our
//! side; the server may still finish processing.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::RequestError;
use crate::http::{Body, Headers, Method, RawResponse, RequestSpec, ResponseResult};

/// Performs one HTTP exchange per call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, spec: RequestSpec) -> Result<ResponseResult, RequestError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(RequestError::network)?;
        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest` client. Its own timeout, if any,
    /// still applies alongside the per-request one.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn exchange(&self, spec: &RequestSpec) -> Result<RawResponse, reqwest::Error> {
        let mut request = self
            .client
            .request(spec.method().into(), spec.url().clone());
        for (name, value) in spec.headers().iter() {
            request = request.header(name, value);
        }
        if let Some(body) = spec.body() {
            request = request.body(body.to_vec());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            match value.to_str() {
                Ok(value) => headers.append(name.as_str(), value),
                Err(_) => tracing::debug!(header = %name, "skipping non-UTF-8 header value"),
            }
        }
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: RequestSpec) -> Result<ResponseResult, RequestError> {
        let timeout = spec.timeout();
        let started = Instant::now();
        tracing::debug!(
            method = %spec.method(),
            url = %spec.url(),
            timeout = ?timeout,
            "sending request"
        );

        let raw = match tokio::time::timeout(timeout, self.exchange(&spec)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return Err(classify_reqwest_error(&spec, timeout, err)),
            Err(_elapsed) => {
                tracing::warn!(
                    method = %spec.method(),
                    url = %spec.url(),
                    timeout = ?timeout,
                    "request timed out"
                );
                return Err(RequestError::Timeout { timeout });
            }
        };

        tracing::debug!(
            method = %spec.method(),
            url = %spec.url(),
            status = raw.status,
            elapsed = ?started.elapsed(),
            "response received"
        );
        classify(raw)
    }
}

fn classify_reqwest_error(spec: &RequestSpec, timeout: Duration, err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::Timeout { timeout };
    }
    if err.is_builder() {
        return RequestError::InvalidRequest(err.to_string());
    }
    tracing::warn!(method = %spec.method(), url = %spec.url(), %err, "network failure");
    RequestError::network(err)
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Turn a raw response into the caller-facing outcome.
///
/// Statuses outside `200..300` become `HttpStatus` with the body text
/// attached. 204 and 205 carry no content and yield `Body::Empty`. Any other
/// success whose content type announces JSON must parse as JSON, an empty
/// payload included, otherwise it is a `DecodeFailure`; any other content
/// type is returned untouched.
pub fn classify(raw: RawResponse) -> Result<ResponseResult, RequestError> {
    let RawResponse {
        status,
        headers,
        body,
    } = raw;

    if !(200..300).contains(&status) {
        return Err(RequestError::HttpStatus {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let body = decode_body(status, headers.get("content-type"), body)?;
    Ok(ResponseResult {
        status,
        headers,
        body,
    })
}

fn decode_body(status: u16, content_type: Option<&str>, bytes: Vec<u8>) -> Result<Body, RequestError> {
    if matches!(status, 204 | 205) {
        return Ok(Body::Empty);
    }
    if content_type.is_some_and(is_json_media_type) {
        return serde_json::from_slice(&bytes)
            .map(Body::Json)
            .map_err(|e| RequestError::decode(e, String::from_utf8_lossy(&bytes)));
    }
    if bytes.is_empty() {
        return Ok(Body::Empty);
    }
    Ok(match String::from_utf8(bytes) {
        Ok(text) => Body::Text(text),
        Err(err) => Body::Bytes(err.into_bytes()),
    })
}

/// `application/json` or any `+json` structured suffix, ignoring parameters
/// and case.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
