//! Plain-data HTTP types shared by the transport and the client.
//!
//! # Design
//! `RequestSpec` is the complete description of one exchange and is frozen
//! once built: fields are private and only readable through accessors.
//! `RawResponse` is what a transport hands back before any interpretation;
//! `transport::classify` turns it into a `ResponseResult` or a
//! `RequestError`, so the status and decoding rules can be exercised without
//! a network.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::RequestError;

/// Timeout applied when neither the client nor the call overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether a request body is sent for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RequestError::InvalidRequest(format!("unsupported method: {s}")))
    }
}

/// Header map with case-insensitive names. Names are stored lower-cased and
/// a repeated insert replaces the earlier value; [`Headers::append`] keeps
/// both, joined with `", "`. Response headers are collected with `append`, so
/// a header sent several times (e.g. `set-cookie`) arrives as one joined
/// value. Values that are not valid UTF-8 are not represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        self.0.insert(name, value.into());
    }

    /// Add a value, joining it to any existing one with `", "`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.0.entry(name) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// A fully specified HTTP exchange.
///
/// Built with [`RequestSpec::builder`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Vec<u8>>,
    timeout: Duration,
}

impl RequestSpec {
    pub fn builder(method: Method, url: Url) -> RequestSpecBuilder {
        RequestSpecBuilder {
            method,
            url,
            headers: Headers::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The payload, present only for methods that carry one.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Vec<u8>>,
    timeout: Duration,
}

impl RequestSpecBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers.0);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Freeze the request. A body given to a method that does not carry one
    /// is dropped.
    pub fn build(self) -> Result<RequestSpec, RequestError> {
        if self.timeout.is_zero() {
            return Err(RequestError::InvalidRequest(
                "timeout must be greater than zero".to_string(),
            ));
        }
        let body = if self.method.carries_body() {
            self.body
        } else {
            None
        };
        Ok(RequestSpec {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body,
            timeout: self.timeout,
        })
    }
}

/// An HTTP response described as plain data, before status and content-type
/// interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Decoded payload of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The content type announced JSON and the payload parsed.
    Json(Value),
    /// Any other content type, UTF-8 payload returned as-is.
    Text(String),
    /// Any other content type, payload that is not UTF-8.
    Bytes(Vec<u8>),
    /// No content: a 204/205 status, or a zero-length payload that was not
    /// announced as JSON.
    Empty,
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

/// The successful outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseResult {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl ResponseResult {
    /// Deserialize the body into `T`.
    ///
    /// JSON bodies are converted directly; text bodies are parsed as JSON.
    /// Any mismatch is a [`RequestError::DecodeFailure`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        match &self.body {
            Body::Json(value) => {
                T::deserialize(value).map_err(|e| RequestError::decode(e, value.to_string()))
            }
            Body::Text(text) => {
                serde_json::from_str(text).map_err(|e| RequestError::decode(e, text.clone()))
            }
            Body::Bytes(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| RequestError::decode(e, String::from_utf8_lossy(bytes))),
            Body::Empty => serde_json::from_str("").map_err(|e| RequestError::decode(e, "")),
        }
    }
}
