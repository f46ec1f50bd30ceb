//! Async HTTP client core with typed failures and call composition.
//!
//! # Overview
//! A `Transport` performs one HTTP exchange described by a `RequestSpec`
//! and resolves to a decoded `ResponseResult` or a `RequestError`.
//! `ApiClient` binds a base address to a transport and offers one operation
//! per verb. The `compose` module chains dependent calls and fans out
//! independent ones; `placeholder` uses both against the JSONPlaceholder API.
//!
//! # Design
//! - `ApiClient` is stateless apart from its immutable `ClientConfig`.
//! - The network boundary is explicit: transports produce a plain-data
//!   `RawResponse`, and the pure `classify` function applies the status and
//!   content-type rules.
//! - Failures form a closed enum; nothing is retried or recovered here.

pub mod client;
pub mod compose;
pub mod config;
pub mod error;
pub mod http;
pub mod placeholder;
pub mod transport;

pub use client::{ApiClient, Call};
pub use compose::{chain, fan_out};
pub use config::ClientConfig;
pub use error::RequestError;
pub use http::{Body, Headers, Method, RawResponse, RequestSpec, ResponseResult, DEFAULT_TIMEOUT};
pub use transport::{classify, HttpTransport, Transport};
