//! Blocking HTTP client engine.
//!
//! # Overview
//! Turns a method, URL, optional body and redirect policy into a transfer
//! configuration, hands it to a transport, and decodes what comes back into a
//! [`Response`] with a case-insensitive [`HeaderMap`] and a [`StatusCode`].
//!
//! ```text
//! request::build -> TransferConfig -> Transport::perform -> RawResponse -> response::decode
//! ```
//!
//! # Design
//! - The engine never does I/O itself; a [`Transport`] does. The default one,
//!   [`CurlTransport`], drives libcurl (cargo feature `curl`, on by default).
//! - Method handling is a table ([`MethodPolicy`]); unknown verbs are sent
//!   as custom requests, never rejected.
//! - Payloads on GET and HEAD are allowed but flagged with a
//!   [`RequestWarning`]. HEAD with a payload relies on the transport aborting
//!   the transfer; see [`request`](mod@request) for the details.
//! - A [`Session`] owns its transport exclusively and resets it around every
//!   transfer. One-shot functions create a session per call.

#[cfg(feature = "curl")]
pub mod api;
pub mod config;
pub mod error;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(feature = "curl")]
pub use api::{delete, get, head, options, patch, post, put, request};
pub use config::SessionConfig;
pub use error::{Error, Result, TransportError, TransportErrorKind};
pub use headers::HeaderMap;
pub use method::{Method, MethodPolicy};
pub use request::{Body, RequestOptions, RequestWarning};
pub use response::Response;
pub use session::Session;
pub use status::StatusCode;
#[cfg(feature = "curl")]
pub use transport::curl::CurlTransport;
pub use transport::{HeaderDirective, RawResponse, RequestBody, TransferConfig, Transport};
