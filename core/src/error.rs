//! Error types for the request engine.
//!
//! # Design
//! Transport failures are kept apart from the failures the engine detects
//! itself. `Integrity` gets its own variant: it means the HEAD-with-body
//! workaround ran in an environment where the transport did not abort the
//! way it must, so the response cannot be trusted, which is a different
//! problem from "the network failed". Advisory conditions (payload on GET)
//! are not errors; see [`crate::request::RequestWarning`].

use thiserror::Error;

use crate::transport::RawResponse;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`crate::Session`] and the one-shot API.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed for a reason other than the expected abort.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    /// The HEAD-with-body workaround did not make the transport abort.
    #[error("expected the transfer to abort for a HEAD request with a payload, but it completed")]
    Integrity,

    /// A text body or URL contained non-ASCII characters.
    #[error("{what} is not ASCII")]
    Encoding { what: &'static str },

    /// The URL could not be parsed to append query parameters.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The same header (after folding) appeared twice in a response.
    #[error("duplicate response header: {name}")]
    DuplicateHeader { name: String },

    /// The transport reported a status outside `100..=599`.
    #[error("invalid response status: {0}")]
    InvalidStatus(u32),

    /// JSON encoding of a request body or decoding of a response body failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body is not valid UTF-8.
    #[error("response body is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failure classification reported by a [`crate::Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The transfer was cut short before the announced size was reached.
    PartialFile,
    /// Name resolution failed.
    Resolve,
    /// The connection could not be established.
    Connect,
    /// The configured timeout elapsed.
    Timeout,
    /// TLS handshake or certificate failure.
    Tls,
    /// Too many redirects were followed.
    TooManyRedirects,
    /// Anything else.
    Other,
}

/// An error reported by the transfer executor.
///
/// `partial` holds whatever arrived before the transfer stopped. It is what
/// the response is decoded from when the abort was expected.
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    pub partial: Option<RawResponse>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: RawResponse) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn is_partial_file(&self) -> bool {
        self.kind == TransportErrorKind::PartialFile
    }
}
