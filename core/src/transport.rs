//! Transfer configuration and the executor contract.
//!
//! # Design
//! The engine never touches the network. [`crate::request::build`] produces a
//! [`TransferConfig`] describing one transfer as plain data; a [`Transport`]
//! executes it and hands back a [`RawResponse`]; the response decoder turns
//! that into a [`crate::Response`]. Anything that can honour the directives
//! below can be plugged in. [`curl::CurlTransport`] is the production one.
//!
//! Header directives follow libcurl's list syntax: `"Name: value"` sets a
//! header, `"Name:"` removes one the transport would otherwise add.

use std::fmt;
use std::time::Duration;

use crate::error::TransportError;
use crate::method::Method;

#[cfg(feature = "curl")]
pub mod curl;

/// Value advertised in `Accept-Encoding` on every request.
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

/// One header instruction for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDirective {
    Set { name: String, value: String },
    /// Suppress a header the transport would add by default.
    Blank { name: String },
}

impl HeaderDirective {
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderDirective::Set {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn blank(name: impl Into<String>) -> Self {
        HeaderDirective::Blank { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            HeaderDirective::Set { name, .. } | HeaderDirective::Blank { name } => name,
        }
    }
}

impl fmt::Display for HeaderDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderDirective::Set { name, value } => write!(f, "{name}: {value}"),
            HeaderDirective::Blank { name } => write!(f, "{name}:"),
        }
    }
}

/// How the request body is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    None,
    /// Copied outright and sent through the transport's POST path.
    BufferedPost(Vec<u8>),
    /// Read as a stream whose length is announced in advance.
    Streamed(Vec<u8>),
}

impl RequestBody {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::None => None,
            RequestBody::BufferedPost(bytes) | RequestBody::Streamed(bytes) => Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a transport needs to run one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub method: Method,
    /// ASCII-only target URL.
    pub url: String,
    /// Method token to send verbatim instead of the transport's own choice.
    pub custom_verb: Option<String>,
    pub headers: Vec<HeaderDirective>,
    pub body: RequestBody,
    /// Do not read a response body (HEAD).
    pub no_response_body: bool,
    pub follow_redirects: bool,
    pub max_redirects: Option<u32>,
    pub accept_encoding: &'static str,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Set for HEAD with a payload: the transfer must end in a partial-file
    /// abort, and completing normally is an error.
    pub expects_abort: bool,
}

impl TransferConfig {
    /// Header directives rendered in the transport's list syntax.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers.iter().map(ToString::to_string).collect()
    }

    pub fn header(&self, name: &str) -> Option<&HeaderDirective> {
        self.headers
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

/// What a transport read back from the wire.
///
/// `headers` is the final response's header block as received: status line
/// first, CRLF-separated lines, blank line last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    pub status: u32,
    pub headers: Vec<u8>,
    pub body: Vec<u8>,
}

/// A transfer executor.
///
/// A handle is owned by exactly one [`crate::Session`]. `reset` must return it
/// to a clean state, discarding every per-transfer option.
pub trait Transport {
    fn reset(&mut self);

    fn perform(&mut self, config: &TransferConfig) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn perform(&mut self, config: &TransferConfig) -> Result<RawResponse, TransportError> {
        (**self).perform(config)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn perform(&mut self, config: &TransferConfig) -> Result<RawResponse, TransportError> {
        (**self).perform(config)
    }
}
