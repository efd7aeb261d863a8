//! Response value and the decoder that builds it from a raw transfer.
//!
//! # Design
//! Decoding is where the HEAD-with-body workaround is settled: a partial-file
//! abort is the expected outcome and its partial data becomes the response;
//! a normal completion means the workaround silently did nothing, which is
//! reported as [`Error::Integrity`].
//!
//! Repeated header names are rejected rather than merged. Servers do repeat
//! some headers (`Set-Cookie`), but merging needs per-header rules that live
//! above this layer.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result, TransportError};
use crate::headers::HeaderMap;
use crate::request::RequestWarning;
use crate::status::StatusCode;
use crate::transport::{RawResponse, TransferConfig};

/// The decoded result of one transfer. Immutable once built.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content: Vec<u8>,
    warnings: Vec<RequestWarning>,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Body decoded as UTF-8.
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8(self.content.clone())?)
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.content)?)
    }

    /// Advisory warnings raised while building the request.
    pub fn warnings(&self) -> &[RequestWarning] {
        &self.warnings
    }
}

/// Turn a transfer outcome into a [`Response`].
pub fn decode(
    outcome: std::result::Result<RawResponse, TransportError>,
    config: &TransferConfig,
    warnings: Vec<RequestWarning>,
) -> Result<Response> {
    let raw = match outcome {
        Ok(_) if config.expects_abort => return Err(Error::Integrity),
        Ok(raw) => raw,
        Err(err) if config.expects_abort && err.is_partial_file() => {
            tracing::debug!(reason = %err.message, "expected abort for HEAD with payload");
            err.partial.unwrap_or_default()
        }
        Err(err) => return Err(Error::Transport(err)),
    };

    let headers = parse_header_block(&raw.headers)?;
    let status = u16::try_from(raw.status)
        .ok()
        .and_then(StatusCode::from_u16)
        .ok_or(Error::InvalidStatus(raw.status))?;

    Ok(Response {
        status,
        headers,
        content: raw.body,
        warnings,
    })
}

/// Parse a raw header block: status line first, then `Name: value` lines.
///
/// Bytes are read as ISO-8859-1 so obs-text values never fail to decode.
/// A line without `": "` becomes a header with an empty value. Lines are
/// split only on colon-space, so a server that writes `Name:value` produces
/// a header literally named `Name:value`.
pub fn parse_header_block(block: &[u8]) -> Result<HeaderMap> {
    let text: String = block.iter().map(|&b| char::from(b)).collect();
    let mut headers = HeaderMap::new();
    for line in text.split("\r\n").skip(1).filter(|line| !line.is_empty()) {
        let (name, value) = line.split_once(": ").unwrap_or((line, ""));
        if !headers.insert_new(name.to_string(), value.to_string()) {
            return Err(Error::DuplicateHeader {
                name: name.to_string(),
            });
        }
    }
    Ok(headers)
}
