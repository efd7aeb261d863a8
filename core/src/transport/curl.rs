//! libcurl-backed transfer executor.
//!
//! One [`CurlTransport`] wraps one easy handle. `reset` maps to
//! `curl_easy_reset`, which drops every option set for the previous
//! transfer while keeping live connections and caches.

use std::io::Read;

use ::curl::easy::{Easy, List};

use crate::error::{TransportError, TransportErrorKind};
use crate::transport::{RawResponse, RequestBody, TransferConfig, Transport};

#[derive(Debug)]
pub struct CurlTransport {
    easy: Easy,
}

impl CurlTransport {
    pub fn new() -> Self {
        Self { easy: Easy::new() }
    }

    fn configure(&mut self, config: &TransferConfig) -> Result<(), ::curl::Error> {
        let easy = &mut self.easy;
        easy.url(&config.url)?;
        easy.accept_encoding(config.accept_encoding)?;
        if config.no_response_body {
            easy.nobody(true)?;
        }
        match &config.body {
            RequestBody::None => {}
            RequestBody::BufferedPost(bytes) => {
                easy.post(true)?;
                easy.post_field_size(bytes.len() as u64)?;
                easy.post_fields_copy(bytes)?;
            }
            RequestBody::Streamed(bytes) => {
                easy.upload(true)?;
                easy.in_filesize(bytes.len() as u64)?;
            }
        }
        if let Some(verb) = &config.custom_verb {
            easy.custom_request(verb)?;
        }
        easy.follow_location(config.follow_redirects)?;
        if let Some(max) = config.max_redirects {
            easy.max_redirections(max)?;
        }
        if let Some(timeout) = config.timeout {
            easy.timeout(timeout)?;
        }
        if let Some(timeout) = config.connect_timeout {
            easy.connect_timeout(timeout)?;
        }

        let mut headers = List::new();
        for line in config.header_lines() {
            headers.append(&line)?;
        }
        easy.http_headers(headers)
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for CurlTransport {
    fn reset(&mut self) {
        self.easy.reset();
    }

    fn perform(&mut self, config: &TransferConfig) -> Result<RawResponse, TransportError> {
        self.configure(config).map_err(classify)?;
        tracing::trace!(url = %config.url, verb = ?config.custom_verb, "performing transfer");

        let mut headers = HeaderBlock::default();
        let mut body = Vec::new();
        let mut upload: &[u8] = match &config.body {
            RequestBody::Streamed(bytes) => bytes,
            _ => &[],
        };

        let result = {
            let mut transfer = self.easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(classify)?;
            transfer
                .header_function(|line| {
                    headers.push(line);
                    true
                })
                .map_err(classify)?;
            transfer
                .read_function(move |into| Ok(upload.read(into).unwrap_or(0)))
                .map_err(classify)?;
            transfer.perform()
        };

        let raw = RawResponse {
            status: self.easy.response_code().unwrap_or(0),
            headers: headers.bytes,
            body,
        };
        match result {
            Ok(()) => Ok(raw),
            Err(err) => Err(classify(err).with_partial(raw)),
        }
    }
}

/// Header lines of the final response, as delivered by libcurl.
#[derive(Debug, Default)]
struct HeaderBlock {
    bytes: Vec<u8>,
    complete: bool,
}

impl HeaderBlock {
    fn push(&mut self, line: &[u8]) {
        // A new status line starts over (redirects, 1xx).
        if line.starts_with(b"HTTP/") {
            self.bytes.clear();
            self.complete = false;
        }
        // Chunked trailers arrive after the terminator and are not headers.
        if self.complete {
            return;
        }
        self.bytes.extend_from_slice(line);
        if line == b"\r\n" || line == b"\n" {
            self.complete = true;
        }
    }
}

fn classify(err: ::curl::Error) -> TransportError {
    let kind = if err.is_partial_file() {
        TransportErrorKind::PartialFile
    } else if err.is_couldnt_resolve_host() || err.is_couldnt_resolve_proxy() {
        TransportErrorKind::Resolve
    } else if err.is_couldnt_connect() {
        TransportErrorKind::Connect
    } else if err.is_operation_timedout() {
        TransportErrorKind::Timeout
    } else if err.is_ssl_connect_error() || err.is_ssl_certproblem() {
        TransportErrorKind::Tls
    } else if err.is_too_many_redirects() {
        TransportErrorKind::TooManyRedirects
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}
