//! Sessions: one exclusively owned transport handle, many requests.
//!
//! # Design
//! A [`Session`] owns its transport for its whole lifetime and hands out
//! `&mut self` per request, so two transfers can never share a handle. The
//! handle is reset before each transfer and again when the transfer scope
//! ends, on success and on every error path, by a drop guard. Dropping the
//! session releases the handle.
//!
//! One-shot calls in [`crate::api`] are a session created and dropped
//! around a single request.

use std::ops::{Deref, DerefMut};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::request::{self, PreparedTransfer, RequestOptions};
use crate::response::{self, Response};
use crate::transport::Transport;

#[cfg(feature = "curl")]
use crate::transport::curl::CurlTransport;

/// Resets the transport on creation and again on drop.
struct ResetGuard<'a, T: Transport> {
    transport: &'a mut T,
}

impl<'a, T: Transport> ResetGuard<'a, T> {
    fn new(transport: &'a mut T) -> Self {
        transport.reset();
        Self { transport }
    }
}

impl<T: Transport> Deref for ResetGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.transport
    }
}

impl<T: Transport> DerefMut for ResetGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.transport
    }
}

impl<T: Transport> Drop for ResetGuard<'_, T> {
    fn drop(&mut self) {
        self.transport.reset();
        tracing::trace!("transport reset");
    }
}

/// A group of requests executed over one transport handle.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
}

#[cfg(feature = "curl")]
impl Session<CurlTransport> {
    /// A session over a fresh libcurl handle.
    pub fn new() -> Self {
        Self::with_transport(CurlTransport::new())
    }
}

#[cfg(feature = "curl")]
impl Default for Session<CurlTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Release the session, returning its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send a request. Redirects are followed unless the options say
    /// otherwise.
    pub fn request(&mut self, method: &str, url: &str, options: RequestOptions) -> Result<Response> {
        self.send(method, url, &options, true)
    }

    pub fn get(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("GET", url, &options, true)
    }

    /// Redirects are not followed unless the options ask for it.
    pub fn head(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("HEAD", url, &options, false)
    }

    pub fn post(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("POST", url, &options, true)
    }

    pub fn put(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("PUT", url, &options, true)
    }

    pub fn patch(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("PATCH", url, &options, true)
    }

    pub fn delete(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("DELETE", url, &options, true)
    }

    pub fn options(&mut self, url: &str, options: RequestOptions) -> Result<Response> {
        self.send("OPTIONS", url, &options, true)
    }

    fn send(
        &mut self,
        method: &str,
        url: &str,
        options: &RequestOptions,
        default_redirects: bool,
    ) -> Result<Response> {
        let PreparedTransfer { config, warnings } =
            request::prepare(method, url, options, default_redirects, &self.config)?;
        for warning in &warnings {
            tracing::warn!(method = %config.method, url = %config.url, "{warning}");
        }

        let outcome = {
            let mut transport = ResetGuard::new(&mut self.transport);
            transport.perform(&config)
        };

        let response = response::decode(outcome, &config, warnings)?;
        tracing::debug!(
            method = %config.method,
            url = %config.url,
            status = response.status().as_u16(),
            "request complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::error::{Error, TransportError, TransportErrorKind};
    use crate::request::RequestWarning;
    use crate::status::StatusCode;
    use crate::transport::{RawResponse, RequestBody, TransferConfig};

    const URL: &str = "http://localhost:8080/anything";

    /// Replays scripted outcomes and records what it was asked to do.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: VecDeque<std::result::Result<RawResponse, TransportError>>,
        seen: Vec<TransferConfig>,
        resets: usize,
    }

    impl ScriptedTransport {
        fn replying(outcome: std::result::Result<RawResponse, TransportError>) -> Self {
            Self {
                outcomes: VecDeque::from([outcome]),
                ..Self::default()
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn reset(&mut self) {
            self.resets += 1;
        }

        fn perform(&mut self, config: &TransferConfig) -> std::result::Result<RawResponse, TransportError> {
            self.seen.push(config.clone());
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new(TransportErrorKind::Other, "no scripted outcome")))
        }
    }

    fn ok(status: u32, body: &[u8]) -> std::result::Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            headers: b"HTTP/1.1 200 OK\r\nServer: scripted\r\n\r\n".to_vec(),
            body: body.to_vec(),
        })
    }

    #[test]
    fn get_round_trip() {
        let mut transport = ScriptedTransport::replying(ok(200, b"hello"));
        let resp = Session::with_transport(&mut transport)
            .get(URL, RequestOptions::new())
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content(), b"hello");
        assert_eq!(resp.headers().get("server"), Some("scripted"));
        assert_eq!(transport.seen.len(), 1);
        assert!(transport.seen[0].follow_redirects);
    }

    #[test]
    fn transport_is_reset_before_and_after_each_transfer() {
        let mut transport = ScriptedTransport::default();
        transport.outcomes.extend([ok(200, b""), ok(201, b"")]);
        let mut session = Session::with_transport(&mut transport);
        session.get(URL, RequestOptions::new()).unwrap();
        session.post(URL, RequestOptions::new()).unwrap();
        drop(session);
        assert_eq!(transport.resets, 4);
    }

    #[test]
    fn transport_is_reset_when_transfer_fails() {
        let mut transport =
            ScriptedTransport::replying(Err(TransportError::new(TransportErrorKind::Connect, "refused")));
        let err = Session::with_transport(&mut transport)
            .get(URL, RequestOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(transport.resets, 2);
    }

    #[test]
    fn encoding_error_happens_before_any_transfer() {
        let mut transport = ScriptedTransport::replying(ok(200, b""));
        let err = Session::with_transport(&mut transport)
            .post(URL, RequestOptions::new().data("\u{2603}"))
            .unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
        assert!(transport.seen.is_empty());
    }

    #[test]
    fn post_without_data_uploads_zero_bytes() {
        let mut transport = ScriptedTransport::replying(ok(200, b""));
        Session::with_transport(&mut transport)
            .request("post", URL, RequestOptions::new())
            .unwrap();
        let config = &transport.seen[0];
        assert_eq!(config.body, RequestBody::BufferedPost(Vec::new()));
        assert_eq!(config.header_lines(), vec!["Connection: keep-alive", "Content-Type:"]);
    }

    #[test]
    fn delete_with_data_streams_three_bytes() {
        let mut transport = ScriptedTransport::replying(ok(200, b""));
        Session::with_transport(&mut transport)
            .request("delete", URL, RequestOptions::new().data(b"abc"))
            .unwrap();
        let config = &transport.seen[0];
        assert_eq!(config.custom_verb.as_deref(), Some("DELETE"));
        assert_eq!(config.body, RequestBody::Streamed(b"abc".to_vec()));
    }

    #[test]
    fn get_with_payload_warns_once_and_succeeds() {
        let mut transport = ScriptedTransport::replying(ok(200, b"{}"));
        let resp = Session::with_transport(&mut transport)
            .get(URL, RequestOptions::new().data("abc"))
            .unwrap();
        assert_eq!(resp.warnings(), &[RequestWarning::PayloadWithGet]);
        assert_eq!(resp.warnings()[0].to_string(), "Payload with a GET is unspecified");
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn head_with_payload_succeeds_on_partial_abort() {
        let partial = RawResponse {
            status: 200,
            headers: b"HTTP/1.1 200 OK\r\nContent-Length: 512\r\n\r\n".to_vec(),
            body: Vec::new(),
        };
        let abort = TransportError::new(TransportErrorKind::PartialFile, "transfer closed with outstanding read data")
            .with_partial(partial);
        let mut transport = ScriptedTransport::replying(Err(abort));
        let resp = Session::with_transport(&mut transport)
            .head(URL, RequestOptions::new().data(b"abc"))
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.content().is_empty());
        assert_eq!(resp.headers().get("content-length"), Some("512"));
        assert_eq!(resp.warnings(), &[RequestWarning::PayloadWithHead]);
        assert_eq!(transport.seen[0].header_lines()[0], "Connection: close");
        assert_eq!(transport.resets, 2);
    }

    #[test]
    fn head_with_payload_that_completes_fails_integrity() {
        let mut transport = ScriptedTransport::replying(ok(200, b""));
        let err = Session::with_transport(&mut transport)
            .head(URL, RequestOptions::new().data(b"abc"))
            .unwrap_err();
        assert!(matches!(err, Error::Integrity));
    }

    #[test]
    fn head_does_not_follow_redirects_by_default() {
        let mut transport = ScriptedTransport::default();
        transport.outcomes.extend([ok(200, b""), ok(200, b"")]);
        let mut session = Session::with_transport(&mut transport);
        session.head(URL, RequestOptions::new()).unwrap();
        session.request("head", URL, RequestOptions::new()).unwrap();
        drop(session);
        assert!(!transport.seen[0].follow_redirects);
        assert!(transport.seen[1].follow_redirects);
    }

    #[test]
    fn session_config_reaches_the_transport() {
        let mut transport = ScriptedTransport::replying(ok(200, b""));
        let config = SessionConfig::default().with_max_redirects(3);
        Session::with_transport(&mut transport)
            .with_config(config)
            .options(URL, RequestOptions::new())
            .unwrap();
        assert_eq!(transport.seen[0].max_redirects, Some(3));
        assert_eq!(transport.seen[0].custom_verb.as_deref(), Some("OPTIONS"));
    }

    #[test]
    fn into_transport_returns_the_handle() {
        let session = Session::with_transport(ScriptedTransport::replying(ok(204, b"")));
        let transport = session.into_transport();
        assert_eq!(transport.outcomes.len(), 1);
    }
}
