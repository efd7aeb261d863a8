//! Request construction: method policy + body + redirect flag -> transfer.
//!
//! # Design
//! `build` is pure. It never performs I/O and never logs; advisory warnings
//! are returned next to the configuration so the caller decides how to
//! surface them. The session logs them and attaches them to the response.
//!
//! Verbs without defined body semantics still upload a payload when given
//! one. GET does so through a custom request and is flagged with a warning.
//! HEAD cannot both suppress the response body and upload a request body in
//! one transfer, so the payload is uploaded under a custom `HEAD` request
//! and the transport is expected to abort with a partial-file error once it
//! sees the truncated response. The decoder treats that abort as success and
//! its absence as [`crate::Error::Integrity`]. The connection is closed
//! afterwards since it is left in an unknown state.

use std::fmt;

use url::Url;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::method::{Connection, Method, UploadMode};
use crate::transport::{HeaderDirective, RequestBody, TransferConfig, ACCEPT_ENCODING};

/// A request payload supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Bytes(Vec<u8>),
    /// Sent as ASCII; any other character fails the request.
    Text(String),
}

impl Body {
    fn into_ascii_bytes(self) -> Result<Vec<u8>> {
        match self {
            Body::Bytes(bytes) => Ok(bytes),
            Body::Text(text) if text.is_ascii() => Ok(text.into_bytes()),
            Body::Text(_) => Err(Error::Encoding { what: "request body" }),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Body::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Body {
    fn from(bytes: &[u8; N]) -> Self {
        Body::Bytes(bytes.to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// Optional arguments of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query pairs appended to the URL.
    pub params: Vec<(String, String)>,
    pub data: Option<Body>,
    /// Serialized as the body when `data` is absent.
    pub json: Option<serde_json::Value>,
    /// `None` lets the calling shorthand pick its default.
    pub allow_redirects: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn data(mut self, data: impl Into<Body>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }
}

/// Non-fatal conditions noticed while building a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestWarning {
    PayloadWithGet,
    PayloadWithHead,
}

impl fmt::Display for RequestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestWarning::PayloadWithGet => f.write_str("Payload with a GET is unspecified"),
            RequestWarning::PayloadWithHead => f.write_str("Payload with a HEAD is unspecified"),
        }
    }
}

/// A transfer ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct PreparedTransfer {
    pub config: TransferConfig,
    pub warnings: Vec<RequestWarning>,
}

/// Build the transfer for `method` on `url`.
pub fn build(
    method: &str,
    url: &str,
    body: Option<Body>,
    follow_redirects: bool,
) -> Result<PreparedTransfer> {
    let body = body.map(Body::into_ascii_bytes).transpose()?;
    assemble(Method::parse(method), url, body, None, follow_redirects)
}

/// Build a transfer from the full option set of the public API.
pub(crate) fn prepare(
    method: &str,
    url: &str,
    options: &RequestOptions,
    default_redirects: bool,
    session: &SessionConfig,
) -> Result<PreparedTransfer> {
    // Url::parse would percent-encode the caller's non-ASCII characters away.
    ensure_ascii_url(url)?;
    let url = with_params(url, &options.params)?;
    let (body, content_type) = match (&options.data, &options.json) {
        (Some(data), _) => (Some(data.clone().into_ascii_bytes()?), None),
        (None, Some(json)) => (Some(serde_json::to_vec(json)?), Some("application/json")),
        (None, None) => (None, None),
    };
    let follow = options.allow_redirects.unwrap_or(default_redirects);

    let mut prepared = assemble(Method::parse(method), &url, body, content_type, follow)?;
    session.apply(&mut prepared.config);
    Ok(prepared)
}

fn ensure_ascii_url(url: &str) -> Result<()> {
    if url.is_ascii() {
        Ok(())
    } else {
        Err(Error::Encoding { what: "URL" })
    }
}

fn with_params(url: &str, params: &[(String, String)]) -> Result<String> {
    if params.is_empty() {
        return Ok(url.to_string());
    }
    let mut parsed = Url::parse(url)?;
    parsed.query_pairs_mut().extend_pairs(params);
    Ok(parsed.into())
}

fn assemble(
    method: Method,
    url: &str,
    body: Option<Vec<u8>>,
    content_type: Option<&str>,
    follow_redirects: bool,
) -> Result<PreparedTransfer> {
    ensure_ascii_url(url)?;

    let policy = method.policy();
    let mut warnings = Vec::new();
    let mut connection = policy.default_connection;
    let mut custom_verb = policy
        .requires_custom_verb_directive
        .then(|| method.as_str().to_string());
    let mut expects_abort = false;

    let body = match body {
        None if policy.sends_body_by_default => Some(Vec::new()),
        other => other,
    };
    let has_payload = body.as_ref().is_some_and(|b| !b.is_empty());

    match &method {
        Method::Get if has_payload => {
            warnings.push(RequestWarning::PayloadWithGet);
            custom_verb = Some(method.as_str().to_string());
        }
        Method::Head if has_payload => {
            warnings.push(RequestWarning::PayloadWithHead);
            custom_verb = Some(method.as_str().to_string());
            connection = Connection::Close;
            expects_abort = true;
        }
        _ => {}
    }

    let mut headers = vec![HeaderDirective::set("Connection", connection.as_str())];
    let body = match body {
        Some(bytes) if policy.sends_body_by_default || has_payload => match policy.upload_mode {
            UploadMode::BufferedPost => {
                headers.push(match content_type {
                    Some(ct) => HeaderDirective::set("Content-Type", ct),
                    None => HeaderDirective::blank("Content-Type"),
                });
                RequestBody::BufferedPost(bytes)
            }
            UploadMode::StreamedWithLength => {
                if let Some(ct) = content_type {
                    headers.push(HeaderDirective::set("Content-Type", ct));
                }
                headers.push(HeaderDirective::blank("Expect"));
                RequestBody::Streamed(bytes)
            }
        },
        _ => RequestBody::None,
    };

    let config = TransferConfig {
        no_response_body: policy.forces_no_body_semantics,
        method,
        url: url.to_string(),
        custom_verb,
        headers,
        body,
        follow_redirects,
        max_redirects: None,
        accept_encoding: ACCEPT_ENCODING,
        timeout: None,
        connect_timeout: None,
        expects_abort,
    };
    Ok(PreparedTransfer { config, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:8080/anything";

    fn built(method: &str, body: Option<&[u8]>) -> PreparedTransfer {
        build(method, URL, body.map(Body::from), true).unwrap()
    }

    #[test]
    fn post_without_data_sends_empty_buffer_and_blanks_content_type() {
        let p = built("post", None);
        assert_eq!(p.config.method, Method::Post);
        assert_eq!(p.config.body, RequestBody::BufferedPost(Vec::new()));
        assert_eq!(p.config.header_lines(), vec!["Connection: keep-alive", "Content-Type:"]);
        assert_eq!(p.config.custom_verb, None);
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn delete_streams_payload_under_custom_verb() {
        let p = built("delete", Some(b"abc"));
        assert_eq!(p.config.custom_verb.as_deref(), Some("DELETE"));
        assert_eq!(p.config.body, RequestBody::Streamed(b"abc".to_vec()));
        assert_eq!(p.config.body.len(), 3);
        assert_eq!(p.config.header_lines(), vec!["Connection: keep-alive", "Expect:"]);
    }

    #[test]
    fn put_patch_delete_default_to_empty_stream() {
        for method in ["put", "patch", "delete"] {
            let p = built(method, None);
            assert_eq!(p.config.body, RequestBody::Streamed(Vec::new()), "{method}");
            assert!(p.config.header("Expect").is_some(), "{method}");
        }
        assert_eq!(built("put", None).config.custom_verb, None);
        assert_eq!(built("patch", None).config.custom_verb.as_deref(), Some("PATCH"));
    }

    #[test]
    fn get_with_payload_warns_and_uploads() {
        let p = built("GET", Some(b"abc"));
        assert_eq!(p.warnings, vec![RequestWarning::PayloadWithGet]);
        assert_eq!(p.warnings[0].to_string(), "Payload with a GET is unspecified");
        assert_eq!(p.config.custom_verb.as_deref(), Some("GET"));
        assert_eq!(p.config.body, RequestBody::Streamed(b"abc".to_vec()));
        assert!(!p.config.expects_abort);
    }

    #[test]
    fn get_with_empty_payload_is_plain_get() {
        for body in [None, Some(&b""[..])] {
            let p = built("get", body);
            assert!(p.warnings.is_empty());
            assert_eq!(p.config.custom_verb, None);
            assert_eq!(p.config.body, RequestBody::None);
            assert_eq!(p.config.header_lines(), vec!["Connection: keep-alive"]);
        }
    }

    #[test]
    fn head_with_payload_takes_the_abort_path() {
        let p = built("head", Some(b"abc"));
        assert_eq!(p.warnings, vec![RequestWarning::PayloadWithHead]);
        assert!(p.config.expects_abort);
        assert!(p.config.no_response_body);
        assert_eq!(p.config.custom_verb.as_deref(), Some("HEAD"));
        assert_eq!(p.config.header_lines(), vec!["Connection: close", "Expect:"]);
        assert_eq!(p.config.body, RequestBody::Streamed(b"abc".to_vec()));
    }

    #[test]
    fn head_without_payload_only_suppresses_body() {
        let p = built("head", None);
        assert!(!p.config.expects_abort);
        assert!(p.config.no_response_body);
        assert_eq!(p.config.custom_verb, None);
        assert_eq!(p.config.body, RequestBody::None);
    }

    #[test]
    fn options_and_unknown_verbs_use_custom_verb() {
        let p = built("options", None);
        assert_eq!(p.config.custom_verb.as_deref(), Some("OPTIONS"));
        assert_eq!(p.config.body, RequestBody::None);

        let p = built("brew", Some(b"coffee"));
        assert_eq!(p.config.custom_verb.as_deref(), Some("BREW"));
        assert_eq!(p.config.body, RequestBody::Streamed(b"coffee".to_vec()));
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn non_ascii_text_body_is_rejected() {
        let err = build("post", URL, Some(Body::from("caf\u{e9}")), true).unwrap_err();
        assert!(matches!(err, Error::Encoding { what: "request body" }));
    }

    #[test]
    fn non_ascii_bytes_are_sent_as_is() {
        let p = build("post", URL, Some(Body::from(&[0xff, 0x00][..])), true).unwrap();
        assert_eq!(p.config.body.bytes(), Some(&[0xff, 0x00][..]));
    }

    #[test]
    fn non_ascii_url_is_rejected() {
        let err = build("get", "http://example.com/caf\u{e9}", None, true).unwrap_err();
        assert!(matches!(err, Error::Encoding { what: "URL" }));
    }

    #[test]
    fn redirect_flag_and_accept_encoding_are_attached() {
        let p = build("get", URL, None, false).unwrap();
        assert!(!p.config.follow_redirects);
        assert_eq!(p.config.accept_encoding, "gzip, deflate");
    }

    #[test]
    fn prepare_appends_params() {
        let options = RequestOptions::new().param("q", "a b").param("n", "1");
        let p = prepare("get", URL, &options, true, &SessionConfig::default()).unwrap();
        assert_eq!(p.config.url, "http://localhost:8080/anything?q=a+b&n=1");
    }

    #[test]
    fn prepare_rejects_non_ascii_url_even_with_params() {
        let options = RequestOptions::new().param("q", "1");
        for opts in [RequestOptions::new(), options] {
            let err = prepare("get", "http://localhost/caf\u{e9}", &opts, true, &SessionConfig::default())
                .unwrap_err();
            assert!(matches!(err, Error::Encoding { what: "URL" }));
        }
    }

    #[test]
    fn prepare_rejects_unparseable_url_with_params() {
        let options = RequestOptions::new().param("q", "1");
        let err = prepare("get", "not a url", &options, true, &SessionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn prepare_serializes_json_with_content_type() {
        let options = RequestOptions::new().json(serde_json::json!({"a": 1}));
        let p = prepare("post", URL, &options, true, &SessionConfig::default()).unwrap();
        assert_eq!(p.config.body, RequestBody::BufferedPost(br#"{"a":1}"#.to_vec()));
        assert_eq!(
            p.config.header_lines(),
            vec!["Connection: keep-alive", "Content-Type: application/json"]
        );

        let p = prepare("put", URL, &options, true, &SessionConfig::default()).unwrap();
        assert_eq!(
            p.config.header_lines(),
            vec!["Connection: keep-alive", "Content-Type: application/json", "Expect:"]
        );
    }

    #[test]
    fn prepare_prefers_data_over_json() {
        let options = RequestOptions::new()
            .data("raw")
            .json(serde_json::json!({"ignored": true}));
        let p = prepare("post", URL, &options, true, &SessionConfig::default()).unwrap();
        assert_eq!(p.config.body, RequestBody::BufferedPost(b"raw".to_vec()));
        assert!(matches!(p.config.header("Content-Type"), Some(HeaderDirective::Blank { .. })));
    }

    #[test]
    fn prepare_uses_default_redirects_unless_overridden() {
        let session = SessionConfig::default();
        let p = prepare("head", URL, &RequestOptions::new(), false, &session).unwrap();
        assert!(!p.config.follow_redirects);
        let options = RequestOptions::new().allow_redirects(true);
        let p = prepare("head", URL, &options, false, &session).unwrap();
        assert!(p.config.follow_redirects);
    }
}
