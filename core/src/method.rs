//! HTTP methods and the per-method transfer policy.
//!
//! # Design
//! Every token is a valid method. The seven well-known ones get their own
//! variants so the policy table can match on them; everything else lands in
//! `Other` and is treated like OPTIONS. Nothing is rejected here.

use std::fmt;

use caseless::Caseless;

/// An HTTP request method, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Other(String),
}

impl Method {
    /// Normalize a method token: full case-fold, then upper-case.
    pub fn parse(token: &str) -> Method {
        let folded: String = token.chars().default_case_fold().collect();
        let upper = folded.to_uppercase();
        match upper.as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "OPTIONS" => Method::Options,
            _ => Method::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Other(token) => token,
        }
    }

    pub fn policy(&self) -> MethodPolicy {
        MethodPolicy::for_method(self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Method {
        Method::parse(token)
    }
}

/// Value of the `Connection` header a method asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    KeepAlive,
    Close,
}

impl Connection {
    pub fn as_str(self) -> &'static str {
        match self {
            Connection::KeepAlive => "keep-alive",
            Connection::Close => "close",
        }
    }
}

/// How a request body reaches the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// The transport copies a fixed buffer and sends it as a POST body.
    BufferedPost,
    /// The transport reads a stream whose length is announced up front.
    StreamedWithLength,
}

/// Transfer directives for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodPolicy {
    /// An absent body is replaced by an empty one.
    pub sends_body_by_default: bool,
    /// The transport must not read a response body (HEAD).
    pub forces_no_body_semantics: bool,
    /// The literal method token must be sent as a custom request even
    /// without a body.
    pub requires_custom_verb_directive: bool,
    pub default_connection: Connection,
    pub upload_mode: UploadMode,
}

impl MethodPolicy {
    pub fn for_method(method: &Method) -> MethodPolicy {
        let base = MethodPolicy {
            sends_body_by_default: false,
            forces_no_body_semantics: false,
            requires_custom_verb_directive: false,
            default_connection: Connection::KeepAlive,
            upload_mode: UploadMode::StreamedWithLength,
        };
        match method {
            Method::Get => base,
            Method::Head => MethodPolicy {
                forces_no_body_semantics: true,
                ..base
            },
            Method::Post => MethodPolicy {
                sends_body_by_default: true,
                upload_mode: UploadMode::BufferedPost,
                ..base
            },
            Method::Put => MethodPolicy {
                sends_body_by_default: true,
                ..base
            },
            Method::Delete | Method::Patch => MethodPolicy {
                sends_body_by_default: true,
                requires_custom_verb_directive: true,
                ..base
            },
            Method::Options | Method::Other(_) => MethodPolicy {
                requires_custom_verb_directive: true,
                ..base
            },
        }
    }
}
