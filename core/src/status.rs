//! HTTP status codes.
//!
//! # Design
//! Every integer in `100..=599` is a valid [`StatusCode`]; identity is the
//! number alone. Reason phrases live in a fixed, sorted table built at compile
//! time. A code may have no phrase (unassigned), one, or several (306 keeps
//! its withdrawn "Switch Proxy" name, 418 its RFC 2324 joke). Nothing is
//! registered at runtime.
//!
//! Names are looked up in a normalized form: case-folded, spaces and hyphens
//! replaced by `_`, apostrophes dropped, so `"I'm a teapot"`,
//! `"im_a_teapot"` and `"IM-A-TEAPOT"` all resolve to 418.

use std::fmt;

use caseless::Caseless;

/// Reason phrases, sorted by code. IANA registry plus a handful of
/// historical names.
static REASONS: &[(u16, &str)] = &[
    // Informational
    (100, "Continue"),
    (101, "Switching Protocols"),
    (102, "Processing"),
    // Successful
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (207, "Multi-Status"),
    (208, "Already Reported"),
    (226, "IM Used"),
    // Redirection
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (306, "Switch Proxy"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    // Client Error
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Payload Too Large"),
    (414, "URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (418, "I'm a teapot"),
    (421, "Misdirected Request"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    // Server Error
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage"),
    (508, "Loop Detected"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
];

/// An HTTP status code in `100..=599`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const MIN: u16 = 100;
    pub const MAX: u16 = 599;

    pub const CONTINUE: StatusCode = StatusCode(100);
    pub const SWITCHING_PROTOCOLS: StatusCode = StatusCode(101);
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const ACCEPTED: StatusCode = StatusCode(202);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const PARTIAL_CONTENT: StatusCode = StatusCode(206);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const SEE_OTHER: StatusCode = StatusCode(303);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const TEMPORARY_REDIRECT: StatusCode = StatusCode(307);
    pub const PERMANENT_REDIRECT: StatusCode = StatusCode(308);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const CONFLICT: StatusCode = StatusCode(409);
    pub const GONE: StatusCode = StatusCode(410);
    pub const IM_A_TEAPOT: StatusCode = StatusCode(418);
    pub const UNPROCESSABLE_ENTITY: StatusCode = StatusCode(422);
    pub const TOO_MANY_REQUESTS: StatusCode = StatusCode(429);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);
    pub const GATEWAY_TIMEOUT: StatusCode = StatusCode(504);

    /// Returns `None` outside `100..=599`.
    pub const fn from_u16(code: u16) -> Option<StatusCode> {
        if code >= Self::MIN && code <= Self::MAX {
            Some(StatusCode(code))
        } else {
            None
        }
    }

    /// Look a code up by one of its reason phrases, in any spelling that
    /// normalizes to the same name.
    pub fn from_name(name: &str) -> Option<StatusCode> {
        let wanted = normalize_name(name);
        REASONS
            .iter()
            .find(|(_, reason)| normalize_name(reason) == wanted)
            .map(|&(code, _)| StatusCode(code))
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// All reason phrases registered for this code, possibly none.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        self.entries().iter().map(|&(_, reason)| reason)
    }

    /// The first registered reason phrase.
    pub fn canonical_reason(self) -> Option<&'static str> {
        self.names().next()
    }

    fn entries(self) -> &'static [(u16, &'static str)] {
        let start = REASONS.partition_point(|&(code, _)| code < self.0);
        let end = REASONS.partition_point(|&(code, _)| code <= self.0);
        &REASONS[start..end]
    }

    pub fn is_informational(self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_redirection(self) -> bool {
        (300..400).contains(&self.0)
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }
}

/// Normalized lookup form of a reason phrase.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .default_case_fold()
        .filter(|&c| c != '\'')
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

impl PartialEq<u16> for StatusCode {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

impl PartialEq<StatusCode> for u16 {
    fn eq(&self, other: &StatusCode) -> bool {
        *self == other.0
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.0
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, u16> {
        StatusCode::from_u16(code).ok_or(code)
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_reason() {
            Some(reason) => write!(f, "StatusCode({} {reason})", self.0),
            None => write!(f, "StatusCode({})", self.0),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_reason() {
            Some(reason) => write!(f, "{} {reason}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
