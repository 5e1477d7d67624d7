use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: HttpVersion,
    pub status_code: u16,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    Other(String),
}

/// One `Set-Cookie` header, broken into its attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub same_site: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// Unrecognized `attr=value` tokens that followed the cookie's own pair.
    pub extensions: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    /// Fail the whole response when a cookie `expires` date cannot be parsed,
    /// instead of dropping just that attribute.
    pub strict_cookie_dates: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_header_bytes: 64 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
            strict_cookie_dates: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub kind: ParseWarningKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarningKind {
    UnknownVersion(String),
    ObsFoldDetected,
    MissingColon,
    NonUtf8Headers,
    InvalidCookieExpires(String),
    InvalidCookieMaxAge(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at byte {offset})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("no header/body separator found")]
    MissingHeaderTerminator,
    #[error("header block too large")]
    HeaderTooLarge,
    #[error("body too large")]
    BodyTooLarge,
    #[error("invalid cookie expires date: {0}")]
    InvalidCookieExpires(String),
}
