use std::time::Duration;

use thiserror::Error;
use wirepeek_net::ParseError;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid form field: {0}")]
    InvalidField(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request is not open")]
    NotOpen,
    #[error("connect error: {0}")]
    Connect(#[from] TransportError),
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] ParseError),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot connect to {addr}: {message}")]
    Connect { addr: String, message: String },
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("transport IO error: {0}")]
    Io(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("response exceeded {0} bytes")]
    ResponseTooLarge(usize),
}
