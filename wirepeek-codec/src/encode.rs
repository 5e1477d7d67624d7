use base64::Engine;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved characters.
const RAW_URL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes `input` with RFC 3986 "raw" rules: a space becomes `%20`,
/// never `+`.
pub fn url_encode_bytes(input: &[u8]) -> String {
    percent_encoding::percent_encode(input, RAW_URL).to_string()
}

pub fn url_encode_str(input: &str) -> String {
    url_encode_bytes(input.as_bytes())
}

pub fn base64_encode_bytes(input: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(input)
}

pub fn data_uri(mime_type: &str, input: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, base64_encode_bytes(input))
}
