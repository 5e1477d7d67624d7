use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::cookie::parse_set_cookie;
use super::types::{
    Cookie, Header, HttpVersion, Limits, ParseError, ParseErrorKind, ParseWarning,
    ParseWarningKind, StatusLine,
};

const CRLF: &[u8] = b"\r\n";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HTTP/(\S+) ([1-5][0-9]{2})(?: (.*))?$").expect("status line pattern is valid")
});

/// A fully buffered HTTP/1.x response: status, headers, cookies and body.
///
/// The body is everything after the first CRLFCRLF, taken verbatim. No
/// chunked or content-encoding handling is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePeek {
    status_line: Option<StatusLine>,
    headers: Vec<Header>,
    cookies: Vec<Cookie>,
    body: Vec<u8>,
    warnings: Vec<ParseWarning>,
}

impl ResponsePeek {
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        ResponseParser::new().parse(raw)
    }

    pub fn status(&self) -> Option<u16> {
        self.status_line.as_ref().map(|line| line.status_code)
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status_line.as_ref()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// An empty `name` returns every header. Otherwise returns the headers
    /// whose name matches case-insensitively, or `None` if there are none.
    pub fn get_header(&self, name: &str) -> Option<Vec<&Header>> {
        if name.is_empty() {
            return Some(self.headers.iter().collect());
        }
        let matches: Vec<&Header> = self
            .headers
            .iter()
            .filter(|header| header.name.eq_ignore_ascii_case(name))
            .collect();
        (!matches.is_empty()).then_some(matches)
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Same contract as [`ResponsePeek::get_header`], over cookie names.
    pub fn get_cookie(&self, name: &str) -> Option<Vec<&Cookie>> {
        if name.is_empty() {
            return Some(self.cookies.iter().collect());
        }
        let matches: Vec<&Cookie> = self
            .cookies
            .iter()
            .filter(|cookie| cookie.name.eq_ignore_ascii_case(name))
            .collect();
        (!matches.is_empty()).then_some(matches)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }
}

#[derive(Debug, Default, Clone)]
pub struct ResponseParser {
    limits: Limits,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn parse(&self, raw: &[u8]) -> Result<ResponsePeek, ParseError> {
        let mut warnings = Vec::new();

        let headers_end = find_headers_end(raw, self.limits)?;
        let body_start = headers_end + HEADER_TERMINATOR.len();
        let body = &raw[body_start..];
        if body.len() > self.limits.max_body_bytes {
            return Err(ParseError {
                kind: ParseErrorKind::BodyTooLarge,
                offset: body_start,
            });
        }

        let head = &raw[..headers_end];
        if let Err(err) = std::str::from_utf8(head) {
            warnings.push(ParseWarning {
                kind: ParseWarningKind::NonUtf8Headers,
                offset: err.valid_up_to(),
            });
        }

        let mut status_line = None;
        let mut headers = Vec::new();
        let mut cookies = Vec::new();

        for (offset, line) in unfold_lines(head, &mut warnings) {
            if line.is_empty() {
                continue;
            }

            if let Some(parsed) = parse_status_line(&line, offset, &mut warnings) {
                status_line = Some(parsed);
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                warnings.push(ParseWarning {
                    kind: ParseWarningKind::MissingColon,
                    offset,
                });
                continue;
            };
            let name = name.trim();
            let value = value.trim();

            if name.eq_ignore_ascii_case("set-cookie") {
                let mut cookie_warnings = Vec::new();
                let cookie = parse_set_cookie(
                    value,
                    self.limits.strict_cookie_dates,
                    &mut cookie_warnings,
                )
                .map_err(|kind| ParseError { kind, offset })?;
                warnings.extend(
                    cookie_warnings
                        .into_iter()
                        .map(|kind| ParseWarning { kind, offset }),
                );
                cookies.push(cookie);
            } else {
                headers.push(Header {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(ResponsePeek {
            status_line,
            headers,
            cookies,
            body: body.to_vec(),
            warnings,
        })
    }
}

fn find_headers_end(raw: &[u8], limits: Limits) -> Result<usize, ParseError> {
    match twoway::find_bytes(raw, HEADER_TERMINATOR) {
        Some(index) if index > limits.max_header_bytes => Err(ParseError {
            kind: ParseErrorKind::HeaderTooLarge,
            offset: limits.max_header_bytes,
        }),
        Some(index) => Ok(index),
        None if raw.len() > limits.max_header_bytes => Err(ParseError {
            kind: ParseErrorKind::HeaderTooLarge,
            offset: limits.max_header_bytes,
        }),
        None => Err(ParseError {
            kind: ParseErrorKind::MissingHeaderTerminator,
            offset: raw.len(),
        }),
    }
}

/// Splits the header block on CRLF, joining obs-fold continuation lines onto
/// the line before them. Each logical line carries the raw byte offset it
/// started at; lines are decoded only after splitting so invalid UTF-8 does
/// not shift later offsets.
fn unfold_lines(head: &[u8], warnings: &mut Vec<ParseWarning>) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    let mut offset = 0;

    for raw_line in split_crlf(head) {
        let line = String::from_utf8_lossy(raw_line);
        let folded = line.starts_with([' ', '\t']);
        if folded {
            warnings.push(ParseWarning {
                kind: ParseWarningKind::ObsFoldDetected,
                offset,
            });
        }
        match lines.last_mut() {
            Some((_, previous)) if folded && !previous.is_empty() => {
                previous.push(' ');
                previous.push_str(line.trim());
            }
            _ => lines.push((offset, line.into_owned())),
        }
        offset += raw_line.len() + CRLF.len();
    }

    lines
}

fn split_crlf(mut bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    while let Some(index) = twoway::find_bytes(bytes, CRLF) {
        lines.push(&bytes[..index]);
        bytes = &bytes[index + CRLF.len()..];
    }
    lines.push(bytes);
    lines
}

fn parse_status_line(
    line: &str,
    offset: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<StatusLine> {
    let captures = STATUS_LINE.captures(line)?;
    let status_code = captures.get(2)?.as_str().parse::<u16>().ok()?;
    let version = parse_http_version(captures.get(1)?.as_str(), offset, warnings);
    let reason = captures
        .get(3)
        .map(|reason| reason.as_str().to_string())
        .unwrap_or_default();

    Some(StatusLine {
        version,
        status_code,
        reason,
    })
}

fn parse_http_version(
    version_raw: &str,
    offset: usize,
    warnings: &mut Vec<ParseWarning>,
) -> HttpVersion {
    match version_raw {
        "1.0" => HttpVersion::Http10,
        "1.1" => HttpVersion::Http11,
        other => {
            warnings.push(ParseWarning {
                kind: ParseWarningKind::UnknownVersion(other.to_string()),
                offset,
            });
            HttpVersion::Other(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ResponseParser, ResponsePeek};
    use crate::http1::{HttpVersion, Limits, ParseErrorKind, ParseWarning, ParseWarningKind};

    const SAMPLE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nSet-Cookie: id=7; Path=/; HttpOnly\r\n\r\nhello";

    #[test]
    fn parses_sample_response() {
        let response = ResponsePeek::parse(SAMPLE).unwrap();

        assert_eq!(response.status(), Some(200));
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers()[0].name, "Content-Type");
        assert_eq!(response.headers()[0].value, "text/plain");

        assert_eq!(response.cookies().len(), 1);
        let cookie = &response.cookies()[0];
        assert_eq!(cookie.name, "id");
        assert_eq!(cookie.value, "7");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert!(cookie.http_only);
        assert!(!cookie.secure);
        assert!(cookie.expires.is_none());

        assert_eq!(response.body(), b"hello");
        assert!(response.warnings().is_empty());
    }

    #[test]
    fn records_status_line_parts() {
        let response = ResponsePeek::parse(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
        let line = response.status_line().unwrap();
        assert_eq!(line.version, HttpVersion::Http10);
        assert_eq!(line.status_code, 404);
        assert_eq!(line.reason, "Not Found");
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn accepts_status_line_without_reason() {
        let response = ResponsePeek::parse(b"HTTP/1.1 204\r\n\r\n").unwrap();
        assert_eq!(response.status(), Some(204));
        assert_eq!(response.status_line().unwrap().reason, "");
    }

    #[test]
    fn out_of_range_status_is_not_a_status_line() {
        let response = ResponsePeek::parse(b"HTTP/1.1 600 Odd\r\nA: b\r\n\r\n").unwrap();
        assert_eq!(response.status(), None);
        assert!(
            response
                .warnings()
                .iter()
                .any(|warning| warning.kind == ParseWarningKind::MissingColon)
        );
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn keeps_duplicate_headers_in_order() {
        let input = b"HTTP/1.1 200 OK\r\nVia: a\r\nX-Other: 1\r\nvia: b\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();

        let via = response.get_header("VIA").unwrap();
        assert_eq!(via.len(), 2);
        assert_eq!(via[0].value, "a");
        assert_eq!(via[1].name, "via");
        assert_eq!(via[1].value, "b");
    }

    #[test]
    fn empty_header_name_returns_all() {
        let response = ResponsePeek::parse(SAMPLE).unwrap();
        assert_eq!(response.get_header("").unwrap().len(), 1);
        assert!(response.get_header("x-missing").is_none());
    }

    #[test]
    fn cookie_lookup_is_case_insensitive() {
        let input = b"HTTP/1.1 200 OK\r\nSet-Cookie: Token=1\r\nset-cookie: other=2; Secure\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();

        assert_eq!(response.get_cookie("").unwrap().len(), 2);
        let token = response.get_cookie("token").unwrap();
        assert_eq!(token.len(), 1);
        assert_eq!(token[0].value, "1");
        assert!(response.get_cookie("missing").is_none());
        assert!(response.get_header("set-cookie").is_none());
    }

    #[test]
    fn header_value_keeps_colons() {
        let input = b"HTTP/1.1 302 Found\r\nLocation: http://example.com:8080/x\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();
        assert_eq!(
            response.get_header("location").unwrap()[0].value,
            "http://example.com:8080/x"
        );
    }

    #[test]
    fn body_is_taken_verbatim() {
        let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();
        assert_eq!(response.body(), b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn binary_body_survives() {
        let mut input = b"HTTP/1.1 200 OK\r\n\r\n".to_vec();
        input.extend_from_slice(&[0x00, 0xff, 0xfe, b'\r', b'\n']);
        let response = ResponsePeek::parse(&input).unwrap();
        assert_eq!(response.body(), &[0x00, 0xff, 0xfe, b'\r', b'\n']);
    }

    #[test]
    fn missing_separator_is_an_error() {
        let err = ResponsePeek::parse(b"HTTP/1.1 200 OK\r\nA: b\r\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingHeaderTerminator);
    }

    #[test]
    fn joins_folded_header_lines() {
        let input = b"HTTP/1.1 200 OK\r\nX-Long: one\r\n\ttwo\r\n  three\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();
        assert_eq!(response.get_header("x-long").unwrap()[0].value, "one two three");
        assert_eq!(
            response
                .warnings()
                .iter()
                .filter(|warning| warning.kind == ParseWarningKind::ObsFoldDetected)
                .count(),
            2
        );
    }

    #[test]
    fn warns_on_unknown_version() {
        let response = ResponsePeek::parse(b"HTTP/9.9 200 OK\r\n\r\n").unwrap();
        assert_eq!(
            response.status_line().unwrap().version,
            HttpVersion::Other("9.9".to_string())
        );
        assert!(
            response
                .warnings()
                .iter()
                .any(|warning| matches!(warning.kind, ParseWarningKind::UnknownVersion(_)))
        );
    }

    #[test]
    fn lenient_cookie_date_keeps_cookie() {
        let input = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1; Expires=someday\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();
        assert_eq!(response.cookies().len(), 1);
        assert!(response.cookies()[0].expires.is_none());
        assert!(
            response
                .warnings()
                .iter()
                .any(|warning| matches!(warning.kind, ParseWarningKind::InvalidCookieExpires(_)))
        );
    }

    #[test]
    fn strict_cookie_date_fails_response() {
        let parser = ResponseParser::with_limits(Limits {
            strict_cookie_dates: true,
            ..Limits::default()
        });
        let input = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1; Expires=someday\r\n\r\n";
        let err = parser.parse(input).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidCookieExpires("someday".to_string())
        );
        assert_eq!(err.offset, 17);
    }

    #[test]
    fn supports_header_limit() {
        let parser = ResponseParser::with_limits(Limits {
            max_header_bytes: 10,
            ..Limits::default()
        });
        let err = parser.parse(SAMPLE).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::HeaderTooLarge);
    }

    #[test]
    fn supports_body_limit() {
        let parser = ResponseParser::with_limits(Limits {
            max_body_bytes: 2,
            ..Limits::default()
        });
        let err = parser.parse(SAMPLE).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BodyTooLarge);
    }

    #[test]
    fn non_utf8_headers_are_decoded_lossily() {
        let input = b"HTTP/1.1 200 OK\r\nX-Name: caf\xe9\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();
        assert_eq!(response.get_header("x-name").unwrap()[0].value, "caf\u{fffd}");
        assert!(
            response
                .warnings()
                .iter()
                .any(|warning| warning.kind == ParseWarningKind::NonUtf8Headers)
        );
    }

    #[test]
    fn warning_offsets_count_raw_bytes_after_invalid_utf8() {
        let input = b"HTTP/1.1 200 OK\r\nX: caf\xe9\r\nY: z\r\nbad\r\n\r\n";
        let response = ResponsePeek::parse(input).unwrap();

        assert_eq!(response.get_header("x").unwrap()[0].value, "caf\u{fffd}");
        assert_eq!(response.get_header("y").unwrap()[0].value, "z");
        assert_eq!(
            response.warnings(),
            &[
                ParseWarning {
                    kind: ParseWarningKind::NonUtf8Headers,
                    offset: 23,
                },
                ParseWarning {
                    kind: ParseWarningKind::MissingColon,
                    offset: 32,
                },
            ]
        );
    }
}
