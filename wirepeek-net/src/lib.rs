mod http1;

pub use http1::{
    Cookie, Header, HttpVersion, Limits, ParseError, ParseErrorKind, ParseWarning,
    ParseWarningKind, ResponseParser, ResponsePeek, StatusLine, parse_cookie_date,
};
