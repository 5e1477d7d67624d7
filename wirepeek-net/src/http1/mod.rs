mod cookie;
mod parser;
mod types;

pub use cookie::parse_cookie_date;
pub use parser::{ResponseParser, ResponsePeek};
pub use types::{
    Cookie, Header, HttpVersion, Limits, ParseError, ParseErrorKind, ParseWarning,
    ParseWarningKind, StatusLine,
};
