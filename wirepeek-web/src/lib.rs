mod body;
mod config;
mod error;
mod form;
mod headers;
mod request;
mod session;
mod source;
mod transport;

pub use body::{EncodedBody, Payload, encode_body, encode_multipart, encode_urlencoded};
pub use config::ClientConfig;
pub use error::{TransportError, WebError};
pub use form::{FieldValue, FormField, FormPayload};
pub use headers::{CookieList, HeaderList};
pub use request::{DEFAULT_USER_AGENT, Method, RequestSpec, RequestState, Scheme, Target};
pub use session::Session;
pub use source::{ByteSource, FileMetadata, FileSource, LocalFiles, sniff_mime_type};
pub use transport::{TcpTransport, Transport};
pub use wirepeek_codec::Boundary;
pub use wirepeek_net::{Cookie, Header, Limits, ParseWarning, ResponsePeek, StatusLine};
