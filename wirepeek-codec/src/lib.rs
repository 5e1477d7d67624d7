mod boundary;
mod encode;
mod error;
mod hash;

pub use boundary::{BOUNDARY_PREFIX, Boundary};
pub use encode::{base64_encode_bytes, data_uri, url_encode_bytes, url_encode_str};
pub use error::CodecError;
pub use hash::md5_hex;
