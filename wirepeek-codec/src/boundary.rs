use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{CodecError, md5_hex};

pub const BOUNDARY_PREFIX: &str = "---------------------------";

const MAX_BOUNDARY_LEN: usize = 70;
const TOKEN_LEN: usize = 10;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A multipart/form-data boundary token, without the leading `--`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Builds a fresh boundary: the dash prefix followed by ten hex characters.
    ///
    /// The hex token is derived from a process-wide sequence number mixed with
    /// a random salt, so two boundaries generated by the same process never
    /// collide even if the random source repeats.
    pub fn generate() -> Self {
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let salt: u64 = rand::random();
        let digest = md5_hex(format!("{sequence}:{salt}").as_bytes());
        Self(format!("{BOUNDARY_PREFIX}{}", &digest[..TOKEN_LEN]))
    }

    /// Accepts a caller-chosen boundary if it is legal per RFC 2046.
    pub fn new(value: impl Into<String>) -> Result<Self, CodecError> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_BOUNDARY_LEN {
            return Err(CodecError::Boundary(format!(
                "length must be 1..={MAX_BOUNDARY_LEN}, got {}",
                value.len()
            )));
        }
        if let Some(invalid) = value.chars().find(|ch| !is_bchar(*ch)) {
            return Err(CodecError::Boundary(format!(
                "character {invalid:?} is not allowed"
            )));
        }
        if value.ends_with(' ') {
            return Err(CodecError::Boundary("must not end with a space".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `--<boundary>`, the delimiter that opens every part.
    pub fn delimiter(&self) -> String {
        format!("--{}", self.0)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_bchar(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' | ' '
        )
}
