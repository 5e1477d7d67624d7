use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wirepeek_net::Limits;

use crate::WebError;
use crate::request::DEFAULT_USER_AGENT;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub max_header_bytes: usize,
    pub max_response_bytes: usize,
    pub accept_invalid_certs: bool,
    pub strict_cookie_dates: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_ms: 10_000,
            read_timeout_ms: 30_000,
            max_header_bytes: limits.max_header_bytes,
            max_response_bytes: limits.max_body_bytes,
            accept_invalid_certs: false,
            strict_cookie_dates: limits.strict_cookie_dates,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, WebError> {
        toml::from_str(raw).map_err(|err| WebError::Config(err.to_string()))
    }

    /// Reads a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, WebError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_response_bytes,
            strict_cookie_dates: self.strict_cookie_dates,
        }
    }
}
