use std::fmt;
use std::str::FromStr;

use log::debug;
use url::Url;
use wirepeek_codec::Boundary;

use crate::body::encode_body;
use crate::{CookieList, HeaderList, Payload, WebError};

pub const DEFAULT_USER_AGENT: &str = "wirepeek/0.1";

const COOKIE_HEADER: &str = "Cookie";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }

    /// HEAD, GET and DELETE never carry a body; their payload is ignored.
    pub fn allows_body(&self) -> bool {
        matches!(self, Method::Put | Method::Post)
    }
}

impl FromStr for Method {
    type Err = WebError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HEAD" => Ok(Method::Head),
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            "POST" => Ok(Method::Post),
            "DELETE" => Ok(Method::Delete),
            _ => Err(WebError::UnsupportedMethod(value.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, Scheme::Https)
    }
}

/// Where an open request goes. `user` and `password` are kept as parsed but
/// never turned into headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub method: Method,
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub query: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Target {
    /// The scheme must be exactly `http://` or `https://` and an authority
    /// must follow it. Path and query are kept as written; only the fragment
    /// is dropped.
    pub fn parse(method: &str, url: &str) -> Result<Self, WebError> {
        let method = method.parse::<Method>()?;
        let url = url.trim();

        let (scheme, rest) = if let Some(rest) = url.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else if let Some(rest) = url.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else {
            return Err(WebError::InvalidUrl(format!(
                "{url}: scheme must be http or https"
            )));
        };
        let authority_end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
        if authority_end == 0 {
            return Err(WebError::InvalidUrl(format!("{url}: missing host")));
        }
        let (path, query) = split_request_target(&rest[authority_end..]);

        let parsed =
            Url::parse(url).map_err(|err| WebError::InvalidUrl(format!("{url}: {err}")))?;
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| WebError::InvalidUrl(format!("{url}: missing host")))?
            .to_string();
        let port = parsed.port().unwrap_or_else(|| scheme.default_port());
        let user = Some(parsed.username())
            .filter(|user| !user.is_empty())
            .map(str::to_string);
        let password = parsed.password().map(str::to_string);

        Ok(Self {
            method,
            scheme,
            host,
            port,
            path,
            query,
            user,
            password,
        })
    }

    /// `host:port`, as handed to the transport.
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The path plus `?query` when a query is present.
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Splits what follows the authority into path and query, verbatim. An empty
/// path becomes `/` and an empty query counts as none.
fn split_request_target(target: &str) -> (String, Option<String>) {
    let target = target
        .split_once('#')
        .map_or(target, |(before, _)| before);
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let path = if path.is_empty() { "/" } else { path };
    let query = query.filter(|query| !query.is_empty()).map(str::to_string);
    (path.to_string(), query)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Open(Target),
    Sent,
}

/// Request-scoped state: target, headers and cookies for the next request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    state: RequestState,
    headers: HeaderList,
    cookies: CookieList,
    user_agent: String,
    boundary: Option<Boundary>,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        let mut spec = Self {
            state: RequestState::Idle,
            headers: HeaderList::new(),
            cookies: CookieList::new(),
            user_agent: user_agent.to_string(),
            boundary: None,
        };
        spec.reset();
        spec
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn target(&self) -> Option<&Target> {
        match &self.state {
            RequestState::Open(target) => Some(target),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, RequestState::Open(_))
    }

    /// Validates `method` and `url` and moves to `Open`. On error nothing changes.
    pub fn open(&mut self, method: &str, url: &str) -> Result<(), WebError> {
        let target = Target::parse(method, url)?;
        debug!(
            "open {} {}://{}{}",
            target.method,
            target.scheme.as_str(),
            target.host_port(),
            target.request_target()
        );
        self.state = RequestState::Open(target);
        Ok(())
    }

    /// Sets a request header. `Cookie` is reserved for [`RequestSpec::set_cookie`]
    /// and is ignored here, as is an empty name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(COOKIE_HEADER) {
            return;
        }
        self.headers.set(name, value.trim());
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.set(name, value);
    }

    /// Fixes the multipart boundary for the next request instead of generating one.
    pub fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = Some(boundary);
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn cookies(&self) -> &CookieList {
        &self.cookies
    }

    /// Request line, `Host`, the header list, the `Cookie` line and the
    /// terminating blank line.
    pub fn build_preamble(&self) -> Result<Vec<u8>, WebError> {
        let target = self.target().ok_or(WebError::NotOpen)?;
        Ok(self.preamble(target, &self.headers))
    }

    /// Serializes the whole request. Body headers are added to a copy of the
    /// header list, so the spec's own headers stay as the caller set them.
    pub fn build(&self, payload: &mut Payload<'_>) -> Result<Vec<u8>, WebError> {
        let target = self.target().ok_or(WebError::NotOpen)?;
        if !target.method.allows_body() {
            return Ok(self.preamble(target, &self.headers));
        }

        let body = encode_body(payload, self.boundary.as_ref())?;
        let mut headers = self.headers.clone();
        if let Some(content_type) = &body.content_type {
            headers.set("Content-Type", content_type);
        }
        headers.set("Content-Length", &body.bytes.len().to_string());

        let mut bytes = self.preamble(target, &headers);
        bytes.extend_from_slice(&body.bytes);
        Ok(bytes)
    }

    pub fn mark_sent(&mut self) {
        self.state = RequestState::Sent;
    }

    /// Back to `Idle` with the default headers and no cookies.
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
        self.headers = HeaderList::new();
        self.headers.set("User-Agent", &self.user_agent);
        self.headers.set("Accept", "*/*");
        self.headers.set("Connection", "close");
        self.headers.set("Cache-Control", "no-cache");
        self.cookies.clear();
        self.boundary = None;
    }

    fn preamble(&self, target: &Target, headers: &HeaderList) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(
            format!("{} {} HTTP/1.1\r\n", target.method, target.request_target()).as_bytes(),
        );
        bytes.extend_from_slice(format!("Host: {}\r\n", target.host).as_bytes());
        for (name, value) in headers.iter() {
            bytes.extend_from_slice(name.as_bytes());
            bytes.extend_from_slice(b": ");
            bytes.extend_from_slice(value.as_bytes());
            bytes.extend_from_slice(b"\r\n");
        }
        if let Some(cookies) = self.cookies.header_value() {
            bytes.extend_from_slice(format!("{COOKIE_HEADER}: {cookies}\r\n").as_bytes());
        }
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}
