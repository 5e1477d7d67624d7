use log::{debug, warn};
use wirepeek_codec::Boundary;
use wirepeek_net::{Limits, ResponseParser, ResponsePeek};

use crate::{ClientConfig, Payload, RequestSpec, TcpTransport, Transport, WebError};

/// One request at a time: open, configure, send, read the parsed response.
///
/// Headers, cookies and the target are request-scoped. After a response is
/// obtained the spec goes back to `Idle` with its default headers, whether or
/// not the response parsed.
#[derive(Debug)]
pub struct Session<T: Transport = TcpTransport> {
    spec: RequestSpec,
    transport: T,
    limits: Limits,
    response: Option<ResponsePeek>,
}

impl Session<TcpTransport> {
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self::with_transport(TcpTransport::new(config), config)
    }
}

impl Default for Session<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        Self {
            spec: RequestSpec::with_user_agent(&config.user_agent),
            transport,
            limits: config.limits(),
            response: None,
        }
    }

    pub fn open(&mut self, method: &str, url: &str) -> Result<(), WebError> {
        self.spec.open(method, url)
    }

    pub fn set_request_header(&mut self, name: &str, value: &str) {
        self.spec.set_header(name, value);
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.spec.set_cookie(name, value);
    }

    pub fn set_boundary(&mut self, boundary: Boundary) {
        self.spec.set_boundary(boundary);
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The response from the last successful `send`.
    pub fn response(&self) -> Option<&ResponsePeek> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<ResponsePeek> {
        self.response.take()
    }

    /// Serializes and transmits the open request, then parses the reply.
    ///
    /// A transport failure leaves the request open and rewinds a form
    /// payload, so the same call can be retried.
    pub async fn send<'a>(&mut self, payload: impl Into<Payload<'a>>) -> Result<&ResponsePeek, WebError> {
        let mut payload = payload.into();
        let target = self.spec.target().ok_or(WebError::NotOpen)?.clone();

        let request = match self.spec.build(&mut payload) {
            Ok(request) => request,
            Err(err) => {
                payload.rewind();
                return Err(err);
            }
        };
        let host_port = target.host_port();
        debug!(
            "send {} {} to {host_port} ({} bytes)",
            target.method,
            target.request_target(),
            request.len()
        );

        let raw = match self
            .transport
            .send(&host_port, target.scheme.is_tls(), &request)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!("request to {host_port} failed: {err}");
                payload.rewind();
                return Err(WebError::Connect(err));
            }
        };

        self.spec.mark_sent();
        let parsed = ResponseParser::with_limits(self.limits).parse(&raw);
        self.spec.reset();
        self.response = None;

        let response = parsed?;
        for warning in response.warnings() {
            warn!(
                "response from {host_port}: {:?} at byte {}",
                warning.kind, warning.offset
            );
        }
        debug!(
            "parsed response from {host_port}: status {:?}, {} body bytes",
            response.status(),
            response.body().len()
        );
        Ok(self.response.insert(response))
    }
}
