use std::future::Future;
use std::time::Duration;

use log::{trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::{ClientConfig, TransportError};

const READ_CHUNK: usize = 8192;

/// Moves one serialized request to `host_port` and returns every byte the
/// peer sent back before closing the connection.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        host_port: &str,
        use_tls: bool,
        request: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Plain TCP, or TLS through native-tls. One connection per request, read
/// until EOF.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_response_bytes: usize,
    pub accept_invalid_certs: bool,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl TcpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            max_response_bytes: config
                .max_header_bytes
                .saturating_add(config.max_response_bytes),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    async fn connect(&self, host_port: &str) -> Result<TcpStream, TransportError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(host_port))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|err| TransportError::Connect {
                addr: host_port.to_string(),
                message: err.to_string(),
            })?;
        stream
            .set_nodelay(true)
            .map_err(|err| TransportError::Io(err.to_string()))?;
        Ok(stream)
    }

    async fn exchange<S>(&self, mut stream: S, request: &[u8]) -> Result<Vec<u8>, TransportError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        timeout(self.read_timeout, stream.write_all(request))
            .await
            .map_err(|_| TransportError::Timeout(self.read_timeout))?
            .map_err(|err| TransportError::Io(err.to_string()))?;
        trace!("wrote {} request bytes", request.len());

        let mut buffer = vec![0u8; READ_CHUNK];
        let mut response = Vec::new();
        loop {
            let read = timeout(self.read_timeout, stream.read(&mut buffer))
                .await
                .map_err(|_| TransportError::Timeout(self.read_timeout))?;
            let n = match read {
                Ok(n) => n,
                // Peers that drop TLS without close_notify still sent a full response.
                Err(err)
                    if err.kind() == std::io::ErrorKind::UnexpectedEof && !response.is_empty() =>
                {
                    0
                }
                Err(err) => return Err(TransportError::Io(err.to_string())),
            };
            if n == 0 {
                break;
            }
            if response.len() + n > self.max_response_bytes {
                return Err(TransportError::ResponseTooLarge(self.max_response_bytes));
            }
            response.extend_from_slice(&buffer[..n]);
        }
        trace!("read {} response bytes", response.len());
        Ok(response)
    }
}

impl Transport for TcpTransport {
    async fn send(
        &self,
        host_port: &str,
        use_tls: bool,
        request: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        let stream = self.connect(host_port).await.inspect_err(|err| {
            warn!("connect to {host_port} failed: {err}");
        })?;
        if !use_tls {
            return self.exchange(stream, request).await;
        }

        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|err| TransportError::Tls(err.to_string()))?;
        let connector = tokio_native_tls::TlsConnector::from(connector);
        let stream = timeout(
            self.connect_timeout,
            connector.connect(tls_domain(host_port), stream),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.connect_timeout))?
        .map_err(|err| {
            warn!("TLS handshake with {host_port} failed: {err}");
            TransportError::Tls(err.to_string())
        })?;
        self.exchange(stream, request).await
    }
}

/// The SNI name for `host:port`: the host with any port and IPv6 brackets removed.
pub(crate) fn tls_domain(host_port: &str) -> &str {
    let host = match host_port.rsplit_once(':') {
        Some((host, port))
            if !port.is_empty() && port.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            host
        }
        _ => host_port,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}
