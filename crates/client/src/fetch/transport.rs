//! Transport: one TCP or TLS connection per request.
//!
//! `Transport` is the seam the fetch orchestrator talks to. `TcpTransport`
//! opens a fresh socket for every exchange, writes the serialized request,
//! reads until the server closes, and drops the connection.

use super::response::read_all;
use super::tls::{TlsPolicy, client_config};
use async_trait::async_trait;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use textweb_core::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use url::{Host, Url};

/// Where to connect for a given URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host to resolve, without IPv6 brackets.
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Target {
    /// Derive host, port, and TLS flag from a URL.
    ///
    /// The port defaults to 443 for `https` and 80 for `http`.
    pub fn from_url(url: &Url) -> Result<Self, Error> {
        let tls = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(Error::InvalidUrl(format!("unsupported scheme: {other}"))),
        };

        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(Error::InvalidUrl(format!("URL has no host: {url}"))),
        };

        let port = url.port().unwrap_or(if tls { 443 } else { 80 });

        Ok(Self { host, port, tls })
    }
}

/// An open byte stream, plain or TLS-wrapped.
pub enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Connection {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Connection::Tls(stream) => Pin::new(&mut **stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Connection::Tls(stream) => Pin::new(&mut **stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Connection::Tls(stream) => Pin::new(&mut **stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Connection::Tls(stream) => Pin::new(&mut **stream).poll_shutdown(cx),
        }
    }
}

/// Open a connection to `target`, performing the TLS handshake if needed.
///
/// # Errors
///
/// DNS, TCP, and handshake failures map to `Error::Connection`; exceeding
/// `timeout` on either step maps to `Error::Timeout`.
pub async fn open(target: &Target, tls_config: Arc<ClientConfig>, timeout: Duration) -> Result<Connection, Error> {
    let addr = format!("{}:{}", target.host, target.port);

    let tcp = match tokio::time::timeout(timeout, TcpStream::connect((target.host.as_str(), target.port))).await {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => return Err(Error::Connection(format!("failed to connect to {addr}: {e}"))),
        Err(_) => return Err(Error::Timeout(format!("connect to {addr} after {}ms", timeout.as_millis()))),
    };

    if !target.tls {
        tracing::debug!("connected to {}", addr);
        return Ok(Connection::Plain(tcp));
    }

    let server_name = ServerName::try_from(target.host.clone())
        .map_err(|e| Error::Connection(format!("invalid server name {}: {e}", target.host)))?;

    let connector = TlsConnector::from(tls_config);
    let stream = match tokio::time::timeout(timeout, connector.connect(server_name, tcp)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(Error::Connection(format!("TLS handshake with {addr} failed: {e}"))),
        Err(_) => return Err(Error::Timeout(format!("TLS handshake with {addr} after {}ms", timeout.as_millis()))),
    };

    tracing::debug!("connected to {} over TLS", addr);
    Ok(Connection::Tls(Box::new(stream)))
}

/// Exchanges one serialized request for the raw response bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to the server for `url` and return everything it
    /// sends back before closing the connection.
    async fn exchange(&self, url: &Url, request: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Socket-backed transport.
#[derive(Clone)]
pub struct TcpTransport {
    tls_config: Arc<ClientConfig>,
    timeout: Duration,
    max_bytes: usize,
}

impl TcpTransport {
    pub fn new(policy: TlsPolicy, timeout: Duration, max_bytes: usize) -> Result<Self, Error> {
        Ok(Self { tls_config: client_config(policy)?, timeout, max_bytes })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn exchange(&self, url: &Url, request: &[u8]) -> Result<Vec<u8>, Error> {
        let target = Target::from_url(url)?;
        let mut conn = open(&target, self.tls_config.clone(), self.timeout).await?;

        let send = async {
            conn.write_all(request).await?;
            conn.flush().await
        };
        match tokio::time::timeout(self.timeout, send).await {
            Ok(sent) => sent?,
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "sending request to {} after {}ms",
                    target.host,
                    self.timeout.as_millis()
                )));
            }
        }

        let received = match tokio::time::timeout(self.timeout, read_all(&mut conn, self.max_bytes)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "reading response from {} after {}ms",
                    target.host,
                    self.timeout.as_millis()
                )));
            }
        };

        tracing::debug!("read {} bytes from {}", received.len(), url);
        Ok(received)
    }
}
