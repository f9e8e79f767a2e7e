//! Async connector on tokio: resolve, connect, optional TLS handshake.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, lookup_host};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::url::UrlDescriptor;
use crate::transport::{Connect, tls};

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Opens plain or TLS connections with tokio.
///
/// The connect timeout is applied by the client around [`Connect::connect`],
/// so dropping the future here is what aborts a stalled attempt.
#[derive(Clone)]
pub struct TcpConnector {
    tls: TlsConnector,
}

impl TcpConnector {
    pub fn new(config: &Config) -> Result<Self> {
        let tls = TlsConnector::from(tls::client_config(&config.tls)?);
        Ok(Self { tls })
    }
}

impl Connect for TcpConnector {
    type Stream = HttpStream;

    async fn connect(&self, target: &UrlDescriptor) -> Result<HttpStream> {
        let host = target.connect_host();

        let addrs = lookup_host((host, target.port()))
            .await
            .map_err(Error::Connection)?;

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::trace!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let tcp = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(Error::Connection(e)),
            (None, None) => {
                return Err(Error::Connection(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses for {host}"),
                )));
            }
        };
        let _ = tcp.set_nodelay(true);

        tracing::trace!(host, port = target.port(), tls = target.is_tls(), "tcp connected");

        if !target.is_tls() {
            return Ok(HttpStream::Plain(tcp));
        }

        let server_name = tls::server_name(host)?;
        // Alerts and bad certificates arrive as InvalidData; resets and
        // early EOF stay connection errors
        let secured = self
            .tls
            .connect(server_name, tcp)
            .await
            .map_err(Error::from_connect)?;

        tracing::trace!(host, "tls handshake complete");

        Ok(HttpStream::Tls(Box::new(secured)))
    }
}
