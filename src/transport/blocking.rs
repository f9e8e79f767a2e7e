//! Blocking connector on `std::net`.
//!
//! Connection establishment shares one deadline across every resolved
//! address and the TLS handshake; socket read timeouts enforce the per-read
//! limit afterwards.
//!
//! Name resolution goes through the system resolver (`getaddrinfo`), which
//! has no timeout parameter, so it runs before the deadline starts and is
//! bounded only by the resolver's own configuration. On the async connector
//! `connect_timeout` covers the lookup as well.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::{ClientConfig, ClientConnection, StreamOwned};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::url::UrlDescriptor;
use crate::transport::{BlockingConnect, tls};

pub enum BlockingStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for BlockingStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BlockingStream::Plain(s) => s.read(buf),
            BlockingStream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for BlockingStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BlockingStream::Plain(s) => s.write(buf),
            BlockingStream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BlockingStream::Plain(s) => s.flush(),
            BlockingStream::Tls(s) => s.flush(),
        }
    }
}

/// Opens plain or TLS connections on the calling thread.
///
/// `connect_timeout` bounds the TCP connect and the TLS handshake, not the
/// preceding DNS lookup (see the module docs).
#[derive(Clone)]
pub struct BlockingTcpConnector {
    tls: Arc<ClientConfig>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl BlockingTcpConnector {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            tls: tls::client_config(&config.tls)?,
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
        })
    }

    fn connect_tcp(&self, target: &UrlDescriptor, deadline: Instant) -> Result<TcpStream> {
        let host = target.connect_host();
        // Blocks for as long as the system resolver takes
        let addrs: Vec<SocketAddr> = (host, target.port())
            .to_socket_addrs()
            .map_err(Error::Connection)?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            let remaining = remaining(deadline)?;
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(Error::ConnectTimeout),
                Err(e) => {
                    tracing::trace!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(Error::Connection(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no addresses for {host}"))
        })))
    }

    fn handshake(
        &self,
        target: &UrlDescriptor,
        tcp: TcpStream,
        deadline: Instant,
    ) -> Result<StreamOwned<ClientConnection, TcpStream>> {
        let server_name = tls::server_name(target.connect_host())?;
        let conn = ClientConnection::new(self.tls.clone(), server_name)
            .map_err(|e| Error::Tls(e.to_string()))?;
        let mut stream = StreamOwned::new(conn, tcp);

        while stream.conn.is_handshaking() {
            let remaining = remaining(deadline)?;
            stream.sock.set_read_timeout(Some(remaining)).map_err(Error::Connection)?;
            stream.sock.set_write_timeout(Some(remaining)).map_err(Error::Connection)?;

            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(Error::from_connect)?;
        }

        tracing::trace!(host = target.host(), "tls handshake complete");
        Ok(stream)
    }
}

impl BlockingConnect for BlockingTcpConnector {
    type Stream = BlockingStream;

    fn connect(&self, target: &UrlDescriptor) -> Result<BlockingStream> {
        let deadline = Instant::now() + self.connect_timeout;

        let tcp = self.connect_tcp(target, deadline)?;
        let _ = tcp.set_nodelay(true);

        let stream = if target.is_tls() {
            let stream = self.handshake(target, tcp, deadline)?;
            stream.sock.set_write_timeout(None).map_err(Error::Connection)?;
            stream
                .sock
                .set_read_timeout(Some(self.read_timeout))
                .map_err(Error::Connection)?;
            BlockingStream::Tls(Box::new(stream))
        } else {
            tcp.set_read_timeout(Some(self.read_timeout))
                .map_err(Error::Connection)?;
            BlockingStream::Plain(tcp)
        };

        Ok(stream)
    }
}

fn remaining(deadline: Instant) -> Result<Duration> {
    match deadline.checked_duration_since(Instant::now()) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(Error::ConnectTimeout),
    }
}
