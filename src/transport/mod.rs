//! Connection establishment
//!
//! The execution engine only needs "give me a byte stream to this target".
//! Both client flavours are generic over a connector so a different
//! transport (a pool, a proxy tunnel, a test double) can be plugged in.
//! Whatever stream a connector hands out is owned by a single exchange and
//! dropped on every exit path, success or failure.

use std::future::Future;
use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::http::url::UrlDescriptor;

pub mod blocking;
pub mod tcp;
pub mod tls;

pub use blocking::{BlockingStream, BlockingTcpConnector};
pub use tcp::{HttpStream, TcpConnector};

/// Async connector used by [`crate::Client`].
///
/// Suspension points are name resolution, the TCP connect and, for TLS
/// targets, the handshake. The client bounds the whole future with
/// `connect_timeout`.
pub trait Connect {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn connect(&self, target: &UrlDescriptor) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Blocking connector used by [`crate::blocking::Client`].
///
/// Implementations enforce `connect_timeout` themselves and return a stream
/// whose reads fail with `TimedOut`/`WouldBlock` after `read_timeout`.
pub trait BlockingConnect {
    type Stream: Read + Write;

    fn connect(&self, target: &UrlDescriptor) -> Result<Self::Stream>;
}
