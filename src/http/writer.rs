use std::io::Write;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::url::UrlDescriptor;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Value advertised when compression negotiation is enabled.
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

/// Renders a request into HTTP/1.1 wire bytes.
///
/// Header precedence: `Host`, `Accept-Encoding` and `Connection: close` are
/// defaults the caller may override; `Content-Length` always reflects the
/// body and `Transfer-Encoding` is never sent.
pub fn serialize_request(request: &Request, target: &UrlDescriptor, compression: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    // Request line
    let request_line = format!(
        "{} {} {}\r\n",
        request.method.as_str(),
        target.path(),
        HTTP_VERSION
    );
    buf.extend_from_slice(request_line.as_bytes());

    let mut headers = Headers::new();
    headers.insert("Host", target.authority());
    if compression {
        headers.insert("Accept-Encoding", ACCEPT_ENCODING);
    }
    headers.insert("Connection", "close");

    for (k, v) in request.headers.iter() {
        headers.insert(k, v);
    }

    headers.remove("Transfer-Encoding");
    headers.remove("Content-Length");
    if let Some(body) = &request.body {
        headers.insert("Content-Length", body.len().to_string());
    }

    for (k, v) in headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    if let Some(body) = &request.body {
        buf.extend_from_slice(body);
    }

    buf
}

/// Serialized request plus write progress.
pub struct RequestWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl RequestWriter {
    pub fn new(request: &Request, target: &UrlDescriptor, compression: bool) -> Self {
        Self {
            buffer: serialize_request(request, target, compression),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await
                .map_err(Error::Connection)?;

            if n == 0 {
                return Err(closed_while_writing());
            }

            self.written += n;
        }

        stream.flush().await.map_err(Error::Connection)
    }

    pub fn write_blocking<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: Write,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .map_err(Error::Connection)?;

            if n == 0 {
                return Err(closed_while_writing());
            }

            self.written += n;
        }

        stream.flush().map_err(Error::Connection)
    }
}

fn closed_while_writing() -> Error {
    Error::Connection(std::io::Error::new(
        std::io::ErrorKind::WriteZero,
        "connection closed while writing",
    ))
}
