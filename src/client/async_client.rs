//! Cooperative client on tokio.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::client::{self, HandlerError, READ_BUFFER_SIZE};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::parser::{ParseError, parse_response_head};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::sse::{SseDecoder, SseEvent};
use crate::http::url::UrlDescriptor;
use crate::http::writer::RequestWriter;
use crate::policy::{RedirectResolver, RetryPolicy};
use crate::transport::{Connect, TcpConnector};

/// Async HTTP client.
///
/// Calls on one client are independent: each owns its connection, retry
/// counter and redirect counter, so a client can be shared between tasks.
///
/// ```ignore
/// use httpline::{Client, Config};
///
/// #[tokio::main]
/// async fn main() -> httpline::Result<()> {
///     let client = Client::new(Config::default())?;
///     let response = client.get("http://example.com/").await?;
///     println!("{} {}", response.status, response.text());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client<C = TcpConnector> {
    config: Arc<Config>,
    connector: C,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let connector = TcpConnector::new(&config)?;
        Ok(Self::with_connector(config, connector))
    }
}

impl<C: Connect> Client<C> {
    /// Uses a custom connector, e.g. a pool or a test double.
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Executes a request with redirect following and retries.
    ///
    /// Once retries are exhausted the last failure is returned, except that
    /// a received 5xx response is handed back as a response.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let target = request.target()?;
        let mut retry = RetryPolicy::new(&self.config.retry);

        loop {
            let outcome = self.execute_redirects(request, &target).await;

            let (failure, status) = client::classify(&outcome);
            if !retry.should_retry(failure, status) {
                return outcome;
            }

            let delay = retry.next_delay();
            client::log_retry(request, &retry, delay, &outcome);
            tokio::time::sleep(delay).await;
            retry.increment_attempt();
        }
    }

    async fn execute_redirects(&self, request: &Request, target: &UrlDescriptor) -> Result<Response> {
        let mut redirects = RedirectResolver::new(&self.config.redirect);
        let mut chain = Vec::new();
        let mut current = Cow::Borrowed(request);
        let mut target = Cow::Borrowed(target);

        loop {
            let mut response = self.exchange(&current, &target).await?;

            match redirects.next_hop(&current, &target, &response)? {
                Some(hop) => {
                    tracing::info!(
                        status = response.status,
                        from = %target,
                        to = %hop.url,
                        hop = redirects.hops(),
                        "Following redirect"
                    );
                    chain.push(hop.url);
                    current = Cow::Owned(hop.request);
                    target = Cow::Owned(hop.target);
                }
                None => {
                    response.redirect_chain = chain;
                    return Ok(response);
                }
            }
        }
    }

    /// One request/response over a fresh connection.
    async fn exchange(&self, request: &Request, target: &UrlDescriptor) -> Result<Response> {
        tracing::debug!(method = ?request.method, url = %target, "Sending request");

        let mut stream = self.connect(target).await?;

        let mut writer = RequestWriter::new(request, target, self.config.compression);
        writer.write_to_stream(&mut stream).await?;
        tracing::trace!(bytes = writer.len(), "Request sent");

        let mut raw = BytesMut::with_capacity(READ_BUFFER_SIZE);
        while self.read_chunk(&mut stream, &mut raw).await? > 0 {}
        tracing::trace!(bytes = raw.len(), "Response received");

        let response = client::finish_response(request.method, &raw)?;
        tracing::debug!(status = response.status, url = %target, "Response decoded");
        Ok(response)
    }

    async fn connect(&self, target: &UrlDescriptor) -> Result<C::Stream> {
        match timeout(self.config.connect_timeout, self.connector.connect(target)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(url = %target, timeout = ?self.config.connect_timeout, "Connect timed out");
                Err(Error::ConnectTimeout)
            }
        }
    }

    /// Reads once into `buf`; `Ok(0)` means end of stream.
    async fn read_chunk<S>(&self, stream: &mut S, buf: &mut BytesMut) -> Result<usize>
    where
        S: AsyncRead + Unpin,
    {
        match timeout(self.config.read_timeout, stream.read_buf(buf)).await {
            Err(_) => Err(Error::ReadTimeout),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) if client::is_eof(&e) => Ok(0),
            Ok(Err(e)) => Err(Error::from_read(e)),
        }
    }

    /// Streams Server-Sent Events from `request` into `handler`.
    ///
    /// Events are delivered in arrival order as soon as their terminating
    /// blank line is read. A handler error aborts the stream and is returned
    /// as [`Error::Handler`]. The returned response carries the status and
    /// headers; for a non-2xx status the handler is not called and the body
    /// is returned instead. Redirects and retries are not applied.
    pub async fn stream_events<F, E>(&self, request: &Request, mut handler: F) -> Result<Response>
    where
        F: FnMut(&SseEvent) -> std::result::Result<(), E>,
        E: Into<HandlerError>,
    {
        let target = request.target()?;
        let request = client::event_stream_request(request);

        let mut stream = self.connect(&target).await?;
        RequestWriter::new(&request, &target, false)
            .write_to_stream(&mut stream)
            .await?;

        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let (head, consumed) = loop {
            if let Some(parsed) = parse_response_head(&buf)? {
                break parsed;
            }
            if self.read_chunk(&mut stream, &mut buf).await? == 0 {
                return Err(ParseError::Incomplete.into());
            }
        };
        buf.advance(consumed);

        if !(200..300).contains(&head.status) {
            while self.read_chunk(&mut stream, &mut buf).await? > 0 {}
            let body = client::response_body(request.method, &head, &buf)?;
            return Ok(Response::new(head, body));
        }

        tracing::debug!(url = %target, status = head.status, "Event stream opened");

        let mut decoder = SseDecoder::new(head.headers.has_token("Transfer-Encoding", "chunked"));
        let mut delivered = 0;
        let mut events = decoder.push(&buf);
        buf.clear();

        loop {
            client::dispatch(&mut handler, events, &mut delivered)?;
            if decoder.is_complete() || self.read_chunk(&mut stream, &mut buf).await? == 0 {
                break;
            }
            events = decoder.push(&buf);
            buf.clear();
        }
        client::dispatch(&mut handler, decoder.finish(), &mut delivered)?;

        tracing::debug!(url = %target, delivered, "Event stream closed");
        Ok(Response::new(head, Vec::new()))
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::GET, url)).await
    }

    pub async fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::POST, url).with_body(body)).await
    }

    pub async fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::PUT, url).with_body(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::DELETE, url)).await
    }

    pub async fn head(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::HEAD, url)).await
    }

    pub async fn patch(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::PATCH, url).with_body(body)).await
    }

    pub async fn options(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::OPTIONS, url)).await
    }
}
