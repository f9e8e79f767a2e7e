//! Blocking client on `std::net`.

use std::borrow::Cow;
use std::io::Read;
use std::sync::Arc;

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
use crate::transport::{BlockingConnect, BlockingTcpConnector};

/// Blocking HTTP client.
///
/// Each call occupies the calling thread until it returns, including the
/// backoff waits between retries.
#[derive(Clone)]
pub struct Client<C = BlockingTcpConnector> {
    config: Arc<Config>,
    connector: C,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let connector = BlockingTcpConnector::new(&config)?;
        Ok(Self::with_connector(config, connector))
    }
}

impl<C: BlockingConnect> Client<C> {
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
    pub fn execute(&self, request: &Request) -> Result<Response> {
        let target = request.target()?;
        let mut retry = RetryPolicy::new(&self.config.retry);

        loop {
            let outcome = self.execute_redirects(request, &target);

            let (failure, status) = client::classify(&outcome);
            if !retry.should_retry(failure, status) {
                return outcome;
            }

            let delay = retry.next_delay();
            client::log_retry(request, &retry, delay, &outcome);
            std::thread::sleep(delay);
            retry.increment_attempt();
        }
    }

    fn execute_redirects(&self, request: &Request, target: &UrlDescriptor) -> Result<Response> {
        let mut redirects = RedirectResolver::new(&self.config.redirect);
        let mut chain = Vec::new();
        let mut current = Cow::Borrowed(request);
        let mut target = Cow::Borrowed(target);

        loop {
            let mut response = self.exchange(&current, &target)?;

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

    fn exchange(&self, request: &Request, target: &UrlDescriptor) -> Result<Response> {
        tracing::debug!(method = ?request.method, url = %target, "Sending request");

        let mut stream = self.connector.connect(target)?;

        let mut writer = RequestWriter::new(request, target, self.config.compression);
        writer.write_blocking(&mut stream)?;
        tracing::trace!(bytes = writer.len(), "Request sent");

        let mut raw = Vec::with_capacity(READ_BUFFER_SIZE);
        let mut chunk = [0u8; READ_BUFFER_SIZE];
        loop {
            let n = read_chunk(&mut stream, &mut chunk)?;
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
        }
        tracing::trace!(bytes = raw.len(), "Response received");

        let response = client::finish_response(request.method, &raw)?;
        tracing::debug!(status = response.status, url = %target, "Response decoded");
        Ok(response)
    }

    /// Streams Server-Sent Events from `request` into `handler`.
    ///
    /// Same contract as [`crate::Client::stream_events`].
    pub fn stream_events<F, E>(&self, request: &Request, mut handler: F) -> Result<Response>
    where
        F: FnMut(&SseEvent) -> std::result::Result<(), E>,
        E: Into<HandlerError>,
    {
        let target = request.target()?;
        let request = client::event_stream_request(request);

        let mut stream = self.connector.connect(&target)?;
        RequestWriter::new(&request, &target, false).write_blocking(&mut stream)?;

        let mut buf = Vec::with_capacity(READ_BUFFER_SIZE);
        let mut chunk = [0u8; READ_BUFFER_SIZE];
        let (head, consumed) = loop {
            if let Some(parsed) = parse_response_head(&buf)? {
                break parsed;
            }
            let n = read_chunk(&mut stream, &mut chunk)?;
            if n == 0 {
                return Err(ParseError::Incomplete.into());
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        buf.drain(..consumed);

        if !(200..300).contains(&head.status) {
            loop {
                let n = read_chunk(&mut stream, &mut chunk)?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = client::response_body(request.method, &head, &buf)?;
            return Ok(Response::new(head, body));
        }

        tracing::debug!(url = %target, status = head.status, "Event stream opened");

        let mut decoder = SseDecoder::new(head.headers.has_token("Transfer-Encoding", "chunked"));
        let mut delivered = 0;
        let mut events = decoder.push(&buf);

        loop {
            client::dispatch(&mut handler, events, &mut delivered)?;
            if decoder.is_complete() {
                break;
            }
            let n = read_chunk(&mut stream, &mut chunk)?;
            if n == 0 {
                break;
            }
            events = decoder.push(&chunk[..n]);
        }
        client::dispatch(&mut handler, decoder.finish(), &mut delivered)?;

        tracing::debug!(url = %target, delivered, "Event stream closed");
        Ok(Response::new(head, Vec::new()))
    }

    pub fn get(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::GET, url))
    }

    pub fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::POST, url).with_body(body))
    }

    pub fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::PUT, url).with_body(body))
    }

    pub fn delete(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::DELETE, url))
    }

    pub fn head(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::HEAD, url))
    }

    pub fn patch(&self, url: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.execute(&Request::new(Method::PATCH, url).with_body(body))
    }

    pub fn options(&self, url: &str) -> Result<Response> {
        self.execute(&Request::new(Method::OPTIONS, url))
    }
}

/// Reads once; `Ok(0)` means end of stream.
fn read_chunk<S: Read>(stream: &mut S, chunk: &mut [u8]) -> Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) if client::is_eof(&e) => return Ok(0),
            Err(e) => return Err(Error::from_read(e)),
        }
    }
}
