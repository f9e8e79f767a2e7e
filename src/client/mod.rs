//! Execution engine
//!
//! Both clients run the same sequence for a top-level call:
//!
//! ```text
//!   resolve URL ─► connect ─► write request ─► read to EOF ─► decode
//!        │                                                    │
//!        │             ┌──── 3xx + Location (hops left) ◄─────┤
//!        │             ▼                                      ▼
//!        │         next hop                         failed or 5xx?
//!        │                                                    │ retry allowed
//!        └─────────────── wait backoff, attempt += 1 ◄────────┘
//! ```
//!
//! [`async_client::Client`] suspends at resolve, connect, handshake, every
//! read and every backoff wait. [`blocking::Client`] occupies the calling
//! thread for the whole call.

use std::io;
use std::time::Duration;

use crate::error::{Error, FailureKind, Result};
use crate::http::body::decode_body;
use crate::http::parser::parse_response;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseHead};
use crate::http::sse::SseEvent;
use crate::policy::RetryPolicy;

pub mod async_client;
pub mod blocking;

/// Read buffer size for both clients.
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

/// Boxed error accepted from SSE handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Turns the bytes of a fully read response into a [`Response`].
pub(crate) fn finish_response(method: Method, raw: &[u8]) -> Result<Response> {
    let (head, body) = parse_response(raw)?;
    let body = response_body(method, &head, body)?;
    Ok(Response::new(head, body))
}

/// Runs the body pipeline unless the exchange cannot carry a body.
///
/// Responses to HEAD, and 1xx, 204 and 304 responses, may declare a
/// `Content-Length` that describes a body which is never sent.
pub(crate) fn response_body(method: Method, head: &ResponseHead, raw: &[u8]) -> Result<Vec<u8>> {
    if method == Method::HEAD || matches!(head.status, 100..=199 | 204 | 304) {
        return Ok(Vec::new());
    }
    decode_body(&head.headers, raw)
}

/// TLS peers that close without `close_notify` surface as `UnexpectedEof`;
/// with `Connection: close` that is the normal end of a response.
pub(crate) fn is_eof(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::UnexpectedEof
}

/// What the retry policy gets to see of an attempt.
pub(crate) fn classify(outcome: &Result<Response>) -> (Option<FailureKind>, Option<u16>) {
    match outcome {
        Ok(response) => (None, Some(response.status)),
        Err(err) => (Some(err.kind()), None),
    }
}

pub(crate) fn log_retry(request: &Request, retry: &RetryPolicy, delay: Duration, outcome: &Result<Response>) {
    match outcome {
        Ok(response) => tracing::warn!(
            method = ?request.method,
            url = %request.url,
            status = response.status,
            attempt = retry.attempt() + 1,
            max_retries = retry.max_retries(),
            delay_ms = delay.as_millis() as u64,
            "Server error, will retry"
        ),
        Err(err) => tracing::warn!(
            method = ?request.method,
            url = %request.url,
            error = %err,
            attempt = retry.attempt() + 1,
            max_retries = retry.max_retries(),
            delay_ms = delay.as_millis() as u64,
            "Request failed, will retry"
        ),
    }
}

/// Copy of `request` prepared for an event stream.
pub(crate) fn event_stream_request(request: &Request) -> Request {
    let mut request = request.clone();
    if !request.headers.contains("Accept") {
        request.headers.insert("Accept", "text/event-stream");
    }
    request
}

/// Hands events to the caller in order; the first handler error aborts.
pub(crate) fn dispatch<F, E>(handler: &mut F, events: Vec<SseEvent>, delivered: &mut usize) -> Result<()>
where
    F: FnMut(&SseEvent) -> std::result::Result<(), E>,
    E: Into<HandlerError>,
{
    for event in events {
        if let Err(e) = handler(&event) {
            let err = e.into();
            tracing::debug!(delivered = *delivered, error = %err, "event handler failed, aborting stream");
            return Err(Error::Handler(err));
        }
        *delivered += 1;
    }
    Ok(())
}
