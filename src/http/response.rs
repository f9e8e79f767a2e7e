use std::borrow::Cow;

use crate::http::headers::Headers;

/// Status line and headers of a response, before the body is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// Numeric status code (e.g., 200)
    pub status: u16,
    /// Reason phrase as sent by the server (may be empty)
    pub reason: String,
    /// Response headers, looked up case-insensitively
    pub headers: Headers,
}

/// A complete response returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
    /// Body after chunked reassembly and decompression
    pub body: Vec<u8>,
    /// Every URL fetched while following redirects, in visit order. The
    /// URL of the original request is not included.
    pub redirect_chain: Vec<String>,
}

impl Response {
    pub fn new(head: ResponseHead, body: Vec<u8>) -> Self {
        Self {
            status: head.status,
            reason: head.reason,
            headers: head.headers,
            body,
            redirect_chain: Vec::new(),
        }
    }

    /// Retrieves a header value by name (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}
