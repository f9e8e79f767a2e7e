//! httpline - resilient HTTP/1.1 client
//!
//! Blocking and async clients with bounded timeouts, retries with
//! exponential backoff, redirect following, chunked/gzip/deflate decoding
//! and Server-Sent Events streaming.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;
pub mod transport;

pub use client::async_client::Client;
pub use client::blocking;
pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use http::request::{Method, Request, RequestBuilder};
pub use http::response::Response;
pub use http::sse::SseEvent;
