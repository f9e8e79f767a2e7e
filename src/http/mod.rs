//! HTTP/1.1 wire handling for the client.
//!
//! # Architecture
//!
//! - **`url`**: Resolves a request target into scheme, host, port and path
//! - **`headers`**: Header mapping with case-insensitive names
//! - **`request`**: Request representation and builder
//! - **`response`**: Response head and complete response
//! - **`writer`**: Serializes requests and writes them to a stream
//! - **`parser`**: Parses the status line and headers of a response
//! - **`body`**: Chunked reassembly and gzip/deflate decompression
//! - **`sse`**: Server-Sent Events parser, batch and incremental
//!
//! # Exchange
//!
//! Every exchange uses a fresh connection and `Connection: close`, so a
//! response ends when the server closes the stream:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Writing   │ ← Serialize request, write all bytes
//!        └──────┬──────┘
//!               │ Request sent
//!               ▼
//!        ┌──────────────────┐
//!        │    Reading       │ ← Accumulate until end-of-stream
//!        └──────┬───────────┘
//!               │ EOF
//!               ▼
//!        ┌──────────────────┐
//!        │    Decoding      │ ← Parse head, dechunk, decompress
//!        └──────┬───────────┘
//!               ▼
//!            Response
//! ```

pub mod body;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod sse;
pub mod url;
pub mod writer;
