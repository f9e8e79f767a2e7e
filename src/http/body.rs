//! Response body decoding pipeline.
//!
//! Two stages, always in this order:
//!
//! 1. **Transfer decoding**: `Transfer-Encoding: chunked` bodies are
//!    reassembled with [`ChunkedDecoder`]. Otherwise a declared
//!    `Content-Length` frames the body.
//! 2. **Content decoding**: `Content-Encoding: gzip` / `deflate` bodies are
//!    inflated once reassembly has finished.
//!
//! A size line that is not hexadecimal stops chunk reassembly and keeps
//! whatever payload was collected before it, instead of failing the response.

use std::io::Read;

use flate2::read::GzDecoder;
use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};
use crate::http::headers::Headers;
use crate::http::parser::ParseError;

/// Size of the scratch buffer the inflater writes into per step.
const INFLATE_BUFFER_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Accumulating a size line.
    Size,
    /// Copying payload bytes; the count is what is still owed.
    Data(usize),
    /// Skipping the line terminator after a payload.
    DataEnd,
    /// Terminal chunk seen, or the size line was malformed.
    Done,
}

/// Incremental decoder for the chunked transfer coding.
///
/// Bytes can be pushed in arbitrary slices; decoded payload is appended to
/// the caller's buffer as soon as it is available.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: ChunkState,
    line: Vec<u8>,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self {
            state: ChunkState::Size,
            line: Vec::new(),
        }
    }

    /// True once the zero-size chunk (or a malformed size line) was reached.
    pub fn is_done(&self) -> bool {
        self.state == ChunkState::Done
    }

    /// Decodes as much of `input` as possible into `out`.
    pub fn decode(&mut self, mut input: &[u8], out: &mut Vec<u8>) {
        while !input.is_empty() {
            match self.state {
                ChunkState::Size => {
                    let Some(pos) = input.iter().position(|&b| b == b'\n') else {
                        self.line.extend_from_slice(input);
                        return;
                    };
                    self.line.extend_from_slice(&input[..pos]);
                    input = &input[pos + 1..];

                    let line = std::mem::take(&mut self.line);
                    self.state = match parse_chunk_size(&line) {
                        // Stray blank lines between chunks are tolerated
                        SizeLine::Blank => ChunkState::Size,
                        SizeLine::Size(0) => ChunkState::Done,
                        SizeLine::Size(n) => ChunkState::Data(n),
                        SizeLine::Malformed => {
                            tracing::debug!("malformed chunk size line, truncating body");
                            ChunkState::Done
                        }
                    };
                }
                ChunkState::Data(remaining) => {
                    let take = remaining.min(input.len());
                    out.extend_from_slice(&input[..take]);
                    input = &input[take..];
                    self.state = if take == remaining {
                        ChunkState::DataEnd
                    } else {
                        ChunkState::Data(remaining - take)
                    };
                }
                ChunkState::DataEnd => match input.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        input = &input[pos + 1..];
                        self.state = ChunkState::Size;
                    }
                    None => return,
                },
                ChunkState::Done => return,
            }
        }
    }
}

enum SizeLine {
    Blank,
    Size(usize),
    Malformed,
}

fn parse_chunk_size(line: &[u8]) -> SizeLine {
    let Ok(line) = std::str::from_utf8(line) else {
        return SizeLine::Malformed;
    };
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return SizeLine::Blank;
    }

    // Chunk extensions (`5;name=value`) carry nothing we use
    let size = line.split(';').next().unwrap_or("").trim();
    match usize::from_str_radix(size, 16) {
        Ok(n) => SizeLine::Size(n),
        Err(_) => SizeLine::Malformed,
    }
}

/// Reassembles a complete chunked body.
///
/// # Example
///
/// ```
/// # use httpline::http::body::decode_chunked;
/// assert_eq!(decode_chunked(b"5\r\nhello\r\n0\r\n\r\n"), b"hello");
/// ```
pub fn decode_chunked(data: &[u8]) -> Vec<u8> {
    let mut decoder = ChunkedDecoder::new();
    let mut out = Vec::with_capacity(data.len());
    decoder.decode(data, &mut out);
    out
}

/// Content codings the client can undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
}

impl ContentEncoding {
    pub fn from_headers(headers: &Headers) -> Option<Self> {
        if headers.has_token("Content-Encoding", "gzip") || headers.has_token("Content-Encoding", "x-gzip") {
            Some(ContentEncoding::Gzip)
        } else if headers.has_token("Content-Encoding", "deflate") {
            Some(ContentEncoding::Deflate)
        } else {
            None
        }
    }
}

pub fn decompress(encoding: ContentEncoding, data: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        ContentEncoding::Gzip => decompress_gzip(data),
        ContentEncoding::Deflate => decompress_deflate(data),
    }
}

pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buffer = vec![0u8; INFLATE_BUFFER_SIZE];

    // GzDecoder verifies the trailer, so a truncated stream errors out here
    loop {
        let n = decoder
            .read(&mut buffer)
            .map_err(|e| Error::Decompression(format!("gzip: {e}")))?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buffer[..n]);
    }
}

/// Inflates a `deflate` body, accepting both zlib-wrapped and raw streams.
pub fn decompress_deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(has_zlib_header(data));
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buffer = vec![0u8; INFLATE_BUFFER_SIZE];

    loop {
        let consumed = inflater.total_in() as usize;
        let before_out = inflater.total_out();

        let status = inflater
            .decompress(&data[consumed..], &mut buffer, FlushDecompress::None)
            .map_err(|e| Error::Decompression(format!("deflate: {e}")))?;

        let produced = (inflater.total_out() - before_out) as usize;
        out.extend_from_slice(&buffer[..produced]);

        match status {
            Status::StreamEnd => return Ok(out),
            Status::Ok | Status::BufError => {
                let progressed = inflater.total_in() as usize != consumed || produced > 0;
                if !progressed {
                    return Err(Error::Decompression(
                        "deflate: stream ended before end marker".to_string(),
                    ));
                }
            }
        }
    }
}

fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => cmf & 0x0F == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Runs the full decoding pipeline on a raw response body.
pub fn decode_body(headers: &Headers, raw: &[u8]) -> Result<Vec<u8>> {
    let framed = if headers.has_token("Transfer-Encoding", "chunked") {
        decode_chunked(raw)
    } else if let Some(length) = headers.get("Content-Length") {
        let expected = length
            .trim()
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidContentLength)?;
        if raw.len() < expected {
            return Err(ParseError::IncompleteBody {
                expected,
                received: raw.len(),
            }
            .into());
        }
        raw[..expected].to_vec()
    } else {
        raw.to_vec()
    };

    match ContentEncoding::from_headers(headers) {
        Some(encoding) if !framed.is_empty() => decompress(encoding, &framed),
        _ => Ok(framed),
    }
}
