use std::fmt;

use crate::http::headers::Headers;
use crate::http::response::ResponseHead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Status line is not `HTTP/x.y CODE [REASON]`.
    InvalidStatusLine,
    /// A header line has no colon or an empty name.
    InvalidHeader,
    /// Status line and headers are not valid UTF-8.
    InvalidEncoding,
    /// The stream ended before the blank line after the headers.
    Incomplete,
    /// The stream ended before `Content-Length` bytes of body arrived.
    IncompleteBody { expected: usize, received: usize },
    InvalidContentLength,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidStatusLine => f.write_str("invalid status line"),
            ParseError::InvalidHeader => f.write_str("invalid header line"),
            ParseError::InvalidEncoding => f.write_str("response head is not valid UTF-8"),
            ParseError::Incomplete => f.write_str("incomplete response head"),
            ParseError::IncompleteBody { expected, received } => write!(
                f,
                "incomplete body: expected {expected} bytes, received {received}"
            ),
            ParseError::InvalidContentLength => f.write_str("invalid Content-Length"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses the status line and headers at the start of `buf`.
///
/// Returns `Ok(None)` while the terminating blank line has not arrived yet,
/// otherwise the head and the number of bytes it occupied.
pub fn parse_response_head(buf: &[u8]) -> Result<Option<(ResponseHead, usize)>, ParseError> {
    let Some((headers_end, separator_len)) = find_headers_end(buf) else {
        return Ok(None);
    };

    let headers_str =
        std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.lines();

    // Status line
    let status_line = lines.next().ok_or(ParseError::InvalidStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');

    let version = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidStatusLine);
    }

    let status = parts
        .next()
        .and_then(|code| code.trim().parse::<u16>().ok())
        .filter(|code| (100..1000).contains(code))
        .ok_or(ParseError::InvalidStatusLine)?;

    let reason = parts.next().unwrap_or("").trim().to_string();

    // Headers
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.insert(key, value.trim());
    }

    let head = ResponseHead {
        status,
        reason,
        headers,
    };

    Ok(Some((head, headers_end + separator_len)))
}

/// Splits a fully received response into its head and raw (still encoded) body.
pub fn parse_response(buf: &[u8]) -> Result<(ResponseHead, &[u8]), ParseError> {
    let (head, consumed) = parse_response_head(buf)?.ok_or(ParseError::Incomplete)?;
    Ok((head, &buf[consumed..]))
}

/// Position of the blank line ending the head and the separator's length.
fn find_headers_end(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = buf.windows(2).position(|w| w == b"\n\n");

    match (crlf, lf) {
        (Some(a), Some(b)) if b < a => Some((b, 2)),
        (Some(a), _) => Some((a, 4)),
        (None, Some(b)) => Some((b, 2)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_ok() {
        let resp = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhi";

        let (head, body) = parse_response(resp).unwrap();

        assert_eq!(head.status, 200);
        assert_eq!(head.reason, "OK");
        assert_eq!(head.headers.get("content-type"), Some("text/plain"));
        assert_eq!(body, b"hi");
    }

    #[test]
    fn head_is_incremental() {
        assert_eq!(parse_response_head(b"HTTP/1.1 200 OK\r\nA: b\r\n").unwrap(), None);
    }
}
