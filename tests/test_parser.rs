use httpline::http::parser::{ParseError, parse_response, parse_response_head};

#[test]
fn test_parse_status_and_headers() {
    let resp = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nX-Request-Id: abc\r\n\r\nmissing";
    let (head, body) = parse_response(resp).unwrap();

    assert_eq!(head.status, 404);
    assert_eq!(head.reason, "Not Found");
    assert_eq!(head.headers.get("content-type"), Some("text/html"));
    assert_eq!(head.headers.get("X-REQUEST-ID"), Some("abc"));
    assert_eq!(body, b"missing");
}

#[test]
fn test_parse_multi_word_reason() {
    let (head, _) = parse_response(b"HTTP/1.1 503 Service Unavailable\r\n\r\n").unwrap();
    assert_eq!(head.status, 503);
    assert_eq!(head.reason, "Service Unavailable");
}

#[test]
fn test_parse_missing_reason() {
    let (head, body) = parse_response(b"HTTP/1.1 204\r\n\r\n").unwrap();
    assert_eq!(head.status, 204);
    assert_eq!(head.reason, "");
    assert!(body.is_empty());
}

#[test]
fn test_parse_bare_lf_head() {
    let (head, body) = parse_response(b"HTTP/1.0 200 OK\nServer: tiny\n\nbody").unwrap();
    assert_eq!(head.status, 200);
    assert_eq!(head.headers.get("server"), Some("tiny"));
    assert_eq!(body, b"body");
}

#[test]
fn test_head_reports_consumed_bytes() {
    let head_bytes = b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n";
    let mut buf = head_bytes.to_vec();
    buf.extend_from_slice(b"data");

    let (head, consumed) = parse_response_head(&buf).unwrap().unwrap();
    assert_eq!(head.headers.get("content-length"), Some("4"));
    assert_eq!(consumed, head_bytes.len());
}

#[test]
fn test_head_waits_for_blank_line() {
    assert_eq!(parse_response_head(b"HTTP/1.1 200 OK\r\n").unwrap(), None);
    assert_eq!(parse_response(b"HTTP/1.1 200 OK\r\n"), Err(ParseError::Incomplete));
}

#[test]
fn test_invalid_status_line() {
    assert_eq!(
        parse_response(b"HTTP/1.1 abc OK\r\n\r\n"),
        Err(ParseError::InvalidStatusLine)
    );
    assert_eq!(
        parse_response(b"SIP/2.0 200 OK\r\n\r\n"),
        Err(ParseError::InvalidStatusLine)
    );
}

#[test]
fn test_invalid_header_line() {
    assert_eq!(
        parse_response(b"HTTP/1.1 200 OK\r\nNoColonHere\r\n\r\n"),
        Err(ParseError::InvalidHeader)
    );
}
