use std::io::Write;

use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use httpline::Error;
use httpline::http::body::{ChunkedDecoder, decode_body, decode_chunked, decompress_deflate, decompress_gzip};
use httpline::http::headers::Headers;
use httpline::http::parser::ParseError;

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn raw_deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs.iter().copied().collect()
}

#[test]
fn test_chunked_single_chunk() {
    assert_eq!(decode_chunked(b"5\r\nhello\r\n0\r\n\r\n"), b"hello");
}

#[test]
fn test_chunked_multiple_chunks_with_extension() {
    let body = b"4\r\nWiki\r\n5;name=value\r\npedia\r\nE\r\n in\r\n\r\nchunks.\r\n0\r\n\r\n";
    assert_eq!(decode_chunked(body), b"Wikipedia in\r\n\r\nchunks.");
}

#[test]
fn test_chunked_malformed_size_keeps_prefix() {
    assert_eq!(decode_chunked(b"5\r\nhello\r\nzz\r\nworld\r\n0\r\n\r\n"), b"hello");
}

#[test]
fn test_chunked_decoder_reports_done() {
    let mut decoder = ChunkedDecoder::new();
    let mut out = Vec::new();

    decoder.decode(b"3\r\nabc\r\n", &mut out);
    assert!(!decoder.is_done());

    decoder.decode(b"0\r\n\r\n", &mut out);
    assert!(decoder.is_done());
    assert_eq!(out, b"abc");
}

#[test]
fn test_gzip_roundtrip() {
    let text = b"the quick brown fox jumps over the lazy dog".repeat(50);
    assert_eq!(decompress_gzip(&gzip(&text)).unwrap(), text);
}

#[test]
fn test_deflate_accepts_zlib_and_raw() {
    let text = b"deflate payload ".repeat(100);
    assert_eq!(decompress_deflate(&zlib(&text)).unwrap(), text);
    assert_eq!(decompress_deflate(&raw_deflate(&text)).unwrap(), text);
}

#[test]
fn test_corrupt_gzip_is_decompression_error() {
    let err = decompress_gzip(b"\x1f\x8b\x08\x00garbage-garbage").unwrap_err();
    assert!(matches!(err, Error::Decompression(_)));
}

#[test]
fn test_truncated_deflate_is_decompression_error() {
    let compressed = zlib(&b"abcdefgh".repeat(500));
    let err = decompress_deflate(&compressed[..compressed.len() / 2]).unwrap_err();
    assert!(matches!(err, Error::Decompression(_)));
}

#[test]
fn test_decode_body_chunked_then_gzip() {
    let compressed = gzip(b"hello world");
    let mut raw = format!("{:x}\r\n", compressed.len()).into_bytes();
    raw.extend_from_slice(&compressed);
    raw.extend_from_slice(b"\r\n0\r\n\r\n");

    let hdrs = headers(&[("Transfer-Encoding", "chunked"), ("Content-Encoding", "gzip")]);
    assert_eq!(decode_body(&hdrs, &raw).unwrap(), b"hello world");
}

#[test]
fn test_decode_body_content_length_frames() {
    let hdrs = headers(&[("Content-Length", "5")]);
    assert_eq!(decode_body(&hdrs, b"helloEXTRA").unwrap(), b"hello");

    let err = decode_body(&hdrs, b"hel").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse(ParseError::IncompleteBody { expected: 5, received: 3 })
    ));
}

#[test]
fn test_decode_body_identity_without_headers() {
    let hdrs = Headers::new();
    assert_eq!(decode_body(&hdrs, b"plain text").unwrap(), b"plain text");
}

#[test]
fn test_decode_body_empty_compressed_body() {
    let hdrs = headers(&[("Content-Encoding", "gzip"), ("Content-Length", "0")]);
    assert!(decode_body(&hdrs, b"").unwrap().is_empty());
}
