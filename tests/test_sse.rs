use httpline::SseEvent;
use httpline::http::sse::{SseDecoder, SseParser, parse_sse_stream};

const SAMPLE: &str = "event: update\ndata: a\ndata: b\nid: 1\n\n";

fn feed_lines(input: &str) -> Vec<SseEvent> {
    let mut parser = SseParser::new();
    let mut events = Vec::new();
    for line in input.split('\n') {
        events.extend(parser.feed_line(line));
    }
    events.extend(parser.finish());
    events
}

#[test]
fn test_parse_single_event() {
    let events = parse_sse_stream(SAMPLE);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "update");
    assert_eq!(events[0].data, "a\nb");
    assert_eq!(events[0].id, "1");
}

#[test]
fn test_line_by_line_matches_batch() {
    let input = format!("{SAMPLE}: keepalive\ndata: second\n\nevent: ping\n\n");
    let batch = parse_sse_stream(&input);
    let lines = feed_lines(&input);

    assert_eq!(batch.len(), 3);
    assert_eq!(batch, lines);
    assert_eq!(batch[1].data, "second");
    assert_eq!(batch[2].event_type, "ping");
}

#[test]
fn test_retry_only_block_is_not_an_event() {
    assert!(parse_sse_stream("retry: 5000\n\n").is_empty());
    assert!(feed_lines("retry: 5000\n\n").is_empty());
}

#[test]
fn test_comments_are_ignored() {
    assert!(parse_sse_stream(": just a comment\n\n").is_empty());
}

#[test]
fn test_crlf_lines() {
    let events = parse_sse_stream("data: one\r\nid: 9\r\n\r\n");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "one");
    assert_eq!(events[0].id, "9");
}

#[test]
fn test_value_without_space_and_extra_fields() {
    let events = parse_sse_stream("data:tight\ncustom: x\nretry: 10\n\n");
    assert_eq!(events[0].data, "tight");
    assert_eq!(events[0].retry, "10");
    assert_eq!(events[0].fields.get("custom").map(String::as_str), Some("x"));
}

#[test]
fn test_trailing_event_without_blank_line() {
    let events = parse_sse_stream("data: last");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "last");
}

#[test]
fn test_decoder_across_split_reads() {
    let mut decoder = SseDecoder::new(false);
    let mut events = Vec::new();
    for piece in ["event: upd", "ate\ndata: a\nda", "ta: b\nid: 1\n", "\n"] {
        events.extend(decoder.push(piece.as_bytes()));
    }
    events.extend(decoder.finish());

    assert_eq!(events, parse_sse_stream(SAMPLE));
}

#[test]
fn test_decoder_chunked_body() {
    let body = format!("{:x}\r\n{SAMPLE}\r\n0\r\n\r\n", SAMPLE.len());
    let mut decoder = SseDecoder::new(true);

    let events = decoder.push(body.as_bytes());
    assert!(decoder.is_complete());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "a\nb");
    assert!(decoder.finish().is_empty());
}

#[test]
fn test_event_to_wire() {
    let event = &parse_sse_stream(SAMPLE)[0];
    assert_eq!(event.to_wire(), "event: update\nid: 1\ndata: a\ndata: b\n\n");
}

fn decode_bytewise(input: &str) -> Vec<SseEvent> {
    let mut decoder = SseDecoder::new(false);
    let mut events = Vec::new();
    for byte in input.as_bytes() {
        events.extend(decoder.push(std::slice::from_ref(byte)));
    }
    events.extend(decoder.finish());
    events
}

fn decode_chunked(input: &str) -> Vec<SseEvent> {
    let body = format!("{:x}\r\n{input}\r\n0\r\n\r\n", input.len());
    let mut decoder = SseDecoder::new(true);
    let mut events = decoder.push(body.as_bytes());
    events.extend(decoder.finish());
    events
}

#[test]
fn test_stray_carriage_returns_kept_consistently() {
    let input = "data: x\r\r\n\nevent: a\r\ndata: y\r\n\r\n: c\r\ndata: z\r\r\r\n\r\n";

    let batch = parse_sse_stream(input);
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].data, "x\r");
    assert_eq!(batch[1].event_type, "a");
    assert_eq!(batch[1].data, "y");
    assert_eq!(batch[2].data, "z\r\r");

    assert_eq!(feed_lines(input), batch);
    assert_eq!(decode_bytewise(input), batch);
    assert_eq!(decode_chunked(input), batch);
}

#[test]
fn test_decoder_matches_batch_on_crlf_stream() {
    let input = "event: update\r\ndata: a\r\ndata: b\r\nid: 1\r\n\r\nretry: 10\r\n\r\ndata: tail";

    let batch = parse_sse_stream(input);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].data, "a\nb");
    assert_eq!(batch[1].data, "tail");

    assert_eq!(feed_lines(input), batch);
    assert_eq!(decode_bytewise(input), batch);
    assert_eq!(decode_chunked(input), batch);
}
