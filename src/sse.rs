//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the byte stream of a `streamGenerateContent?alt=sse`
//! response into a stream of [`GenerateContentResponse`] chunks.  Events are
//! delimited by blank lines; `\r\n` line endings are accepted.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::client::{GoogleErrorBody, error_from_status};
use crate::observability::{STREAM_BYTES, STREAM_ERRORS};
use crate::types::GenerateContentResponse;
use crate::{Error, Result};

/// Process a stream of bytes into a stream of response chunks.
///
/// Events without a `data:` field (comments, keep-alives) are skipped.  An
/// event whose data is a Google error body is surfaced as the matching
/// [`Error`].
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                if let Some(event) = extract_event(&mut buffer) {
                    match event {
                        Some(event) => return Some((event, (stream, buffer))),
                        None => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                        if buffer.contains(&b'\r') {
                            normalize_crlf(&mut buffer);
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // A final event may lack its trailing blank line.
                        let last = std::mem::take(&mut buffer);
                        if last.iter().all(u8::is_ascii_whitespace) {
                            return None;
                        }
                        return decode_event(&last).map(|event| (event, (stream, buffer)));
                    }
                }
            }
        },
    )
}

/// Extract a complete SSE event from the front of `buffer`.
///
/// Returns `None` if the buffer does not yet hold a complete event, and
/// `Some(None)` for a complete event that carries no data.  Only complete
/// events are decoded, so a character split across network chunks is
/// reassembled first.
fn extract_event(buffer: &mut Vec<u8>) -> Option<Option<Result<GenerateContentResponse>>> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event: Vec<u8> = buffer.drain(..end + 2).take(end).collect();
    Some(decode_event(&event))
}

fn decode_event(event: &[u8]) -> Option<Result<GenerateContentResponse>> {
    match std::str::from_utf8(event) {
        Ok(text) => parse_event(text),
        Err(e) => {
            STREAM_ERRORS.click();
            Some(Err(Error::from(e)))
        }
    }
}

/// Drops the `\r` of every `\r\n` pair.  A trailing `\r` is kept until its
/// `\n` arrives.
fn normalize_crlf(buffer: &mut Vec<u8>) {
    let mut out = Vec::with_capacity(buffer.len());
    let mut bytes = buffer.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&b'\n') {
            continue;
        }
        out.push(b);
    }
    *buffer = out;
}

/// Parse the text of one event.
fn parse_event(event_text: &str) -> Option<Result<GenerateContentResponse>> {
    let mut data: Option<String> = None;
    for line in event_text.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }
    let data = data?;
    if data.trim() == "[DONE]" {
        return None;
    }
    Some(parse_data(&data))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: GoogleErrorBody },
    Chunk(GenerateContentResponse),
}

fn parse_data(data: &str) -> Result<GenerateContentResponse> {
    match serde_json::from_str::<StreamPayload>(data) {
        Ok(StreamPayload::Chunk(chunk)) => Ok(chunk),
        Ok(StreamPayload::Error { error }) => {
            STREAM_ERRORS.click();
            Err(error_from_status(
                error.code.unwrap_or(500),
                error.status,
                error.message.unwrap_or_else(|| data.to_string()),
                None,
            ))
        }
        Err(e) => {
            STREAM_ERRORS.click();
            Err(Error::serialization(
                format!("Failed to parse event JSON: {e}"),
                Some(Box::new(e)),
            ))
        }
    }
}
