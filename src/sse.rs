//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with a sequence of `data:` events,
//! each holding one JSON encoded [`GenerateContentResponse`]. This module turns
//! the raw byte stream of such a response into a lazy, single-pass stream of
//! parsed chunks that ends when the transport ends or after the first
//! transport error.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS};
use crate::{Error, GenerateContentResponse, Result};

/// Process a stream of bytes into a stream of response chunks.
///
/// Events may be split across network reads in any position, including
/// inside a multi-byte character; they are reassembled before decoding.
///
/// # Example
///
/// ```
/// use aictl::sse::process_sse;
/// use bytes::Bytes;
/// use futures::StreamExt;
///
/// # tokio_test::block_on(async {
/// let body = vec![
///     Ok::<_, reqwest::Error>(Bytes::from_static(b"data: {\"candidates\": [{\"content\": ")),
///     Ok(Bytes::from_static(b"{\"parts\": [{\"text\": \"Hi\"}]}}]}\n\n")),
/// ];
/// let chunks: Vec<_> = process_sse(futures::stream::iter(body)).collect().await;
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].as_ref().unwrap().text(), "Hi");
/// # });
/// ```
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    // State: byte stream, pending bytes, offset already searched for a
    // boundary, and whether the stream is finished.
    stream::unfold(
        (stream, Vec::new(), 0, false),
        move |(mut stream, mut buffer, mut scanned, finished): (_, Vec<u8>, usize, bool)| async move {
            if finished {
                return None;
            }
            loop {
                // First check if we have a complete event in the buffer
                if let Some((end, next)) = event_boundary(&buffer, scanned) {
                    scanned = 0;
                    let rest = buffer.split_off(next);
                    buffer.truncate(end);
                    let event = std::mem::replace(&mut buffer, rest);
                    match parse_event(&event) {
                        Some(Frame::Chunk(chunk)) => {
                            if chunk.is_err() {
                                STREAM_ERRORS.click();
                            }
                            return Some((chunk, (stream, buffer, scanned, false)));
                        }
                        Some(Frame::Done) => return None,
                        None => continue,
                    }
                }

                // A boundary may straddle the next read by up to three bytes.
                scanned = buffer.len().saturating_sub(3);

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, scanned, true)));
                    }
                    None => {
                        // A final event may arrive without its terminating blank line.
                        let event = std::mem::take(&mut buffer);
                        return match parse_event(&event) {
                            Some(Frame::Chunk(chunk)) => Some((chunk, (stream, buffer, 0, true))),
                            Some(Frame::Done) | None => None,
                        };
                    }
                }
            }
        },
    )
}

/// A decoded event.
enum Frame {
    /// A response chunk, or the error that replaced it.
    Chunk(Result<GenerateContentResponse>),
    /// The `[DONE]` end marker.
    Done,
}

/// Error payload Google sends inside the stream when generation fails midway.
#[derive(Deserialize)]
struct StreamError {
    error: StreamErrorBody,
}

#[derive(Deserialize)]
struct StreamErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Find the end of the first complete event.
///
/// Returns the offset where the event ends and the offset where the next one
/// starts. Events are terminated by a blank line in any of the line ending
/// conventions SSE allows. The search begins at `from`; earlier offsets are
/// known not to start a boundary.
fn event_boundary(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    (from.min(buffer.len())..buffer.len()).find_map(|i| {
        let tail = &buffer[i..];
        if tail.starts_with(b"\r\n\r\n") {
            Some((i, i + 4))
        } else if tail.starts_with(b"\n\n") || tail.starts_with(b"\r\r") {
            Some((i, i + 2))
        } else {
            None
        }
    })
}

/// Decode one event. Events without a `data` field yield `None`.
fn parse_event(raw: &[u8]) -> Option<Frame> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => return Some(Frame::Chunk(Err(e.into()))),
    };

    let mut data: Option<String> = None;
    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
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
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Frame::Done);
    }
    if let Ok(StreamError { error }) = serde_json::from_str::<StreamError>(data) {
        return Some(Frame::Chunk(Err(Error::api(
            error.code.unwrap_or(500),
            error.status,
            error
                .message
                .unwrap_or_else(|| "stream terminated by server".to_string()),
        ))));
    }
    Some(Frame::Chunk(
        serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
            Error::serialization(
                format!("Failed to parse event JSON: {e}"),
                Some(Box::new(e)),
            )
        }),
    ))
}
