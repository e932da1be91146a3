//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the raw byte stream of a streaming query endpoint into a
//! lazy stream of decoded text payloads. Frames are delimited by a blank
//! line, carry an optional `data: ` marker, and end with the `[DONE]`
//! sentinel.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability;

/// The reserved payload marking normal end of stream.
const SENTINEL: &str = "[DONE]";

/// What a complete frame decoded to.
enum Frame {
    /// A payload to deliver downstream.
    Payload(String),
    /// The end-of-stream sentinel; nothing further is delivered.
    Done,
    /// The frame was not valid UTF-8.
    Invalid(Error),
}

/// Process a stream of bytes into a stream of decoded frame payloads.
///
/// Payloads are produced lazily as chunks arrive; nothing is buffered to
/// completion. Chunks may split a frame anywhere, including inside a
/// multi-byte character: the accumulation buffer is kept as raw bytes and
/// only complete frames are decoded. The stream ends when the `[DONE]`
/// sentinel arrives or the source is exhausted; a partial trailing frame at
/// end of input is discarded.
pub fn decode_frames<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                // First drain any complete frame already in the buffer
                if let Some(frame_bytes) = take_frame(&mut buffer) {
                    match decode_frame(&frame_bytes) {
                        Frame::Payload(payload) => {
                            observability::STREAM_FRAMES.click();
                            return Some((Ok(payload), (stream, buffer)));
                        }
                        Frame::Done => return None,
                        Frame::Invalid(err) => {
                            observability::STREAM_ERRORS.click();
                            return Some((Err(err), (stream, buffer)));
                        }
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        observability::STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        observability::STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // Source exhausted without a sentinel: not an error.
                        // Any partial trailing frame is dropped.
                        return None;
                    }
                }
            }
        },
    )
}

/// Remove and return the bytes of the first complete frame in the buffer.
///
/// Returns `None` when no blank-line delimiter is present yet; the buffer is
/// left untouched so a partial frame (or partial multi-byte character)
/// continues with the next chunk.
fn take_frame(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let at = buffer.windows(2).position(|window| window == b"\n\n")?;
    let mut frame: Vec<u8> = buffer.drain(..at + 2).collect();
    frame.truncate(at);
    Some(frame)
}

/// Decode one complete frame's bytes into a payload.
///
/// The delimiter is ASCII, so a complete frame is a whole UTF-8 sequence
/// whenever the producer emits valid UTF-8 overall. A `data: ` marker is
/// stripped when present; frames without the marker are delivered verbatim.
fn decode_frame(frame: &[u8]) -> Frame {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            return Frame::Invalid(Error::encoding(
                format!("Invalid UTF-8 in stream frame: {e}"),
                Some(Box::new(e)),
            ));
        }
    };

    let payload = text
        .strip_prefix("data: ")
        .or_else(|| text.strip_prefix("data:"))
        .unwrap_or(text);

    if payload == SENTINEL {
        Frame::Done
    } else {
        Frame::Payload(payload.to_string())
    }
}
