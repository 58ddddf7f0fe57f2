use anyhow::Result;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use super::buffering::CircularLineBuffer;
use crate::StreamEvent;

/// Strategy for turning SSE `data:` payloads into stream events
pub trait SseLineParser: Send {
    /// Parse a data payload into stream events
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE parser over any chunked byte stream (an HTTP body in
/// production, an in-memory stream in tests).
pub fn parse_sse_stream<S, B, E, P>(
    bytes: S,
    parser: P,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(8192);
        let mut finished = false;

        'outer: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend(chunk.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        match line_result {
                            Ok(line) => {
                                let Some(data) = data_payload(&line) else { continue };

                                if parser.is_done_marker(data) {
                                    yield Ok(StreamEvent::Done { finish_reason: None });
                                    finished = true;
                                    break 'outer;
                                }

                                match parser.parse_data_line(data) {
                                    Ok(events) => {
                                        for event in events {
                                            yield Ok(event);
                                        }
                                    }
                                    Err(e) => yield Err(e),
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    finished = true;
                    break;
                }
            }
        }

        if !finished {
            if let Some(Ok(line)) = buffer.take_remainder() {
                if let Some(data) = data_payload(&line) {
                    if !parser.is_done_marker(data) {
                        match parser.parse_data_line(data) {
                            Ok(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
            }
        }
    })
}

fn data_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    line.strip_prefix("data:").map(str::trim_start)
}
