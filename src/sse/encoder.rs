//! Encodes [`StreamEvent`]s as `data:` frames for the client.

use bytes::Bytes;

use crate::error::QuillError;
use crate::types::StreamEvent;

/// Completion sentinel frame.
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Encode one event as a `data: <json>\n\n` frame.
pub fn encode_event(event: &StreamEvent) -> Result<Bytes, QuillError> {
    if event.is_done() {
        return Ok(Bytes::from_static(DONE_FRAME));
    }
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}
