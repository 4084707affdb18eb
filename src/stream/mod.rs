//! Decoding of upstream chat-completion streams.
//!
//! Raw bytes go through [`decoder`] into frames, each frame is tagged by
//! [`delta::classify`], and tool-call fragments are merged per slot by
//! [`accumulator::ToolCallAccumulator`].

pub mod accumulator;
pub mod decoder;
pub mod delta;

pub use accumulator::ToolCallAccumulator;
pub use decoder::{decode_frames, Frame, FrameDecoder, DONE_SENTINEL};
pub use delta::{classify, classify_payload, Delta, ToolCallFragment};

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::QuillError;

/// Raw response body chunks, with arbitrary boundaries.
pub type ByteStream = BoxStream<'static, Result<Bytes, QuillError>>;
