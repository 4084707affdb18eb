//! Outbound event-stream encoding.

pub mod encoder;

pub use encoder::{encode_event, DONE_FRAME};
