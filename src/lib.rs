//! Quill: a streaming diary & planning agent.
//!
//! Relays a conversation to an OpenAI-compatible chat-completions endpoint,
//! forwards reasoning and answer text as they stream in, executes the tools
//! the model requests, and feeds results back for up to a bounded number of
//! rounds. Output is a sequence of `data:` frames ending in `data: [DONE]`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use quill::prelude::*;
//!
//! # async fn example() -> quill::error::Result<()> {
//! let config = QuillConfig::load()?;
//! let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
//! let mut frames = orchestrator.stream(vec![Message::user("I ran 5k today")]);
//! while let Some(frame) = frames.next().await {
//!     print!("{}", String::from_utf8_lossy(&frame));
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod sse;
pub mod stream;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
