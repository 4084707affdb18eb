//! Multi-round agent orchestration.
//!
//! [`Orchestrator`] drives the round loop: stream a completion, forward
//! reasoning and text as they arrive, run any requested tools, feed results
//! back and repeat until the model answers without tools or the round bound
//! is reached. [`BlockEmitter`] keeps the client-visible block sequence.

pub mod emitter;
pub mod orchestrator;
pub mod settings;

pub use emitter::BlockEmitter;
pub use orchestrator::{AgentRun, Orchestrator, Termination};
pub use settings::{AgentSettings, DEFAULT_SYSTEM_PROMPT};
