//! Shared test helpers and a scripted provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, Notify};

use quill::agent::{AgentSettings, Orchestrator};
use quill::error::QuillError;
use quill::provider::{ChatProvider, ChatRequest};
use quill::stream::ByteStream;
use quill::tools::ToolRegistry;
use quill::types::StreamEvent;

pub const DONE: &str = "data: [DONE]\n\n";

/// How one `stream_chat` call behaves.
#[derive(Clone, Debug)]
pub enum Script {
    /// Serve these chunks, then end the body.
    Chunks(Vec<Bytes>),
    /// Fail before any body is returned.
    Refuse(String),
    /// Serve these chunks, then fail mid-body.
    Break(Vec<Bytes>, String),
    /// Serve these chunks, then never produce another byte.
    Stall(Vec<Bytes>),
    /// Never answer the request at all.
    Hang,
}

/// A provider that replays scripted upstream bodies, one per stream call.
pub struct ScriptedProvider {
    rounds: Mutex<VecDeque<Script>>,
    fallback: Option<Script>,
    completion: String,
    stream_calls: AtomicUsize,
    complete_calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
    completions: Mutex<Vec<ChatRequest>>,
    body_dropped: Arc<Notify>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            rounds: Mutex::new(VecDeque::new()),
            fallback: None,
            completion: "tool output".to_string(),
            stream_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
            body_dropped: Arc::new(Notify::new()),
        }
    }

    /// Queue one upstream body, delivered in the given chunks.
    pub fn round(self, chunks: Vec<Bytes>) -> Self {
        self.script(Script::Chunks(chunks))
    }

    pub fn script(self, script: Script) -> Self {
        self.rounds.lock().unwrap().push_back(script);
        self
    }

    /// Script used once the queue is exhausted.
    pub fn repeat(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Text returned by every non-streaming completion.
    pub fn completion(mut self, text: &str) -> Self {
        self.completion = text.to_string();
        self
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<ChatRequest> {
        self.completions.lock().unwrap().clone()
    }

    /// Notified whenever a served body is dropped.
    pub fn body_dropped(&self) -> Arc<Notify> {
        self.body_dropped.clone()
    }
}

/// Signals when the body stream that owns it is dropped.
struct DropSignal(Arc<Notify>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, QuillError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let script = self
            .rounds
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Script::Chunks(vec![Bytes::from_static(DONE.as_bytes())]));

        let signal = DropSignal(self.body_dropped.clone());
        let ok = |chunks: Vec<Bytes>| stream::iter(chunks.into_iter().map(Ok::<_, QuillError>));
        let body: ByteStream = match script {
            Script::Chunks(chunks) => ok(chunks).boxed(),
            Script::Refuse(message) => return Err(QuillError::Stream(message)),
            Script::Hang => std::future::pending().await,
            Script::Break(chunks, message) => ok(chunks)
                .chain(stream::once(async move { Err(QuillError::Stream(message)) }))
                .boxed(),
            Script::Stall(chunks) => ok(chunks).chain(stream::pending()).boxed(),
        };
        Ok(body
            .map(move |chunk| {
                let _held = &signal;
                chunk
            })
            .boxed())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, QuillError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.completions.lock().unwrap().push(request.clone());
        Ok(self.completion.clone())
    }
}

pub fn orchestrator(provider: Arc<ScriptedProvider>, settings: AgentSettings) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        provider,
        Arc::new(ToolRegistry::with_defaults()),
        settings,
    ))
}

pub fn frame(payload: serde_json::Value) -> String {
    format!("data: {payload}\n\n")
}

pub fn text(content: &str) -> String {
    frame(json!({"choices": [{"index": 0, "delta": {"content": content}}]}))
}

pub fn reasoning(content: &str) -> String {
    frame(json!({"choices": [{"index": 0, "delta": {"reasoning_content": content}}]}))
}

/// One tool-call fragment; empty fields are omitted like upstream does.
pub fn tool_call(slot: u32, id: &str, name: &str, arguments: &str) -> String {
    let mut function = serde_json::Map::new();
    if !name.is_empty() {
        function.insert("name".into(), json!(name));
    }
    function.insert("arguments".into(), json!(arguments));
    let mut call = json!({"index": slot, "type": "function", "function": function});
    if !id.is_empty() {
        call["id"] = json!(id);
    }
    frame(json!({"choices": [{"index": 0, "delta": {"tool_calls": [call]}}]}))
}

/// Split a body into chunks of at most `size` bytes, ignoring char boundaries.
pub fn chunked(body: &str, size: usize) -> Vec<Bytes> {
    body.as_bytes()
        .chunks(size)
        .map(Bytes::copy_from_slice)
        .collect()
}

pub fn whole(body: &str) -> Vec<Bytes> {
    vec![Bytes::copy_from_slice(body.as_bytes())]
}

pub async fn collect_events(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
