//! Round controller.
//!
//! One request runs as a small state machine:
//!
//! ```text
//! AwaitingUpstream -> Decoding -> ToolCallsPresent -> AwaitingUpstream ...
//!                             \-> NoToolCalls -> Terminal
//! ```
//!
//! Every path ends in `Terminal`, after which the completion sentinel is
//! emitted exactly once.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::emitter::BlockEmitter;
use super::settings::AgentSettings;
use crate::config::QuillConfig;
use crate::error::QuillError;
use crate::provider::{ChatProvider, ChatRequest, OpenAiCompatibleProvider};
use crate::sse::encode_event;
use crate::stream::{classify, decode_frames, ByteStream, Delta, ToolCallAccumulator};
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::types::{Block, Message, StreamEvent, ToolCallRecord};
use crate::util::timeout::with_timeout;

const EVENT_BUFFER: usize = 64;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The model answered without requesting tools.
    Completed,
    /// Every allowed round requested tools.
    RoundLimit,
    /// The client went away or the run was canceled.
    Canceled,
    /// An upstream failure ended the run.
    Failed(String),
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub run_id: Uuid,
    /// System prompt, client history, and everything appended during the run.
    pub conversation: Vec<Message>,
    pub blocks: Vec<Block>,
    /// Streaming calls made.
    pub rounds: usize,
    pub termination: Termination,
}

enum RoundState {
    AwaitingUpstream,
    Decoding(ByteStream),
    ToolCallsPresent(Vec<ToolCallRecord>),
    NoToolCalls(String),
    Terminal(Termination),
}

struct RoundOutput {
    text: String,
    calls: Vec<ToolCallRecord>,
}

/// Forwards events to the client; a closed receiver cancels the run.
struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    async fn send(&self, event: StreamEvent) {
        if self.tx.send(event).await.is_err() && !self.cancel.is_cancelled() {
            debug!("client disconnected");
            self.cancel.cancel();
        }
    }

    /// Resolves once the run is canceled or the receiver is dropped.
    async fn gone(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.tx.closed() => {
                debug!("client disconnected");
                self.cancel.cancel();
            }
        }
    }
}

/// Drives streaming rounds and tool execution for one request at a time.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
    executor: ToolExecutor,
    settings: AgentSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
    ) -> Self {
        let executor = ToolExecutor::new(tools.clone(), provider.clone(), settings.tool_timeout);
        Self {
            provider,
            tools,
            executor,
            settings,
        }
    }

    /// Upstream provider and default tools from configuration.
    pub fn from_config(config: &QuillConfig) -> Result<Self, QuillError> {
        let provider: Arc<dyn ChatProvider> = Arc::new(OpenAiCompatibleProvider::from_config(config)?);
        Ok(Self::new(
            provider,
            Arc::new(ToolRegistry::with_defaults()),
            AgentSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one request to completion, forwarding events on `events`.
    ///
    /// Always sends [`StreamEvent::Done`] last. Dropping the receiver or
    /// triggering `cancel` stops the run at the next await point.
    pub async fn run(
        &self,
        history: Vec<Message>,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> AgentRun {
        let run_id = Uuid::new_v4();
        let max_rounds = self.settings.max_rounds.max(1);
        let sink = EventSink {
            tx: events,
            cancel: cancel.clone(),
        };
        let mut emitter = BlockEmitter::new();

        let mut conversation = Vec::with_capacity(history.len() + 1);
        conversation.push(Message::system(self.settings.system_prompt.clone()));
        conversation.extend(history);

        info!(%run_id, model = %self.provider.model_id(), max_rounds, "agent run start");

        let mut rounds = 0usize;
        let mut state = RoundState::AwaitingUpstream;
        let termination = loop {
            state = match state {
                RoundState::AwaitingUpstream if cancel.is_cancelled() => {
                    RoundState::Terminal(Termination::Canceled)
                }
                RoundState::AwaitingUpstream => {
                    rounds += 1;
                    debug!(%run_id, round = rounds, "requesting completion stream");
                    let request =
                        ChatRequest::new(conversation.clone()).with_tools(self.tools.definitions());
                    let response = async {
                        match self.settings.stream_idle_timeout {
                            Some(limit) => {
                                with_timeout(limit, self.provider.stream_chat(&request)).await
                            }
                            None => self.provider.stream_chat(&request).await,
                        }
                    };
                    tokio::select! {
                        biased;
                        _ = sink.gone() => RoundState::Terminal(Termination::Canceled),
                        result = response => match result {
                            Ok(bytes) => RoundState::Decoding(bytes),
                            Err(err) => RoundState::Terminal(self.fail(&sink, err).await),
                        },
                    }
                }
                RoundState::Decoding(bytes) => {
                    match self.decode_round(bytes, &sink, &mut emitter).await {
                        Ok(output) => {
                            debug!(
                                %run_id,
                                round = rounds,
                                tool_calls = output.calls.len(),
                                text_len = output.text.len(),
                                "round decoded"
                            );
                            if output.calls.is_empty() {
                                RoundState::NoToolCalls(output.text)
                            } else {
                                RoundState::ToolCallsPresent(output.calls)
                            }
                        }
                        Err(QuillError::Canceled) => RoundState::Terminal(Termination::Canceled),
                        Err(err) => RoundState::Terminal(self.fail(&sink, err).await),
                    }
                }
                RoundState::ToolCallsPresent(calls) => {
                    conversation.push(Message::assistant_tool_calls(calls.clone()));
                    if self.run_tools(&calls, &sink, &mut emitter, &mut conversation).await {
                        if rounds >= max_rounds {
                            warn!(%run_id, rounds, "round limit reached before a final answer");
                            RoundState::Terminal(Termination::RoundLimit)
                        } else {
                            RoundState::AwaitingUpstream
                        }
                    } else {
                        RoundState::Terminal(Termination::Canceled)
                    }
                }
                RoundState::NoToolCalls(text) => {
                    conversation.push(Message::assistant(text));
                    RoundState::Terminal(Termination::Completed)
                }
                RoundState::Terminal(termination) => break termination,
            };
        };

        sink.send(StreamEvent::Done).await;
        info!(%run_id, rounds, termination = ?termination, "agent run finished");

        AgentRun {
            run_id,
            conversation,
            blocks: emitter.into_blocks(),
            rounds,
            termination,
        }
    }

    /// Spawn [`run`](Self::run) and expose its events as encoded frames.
    ///
    /// Dropping the returned stream cancels the run.
    pub fn stream(self: Arc<Self>, history: Vec<Message>) -> BoxStream<'static, Bytes> {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();

        tokio::spawn(async move {
            self.run(history, tx, cancel).await;
        });

        Box::pin(async_stream::stream! {
            let _guard = guard;
            while let Some(event) = rx.recv().await {
                let done = event.is_done();
                match encode_event(&event) {
                    Ok(frame) => yield frame,
                    Err(err) => warn!(error = %err, "dropping unencodable event"),
                }
                if done {
                    break;
                }
            }
        })
    }

    /// Decode one upstream stream until the sentinel or end of body.
    async fn decode_round(
        &self,
        bytes: ByteStream,
        sink: &EventSink,
        emitter: &mut BlockEmitter,
    ) -> Result<RoundOutput, QuillError> {
        let mut frames = decode_frames(bytes);
        let mut accumulator = ToolCallAccumulator::new();
        let mut text = String::new();

        let idle_timeout = self.settings.stream_idle_timeout;
        let mut idle_sleep = idle_timeout.map(|d| Box::pin(time::sleep(d)));

        loop {
            tokio::select! {
                biased;
                _ = sink.gone() => return Err(QuillError::Canceled),
                _ = idle(&mut idle_sleep) => {
                    let ms = idle_timeout.map(|d| d.as_millis() as u64).unwrap_or_default();
                    warn!(idle_ms = ms, "upstream stream idle timeout");
                    return Err(QuillError::Timeout(ms));
                }
                frame = frames.next() => {
                    let Some(frame) = frame else { break; };
                    let frame = frame?;
                    if let (Some(sleep), Some(d)) = (idle_sleep.as_mut(), idle_timeout) {
                        sleep.as_mut().reset(time::Instant::now() + d);
                    }
                    match classify(&frame) {
                        Some(Delta::End) => break,
                        Some(Delta::Reasoning(delta)) => sink.send(emitter.thinking(&delta)).await,
                        Some(Delta::Text(delta)) => {
                            text.push_str(&delta);
                            sink.send(emitter.text(&delta)).await;
                        }
                        Some(Delta::ToolCalls(fragments)) => accumulator.extend(fragments),
                        None => {}
                    }
                }
            }
        }

        Ok(RoundOutput {
            text,
            calls: accumulator.finish(),
        })
    }

    /// Execute calls in order, appending one tool message per call.
    ///
    /// Returns `false` when canceled part-way.
    async fn run_tools(
        &self,
        calls: &[ToolCallRecord],
        sink: &EventSink,
        emitter: &mut BlockEmitter,
        conversation: &mut Vec<Message>,
    ) -> bool {
        for call in calls {
            if sink.cancel.is_cancelled() {
                return false;
            }
            let label = self.executor.label_for(&call.name);
            let args = if call.raw_arguments.is_empty() {
                call.arguments.to_string()
            } else {
                call.raw_arguments.clone()
            };
            sink.send(emitter.tool_start(&call.name, &label, &args)).await;

            let outcome = tokio::select! {
                biased;
                _ = sink.gone() => return false,
                outcome = self.executor.execute(call) => outcome,
            };
            debug!(
                tool = %outcome.name,
                call_id = %outcome.call_id,
                is_error = outcome.is_error,
                "tool finished"
            );
            sink.send(emitter.tool_result(&outcome.name, &outcome.label, &outcome.result))
                .await;
            conversation.push(Message::tool_result(outcome.call_id, outcome.result));
        }
        true
    }

    async fn fail(&self, sink: &EventSink, err: QuillError) -> Termination {
        if err.is_transport() {
            warn!(error = %err, "upstream transport failed");
        } else {
            error!(error = %err, "agent run failed");
        }
        let message = err.to_string();
        sink.send(StreamEvent::Error {
            message: message.clone(),
        })
        .await;
        Termination::Failed(message)
    }
}

/// Resolves when the idle timer fires; never when there is none.
async fn idle(sleep: &mut Option<Pin<Box<time::Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools.names())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use pretty_assertions::assert_eq;

    /// Serves the same single-round body for every stream call.
    struct OneShot(&'static str);

    #[async_trait]
    impl ChatProvider for OneShot {
        fn model_id(&self) -> &str {
            "one-shot"
        }

        async fn stream_chat(&self, _request: &ChatRequest) -> Result<ByteStream, QuillError> {
            let chunk: Result<Bytes, QuillError> = Ok(Bytes::from_static(self.0.as_bytes()));
            Ok(Box::pin(stream::iter(vec![chunk])))
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<String, QuillError> {
            Ok(String::new())
        }
    }

    fn orchestrator(body: &'static str) -> Orchestrator {
        Orchestrator::new(
            Arc::new(OneShot(body)),
            Arc::new(ToolRegistry::with_defaults()),
            AgentSettings::default(),
        )
    }

    #[tokio::test]
    async fn plain_answer_completes_in_one_round() {
        let orch = orchestrator(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
             data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n\
             data: [DONE]\n\n",
        );
        let (tx, mut rx) = mpsc::channel(16);
        let run = orch
            .run(vec![Message::user("hello")], tx, CancellationToken::new())
            .await;

        assert_eq!(run.termination, Termination::Completed);
        assert_eq!(run.rounds, 1);
        assert_eq!(
            run.blocks,
            vec![Block::Text {
                content: "Hi there".into()
            }]
        );
        assert_eq!(run.conversation.len(), 3);
        assert_eq!(run.conversation[2], Message::assistant("Hi there"));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(events[2].is_done());
    }

    #[tokio::test]
    async fn missing_sentinel_still_ends_the_round() {
        let orch = orchestrator("data: {\"choices\":[{\"delta\":{\"content\":\"cut\"}}]}\n\n");
        let (tx, _rx) = mpsc::channel(16);
        let run = orch.run(vec![Message::user("hi")], tx, CancellationToken::new()).await;
        assert_eq!(run.termination, Termination::Completed);
        assert_eq!(run.conversation.last().map(Message::text), Some("cut"));
    }

    #[tokio::test]
    async fn canceled_before_start_sends_only_done() {
        let orch = orchestrator("data: [DONE]\n\n");
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let run = orch.run(vec![Message::user("hi")], tx, cancel).await;
        assert_eq!(run.termination, Termination::Canceled);
        assert_eq!(run.rounds, 0);
        assert_eq!(rx.recv().await, Some(StreamEvent::Done));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn system_prompt_leads_the_conversation() {
        let orch = orchestrator("data: [DONE]\n\n");
        let (tx, _rx) = mpsc::channel(16);
        let run = orch.run(vec![Message::user("hi")], tx, CancellationToken::new()).await;
        assert_eq!(
            run.conversation[0],
            Message::system(crate::agent::DEFAULT_SYSTEM_PROMPT)
        );
    }
}
