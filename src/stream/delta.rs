//! Classification of decoded payloads into deltas.

use serde::Deserialize;
use tracing::{debug, warn};

use super::decoder::Frame;

/// What a single frame contributes to the round.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Reasoning(String),
    ToolCalls(Vec<ToolCallFragment>),
    Text(String),
    End,
}

/// A piece of a streamed tool call, addressed by slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub index: u32,
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Classify a frame. `None` means the frame carries nothing usable.
pub fn classify(frame: &Frame) -> Option<Delta> {
    match frame {
        Frame::Done => Some(Delta::End),
        Frame::Data(payload) => classify_payload(payload),
    }
}

/// Classify one payload.
///
/// At most one category is produced per payload: reasoning wins over tool
/// calls, which win over text. Malformed JSON is dropped.
pub fn classify_payload(payload: &str) -> Option<Delta> {
    let chunk: StreamChunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(err) => {
            warn!(error = %err, "dropping malformed stream payload");
            return None;
        }
    };

    let Some(delta) = chunk.choices.into_iter().next().and_then(|c| c.delta) else {
        debug!("stream payload without choices");
        return None;
    };

    if let Some(reasoning) = delta.reasoning_content.filter(|r| !r.is_empty()) {
        return Some(Delta::Reasoning(reasoning));
    }
    if let Some(calls) = delta.tool_calls.filter(|c| !c.is_empty()) {
        return Some(Delta::ToolCalls(
            calls.into_iter().map(ToolCallFragment::from).collect(),
        ));
    }
    delta.content.filter(|c| !c.is_empty()).map(Delta::Text)
}

impl From<WireToolCallDelta> for ToolCallFragment {
    fn from(raw: WireToolCallDelta) -> Self {
        let function = raw.function.unwrap_or_default();
        Self {
            index: raw.index.unwrap_or(0),
            id: raw.id.unwrap_or_default(),
            name: function.name.unwrap_or_default(),
            arguments: function.arguments.unwrap_or_default(),
        }
    }
}

// Chat-completion chunk shapes (internal)

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize, Default)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
