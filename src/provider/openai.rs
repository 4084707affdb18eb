//! OpenAI-compatible Chat Completions provider.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::config::QuillConfig;
use crate::error::QuillError;
use crate::stream::ByteStream;
use crate::types::{Message, Role};

use super::http::{bearer_headers, build_client, status_to_error};
use super::{ChatProvider, ChatRequest};

pub struct OpenAiCompatibleProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, QuillError> {
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(connect_timeout)?,
        })
    }

    /// Build from configuration. Fails when no API key is configured.
    pub fn from_config(config: &QuillConfig) -> Result<Self, QuillError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            QuillError::Configuration("Missing QUILL_API_KEY (or ZHIPUAI_API_KEY)".into())
        })?;
        Self::new(
            config.model.clone(),
            api_key,
            config.base_url.clone(),
            config.connect_timeout(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request_body(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });

        if let (Some(tools), Some(obj)) = (&request.tools, body.as_object_mut()) {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
        }

        body
    }

    async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, QuillError> {
        let resp = self
            .client
            .post(self.endpoint())
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<ByteStream, QuillError> {
        let body = self.build_request_body(request, true);
        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "chat completion stream"
        );

        let resp = self.post(&body).await?;
        Ok(Box::pin(resp.bytes_stream().map_err(QuillError::Network)))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, QuillError> {
        let body = self.build_request_body(request, false);
        debug!(model = %self.model, "chat completion");

        let resp = self.post(&body).await?;
        let data: ChatCompletionResponse = resp.json().await?;
        Ok(data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Convert a conversation message to the chat-completions wire shape.
pub fn message_to_openai(msg: &Message) -> serde_json::Value {
    match msg.role {
        Role::Assistant if !msg.tool_calls.is_empty() => {
            let tool_calls: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            serde_json::json!({
                "role": "assistant",
                "content": msg.content,
                "tool_calls": tool_calls,
            })
        }
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "content": msg.text(),
        }),
        role => serde_json::json!({
            "role": role.to_string(),
            "content": msg.text(),
        }),
    }
}

// Chat-completion response types (internal)

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}
