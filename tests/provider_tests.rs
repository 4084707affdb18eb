//! Tests for the OpenAI-compatible provider against a mock HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{collect_events, text, tool_call, DONE};
use quill::agent::{AgentSettings, Orchestrator, Termination};
use quill::config::QuillConfig;
use quill::error::QuillError;
use quill::provider::{ChatProvider, ChatRequest, OpenAiCompatibleProvider};
use quill::stream::{classify, decode_frames, Delta};
use quill::tools::ToolRegistry;
use quill::types::{Message, StreamEvent};

fn provider_for(server: &MockServer) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new("glm-5", "test-key", server.uri(), Duration::from_secs(5)).unwrap()
}

fn sse(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn stream_chat_posts_and_decodes_deltas() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("\"stream\":true"))
        .and(body_string_contains("\"model\":\"glm-5\""))
        .respond_with(sse([text("Hel"), text("lo"), DONE.to_string()].concat()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let bytes = provider
        .stream_chat(&ChatRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap();

    let deltas: Vec<Delta> = decode_frames(bytes)
        .filter_map(|frame| async move { frame.ok().as_ref().and_then(classify) })
        .collect()
        .await;
    assert_eq!(
        deltas,
        vec![
            Delta::Text("Hel".into()),
            Delta::Text("lo".into()),
            Delta::End
        ]
    );
}

#[tokio::test]
async fn request_carries_tool_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("\"tools\":[{"))
        .and(body_string_contains("\"name\":\"generate_diary\""))
        .and(body_string_contains("\"name\":\"create_plan\""))
        .respond_with(sse(DONE.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let request = ChatRequest::new(vec![Message::user("hi")])
        .with_tools(ToolRegistry::with_defaults().definitions());
    provider.stream_chat(&request).await.unwrap();
}

#[tokio::test]
async fn complete_returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("\"stream\":false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "# Plan"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let text = provider
        .complete(&ChatRequest::new(vec![Message::user("plan")]))
        .await
        .unwrap();
    assert_eq!(text, "# Plan");
}

#[tokio::test]
async fn complete_without_choices_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let text = provider
        .complete(&ChatRequest::new(vec![Message::user("plan")]))
        .await
        .unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = match provider
        .stream_chat(&ChatRequest::new(vec![Message::user("hi")]))
        .await
    {
        Ok(_) => panic!("expected authentication error"),
        Err(err) => err,
    };
    assert!(matches!(&err, QuillError::Authentication(body) if body == "bad key"));
    assert!(err.is_transport());
}

#[tokio::test]
async fn rate_limit_carries_retry_hint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"retry_after": 2}})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .complete(&ChatRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuillError::RateLimited {
            retry_after_ms: Some(2000)
        }
    ));
}

#[tokio::test]
async fn server_error_ends_the_run_with_an_error_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let config = QuillConfig::default()
        .with_api_key("test-key")
        .with_base_url(server.uri());
    let orch = Orchestrator::from_config(&config).unwrap();

    let (tx, rx) = mpsc::channel(16);
    let run = orch.run(vec![Message::user("hi")], tx, CancellationToken::new()).await;
    let events = collect_events(rx).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Error {
                message: "API error (status 502): bad gateway".into()
            },
            StreamEvent::Done,
        ]
    );
    assert!(matches!(run.termination, Termination::Failed(_)));
}

#[tokio::test]
async fn full_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("\"stream\":true"))
        .respond_with(sse(
            [
                tool_call(0, "call_1", "create_plan", "{\"goal\":\"learn"),
                tool_call(0, "", "", " Rust\"}"),
                DONE.to_string(),
            ]
            .concat(),
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("\"stream\":true"))
        .and(body_string_contains("\"tool_call_id\":\"call_1\""))
        .respond_with(sse([text("Here is your plan."), DONE.to_string()].concat()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("\"stream\":false"))
        .and(body_string_contains("Goal: learn Rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "## Week 1"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(provider_for(&server));
    let orch = Orchestrator::new(
        provider,
        Arc::new(ToolRegistry::with_defaults()),
        AgentSettings::default(),
    );

    let (tx, rx) = mpsc::channel(16);
    let run = orch
        .run(vec![Message::user("help me learn Rust")], tx, CancellationToken::new())
        .await;
    let events = collect_events(rx).await;

    assert_eq!(run.termination, Termination::Completed);
    assert_eq!(run.rounds, 2);
    assert_eq!(
        events[1],
        StreamEvent::ToolResult {
            index: 0,
            name: "create_plan".into(),
            label: "Plan".into(),
            result: "## Week 1".into(),
        }
    );
    assert_eq!(
        events[2],
        StreamEvent::Text {
            index: 1,
            content: "Here is your plan.".into(),
        }
    );
    assert_eq!(events.len(), 4);
}
