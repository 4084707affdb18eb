//! HTTP surface: `POST /agent` streaming wire frames.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::info;

use crate::agent::Orchestrator;
use crate::error::QuillError;
use crate::types::AgentRequest;

/// Event-stream response over [`Orchestrator::stream`].
pub struct SseResponse {
    frames: BoxStream<'static, Bytes>,
}

impl SseResponse {
    pub fn new(frames: BoxStream<'static, Bytes>) -> Self {
        Self { frames }
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = Body::from_stream(self.frames.map(Ok::<_, Infallible>));
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            body,
        )
            .into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/agent", post(agent_handler))
        .with_state(orchestrator)
}

async fn agent_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<AgentRequest>,
) -> Result<SseResponse, StatusCode> {
    if request.messages.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(SseResponse::new(orchestrator.stream(request.messages)))
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, orchestrator: Arc<Orchestrator>) -> Result<(), QuillError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}
