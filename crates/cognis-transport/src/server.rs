//! The A2A server half: the agent-card endpoint and the `POST /`
//! JSON-RPC dispatcher for `message/send`/`message/stream`. The brain
//! is bidirectional — it is also a server
//! to the avatar client and to other agent workers — so this lives
//! alongside the client in the same crate.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use cognis_types::{AgentCard, Message, TaskEvent};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::jsonrpc::Configuration;

pub type TaskEventStream = Pin<Box<dyn Stream<Item = TaskEvent> + Send>>;

/// Implemented by whatever sits behind the A2A server (the brain's
/// dispatcher, in `cognis-sdk`). Handlers are never called with a `to`
/// that doesn't belong to this agent; routing above the transport layer
/// is out of scope here.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_send(
        &self,
        message: Message,
        mode: Option<String>,
        config: Option<Configuration>,
    ) -> Result<Message, String>;

    async fn handle_stream(
        &self,
        message: Message,
        mode: Option<String>,
        config: Option<Configuration>,
    ) -> TaskEventStream;
}

struct ServerState {
    card: AgentCard,
    handler: Arc<dyn MessageHandler>,
}

pub fn router(card: AgentCard, handler: Arc<dyn MessageHandler>) -> Router {
    let state = Arc::new(ServerState { card, handler });
    Router::new()
        .route("/.well-known/agent-card.json", get(agent_card))
        .route("/", post(dispatch))
        .with_state(state)
}

async fn agent_card(State(state): State<Arc<ServerState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

#[derive(Debug, Deserialize)]
struct IncomingParams {
    message: Message,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    configuration: Option<Configuration>,
}

#[derive(Debug, Deserialize)]
struct IncomingRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: IncomingParams,
    id: serde_json::Value,
}

async fn dispatch(State(state): State<Arc<ServerState>>, body: String) -> Response {
    let request: IncomingRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": err.to_string()}})),
            )
                .into_response()
        }
    };

    match request.method.as_str() {
        "message/send" => {
            let result = state
                .handler
                .handle_send(
                    request.params.message,
                    request.params.mode,
                    request.params.configuration,
                )
                .await;
            match result {
                Ok(message) => Json(json!({
                    "jsonrpc": "2.0",
                    "id": request.id,
                    "result": {"message": message},
                }))
                .into_response(),
                Err(err) => Json(json!({
                    "jsonrpc": "2.0",
                    "id": request.id,
                    "error": {"code": -32000, "message": err},
                }))
                .into_response(),
            }
        }
        "message/stream" => {
            let stream = state
                .handler
                .handle_stream(
                    request.params.message,
                    request.params.mode,
                    request.params.configuration,
                )
                .await;
            let sse_stream = stream.map(|event| {
                let data = serde_json::to_string(&event).unwrap_or_default();
                Ok::<_, std::convert::Infallible>(Event::default().data(data))
            });
            Sse::new(sse_stream).into_response()
        }
        other => Json(json!({
            "jsonrpc": "2.0",
            "id": request.id,
            "error": {"code": -32601, "message": format!("method not found: {other}")},
        }))
        .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognis_types::Role;
    use tower::ServiceExt;

    struct EchoHandler;

    #[async_trait]
    impl MessageHandler for EchoHandler {
        async fn handle_send(
            &self,
            message: Message,
            _mode: Option<String>,
            _config: Option<Configuration>,
        ) -> Result<Message, String> {
            Ok(Message::text(Role::Agent, message.extract_text()))
        }

        async fn handle_stream(
            &self,
            _message: Message,
            _mode: Option<String>,
            _config: Option<Configuration>,
        ) -> TaskEventStream {
            Box::pin(futures::stream::empty())
        }
    }

    fn sample_card() -> AgentCard {
        AgentCard {
            name: "test-agent".to_string(),
            version: "0.1.0".to_string(),
            protocol_version: "0.3.0".to_string(),
            description: "test".to_string(),
            capabilities: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn dispatch_routes_message_send_to_handler() {
        let router = router(sample_card(), Arc::new(EchoHandler));
        let body = json!({
            "jsonrpc": "2.0",
            "method": "message/send",
            "params": {"message": {"role": "user", "parts": [{"kind": "text", "text": "hi"}]}},
            "id": 1
        })
        .to_string();

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["result"]["message"]["parts"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn unknown_method_returns_rpc_error() {
        let router = router(sample_card(), Arc::new(EchoHandler));
        let body = json!({
            "jsonrpc": "2.0",
            "method": "unknown/method",
            "params": {"message": {"role": "user", "parts": []}},
            "id": 1
        })
        .to_string();

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn agent_card_endpoint_serves_configured_card() {
        let router = router(sample_card(), Arc::new(EchoHandler));
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("GET")
                    .uri("/.well-known/agent-card.json")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let card: AgentCard = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(card.name, "test-agent");
    }
}
