//! The A2A client half: `Discover`, `SendMessage`, `SendMessageStream`.
//! The unary and streaming HTTP clients are deliberately
//! two separate `reqwest::Client` instances — the streaming one carries no
//! wall-clock timeout, since it must never be killed mid-stream by the
//! unary client's timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cognis_types::{AgentCard, Message, Metadata, Part, Role, TaskEvent};
use futures::StreamExt;

use crate::error::{Error, Result};
use crate::jsonrpc::{Configuration, MessageSendParams, RpcRequest, RpcResponse};
use crate::sse::SseParser;

/// Default unary request timeout.
pub const DEFAULT_UNARY_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-call options recognized by `SendMessage`/`SendMessageStream`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub mode: Option<String>,
    pub persona: Option<String>,
    pub image_base64: Option<String>,
    pub mime_type: Option<String>,
    pub config: Option<Configuration>,
}

impl SendOptions {
    fn into_message(self, text: impl Into<String>) -> (Message, Option<String>, Option<Configuration>) {
        let mut metadata = Metadata::new();
        if let Some(persona) = &self.persona {
            metadata.insert("personaId".to_string(), serde_json::json!(persona));
        }
        if let Some(mode) = &self.mode {
            metadata.insert("mode".to_string(), serde_json::json!(mode));
        }

        let mut message = Message::text_with_metadata(Role::User, text, metadata);
        if let (Some(bytes), Some(mime)) = (self.image_base64.as_ref(), self.mime_type.as_ref()) {
            if !bytes.is_empty() && !mime.is_empty() {
                message = message.with_file_part(bytes.clone(), mime.clone());
            }
        }

        (message, self.mode, self.config)
    }
}

/// Invoked outside the client's internal lock, exactly once per
/// connected/disconnected transition.
pub type StatusHandler = Arc<dyn Fn(bool) + Send + Sync>;

pub struct A2aClient {
    server_url: String,
    unary: reqwest::Client,
    streaming: reqwest::Client,
    connected: AtomicBool,
    status_handler: Option<StatusHandler>,
}

impl A2aClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(server_url, DEFAULT_UNARY_TIMEOUT)
    }

    pub fn with_timeout(server_url: impl Into<String>, unary_timeout: Duration) -> Result<Self> {
        let unary = reqwest::Client::builder().timeout(unary_timeout).build()?;
        let streaming = reqwest::Client::builder().build()?;
        Ok(Self {
            server_url: server_url.into(),
            unary,
            streaming,
            connected: AtomicBool::new(false),
            status_handler: None,
        })
    }

    pub fn with_status_handler(mut self, handler: StatusHandler) -> Self {
        self.status_handler = Some(handler);
        self
    }

    fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous != connected {
            if let Some(handler) = &self.status_handler {
                handler(connected);
            }
        }
    }

    pub async fn discover(&self) -> Result<AgentCard> {
        let url = format!("{}/.well-known/agent-card.json", self.server_url.trim_end_matches('/'));
        let response = match self.unary.get(&url).send().await {
            Ok(r) => r,
            Err(err) => {
                self.set_connected(false);
                return Err(err.into());
            }
        };
        let status = response.status();
        if !status.is_success() {
            self.set_connected(false);
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        let card: AgentCard = response.json().await?;
        self.set_connected(true);
        Ok(card)
    }

    /// POST "/" with `message/send`. If the server upgrades to SSE, the
    /// stream is consumed and the final (`is_final=true`) event's message
    /// is returned; a missing final event is an error. Otherwise the
    /// JSON-RPC result is probed in the fixed three-location order.
    pub async fn send_message(&self, text: &str, options: SendOptions) -> Result<Message> {
        let (message, mode, config) = options.into_message(text);
        let params = MessageSendParams {
            message,
            mode,
            configuration: config,
        };
        let body = RpcRequest::new("message/send", params);

        let response = match self
            .unary
            .post(&self.server_url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(err) => {
                self.set_connected(false);
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.set_connected(false);
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let is_sse = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);

        self.set_connected(true);

        if is_sse {
            let mut final_message = None;
            let mut stream = response.bytes_stream();
            let mut parser = SseParser::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                for event in parser.push(&chunk) {
                    if let Some(task_event) = decode_task_event(&event.data) {
                        if task_event.is_final {
                            final_message = Some(task_event.message);
                        }
                    }
                }
            }
            if let Some(event) = parser.finish() {
                if let Some(task_event) = decode_task_event(&event.data) {
                    if task_event.is_final {
                        final_message = Some(task_event.message);
                    }
                }
            }
            return final_message.ok_or(Error::MissingFinalEvent);
        }

        let rpc: RpcResponse = response.json().await?;
        if let Some(err) = rpc.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        rpc.result
            .and_then(|r| r.extract_message())
            .ok_or(Error::UnexpectedResponseFormat)
    }

    /// POST "/" with `message/stream`. Each decoded `TaskEvent` is passed
    /// to `handler`; the loop stops on EOF or the first `is_final=true`
    /// event. Individual JSON-decode failures are logged and the event
    /// skipped, never terminating the stream.
    pub async fn send_message_stream(
        &self,
        text: &str,
        options: SendOptions,
        mut handler: impl FnMut(TaskEvent),
    ) -> Result<()> {
        let (message, mode, config) = options.into_message(text);
        let params = MessageSendParams {
            message,
            mode,
            configuration: config,
        };
        let body = RpcRequest::new("message/stream", params);

        let response = match self
            .streaming
            .post(&self.server_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(err) => {
                self.set_connected(false);
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.set_connected(false);
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        self.set_connected(true);

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in parser.push(&chunk) {
                match serde_json::from_str::<TaskEvent>(&event.data) {
                    Ok(task_event) => {
                        let is_final = task_event.is_final;
                        handler(task_event);
                        if is_final {
                            return Ok(());
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping undecodable stream event");
                    }
                }
            }
        }
        if let Some(event) = parser.finish() {
            match serde_json::from_str::<TaskEvent>(&event.data) {
                Ok(task_event) => handler(task_event),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable stream event");
                }
            }
        }
        Ok(())
    }
}

fn decode_task_event(data: &str) -> Option<TaskEvent> {
    match serde_json::from_str::<TaskEvent>(data) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(error = %err, "skipping undecodable stream event");
            None
        }
    }
}
