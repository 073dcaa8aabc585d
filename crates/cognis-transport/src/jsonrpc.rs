//! JSON-RPC envelope and A2A wire shapes.

use cognis_types::{Message, TaskEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
    pub id: u64,
}

impl<P> RpcRequest<P> {
    pub fn new(method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
    #[serde(rename = "historyLength", skip_serializing_if = "Option::is_none")]
    pub history_length: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageSendParams {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// The three known result layouts for `message/send`, probed in a fixed
/// order: `result.status.message`, `result.message`,
/// then the last agent-role history entry. An unrecognized shape is a
/// hard error (`Error::UnexpectedResponseFormat`), not a silent default.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SendResult {
    Status { status: StatusWrapper },
    Message { message: Message },
    History { history: Vec<Message> },
    Unrecognized(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusWrapper {
    pub message: Message,
}

impl SendResult {
    /// Extract the response message per the fixed probing order.
    pub fn extract_message(&self) -> Option<Message> {
        match self {
            SendResult::Status { status } => Some(status.message.clone()),
            SendResult::Message { message } => Some(message.clone()),
            SendResult::History { history } => history
                .iter()
                .rev()
                .find(|m| m.role == cognis_types::Role::Agent)
                .cloned(),
            SendResult::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub result: Option<SendResult>,
    pub error: Option<RpcError>,
}

/// A single decoded streamed event, mirroring `cognis_types::TaskEvent`
/// on the wire.
pub type StreamEvent = TaskEvent;
