//! The agent-card wire shape served at `/.well-known/agent-card.json`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub version: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: serde_json::Value,
}
