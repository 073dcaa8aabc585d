//! Heartbeat records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Liveness status reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Busy,
    Degraded,
    ShuttingDown,
}

/// One heartbeat record. The most recent record per agent is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub agent: String,
    pub status: AgentStatus,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Heartbeat {
    pub fn new(agent: impl Into<String>, status: AgentStatus, timestamp: i64) -> Self {
        Self {
            agent: agent.into(),
            status,
            timestamp,
            metadata: BTreeMap::new(),
        }
    }
}
