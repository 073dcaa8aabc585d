//! The task envelope and stream-naming scheme.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Priority determines which of the four broker streams a task lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Priority {
    /// All priorities, highest first — the broker's fixed poll order.
    pub const ALL_HIGH_TO_LOW: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

/// The kind of work a task carries; jointly with priority selects a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Reasoning,
    ToolCall,
    Distillation,
    Grading,
    Control,
}

impl TaskType {
    fn as_str(&self) -> &'static str {
        match self {
            TaskType::Reasoning => "reasoning",
            TaskType::ToolCall => "tool_call",
            TaskType::Distillation => "distillation",
            TaskType::Grading => "grading",
            TaskType::Control => "control",
        }
    }
}

/// Stream name for a given (priority, type) pair.
pub fn stream_name(priority: Priority, task_type: TaskType) -> String {
    format!("tasks:{}:{}", priority.as_str(), task_type.as_str())
}

/// The fixed per-priority stream the broker subscribes to (one of exactly
/// four). `stream_name` above supports finer, type-aware routing for
/// callers that want it; the priority broker itself polls these four
/// coarser streams in `Priority::ALL_HIGH_TO_LOW` order, matching the
/// literal "four priority streams" framing of the broker's contract.
pub fn priority_stream_name(priority: Priority) -> String {
    format!("tasks:{}", priority.as_str())
}

/// Dedicated stream name for heartbeats (one stream total).
pub fn heartbeat_stream_name() -> &'static str {
    "heartbeats"
}

/// Dedicated stream name for the dead-letter tail.
pub fn dlq_stream_name() -> &'static str {
    "dlq"
}

/// Per-agent direct-message stream, `messages:<agent>`.
pub fn agent_message_stream_name(agent: &str) -> String {
    format!("messages:{}", agent)
}

/// The consumer-group name used by priority processors.
pub const AGENTS_CONSUMER_GROUP: &str = "agents";

/// A unit of work passed through the broker, by value, with no owner in
/// flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: Id,
    pub from: String,
    pub to: Option<String>,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub payload: BTreeMap<String, serde_json::Value>,
    pub created: i64,
}

impl TaskEnvelope {
    pub fn new(
        from: impl Into<String>,
        to: Option<String>,
        priority: Priority,
        task_type: TaskType,
        payload: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Id::new(),
            from: from.into(),
            to,
            priority,
            task_type,
            payload,
            created: epoch_seconds(),
        }
    }

    /// The stream this task is destined for.
    pub fn stream(&self) -> String {
        stream_name(self.priority, self.task_type)
    }
}
