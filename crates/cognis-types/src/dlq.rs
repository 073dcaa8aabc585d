//! Dead-letter records.

use crate::ids::Id;
use crate::task::{Priority, TaskEnvelope, TaskType};
use serde::{Deserialize, Serialize};

/// Wraps a failed task with the error that killed it and how many times
/// it had already been retried. Re-publishing preserves the original
/// priority/type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: Id,
    pub original: TaskEnvelope,
    pub error: String,
    pub retry_count: u32,
    pub dead_at: i64,
}

impl DeadLetter {
    pub fn new(original: TaskEnvelope, error: impl Into<String>, retry_count: u32, dead_at: i64) -> Self {
        Self {
            id: Id::new(),
            original,
            error: error.into(),
            retry_count,
            dead_at,
        }
    }

    /// Original priority, preserved across the dead-letter round-trip.
    pub fn original_priority(&self) -> Priority {
        self.original.priority
    }

    /// Original type, preserved across the dead-letter round-trip.
    pub fn original_type(&self) -> TaskType {
        self.original.task_type
    }
}
