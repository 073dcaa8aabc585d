//! Record of one distillation attempt (successful or not), independent of
//! whether it produced a persisted template.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistillationAttempt {
    pub id: Id,
    pub task_type: String,
    pub source_request_id: Option<String>,
    pub schema_valid: bool,
    pub compilation_passed: bool,
    /// Set only when both safety valves passed and a template was
    /// actually persisted.
    pub template_id: Option<Id>,
    pub failure_reason: Option<String>,
    pub created_at: i64,
}

impl DistillationAttempt {
    pub fn new(task_type: impl Into<String>, source_request_id: Option<String>) -> Self {
        Self {
            id: Id::new(),
            task_type: task_type.into(),
            source_request_id,
            schema_valid: false,
            compilation_passed: false,
            template_id: None,
            failure_reason: None,
            created_at: epoch_seconds(),
        }
    }

    pub fn succeeded(mut self, template_id: Id) -> Self {
        self.schema_valid = true;
        self.compilation_passed = true;
        self.template_id = Some(template_id);
        self
    }

    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}
