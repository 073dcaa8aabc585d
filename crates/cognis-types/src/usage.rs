//! Usage logs: one per template execution.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLog {
    pub id: Id,
    pub template_id: Id,
    pub user_input: String,
    pub rendered_output: String,
    pub timestamp: i64,
    pub graded: bool,
}

impl UsageLog {
    pub fn new(template_id: Id, user_input: impl Into<String>, rendered_output: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            template_id,
            user_input: user_input.into(),
            rendered_output: rendered_output.into(),
            timestamp: epoch_seconds(),
            graded: false,
        }
    }
}
