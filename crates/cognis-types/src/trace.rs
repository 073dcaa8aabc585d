//! Reasoning traces: recorded agent runs, reusable on similar future
//! queries.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};

/// How a reasoning run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Partial,
    Failed,
    Interrupted,
}

/// What a single reasoning step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Think,
    ToolCall,
    ToolResult,
    Conclude,
}

/// One immutable step within a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_num: u32,
    pub action: StepAction,
    pub content: String,
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
    pub tool_output: Option<serde_json::Value>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: i64,
}

/// A recorded sequence of steps from a single agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub id: Id,
    pub query: String,
    pub query_embedding: Option<Vec<f32>>,
    pub approach: String,
    pub steps: Vec<ReasoningStep>,
    pub outcome: Outcome,
    pub success_score: f64,
    pub reused_count: u64,
    pub tools_used: Vec<String>,
    pub duration_ms: u64,
    pub tokens: u64,
    pub created_at: i64,
    pub last_used_at: i64,
}

impl ReasoningTrace {
    pub fn new(query: impl Into<String>) -> Self {
        let now = epoch_seconds();
        Self {
            id: Id::new(),
            query: query.into(),
            query_embedding: None,
            approach: String::new(),
            steps: Vec::new(),
            outcome: Outcome::Interrupted,
            success_score: 0.0,
            reused_count: 0,
            tools_used: Vec::new(),
            duration_ms: 0,
            tokens: 0,
            created_at: now,
            last_used_at: now,
        }
    }

    /// Append a step, de-duplicating the tool name into `tools_used`.
    pub fn push_step(&mut self, step: ReasoningStep) {
        if let Some(name) = &step.tool_name {
            if !self.tools_used.iter().any(|t| t == name) {
                self.tools_used.push(name.clone());
            }
        }
        if !step.success {
            if let Some(err) = &step.error {
                if !err.is_empty() {
                    self.outcome = Outcome::Failed;
                }
            }
        }
        self.steps.push(step);
    }

    /// Steps are contiguous and gapless by construction; this asserts
    /// that invariant for tests and diagnostics.
    pub fn has_contiguous_step_numbers(&self) -> bool {
        if self.steps.is_empty() {
            return true;
        }
        let first = self.steps.first().unwrap().step_num;
        let last = self.steps.last().unwrap().step_num;
        self.steps.len() as u32 == last + 1 - first
            && self
                .steps
                .windows(2)
                .all(|w| w[1].step_num == w[0].step_num + 1)
    }

    /// Record a reuse: atomically (from the caller's point of view, once
    /// persisted through the store) bump count and refresh last-used time.
    pub fn mark_reused(&mut self) {
        self.reused_count += 1;
        self.last_used_at = epoch_seconds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, action: StepAction) -> ReasoningStep {
        ReasoningStep {
            step_num: n,
            action,
            content: String::new(),
            tool_name: None,
            tool_input: None,
            tool_output: None,
            success: true,
            error: None,
            duration_ms: 0,
            timestamp: 0,
        }
    }

    #[test]
    fn steps_are_gapless() {
        let mut trace = ReasoningTrace::new("q");
        trace.push_step(step(0, StepAction::Think));
        trace.push_step(step(1, StepAction::ToolCall));
        trace.push_step(step(2, StepAction::Conclude));
        assert!(trace.has_contiguous_step_numbers());
    }

    #[test]
    fn tool_names_are_deduplicated() {
        let mut trace = ReasoningTrace::new("q");
        let mut s1 = step(0, StepAction::ToolCall);
        s1.tool_name = Some("grep".to_string());
        let mut s2 = step(1, StepAction::ToolCall);
        s2.tool_name = Some("grep".to_string());
        trace.push_step(s1);
        trace.push_step(s2);
        assert_eq!(trace.tools_used, vec!["grep".to_string()]);
    }

    #[test]
    fn failed_step_transitions_outcome_to_failed() {
        let mut trace = ReasoningTrace::new("q");
        let mut s = step(0, StepAction::ToolCall);
        s.success = false;
        s.error = Some("boom".to_string());
        trace.push_step(s);
        assert_eq!(trace.outcome, Outcome::Failed);
    }

    #[test]
    fn mark_reused_increments_count() {
        let mut trace = ReasoningTrace::new("q");
        trace.mark_reused();
        trace.mark_reused();
        assert_eq!(trace.reused_count, 2);
    }
}
