//! In-flight reasoning-trace collection: an agent run accumulates steps
//! under a request id while it's in progress, then hands the finished
//! trace off for persistence — or is torn down without a trace if the
//! run is cancelled.

use std::collections::HashMap;
use std::sync::Mutex;

use cognis_types::{Outcome, ReasoningStep, ReasoningTrace, StepAction};

/// Truncation length for `approach`, the recorded content of the trace's
/// first `think` step.
const APPROACH_MAX_CHARS: usize = 200;

/// Base score before outcome and efficiency adjustments are applied.
const BASE_SUCCESS_SCORE: f64 = 0.5;
const SUCCESS_BONUS: f64 = 0.3;
const PARTIAL_BONUS: f64 = 0.1;
/// Scales `step_count_efficiency`'s 0..=1 range into a score delta.
const EFFICIENCY_DELTA_SCALE: f64 = 0.4;

/// `success_score` for a finished trace: a base score adjusted for how the
/// run ended and how many steps it took to get there.
fn compute_success_score(outcome: Outcome, step_count: usize) -> f64 {
    let outcome_bonus = match outcome {
        Outcome::Success => SUCCESS_BONUS,
        Outcome::Partial => PARTIAL_BONUS,
        Outcome::Failed | Outcome::Interrupted => 0.0,
    };
    let efficiency_delta = (cognis_core::step_count_efficiency(step_count) - 0.5) * EFFICIENCY_DELTA_SCALE;
    (BASE_SUCCESS_SCORE + outcome_bonus + efficiency_delta).clamp(0.0, 1.0)
}

/// The trace's recorded approach: the (possibly truncated) content of its
/// first `think` step, empty if it never reasoned aloud.
fn first_think_approach(steps: &[ReasoningStep]) -> String {
    steps
        .iter()
        .find(|step| step.action == StepAction::Think)
        .map(|step| truncate_chars(&step.content, APPROACH_MAX_CHARS))
        .unwrap_or_default()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Rough token estimate: total step content length divided by four
/// characters per token.
fn estimate_tokens(steps: &[ReasoningStep]) -> u64 {
    let total_chars: usize = steps.iter().map(|step| step.content.chars().count()).sum();
    (total_chars / 4) as u64
}

/// Registry of traces being assembled, keyed by request id. A collection
/// is owned by exactly one caller at a time: `finish`/`cancel` both take
/// the entry out of the map (load-and-delete), so a request id can't be
/// finished twice or have steps pushed to it after completion.
#[derive(Default)]
pub struct CollectorRegistry {
    in_flight: Mutex<HashMap<String, ReasoningTrace>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin collecting a trace for `request_id`. Overwrites any
    /// unfinished collection already registered under the same id.
    pub fn start(&self, request_id: impl Into<String>, query: impl Into<String>) {
        let trace = ReasoningTrace::new(query);
        self.in_flight
            .lock()
            .expect("collector registry mutex poisoned")
            .insert(request_id.into(), trace);
    }

    /// Append a step to the in-flight trace for `request_id`. A no-op if
    /// no collection is registered (the run wasn't started through this
    /// registry, or it already finished).
    pub fn push_step(&self, request_id: &str, step: ReasoningStep) {
        if let Some(trace) = self.in_flight.lock().expect("collector registry mutex poisoned").get_mut(request_id) {
            trace.push_step(step);
        }
    }

    /// Take ownership of the trace for `request_id`, setting its final
    /// outcome and deriving `success_score`, `approach`, and `tokens` from
    /// the accumulated steps. Returns `None` if no collection was
    /// registered under that id.
    pub fn finish(&self, request_id: &str, outcome: Outcome) -> Option<ReasoningTrace> {
        let mut trace = self
            .in_flight
            .lock()
            .expect("collector registry mutex poisoned")
            .remove(request_id)?;
        trace.outcome = outcome;
        trace.success_score = compute_success_score(outcome, trace.steps.len());
        trace.approach = first_think_approach(&trace.steps);
        trace.tokens = estimate_tokens(&trace.steps);
        trace.last_used_at = cognis_types::ids::epoch_seconds();
        Some(trace)
    }

    /// Discard the in-flight trace for `request_id` without ever
    /// persisting it.
    pub fn cancel(&self, request_id: &str) {
        self.in_flight.lock().expect("collector registry mutex poisoned").remove(request_id);
    }

    pub fn is_collecting(&self, request_id: &str) -> bool {
        self.in_flight.lock().expect("collector registry mutex poisoned").contains_key(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32) -> ReasoningStep {
        ReasoningStep {
            step_num: n,
            action: StepAction::Think,
            content: "thinking".to_string(),
            tool_name: None,
            tool_input: None,
            tool_output: None,
            success: true,
            error: None,
            duration_ms: 5,
            timestamp: 0,
        }
    }

    #[test]
    fn finish_returns_the_accumulated_trace_and_clears_the_registry() {
        let registry = CollectorRegistry::new();
        registry.start("req-1", "how do I reset a password");
        registry.push_step("req-1", step(0));
        registry.push_step("req-1", step(1));

        let trace = registry.finish("req-1", Outcome::Success).unwrap();
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.outcome, Outcome::Success);
        assert!(!registry.is_collecting("req-1"));
    }

    #[test]
    fn finish_derives_success_score_approach_and_tokens_from_the_steps() {
        let registry = CollectorRegistry::new();
        registry.start("req-1", "how do I reset a password");
        registry.push_step("req-1", step(0));
        registry.push_step("req-1", step(1));

        let trace = registry.finish("req-1", Outcome::Success).unwrap();
        assert!(trace.success_score > BASE_SUCCESS_SCORE);
        assert_eq!(trace.approach, "thinking");
        assert_eq!(trace.tokens, (8 * 2) / 4);
    }

    #[test]
    fn finish_on_a_failed_run_scores_no_higher_than_the_base() {
        let registry = CollectorRegistry::new();
        registry.start("req-1", "query");
        for n in 0..12 {
            registry.push_step("req-1", step(n));
        }
        let trace = registry.finish("req-1", Outcome::Failed).unwrap();
        assert!(trace.success_score <= BASE_SUCCESS_SCORE);
    }

    #[test]
    fn finish_with_no_think_step_leaves_approach_empty() {
        let registry = CollectorRegistry::new();
        registry.start("req-1", "query");
        let mut tool_step = step(0);
        tool_step.action = StepAction::ToolCall;
        registry.push_step("req-1", tool_step);
        let trace = registry.finish("req-1", Outcome::Success).unwrap();
        assert_eq!(trace.approach, "");
    }

    #[test]
    fn finish_on_an_unknown_request_id_returns_none() {
        let registry = CollectorRegistry::new();
        assert!(registry.finish("missing", Outcome::Success).is_none());
    }

    #[test]
    fn cancel_discards_without_producing_a_trace() {
        let registry = CollectorRegistry::new();
        registry.start("req-2", "query");
        registry.push_step("req-2", step(0));
        registry.cancel("req-2");
        assert!(!registry.is_collecting("req-2"));
        assert!(registry.finish("req-2", Outcome::Success).is_none());
    }

    #[test]
    fn push_step_against_an_unregistered_id_is_a_harmless_no_op() {
        let registry = CollectorRegistry::new();
        registry.push_step("never-started", step(0));
    }
}
