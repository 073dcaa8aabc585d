//! SSE-to-delta bridge: the separate path for callers that
//! receive `TaskEvent`s directly off the A2A SSE stream rather than raw
//! response chunks. Each event carries the full text accumulated so far;
//! this tracks the previously-seen text and hands back only the new
//! suffix.

use cognis_types::TaskEvent;

/// A text delta derived from consecutive `TaskEvent`s for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDelta {
    pub delta: String,
    pub is_final: bool,
}

/// Tracks `prev_text` across a stream of events for a single task and
/// computes the monotone-suffix delta between them.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    prev_text: String,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the delta for `event` and advance the tracker's baseline.
    /// If the new text is no longer than what's already been seen — a
    /// replayed or out-of-order event — the delta is empty and the
    /// baseline is left untouched, since there is nothing new to emit and
    /// shrinking the baseline would re-emit already-seen text on the next
    /// call.
    pub fn advance(&mut self, event: &TaskEvent) -> TextDelta {
        let new_text = event.message.extract_text();
        let delta = if new_text.len() > self.prev_text.len() && new_text.starts_with(self.prev_text.as_str()) {
            let suffix = new_text[self.prev_text.len()..].to_string();
            self.prev_text = new_text;
            suffix
        } else {
            String::new()
        };

        TextDelta {
            delta,
            is_final: event.is_final,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognis_types::{Message, Part, Role, TaskState};

    fn event(text: &str, is_final: bool) -> TaskEvent {
        TaskEvent {
            event_type: "message".to_string(),
            task_id: "t1".to_string(),
            state: TaskState::Working,
            message: Message {
                role: Role::Agent,
                parts: vec![Part::Text { text: text.to_string() }],
                metadata: Default::default(),
            },
            is_final,
        }
    }

    #[test]
    fn first_event_yields_its_full_text_as_the_delta() {
        let mut tracker = DeltaTracker::new();
        let delta = tracker.advance(&event("Hello", false));
        assert_eq!(delta.delta, "Hello");
        assert!(!delta.is_final);
    }

    #[test]
    fn subsequent_events_yield_only_the_new_suffix() {
        let mut tracker = DeltaTracker::new();
        tracker.advance(&event("Hello", false));
        let delta = tracker.advance(&event("Hello, world", true));
        assert_eq!(delta.delta, ", world");
        assert!(delta.is_final);
    }

    #[test]
    fn a_non_growing_event_yields_an_empty_delta() {
        let mut tracker = DeltaTracker::new();
        tracker.advance(&event("Hello, world", false));
        let delta = tracker.advance(&event("Hello", false));
        assert_eq!(delta.delta, "");
    }

    #[test]
    fn an_equal_length_repeat_yields_an_empty_delta() {
        let mut tracker = DeltaTracker::new();
        tracker.advance(&event("Hello", false));
        let delta = tracker.advance(&event("Hello", false));
        assert_eq!(delta.delta, "");
    }

    #[test]
    fn text_that_diverges_rather_than_extends_yields_an_empty_delta() {
        let mut tracker = DeltaTracker::new();
        tracker.advance(&event("Hello", false));
        let delta = tracker.advance(&event("Goodbye now", false));
        assert_eq!(delta.delta, "");
    }
}
