//! Sample data builders for `Message`/`TaskEnvelope`/`Template`, so tests
//! construct fixtures by intent ("a probation template for this task
//! type") rather than repeating every field of the underlying struct.

use std::collections::BTreeMap;

use cognis_core::{derive_grammar, validate_flat};
use cognis_types::{
    FlatSchema, Message, Priority, Role, SourceTier, TaskEnvelope, TaskType, Template,
};

/// A one-line user text message.
pub fn user_message(text: impl Into<String>) -> Message {
    Message::text(Role::User, text)
}

/// A one-line agent text message.
pub fn agent_message(text: impl Into<String>) -> Message {
    Message::text(Role::Agent, text)
}

/// A `Normal`-priority, `Reasoning`-type task carrying one string payload
/// field under the key `"input"`.
pub fn reasoning_task(from: impl Into<String>, input: impl Into<String>) -> TaskEnvelope {
    let mut payload = BTreeMap::new();
    payload.insert("input".to_string(), serde_json::json!(input.into()));
    TaskEnvelope::new(from, None, Priority::Normal, TaskType::Reasoning, payload)
}

/// A task built with an explicit priority and type, for broker-ordering
/// tests that need more than the `Normal`/`Reasoning` default.
pub fn task(from: impl Into<String>, priority: Priority, task_type: TaskType) -> TaskEnvelope {
    TaskEnvelope::new(from, None, priority, task_type, BTreeMap::new())
}

/// A freshly-distilled template: one string variable named `input`, a
/// body that echoes it back, on probation for the given task type.
pub fn probation_template(task_type: impl Into<String>, name: impl Into<String>) -> Template {
    let schema = FlatSchema(serde_json::json!({
        "type": "object",
        "properties": {"input": {"type": "string"}},
    }));
    validate_flat(&schema.0).expect("fixture schema is flat by construction");
    let grammar = derive_grammar(&schema.0).unwrap_or_default();
    Template::new(name, "echoes the input variable", "{{input}}", schema, grammar, task_type, SourceTier::Distillation, None)
}

/// A manually-authored template, bypassing distillation entirely (the
/// `SourceTier::Manual` path).
pub fn manual_template(task_type: impl Into<String>, name: impl Into<String>, body: impl Into<String>) -> Template {
    let schema = FlatSchema(serde_json::json!({"type": "object", "properties": {}}));
    Template::new(name, "a hand-authored template", body, schema, String::new(), task_type, SourceTier::Manual, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_task_carries_its_input_in_the_payload() {
        let task = reasoning_task("gateway", "hello");
        assert_eq!(task.task_type, TaskType::Reasoning);
        assert_eq!(task.payload["input"], serde_json::json!("hello"));
    }

    #[test]
    fn probation_template_starts_on_probation_with_initial_confidence() {
        let template = probation_template("reasoning", "echo");
        assert_eq!(template.status, cognis_types::TemplateStatus::Probation);
        assert_eq!(template.confidence, Template::INITIAL_CONFIDENCE);
    }
}
