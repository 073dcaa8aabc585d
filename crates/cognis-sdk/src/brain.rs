//! The brain façade: one struct gluing C6 (`cognis-engine::Lifecycle`),
//! the dead-letter store, and the A2A transport's server half behind a
//! single `MessageHandler` implementation, so a caller talking JSON-RPC
//! to one endpoint gets template-backed reasoning without knowing the
//! lifecycle or dead-letter plumbing behind it.

use std::sync::Arc;

use async_trait::async_trait;
use cognis_core::{Embedder, Variables};
use cognis_engine::{DistillationOutcome, GraderModel, HealthState, Lifecycle, LifecycleMetrics, TeacherModel};
use cognis_index::{DeadLetterStore, Database};
use cognis_transport::{router, Configuration, MessageHandler, TaskEventStream};
use cognis_types::{AgentCard, Id, Message, Role, TaskEvent, TaskState, UsageLog};
use serde_json::json;

use crate::config::BrainConfig;
use crate::error::{Error, Result};

/// Maximum words per emitted chunk in `handle_stream`'s cumulative-text
/// fanout — a modest, fixed granularity rather than a per-token stream,
/// since the template render path here produces a response in one shot
/// rather than incrementally.
const STREAM_WORDS_PER_CHUNK: usize = 8;

pub struct Brain {
    lifecycle: Lifecycle,
    dead_letters: DeadLetterStore,
    config: BrainConfig,
}

impl Brain {
    pub fn new(db: Arc<Database>, config: BrainConfig) -> Self {
        let lifecycle = Lifecycle::new(db.clone(), config.lifecycle.clone());
        Self {
            lifecycle,
            dead_letters: DeadLetterStore::new(db),
            config,
        }
    }

    pub fn with_teacher(mut self, teacher: Arc<dyn TeacherModel>) -> Self {
        self.lifecycle = self.lifecycle.with_teacher(teacher);
        self
    }

    pub fn with_grader(mut self, grader: Arc<dyn GraderModel>) -> Self {
        self.lifecycle = self.lifecycle.with_grader(grader);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.lifecycle = self.lifecycle.with_embedder(embedder);
        self
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn dead_letters(&self) -> &DeadLetterStore {
        &self.dead_letters
    }

    pub fn metrics(&self) -> Result<LifecycleMetrics> {
        self.lifecycle.collect_metrics().map_err(Into::into)
    }

    pub fn card(&self) -> AgentCard {
        AgentCard {
            name: self.config.agent_name.clone(),
            version: self.config.agent_version.clone(),
            protocol_version: "0.3.0".to_string(),
            description: self.config.agent_description.clone(),
            capabilities: json!({"streaming": true}),
        }
    }

    /// Build the A2A server router with this brain wired in as the
    /// handler, plus a `/healthz` liveness endpoint reporting C6's health
    /// score alongside the agent-card-style discovery endpoint.
    pub fn router(self: Arc<Self>) -> axum::Router {
        let healthz = {
            let brain = self.clone();
            move || async move { brain.healthz_body() }
        };
        router(self.card(), self).route("/healthz", axum::routing::get(healthz))
    }

    fn healthz_body(&self) -> axum::Json<serde_json::Value> {
        let body = match self.metrics() {
            Ok(metrics) => json!({
                "status": health_state_label(metrics.health_state()),
                "health_score": metrics.health_score,
                "promoted_templates": metrics.promoted_count,
                "probation_templates": metrics.probation_count,
            }),
            Err(err) => json!({"status": "unhealthy", "error": err.to_string()}),
        };
        axum::Json(body)
    }

    /// Resolve `task_type`/`query` to response text: a promoted
    /// template if one exists for `task_type`, the highest-confidence
    /// one winning; otherwise a fresh distillation via the configured
    /// teacher. Returns the usage-log id when a template was used, so
    /// the caller can grade it later.
    async fn respond(&self, task_type: &str, query: &str) -> Result<(String, Option<Id>)> {
        let candidates = self.lifecycle.templates().promoted_for_type(task_type)?;

        if let Some(template) = candidates.into_iter().next() {
            let compiled = match cognis_core::compile(&template.template_body) {
                Ok(compiled) => compiled,
                Err(err) => {
                    tracing::error!(error = %err, template_id = %template.id, "promoted template failed to recompile, falling back to distillation");
                    return self.distill(task_type, query).await;
                }
            };
            let mut vars = Variables::new();
            vars.insert("Input".to_string(), json!(query));
            let rendered = compiled.render(&vars);

            let usage = UsageLog::new(template.id, query, rendered.clone());
            self.lifecycle.usage_logs().insert(&usage)?;

            return Ok((rendered, Some(usage.id)));
        }

        self.distill(task_type, query).await
    }

    async fn distill(&self, task_type: &str, query: &str) -> Result<(String, Option<Id>)> {
        match self.lifecycle.solve_and_teach(task_type, query, None).await {
            Ok(DistillationOutcome::Created { solution, .. }) => Ok((solution, None)),
            Ok(DistillationOutcome::SolutionOnly { solution, .. }) => Ok((solution, None)),
            Err(cognis_engine::Error::Model(_)) => Err(Error::NoResponder),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl MessageHandler for Brain {
    async fn handle_send(
        &self,
        message: Message,
        mode: Option<String>,
        _config: Option<Configuration>,
    ) -> std::result::Result<Message, String> {
        let task_type = mode.unwrap_or_else(|| self.config.default_task_type.clone());
        let query = message.extract_text();

        let (text, _usage_id) = self.respond(&task_type, &query).await.map_err(|err| err.to_string())?;
        Ok(Message::text(Role::Agent, text))
    }

    async fn handle_stream(
        &self,
        message: Message,
        mode: Option<String>,
        _config: Option<Configuration>,
    ) -> TaskEventStream {
        let task_type = mode.unwrap_or_else(|| self.config.default_task_type.clone());
        let query = message.extract_text();
        let task_id = Id::new().to_string();

        match self.respond(&task_type, &query).await {
            Ok((text, _usage_id)) => Box::pin(futures::stream::iter(cumulative_events(task_id, &text))),
            Err(err) => {
                let event = TaskEvent {
                    event_type: "message".to_string(),
                    task_id,
                    state: TaskState::Failed,
                    message: Message::text(Role::Agent, err.to_string()),
                    is_final: true,
                };
                Box::pin(futures::stream::once(async move { event }))
            }
        }
    }
}

fn health_state_label(state: HealthState) -> &'static str {
    match state {
        HealthState::Healthy => "healthy",
        HealthState::Degraded => "degraded",
        HealthState::Unhealthy => "unhealthy",
    }
}

/// Split `text` into growing prefixes at `STREAM_WORDS_PER_CHUNK`-word
/// boundaries, each event carrying the full text accumulated so far, so
/// the SSE bridge on the other end always sees a monotone-suffix delta
/// against a cumulative shape. The last event is marked final.
fn cumulative_events(task_id: String, text: &str) -> Vec<TaskEvent> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![TaskEvent {
            event_type: "message".to_string(),
            task_id,
            state: TaskState::Completed,
            message: Message::text(Role::Agent, String::new()),
            is_final: true,
        }];
    }

    let mut events = Vec::new();
    let mut emitted = 0;
    while emitted < words.len() {
        emitted = (emitted + STREAM_WORDS_PER_CHUNK).min(words.len());
        let is_final = emitted == words.len();
        let cumulative = words[..emitted].join(" ");
        events.push(TaskEvent {
            event_type: "message".to_string(),
            task_id: task_id.clone(),
            state: if is_final { TaskState::Completed } else { TaskState::Working },
            message: Message::text(Role::Agent, cumulative),
            is_final,
        });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cognis_engine::{GradeRequest, GraderVerdict, TeacherResponse};
    use cognis_types::{FlatSchema, SourceTier, Template};
    use futures::StreamExt;

    struct FixedTeacher(TeacherResponse);

    #[async_trait]
    impl TeacherModel for FixedTeacher {
        async fn solve_and_teach(&self, _task_type: &str, _user_input: &str) -> std::result::Result<TeacherResponse, String> {
            Ok(self.0.clone())
        }
    }

    struct NoTeacher;

    #[async_trait]
    impl TeacherModel for NoTeacher {
        async fn solve_and_teach(&self, _task_type: &str, _user_input: &str) -> std::result::Result<TeacherResponse, String> {
            Err("no teacher wired up".to_string())
        }
    }

    struct NeverCalledGrader;

    #[async_trait]
    impl GraderModel for NeverCalledGrader {
        async fn grade(&self, _request: GradeRequest<'_>) -> std::result::Result<GraderVerdict, String> {
            panic!("grader should not be invoked")
        }
    }

    fn brain_with_teacher(response: TeacherResponse) -> Brain {
        let db = Arc::new(Database::open_in_memory().unwrap());
        Brain::new(db, BrainConfig::default())
            .with_teacher(Arc::new(FixedTeacher(response)))
            .with_grader(Arc::new(NeverCalledGrader))
    }

    #[tokio::test]
    async fn handle_send_falls_back_to_distillation_with_no_promoted_template() {
        let brain = brain_with_teacher(TeacherResponse {
            intent: "answer a greeting".to_string(),
            schema: json!({"type": "object", "properties": {"x": {"type": "string"}}}),
            template_body: "Hi there".to_string(),
            solution: "Hello back!".to_string(),
        });

        let reply = brain
            .handle_send(Message::text(Role::User, "hi"), None, None)
            .await
            .unwrap();
        assert_eq!(reply.extract_text(), "Hello back!");
    }

    #[tokio::test]
    async fn handle_send_prefers_a_promoted_template_over_distillation() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let brain = Brain::new(db, BrainConfig::default()).with_teacher(Arc::new(NoTeacher));

        let mut template = Template::new(
            "echo",
            "echo the input back",
            "Echo: {{.Input}}",
            FlatSchema(json!({"type": "object", "properties": {"Input": {"type": "string"}}})),
            String::new(),
            "default",
            SourceTier::Manual,
            None,
        );
        template.status = cognis_types::TemplateStatus::Promoted;
        template.confidence = 0.9;
        brain.lifecycle().templates().insert(&template).unwrap();

        let reply = brain
            .handle_send(Message::text(Role::User, "ping"), None, None)
            .await
            .unwrap();
        assert_eq!(reply.extract_text(), "Echo: ping");
    }

    #[tokio::test]
    async fn handle_send_with_no_template_and_no_teacher_reports_an_error() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let brain = Brain::new(db, BrainConfig::default());
        let result = brain.handle_send(Message::text(Role::User, "hi"), None, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn handle_stream_emits_growing_cumulative_chunks_ending_final() {
        let brain = brain_with_teacher(TeacherResponse {
            intent: "long answer".to_string(),
            schema: json!({"type": "object", "properties": {"x": {"type": "string"}}}),
            template_body: "placeholder".to_string(),
            solution: "one two three four five six seven eight nine ten".to_string(),
        });

        let events: Vec<TaskEvent> = brain
            .handle_stream(Message::text(Role::User, "go"), None, None)
            .await
            .collect()
            .await;

        assert!(events.len() >= 2);
        assert!(events.last().unwrap().is_final);
        let last_text = events.last().unwrap().message.extract_text();
        assert_eq!(last_text, "one two three four five six seven eight nine ten");
        let first_text = events.first().unwrap().message.extract_text();
        assert!(last_text.len() >= first_text.len());
    }

    #[test]
    fn healthz_reports_a_status_and_score_with_no_activity() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let brain = Brain::new(db, BrainConfig::default());
        let body = brain.healthz_body().0;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["health_score"], 0.0);
    }

    #[test]
    fn card_reflects_configured_identity() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let mut config = BrainConfig::default();
        config.agent_name = "test-brain".to_string();
        let brain = Brain::new(db, config);
        assert_eq!(brain.card().name, "test-brain");
    }
}
