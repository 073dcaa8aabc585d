//! "Solve and Teach": C6 distillation plus its three safety valves.

use cognis_types::{DistillationAttempt, FlatSchema, SourceTier, Template};

use crate::teacher::TeacherResponse;
use crate::Lifecycle;

/// What a distillation attempt produced. Safety-valve failures never
/// surface as an error to the caller — the user still gets a solution,
/// just not a reusable template.
#[derive(Debug, Clone)]
pub enum DistillationOutcome {
    Created { template: Template, solution: String },
    SolutionOnly { solution: String, reason: String },
}

impl Lifecycle {
    /// Invoked when an incoming request of `task_type` has no matching
    /// template. Calls the configured teacher model, then runs the three
    /// safety valves before ever persisting a template.
    pub async fn solve_and_teach(
        &self,
        task_type: &str,
        user_input: &str,
        source_request_id: Option<String>,
    ) -> crate::Result<DistillationOutcome> {
        let Some(teacher) = &self.teacher else {
            return Err(crate::Error::Model("no teacher model configured".to_string()));
        };

        let response = teacher
            .solve_and_teach(task_type, user_input)
            .await
            .map_err(crate::Error::Model)?;

        let outcome = self
            .run_safety_valves(task_type, source_request_id, &response)
            .await;

        Ok(outcome)
    }

    async fn run_safety_valves(
        &self,
        task_type: &str,
        source_request_id: Option<String>,
        response: &TeacherResponse,
    ) -> DistillationOutcome {
        let mut attempt = DistillationAttempt::new(task_type, source_request_id.clone());

        // Safety valve 1: the schema must be flat.
        if let Err(err) = cognis_core::validate_flat(&response.schema) {
            let attempt = attempt.failed(err.to_string());
            self.record_attempt(&attempt);
            return DistillationOutcome::SolutionOnly {
                solution: response.solution.clone(),
                reason: err.to_string(),
            };
        }
        attempt.schema_valid = true;

        // Safety valve 2: the template body must parse.
        if let Err(err) = cognis_core::compile(&response.template_body) {
            let attempt = attempt.failed(err.to_string());
            self.record_attempt(&attempt);
            return DistillationOutcome::SolutionOnly {
                solution: response.solution.clone(),
                reason: err.to_string(),
            };
        }
        attempt.compilation_passed = true;

        // Safety valve 3: grammar derivation. Failure is non-fatal — the
        // template is still created with an empty grammar.
        let grammar = cognis_core::derive_grammar(&response.schema).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "grammar derivation failed, continuing with empty grammar");
            String::new()
        });

        let intent_embedding = match &self.embedder {
            Some(embedder) => match embedder.embed(&response.intent).await {
                Ok(vector) => Some(vector),
                Err(err) => {
                    tracing::warn!(error = %err, "embedding the template intent failed, degrading to no embedding");
                    None
                }
            },
            None => None,
        };

        let mut template = Template::new(
            derive_name(&response.intent),
            response.intent.clone(),
            response.template_body.clone(),
            FlatSchema(response.schema.clone()),
            grammar,
            task_type,
            SourceTier::Distillation,
            source_request_id,
        );
        template.intent_embedding = intent_embedding;

        // Persistence failures log but never fail the user-visible call:
        // the user still gets `response.solution`.
        if let Err(err) = self.templates.insert(&template) {
            tracing::error!(error = %err, template_id = %template.id, "failed to persist distilled template");
        } else {
            let attempt = attempt.succeeded(template.id);
            self.record_attempt(&attempt);
        }

        DistillationOutcome::Created {
            template,
            solution: response.solution.clone(),
        }
    }

    fn record_attempt(&self, attempt: &DistillationAttempt) {
        if let Err(err) = self.attempts.insert(attempt) {
            tracing::error!(error = %err, "failed to persist distillation attempt");
        }
    }
}

/// A short name for the template, derived from its intent sentence —
/// the teacher doesn't hand back a name separately.
fn derive_name(intent: &str) -> String {
    let words: Vec<&str> = intent.split_whitespace().take(6).collect();
    if words.is_empty() {
        "untitled-template".to_string()
    } else {
        words.join("-").to_lowercase()
    }
}
