//! Grading: turn a usage log into a verdict, apply the resulting
//! confidence delta, and batch through the pending queue.

use cognis_types::{Grade, Id, UsageLog};

use crate::teacher::GradeRequest;
use crate::Lifecycle;

impl Lifecycle {
    /// Grade one usage log against its template and persist the result.
    /// Confidence is always recomputed from the full delta history
    /// (`cognis_types::recompute_confidence`), never adjusted in place.
    pub async fn grade_usage(&self, usage: &UsageLog) -> crate::Result<Grade> {
        let Some(grader) = &self.grader else {
            return Err(crate::Error::Model("no grader model configured".to_string()));
        };

        let template = self
            .templates
            .get(&usage.template_id)?
            .ok_or_else(|| crate::Error::Model(format!("template {} not found", usage.template_id)))?;

        let verdict = grader
            .grade(GradeRequest {
                user_request: &usage.user_input,
                template_name: &template.name,
                template_intent: &template.intent,
                rendered_response: &usage.rendered_output,
            })
            .await
            .map_err(crate::Error::Model)?;

        let grade = Grade::new(
            template.id,
            usage.id,
            "configured-grader",
            verdict.grade,
            verdict.correctness_score,
            verdict.completeness_score,
        );

        self.grades.insert(&grade)?;
        self.usage_logs.mark_graded(&usage.id)?;

        let deltas = self.grades.deltas_for_template(&template.id)?;
        let confidence = cognis_types::recompute_confidence(deltas);
        let new_status = self.next_status(&template, confidence)?;
        self.templates
            .update_status_and_confidence(&template.id, new_status, confidence, cognis_types::ids::epoch_seconds())?;

        Ok(grade)
    }

    /// Grade up to `limit` pending usage logs (or the configured default
    /// batch size if `limit` is `None`). A single usage's grading failure
    /// is logged and skipped rather than aborting the whole batch.
    pub async fn grade_pending_usages(&self, limit: Option<u32>) -> crate::Result<Vec<Id>> {
        let limit = limit.unwrap_or(self.config.default_grade_batch);
        let pending = self.usage_logs.pending(limit)?;

        let mut graded = Vec::with_capacity(pending.len());
        for usage in &pending {
            match self.grade_usage(usage).await {
                Ok(grade) => graded.push(grade.id),
                Err(err) => {
                    tracing::warn!(error = %err, usage_log_id = %usage.id, "skipping usage log that failed to grade");
                }
            }
        }
        Ok(graded)
    }
}
