//! Template/distillation metrics and the weighted health score.

use cognis_types::TemplateStatus;

use crate::Lifecycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Penalty weight applied to each metric's shortfall below 1.0. Sums to
/// 100, so `health_score` is `100 - Σ weight·(1 - metric)`.
const MATURITY_WEIGHT: f64 = 20.0;
const SUCCESS_WEIGHT: f64 = 25.0;
const LOCAL_MODEL_WEIGHT: f64 = 15.0;
const PASS_WEIGHT: f64 = 25.0;
const DISTILLATION_WEIGHT: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct LifecycleMetrics {
    pub probation_count: u64,
    pub validated_count: u64,
    pub promoted_count: u64,
    pub deprecated_count: u64,
    /// Share of templates that have progressed past Probation.
    pub maturity_ratio: f64,
    /// Share of reasoning traces that ended in `Outcome::Success`.
    pub success_rate: f64,
    /// Share of served requests handled by an already-promoted template,
    /// rather than escalated to a fresh distillation.
    pub local_model_rate: f64,
    pub distillation_success_rate: f64,
    pub grade_pass_count: u64,
    pub grade_partial_count: u64,
    pub grade_fail_count: u64,
    pub pass_rate: f64,
    /// Score in 0..=100, 100 minus the weighted penalty for each metric's
    /// shortfall below 1.0. See `health_state` for the banding.
    pub health_score: f64,
}

impl LifecycleMetrics {
    /// Healthy >= 80, degraded >= 50, else unhealthy.
    pub fn health_state(&self) -> HealthState {
        if self.health_score >= 80.0 {
            HealthState::Healthy
        } else if self.health_score >= 50.0 {
            HealthState::Degraded
        } else {
            HealthState::Unhealthy
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Lifecycle {
    pub fn collect_metrics(&self) -> crate::Result<LifecycleMetrics> {
        let probation_count = self.templates.list_by_status(TemplateStatus::Probation)?.len() as u64;
        let validated_count = self.templates.list_by_status(TemplateStatus::Validated)?.len() as u64;
        let promoted_count = self.templates.list_by_status(TemplateStatus::Promoted)?.len() as u64;
        let deprecated_count = self.templates.list_by_status(TemplateStatus::Deprecated)?.len() as u64;
        let template_total = probation_count + validated_count + promoted_count + deprecated_count;
        let maturity_ratio = ratio(validated_count + promoted_count, template_total);

        let (distilled_success, distilled_total) = self.attempts.success_and_total_counts()?;
        let distillation_success_rate = ratio(distilled_success, distilled_total);

        let (trace_success, trace_total) = self.traces.outcome_success_and_total_counts()?;
        let success_rate = ratio(trace_success, trace_total);

        let local_served = self.usage_logs.total_count()?;
        let local_model_rate = ratio(local_served, local_served + distilled_total);

        let (pass, partial, fail) = self.grades.verdict_counts()?;
        let graded_total = pass + partial + fail;
        let pass_rate = ratio(pass, graded_total);

        let health_score = 100.0
            - (MATURITY_WEIGHT * (1.0 - maturity_ratio)
                + SUCCESS_WEIGHT * (1.0 - success_rate)
                + LOCAL_MODEL_WEIGHT * (1.0 - local_model_rate)
                + PASS_WEIGHT * (1.0 - pass_rate)
                + DISTILLATION_WEIGHT * (1.0 - distillation_success_rate));

        Ok(LifecycleMetrics {
            probation_count,
            validated_count,
            promoted_count,
            deprecated_count,
            maturity_ratio,
            success_rate,
            local_model_rate,
            distillation_success_rate,
            grade_pass_count: pass,
            grade_partial_count: partial,
            grade_fail_count: fail,
            pass_rate,
            health_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Lifecycle};
    use cognis_index::Database;
    use cognis_types::{
        DistillationAttempt, FlatSchema, Grade, GradeVerdict, Id, Outcome, ReasoningTrace, SourceTier,
        Template, UsageLog,
    };
    use std::sync::Arc;

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(Arc::new(Database::open_in_memory().unwrap()), Config::default())
    }

    #[test]
    fn empty_lifecycle_reports_zero_health() {
        let lifecycle = lifecycle();
        let metrics = lifecycle.collect_metrics().unwrap();
        assert_eq!(metrics.health_score, 0.0);
        assert_eq!(metrics.health_state(), HealthState::Unhealthy);
    }

    #[test]
    fn a_healthy_lifecycle_scores_in_the_healthy_band() {
        let lifecycle = lifecycle();

        let template = Template::new(
            "t",
            "intent",
            "{{.x}}",
            FlatSchema(serde_json::json!({"type": "object", "properties": {"x": {"type": "string"}}})),
            String::new(),
            "reasoning",
            SourceTier::Distillation,
            None,
        );
        let mut promoted = template.clone();
        promoted.id = Id::new();
        promoted.status = TemplateStatus::Promoted;
        lifecycle.templates.insert(&promoted).unwrap();

        lifecycle
            .attempts
            .insert(&DistillationAttempt::new("reasoning", None).succeeded(promoted.id))
            .unwrap();

        for _ in 0..4 {
            lifecycle
                .grades
                .insert(&Grade::new(promoted.id, Id::new(), "g", GradeVerdict::Pass, 1.0, 1.0))
                .unwrap();
        }

        for _ in 0..4 {
            lifecycle.usage_logs.insert(&UsageLog::new(promoted.id, "in", "out")).unwrap();
        }

        let mut trace = ReasoningTrace::new("q");
        trace.outcome = Outcome::Success;
        lifecycle.traces.insert(&trace).unwrap();

        let metrics = lifecycle.collect_metrics().unwrap();
        assert_eq!(metrics.health_state(), HealthState::Healthy);
    }

    #[test]
    fn local_model_rate_falls_as_escalations_outpace_local_serves() {
        let lifecycle = lifecycle();
        lifecycle.usage_logs.insert(&UsageLog::new(Id::new(), "in", "out")).unwrap();
        lifecycle
            .attempts
            .insert(&DistillationAttempt::new("reasoning", None).failed("no match"))
            .unwrap();
        lifecycle
            .attempts
            .insert(&DistillationAttempt::new("reasoning", None).failed("no match"))
            .unwrap();

        let metrics = lifecycle.collect_metrics().unwrap();
        assert!((metrics.local_model_rate - (1.0 / 3.0)).abs() < 1e-9);
    }
}
