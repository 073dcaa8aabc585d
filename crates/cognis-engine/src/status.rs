//! The Probation -> Validated -> Promoted state machine, with Deprecated
//! reachable from any state.

use cognis_types::{Grade, GradeVerdict, Template, TemplateStatus};

use crate::Lifecycle;

impl Lifecycle {
    /// The status `template` should move to given its freshly recomputed
    /// `confidence`. Called right after a grade is recorded, so the grade
    /// history needed for fail-rate and graded-count thresholds is already
    /// persisted.
    pub(crate) fn next_status(&self, template: &Template, confidence: f64) -> crate::Result<TemplateStatus> {
        let grades = self.grades.list_for_template(&template.id)?;

        if should_deprecate(&grades, confidence, &self.config) {
            return Ok(TemplateStatus::Deprecated);
        }

        let status = match template.status {
            TemplateStatus::Probation => {
                if confidence >= self.config.validate_threshold && grades.len() as u32 >= self.config.n_validate {
                    TemplateStatus::Validated
                } else {
                    TemplateStatus::Probation
                }
            }
            TemplateStatus::Validated => {
                let use_count = self.usage_logs_for_template_count(&template.id)?;
                if confidence >= self.config.promote_threshold && use_count >= self.config.n_promote {
                    TemplateStatus::Promoted
                } else {
                    TemplateStatus::Validated
                }
            }
            other => other,
        };

        Ok(status)
    }

    fn usage_logs_for_template_count(&self, template_id: &cognis_types::Id) -> crate::Result<u32> {
        Ok(self.usage_logs.count_for_template(template_id)? as u32)
    }

    /// Re-evaluate every non-deprecated template's status against the
    /// current threshold configuration, without requiring a fresh grade.
    /// Used by a periodic sweep rather than the per-grade hot path.
    pub async fn run_promotion_sweep(&self) -> crate::Result<Vec<(cognis_types::Id, TemplateStatus)>> {
        let mut transitioned = Vec::new();
        for status in [TemplateStatus::Probation, TemplateStatus::Validated] {
            for template in self.templates.list_by_status(status)? {
                let next = self.next_status(&template, template.confidence)?;
                if next != template.status {
                    self.templates.update_status_and_confidence(
                        &template.id,
                        next,
                        template.confidence,
                        cognis_types::ids::epoch_seconds(),
                    )?;
                    transitioned.push((template.id, next));
                }
            }
        }
        Ok(transitioned)
    }
}

fn should_deprecate(grades: &[Grade], confidence: f64, config: &crate::Config) -> bool {
    if confidence <= config.deprecate_threshold {
        return true;
    }
    if grades.is_empty() {
        return false;
    }
    let fails = grades.iter().filter(|g| g.verdict == GradeVerdict::Fail).count();
    (fails as f64 / grades.len() as f64) > config.f_deprecate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Lifecycle};
    use cognis_index::Database;
    use cognis_types::{FlatSchema, SourceTier};
    use std::sync::Arc;

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(Arc::new(Database::open_in_memory().unwrap()), Config::default())
    }

    fn sample_template(status: TemplateStatus, confidence: f64) -> Template {
        let mut t = Template::new(
            "t",
            "intent",
            "{{.x}}",
            FlatSchema(serde_json::json!({"type": "object", "properties": {"x": {"type": "string"}}})),
            String::new(),
            "reasoning",
            SourceTier::Distillation,
            None,
        );
        t.status = status;
        t.confidence = confidence;
        t
    }

    #[test]
    fn probation_moves_to_validated_once_threshold_and_count_are_met() {
        let lifecycle = lifecycle();
        let template = sample_template(TemplateStatus::Probation, 0.7);
        lifecycle.templates.insert(&template).unwrap();
        for _ in 0..5 {
            let grade = Grade::new(template.id, cognis_types::Id::new(), "g", GradeVerdict::Pass, 1.0, 1.0);
            lifecycle.grades.insert(&grade).unwrap();
        }

        let next = lifecycle.next_status(&template, 0.7).unwrap();
        assert_eq!(next, TemplateStatus::Validated);
    }

    #[test]
    fn probation_stays_put_below_the_graded_count_floor() {
        let lifecycle = lifecycle();
        let template = sample_template(TemplateStatus::Probation, 0.9);
        lifecycle.templates.insert(&template).unwrap();
        let grade = Grade::new(template.id, cognis_types::Id::new(), "g", GradeVerdict::Pass, 1.0, 1.0);
        lifecycle.grades.insert(&grade).unwrap();

        let next = lifecycle.next_status(&template, 0.9).unwrap();
        assert_eq!(next, TemplateStatus::Probation);
    }

    #[test]
    fn low_confidence_deprecates_from_any_state() {
        let lifecycle = lifecycle();
        let template = sample_template(TemplateStatus::Validated, 0.1);
        lifecycle.templates.insert(&template).unwrap();

        let next = lifecycle.next_status(&template, 0.1).unwrap();
        assert_eq!(next, TemplateStatus::Deprecated);
    }

    #[test]
    fn high_fail_rate_deprecates_even_with_acceptable_confidence() {
        let lifecycle = lifecycle();
        let template = sample_template(TemplateStatus::Validated, 0.6);
        lifecycle.templates.insert(&template).unwrap();
        for verdict in [GradeVerdict::Fail, GradeVerdict::Fail, GradeVerdict::Pass] {
            let grade = Grade::new(template.id, cognis_types::Id::new(), "g", verdict, 1.0, 1.0);
            lifecycle.grades.insert(&grade).unwrap();
        }

        let next = lifecycle.next_status(&template, 0.6).unwrap();
        assert_eq!(next, TemplateStatus::Deprecated);
    }
}
