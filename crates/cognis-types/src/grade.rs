//! Grades: append-only confidence deltas on a template.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};

/// The grader's verdict on one usage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeVerdict {
    Pass,
    Partial,
    Fail,
}

impl GradeVerdict {
    /// Confidence delta for this verdict: +0.1 / 0 / -0.1.
    pub fn confidence_delta(&self) -> f64 {
        match self {
            GradeVerdict::Pass => 0.1,
            GradeVerdict::Partial => 0.0,
            GradeVerdict::Fail => -0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: Id,
    pub template_id: Id,
    pub usage_log_id: Id,
    pub grader_model: String,
    pub verdict: GradeVerdict,
    pub correctness: f64,
    pub completeness: f64,
    pub confidence_delta: f64,
    pub timestamp: i64,
}

impl Grade {
    pub fn new(
        template_id: Id,
        usage_log_id: Id,
        grader_model: impl Into<String>,
        verdict: GradeVerdict,
        correctness: f64,
        completeness: f64,
    ) -> Self {
        Self {
            id: Id::new(),
            template_id,
            usage_log_id,
            grader_model: grader_model.into(),
            confidence_delta: verdict.confidence_delta(),
            verdict,
            correctness,
            completeness,
            timestamp: epoch_seconds(),
        }
    }
}

/// Recompute a template's confidence as clamp(0, 1, 0.5 + sum of deltas).
pub fn recompute_confidence(deltas: impl IntoIterator<Item = f64>) -> f64 {
    let sum: f64 = deltas.into_iter().sum();
    (0.5 + sum).clamp(0.0, 1.0)
}
