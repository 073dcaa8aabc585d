//! Lifecycle thresholds. Every field carries a sensible numeric default
//! inline; `cognis-cli` overrides them from its TOML config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Confidence floor to move Probation -> Validated.
    pub validate_threshold: f64,
    /// Graded-count floor to move Probation -> Validated.
    pub n_validate: u32,
    /// Confidence floor to move Validated -> Promoted.
    pub promote_threshold: f64,
    /// Use-count floor to move Validated -> Promoted.
    pub n_promote: u32,
    /// Confidence ceiling below which a template is deprecated from any
    /// state.
    pub deprecate_threshold: f64,
    /// Fail-rate ceiling above which a template is deprecated from any
    /// state.
    pub f_deprecate: f64,
    /// Minimum cosine similarity for a trace to be a retrieval candidate.
    pub min_similarity: f64,
    /// `GradePendingUsages` batch size when none is specified.
    pub default_grade_batch: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_threshold: 0.7,
            n_validate: 5,
            promote_threshold: 0.85,
            n_promote: 20,
            deprecate_threshold: 0.2,
            f_deprecate: 0.5,
            min_similarity: 0.7,
            default_grade_batch: 20,
        }
    }
}
