//! Reusable reasoning templates.

use crate::ids::{epoch_seconds, Id};
use serde::{Deserialize, Serialize};

/// Lifecycle state. Probation -> Validated -> Promoted, with Deprecated
/// reachable as a terminal sink from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    Probation,
    Validated,
    Promoted,
    Deprecated,
}

/// Where a template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Distillation,
    Manual,
    Synthesis,
}

/// A flat JSON Schema: top-level properties only, no nested objects, no
/// arrays of objects. Flatness is enforced by `cognis_core::schema::validate_flat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatSchema(pub serde_json::Value);

/// A reusable reasoning template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Id,
    pub name: String,
    pub intent: String,
    pub intent_embedding: Option<Vec<f32>>,
    pub template_body: String,
    pub schema: FlatSchema,
    /// GBNF grammar derived from `schema`. May be empty — derivation
    /// failure is non-fatal.
    pub grammar: String,
    pub task_type: String,
    pub status: TemplateStatus,
    pub confidence: f64,
    pub complexity_score: f64,
    pub source_tier: SourceTier,
    pub source_request_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Template {
    /// Confidence starts at 0.5 on creation and only ever
    /// evolves through grading deltas afterward.
    pub const INITIAL_CONFIDENCE: f64 = 0.5;

    pub fn new(
        name: impl Into<String>,
        intent: impl Into<String>,
        template_body: impl Into<String>,
        schema: FlatSchema,
        grammar: String,
        task_type: impl Into<String>,
        source_tier: SourceTier,
        source_request_id: Option<String>,
    ) -> Self {
        let now = epoch_seconds();
        Self {
            id: Id::new(),
            name: name.into(),
            intent: intent.into(),
            intent_embedding: None,
            template_body: template_body.into(),
            schema,
            grammar,
            task_type: task_type.into(),
            status: TemplateStatus::Probation,
            confidence: Self::INITIAL_CONFIDENCE,
            complexity_score: 0.0,
            source_tier,
            source_request_id,
            created_at: now,
            updated_at: now,
        }
    }
}
