//! The teacher/grader model boundary: both are plain `async_trait`
//! objects so `cognis-testing` can supply scripted doubles and the SDK
//! can wire in a real frontier-model client without either side
//! depending on a concrete provider.

use async_trait::async_trait;
use cognis_types::GradeVerdict;

/// The four sections a teacher call must extract: an intent sentence, a
/// flat JSON Schema of variables, a `{{…}}`-syntax template body, and the
/// final solution text.
#[derive(Debug, Clone)]
pub struct TeacherResponse {
    pub intent: String,
    pub schema: serde_json::Value,
    pub template_body: String,
    pub solution: String,
}

#[async_trait]
pub trait TeacherModel: Send + Sync {
    /// Solve `user_input` for `task_type`, returning both the structured
    /// template candidate and the solution the user actually sees.
    async fn solve_and_teach(
        &self,
        task_type: &str,
        user_input: &str,
    ) -> Result<TeacherResponse, String>;
}

/// Input to a grading call: the original request, the template that
/// answered it, and what it rendered.
#[derive(Debug, Clone)]
pub struct GradeRequest<'a> {
    pub user_request: &'a str,
    pub template_name: &'a str,
    pub template_intent: &'a str,
    pub rendered_response: &'a str,
}

/// A grader's verdict on one usage log.
#[derive(Debug, Clone)]
pub struct GraderVerdict {
    pub grade: GradeVerdict,
    pub reason: String,
    pub correctness_score: f64,
    pub completeness_score: f64,
}

#[async_trait]
pub trait GraderModel: Send + Sync {
    async fn grade(&self, request: GradeRequest<'_>) -> Result<GraderVerdict, String>;
}
