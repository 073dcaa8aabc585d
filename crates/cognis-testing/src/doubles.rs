//! Scripted doubles for the teacher/grader/TTS capability traits: each
//! queues canned responses up front and returns them in order, so a test
//! can assert on exactly what the lifecycle did with a known answer
//! instead of a real model's.

use std::sync::Mutex;

use async_trait::async_trait;
use cognis_engine::{GradeRequest, GraderModel, GraderVerdict, TeacherModel, TeacherResponse};
use cognis_runtime::{SynthesizedAudio, TtsProvider};
use cognis_types::GradeVerdict;

/// A [`TeacherModel`] that hands back pre-scripted responses in FIFO
/// order. Calling past the end of the queue is a test bug, not a runtime
/// condition, so it panics rather than erroring.
pub struct ScriptedTeacher {
    responses: Mutex<Vec<TeacherResponse>>,
}

impl ScriptedTeacher {
    pub fn new(responses: Vec<TeacherResponse>) -> Self {
        Self { responses: Mutex::new(responses) }
    }

    /// A single-response teacher returning a flat-schema candidate with
    /// one string variable and the given solution text.
    pub fn solving(intent: impl Into<String>, solution: impl Into<String>) -> Self {
        Self::new(vec![TeacherResponse {
            intent: intent.into(),
            schema: serde_json::json!({"type": "object", "properties": {"input": {"type": "string"}}}),
            template_body: "{{input}}".to_string(),
            solution: solution.into(),
        }])
    }
}

#[async_trait]
impl TeacherModel for ScriptedTeacher {
    async fn solve_and_teach(&self, _task_type: &str, _user_input: &str) -> Result<TeacherResponse, String> {
        let mut responses = self.responses.lock().expect("scripted teacher mutex poisoned");
        if responses.is_empty() {
            panic!("ScriptedTeacher asked for a response but its queue is empty");
        }
        Ok(responses.remove(0))
    }
}

/// A [`GraderModel`] that hands back pre-scripted verdicts in FIFO order.
pub struct ScriptedGrader {
    verdicts: Mutex<Vec<GraderVerdict>>,
}

impl ScriptedGrader {
    pub fn new(verdicts: Vec<GraderVerdict>) -> Self {
        Self { verdicts: Mutex::new(verdicts) }
    }

    /// A single-verdict grader.
    pub fn verdict(grade: GradeVerdict, reason: impl Into<String>) -> Self {
        Self::new(vec![GraderVerdict {
            grade,
            reason: reason.into(),
            correctness_score: match grade {
                GradeVerdict::Pass => 1.0,
                GradeVerdict::Partial => 0.5,
                GradeVerdict::Fail => 0.0,
            },
            completeness_score: match grade {
                GradeVerdict::Pass => 1.0,
                GradeVerdict::Partial => 0.5,
                GradeVerdict::Fail => 0.0,
            },
        }])
    }
}

#[async_trait]
impl GraderModel for ScriptedGrader {
    async fn grade(&self, _request: GradeRequest<'_>) -> Result<GraderVerdict, String> {
        let mut verdicts = self.verdicts.lock().expect("scripted grader mutex poisoned");
        if verdicts.is_empty() {
            panic!("ScriptedGrader asked for a verdict but its queue is empty");
        }
        Ok(verdicts.remove(0))
    }
}

/// A [`TtsProvider`] that echoes the sentence's bytes back as "audio",
/// matching the orchestrator's own in-crate test double.
pub struct EchoTts;

impl TtsProvider for EchoTts {
    fn synthesize(&self, sentence: &str) -> Result<SynthesizedAudio, String> {
        Ok(SynthesizedAudio { audio: sentence.as_bytes().to_vec(), format: "pcm".to_string(), phonemes: vec![] })
    }
}

/// A [`TtsProvider`] that always fails, for exercising the orchestrator's
/// skip-and-warn path.
pub struct FailingTts;

impl TtsProvider for FailingTts {
    fn synthesize(&self, _sentence: &str) -> Result<SynthesizedAudio, String> {
        Err("synthesis failed".to_string())
    }
}
