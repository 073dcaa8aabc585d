//! Template lifecycle (C6): distillation and its safety valves, grading,
//! the Probation -> Validated -> Promoted state machine, reasoning-trace
//! capture/retrieval/pruning, and the metrics/health-score collector.
//!
//! [`Lifecycle`] is the facade every other crate talks to; its methods
//! are split across modules by concern (mirroring how `cognis-index`
//! splits stores by table).

mod collector;
mod config;
mod distillation;
mod error;
mod grading;
mod metrics;
mod retrieval;
mod status;
mod teacher;

pub use collector::CollectorRegistry;
pub use config::Config;
pub use distillation::DistillationOutcome;
pub use error::{Error, Result};
pub use metrics::{HealthState, LifecycleMetrics};
pub use retrieval::{TraceCandidate, MIN_PRUNE_AGE_SECONDS};
pub use teacher::{GradeRequest, GraderModel, GraderVerdict, TeacherModel, TeacherResponse};

use std::sync::Arc;

use cognis_core::Embedder;
use cognis_index::{AttemptStore, Database, GradeStore, TemplateStore, TraceStore, UsageLogStore};

/// The C6 facade: every store the lifecycle needs, plus the optional
/// model capabilities (teacher, grader, embedder) that distillation,
/// grading, and retrieval degrade gracefully without.
#[derive(Clone)]
pub struct Lifecycle {
    pub(crate) templates: TemplateStore,
    pub(crate) attempts: AttemptStore,
    pub(crate) usage_logs: UsageLogStore,
    pub(crate) grades: GradeStore,
    pub(crate) traces: TraceStore,
    pub(crate) teacher: Option<Arc<dyn TeacherModel>>,
    pub(crate) grader: Option<Arc<dyn GraderModel>>,
    pub(crate) embedder: Option<Arc<dyn Embedder>>,
    pub(crate) config: Config,
}

impl Lifecycle {
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        Self {
            templates: TemplateStore::new(db.clone()),
            attempts: AttemptStore::new(db.clone()),
            usage_logs: UsageLogStore::new(db.clone()),
            grades: GradeStore::new(db.clone()),
            traces: TraceStore::new(db),
            teacher: None,
            grader: None,
            embedder: None,
            config,
        }
    }

    pub fn with_teacher(mut self, teacher: Arc<dyn TeacherModel>) -> Self {
        self.teacher = Some(teacher);
        self
    }

    pub fn with_grader(mut self, grader: Arc<dyn GraderModel>) -> Self {
        self.grader = Some(grader);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn usage_logs(&self) -> &UsageLogStore {
        &self.usage_logs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
