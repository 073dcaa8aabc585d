//! Core wire and domain types shared by every crate in the cognis workspace.
//!
//! This crate has no I/O: it holds the data model
//! (messages, tasks, heartbeats, dead letters, templates, usage logs,
//! grades, reasoning traces) plus the small amount of pure logic that is an
//! invariant of the type itself (confidence clamping, step contiguity,
//! text extraction) rather than of any particular component.

mod agent_card;
mod distillation;
mod dlq;
mod error;
mod event;
mod grade;
mod heartbeat;
pub mod ids;
mod message;
mod task;
mod template;
mod trace;
mod usage;

pub use agent_card::AgentCard;
pub use distillation::DistillationAttempt;
pub use dlq::DeadLetter;
pub use error::{Error, Result};
pub use event::{TaskEvent, TaskState};
pub use grade::{recompute_confidence, Grade, GradeVerdict};
pub use heartbeat::{AgentStatus, Heartbeat};
pub use ids::Id;
pub use message::{Message, Metadata, Part, Role};
pub use task::{
    agent_message_stream_name, dlq_stream_name, heartbeat_stream_name, priority_stream_name,
    stream_name, TaskEnvelope, Priority, TaskType, AGENTS_CONSUMER_GROUP,
};
pub use template::{FlatSchema, SourceTier, Template, TemplateStatus};
pub use trace::{Outcome, ReasoningStep, ReasoningTrace, StepAction};
pub use usage::UsageLog;
