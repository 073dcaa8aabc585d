//! SQLite-backed persistence for the cognis workspace.
//!
//! One [`Database`] (one `rusqlite::Connection` behind a `Mutex`) backs
//! every store here: the append-only log (C1), the dead-letter tail (C3),
//! and the template/usage-log/grade/reasoning-trace tables (C6). Callers
//! typically hold a single `Arc<Database>` and construct whichever stores
//! they need from it.

mod attempts;
mod db;
mod dlq;
mod error;
mod grades;
mod log;
mod schema;
mod templates;
mod traces;
mod usage;

pub use attempts::AttemptStore;
pub use db::Database;
pub use dlq::DeadLetterStore;
pub use error::{Error, Result};
pub use grades::GradeStore;
pub use log::{LogClient, Subscription};
pub use schema::SCHEMA_VERSION;
pub use templates::TemplateStore;
pub use traces::TraceStore;
pub use usage::UsageLogStore;
