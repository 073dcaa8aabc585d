//! An in-memory workspace: one `:memory:` [`Database`] plus every store
//! built on it, so a test can reach for whichever one it needs without
//! repeating the `Arc::new(Database::open_in_memory()...)` boilerplate.

use std::sync::Arc;

use cognis_index::{
    AttemptStore, DeadLetterStore, Database, GradeStore, LogClient, TemplateStore, TraceStore,
    UsageLogStore,
};

/// A disposable, fully-wired workspace backed by SQLite's `:memory:`.
pub struct TestStore {
    pub db: Arc<Database>,
    pub templates: TemplateStore,
    pub usage_log: UsageLogStore,
    pub grades: GradeStore,
    pub traces: TraceStore,
    pub attempts: AttemptStore,
    pub dlq: DeadLetterStore,
    pub log: LogClient,
}

impl TestStore {
    /// Open a fresh in-memory workspace. Panics on failure, matching the
    /// rest of the workspace's `#[cfg(test)]` convention of `.unwrap()`ing
    /// `Database::open_in_memory()`.
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().expect("opening an in-memory cognis database"));
        Self {
            templates: TemplateStore::new(db.clone()),
            usage_log: UsageLogStore::new(db.clone()),
            grades: GradeStore::new(db.clone()),
            traces: TraceStore::new(db.clone()),
            attempts: AttemptStore::new(db.clone()),
            dlq: DeadLetterStore::new(db.clone()),
            log: LogClient::new(db.clone()),
            db,
        }
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}
