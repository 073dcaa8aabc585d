//! Distillation-attempt storage: one row per `solve_and_teach` call,
//! whether or not it produced a template.

use std::sync::Arc;

use cognis_types::{DistillationAttempt, Id};
use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::Result;

#[derive(Debug, Clone)]
pub struct AttemptStore {
    db: Arc<Database>,
}

impl AttemptStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, attempt: &DistillationAttempt) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.execute(
            "INSERT INTO distillation_attempts
                (id, task_type, source_request_id, schema_valid, compilation_passed,
                 template_id, failure_reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                attempt.id.to_string(),
                attempt.task_type,
                attempt.source_request_id,
                attempt.schema_valid,
                attempt.compilation_passed,
                attempt.template_id.map(|id| id.to_string()),
                attempt.failure_reason,
                attempt.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &Id) -> Result<Option<DistillationAttempt>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT id, task_type, source_request_id, schema_valid, compilation_passed,
                    template_id, failure_reason, created_at
             FROM distillation_attempts WHERE id = ?1",
            params![id.to_string()],
            row_to_attempt,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Success/failure counts across all attempts, for the C6.5 metrics
    /// collector's distillation-success-rate figure.
    pub fn success_and_total_counts(&self) -> Result<(u64, u64)> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM distillation_attempts", [], |row| row.get(0))?;
        let success: u64 = conn.query_row(
            "SELECT COUNT(*) FROM distillation_attempts WHERE template_id IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok((success, total))
    }
}

fn row_to_attempt(row: &rusqlite::Row<'_>) -> rusqlite::Result<DistillationAttempt> {
    let id: String = row.get(0)?;
    let template_id: Option<String> = row.get(5)?;
    Ok(DistillationAttempt {
        id: decode_id(&id).map_err(to_sql_err)?,
        task_type: row.get(1)?,
        source_request_id: row.get(2)?,
        schema_valid: row.get(3)?,
        compilation_passed: row.get(4)?,
        template_id: template_id.map(|s| decode_id(&s)).transpose().map_err(to_sql_err)?,
        failure_reason: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn decode_id(s: &str) -> crate::Result<Id> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| crate::Error::Query(format!("malformed id {s}: {e}")))
}

fn to_sql_err(e: crate::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AttemptStore {
        AttemptStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn insert_and_get_round_trips_a_failed_attempt() {
        let s = store();
        let attempt = DistillationAttempt::new("reasoning", Some("req-1".to_string())).failed("non-flat schema");
        s.insert(&attempt).unwrap();
        assert_eq!(s.get(&attempt.id).unwrap().unwrap(), attempt);
    }

    #[test]
    fn insert_and_get_round_trips_a_successful_attempt() {
        let s = store();
        let template_id = Id::new();
        let attempt = DistillationAttempt::new("reasoning", None).succeeded(template_id);
        s.insert(&attempt).unwrap();
        let fetched = s.get(&attempt.id).unwrap().unwrap();
        assert_eq!(fetched.template_id, Some(template_id));
    }

    #[test]
    fn success_and_total_counts_tally_correctly() {
        let s = store();
        s.insert(&DistillationAttempt::new("a", None).succeeded(Id::new())).unwrap();
        s.insert(&DistillationAttempt::new("a", None).failed("bad")).unwrap();
        s.insert(&DistillationAttempt::new("a", None).failed("bad")).unwrap();
        assert_eq!(s.success_and_total_counts().unwrap(), (1, 3));
    }
}
