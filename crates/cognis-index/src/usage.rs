//! Usage-log storage: one row per template execution, graded in batches
//! by `GradePendingUsages`.

use std::sync::Arc;

use cognis_types::{Id, UsageLog};
use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::Result;

#[derive(Debug, Clone)]
pub struct UsageLogStore {
    db: Arc<Database>,
}

impl UsageLogStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, log: &UsageLog) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.execute(
            "INSERT INTO usage_logs (id, template_id, user_input, rendered_output, timestamp, graded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.id.to_string(),
                log.template_id.to_string(),
                log.user_input,
                log.rendered_output,
                log.timestamp,
                log.graded,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &Id) -> Result<Option<UsageLog>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT id, template_id, user_input, rendered_output, timestamp, graded
             FROM usage_logs WHERE id = ?1",
            params![id.to_string()],
            row_to_usage_log,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Up to `limit` ungraded usage logs, oldest first — the work queue for
    /// `GradePendingUsages`.
    pub fn pending(&self, limit: u32) -> Result<Vec<UsageLog>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, template_id, user_input, rendered_output, timestamp, graded
             FROM usage_logs WHERE graded = 0 ORDER BY timestamp ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_usage_log)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn mark_graded(&self, id: &Id) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let changed = conn.execute(
            "UPDATE usage_logs SET graded = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if changed == 0 {
            return Err(crate::Error::Query(format!("usage log {id} not found")));
        }
        Ok(())
    }

    /// Total executions recorded for `template_id`, graded or not — the
    /// use-count input to the Validated -> Promoted threshold.
    pub fn count_for_template(&self, template_id: &Id) -> Result<u64> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT COUNT(*) FROM usage_logs WHERE template_id = ?1",
            params![template_id.to_string()],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    /// Total executions across every template — requests served locally
    /// by an already-promoted template, for the metrics collector's
    /// local-model-rate.
    pub fn total_count(&self) -> Result<u64> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row("SELECT COUNT(*) FROM usage_logs", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn row_to_usage_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageLog> {
    let id: String = row.get(0)?;
    let template_id: String = row.get(1)?;
    Ok(UsageLog {
        id: decode_id(&id).map_err(to_sql_err)?,
        template_id: decode_id(&template_id).map_err(to_sql_err)?,
        user_input: row.get(2)?,
        rendered_output: row.get(3)?,
        timestamp: row.get(4)?,
        graded: row.get(5)?,
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

    fn store() -> UsageLogStore {
        UsageLogStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn insert_and_get_round_trips() {
        let s = store();
        let log = UsageLog::new(Id::new(), "hello", "world");
        s.insert(&log).unwrap();
        assert_eq!(s.get(&log.id).unwrap().unwrap(), log);
    }

    #[test]
    fn pending_excludes_graded_entries() {
        let s = store();
        let ungraded = UsageLog::new(Id::new(), "a", "b");
        s.insert(&ungraded).unwrap();
        let mut graded = UsageLog::new(Id::new(), "c", "d");
        graded.graded = true;
        s.insert(&graded).unwrap();

        let pending = s.pending(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, ungraded.id);
    }

    #[test]
    fn mark_graded_flips_flag() {
        let s = store();
        let log = UsageLog::new(Id::new(), "a", "b");
        s.insert(&log).unwrap();
        s.mark_graded(&log.id).unwrap();
        assert!(s.get(&log.id).unwrap().unwrap().graded);
        assert!(s.pending(10).unwrap().is_empty());
    }

    #[test]
    fn total_count_spans_every_template() {
        let s = store();
        s.insert(&UsageLog::new(Id::new(), "a", "b")).unwrap();
        s.insert(&UsageLog::new(Id::new(), "c", "d")).unwrap();
        assert_eq!(s.total_count().unwrap(), 2);
    }

    #[test]
    fn count_for_template_counts_graded_and_ungraded_alike() {
        let s = store();
        let template_id = Id::new();
        s.insert(&UsageLog::new(template_id, "a", "b")).unwrap();
        let mut graded = UsageLog::new(template_id, "c", "d");
        graded.graded = true;
        s.insert(&graded).unwrap();
        s.insert(&UsageLog::new(Id::new(), "e", "f")).unwrap();

        assert_eq!(s.count_for_template(&template_id).unwrap(), 2);
    }
}
