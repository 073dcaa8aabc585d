//! C3: the dead-letter tail. `SendToDeadLetter` appends a row;
//! `RetryDeadLetter` republishes the original envelope onto its stream and
//! deletes the dead-letter row as one transaction, so a failed republish
//! (e.g. a full disk) leaves the entry intact rather than losing the task.

use std::sync::Arc;

use cognis_types::{DeadLetter, Priority, TaskEnvelope, TaskType};
use rusqlite::params;

use crate::db::Database;
use crate::Result;

fn priority_str(p: Priority) -> &'static str {
    match p {
        Priority::Low => "low",
        Priority::Normal => "normal",
        Priority::High => "high",
        Priority::Critical => "critical",
    }
}

fn parse_priority(s: &str) -> crate::Result<Priority> {
    match s {
        "low" => Ok(Priority::Low),
        "normal" => Ok(Priority::Normal),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(crate::Error::Query(format!("unknown priority: {other}"))),
    }
}

fn task_type_str(t: TaskType) -> &'static str {
    match t {
        TaskType::Reasoning => "reasoning",
        TaskType::ToolCall => "tool_call",
        TaskType::Distillation => "distillation",
        TaskType::Grading => "grading",
        TaskType::Control => "control",
    }
}

fn parse_task_type(s: &str) -> crate::Result<TaskType> {
    match s {
        "reasoning" => Ok(TaskType::Reasoning),
        "tool_call" => Ok(TaskType::ToolCall),
        "distillation" => Ok(TaskType::Distillation),
        "grading" => Ok(TaskType::Grading),
        "control" => Ok(TaskType::Control),
        other => Err(crate::Error::Query(format!("unknown task type: {other}"))),
    }
}

#[derive(Debug, Clone)]
pub struct DeadLetterStore {
    db: Arc<Database>,
}

impl DeadLetterStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn send_to_dead_letter(&self, letter: &DeadLetter) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let payload = serde_json::to_string(&letter.original.payload)?;
        conn.execute(
            "INSERT INTO dead_letters
                (id, original_id, original_priority, original_type, original_payload,
                 original_from, original_to, original_created, error, retry_count, dead_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                letter.id.to_string(),
                letter.original.id.to_string(),
                priority_str(letter.original_priority()),
                task_type_str(letter.original_type()),
                payload,
                letter.original.from,
                letter.original.to,
                letter.original.created,
                letter.error,
                letter.retry_count,
                letter.dead_at,
            ],
        )?;
        tracing::warn!(id = %letter.id, error = %letter.error, "sent task to dead letter");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<DeadLetter>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, original_id, original_priority, original_type, original_payload,
                    original_from, original_to, original_created, error, retry_count, dead_at
             FROM dead_letters ORDER BY dead_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, u32>(9)?,
                row.get::<_, i64>(10)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, original_id, priority, task_type, payload, from, to, created, error, retry_count, dead_at) =
                row?;
            out.push(self.to_dead_letter(
                id,
                original_id,
                priority,
                task_type,
                payload,
                from,
                to,
                created,
                error,
                retry_count,
                dead_at,
            )?);
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn to_dead_letter(
        &self,
        id: String,
        original_id: String,
        priority: String,
        task_type: String,
        payload: String,
        from: String,
        to: Option<String>,
        created: i64,
        error: String,
        retry_count: u32,
        dead_at: i64,
    ) -> Result<DeadLetter> {
        let payload: std::collections::BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&payload)?;
        let original = TaskEnvelope {
            id: parse_id(&original_id)?,
            from,
            to,
            priority: parse_priority(&priority)?,
            task_type: parse_task_type(&task_type)?,
            payload,
            created,
        };
        Ok(DeadLetter {
            id: parse_id(&id)?,
            original,
            error,
            retry_count,
            dead_at,
        })
    }

    /// Republish `letter.original` onto its priority stream and delete the
    /// dead-letter row, as a single transaction.
    pub fn retry_dead_letter(&self, letter: &DeadLetter) -> Result<u64> {
        let mut conn = self.db.conn.lock().expect("db mutex poisoned");
        let tx = conn.transaction()?;

        let stream = cognis_types::priority_stream_name(letter.original_priority());
        let next_offset: i64 = tx.query_row(
            "SELECT COALESCE(MAX(offset), 0) + 1 FROM log_records WHERE stream = ?1",
            params![stream],
            |row| row.get(0),
        )?;
        let record = serde_json::to_vec(&letter.original)?;
        tx.execute(
            "INSERT INTO log_records (stream, offset, record, appended_at) VALUES (?1, ?2, ?3, strftime('%s','now'))",
            params![stream, next_offset, record],
        )?;
        let deleted = tx.execute(
            "DELETE FROM dead_letters WHERE id = ?1",
            params![letter.id.to_string()],
        )?;
        if deleted == 0 {
            return Err(crate::Error::Query(format!(
                "dead letter {} not found, aborting retry",
                letter.id
            )));
        }
        tx.commit()?;
        tracing::info!(id = %letter.id, stream, offset = next_offset, "retried dead letter");
        Ok(next_offset as u64)
    }

    pub fn find(&self, id: &cognis_types::Id) -> Result<Option<DeadLetter>> {
        Ok(self.list()?.into_iter().find(|d| &d.id == id))
    }
}

fn parse_id(s: &str) -> Result<cognis_types::Id> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| crate::Error::Query(format!("malformed id {s}: {e}")))
}
