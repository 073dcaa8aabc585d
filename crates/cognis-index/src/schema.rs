//! Table definitions backing the log (C1), DLQ (C3) and template lifecycle
//! (C6) stores. One `rusqlite::Connection`, one schema, no migrations yet —
//! `SCHEMA_VERSION` exists so a future release can detect drift the way the
//! teacher's index crate does.

use rusqlite::Connection;

use crate::Result;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log_records (
            stream TEXT NOT NULL,
            offset INTEGER NOT NULL,
            record BLOB NOT NULL,
            appended_at INTEGER NOT NULL,
            PRIMARY KEY (stream, offset)
        );

        CREATE TABLE IF NOT EXISTS consumer_offsets (
            stream TEXT NOT NULL,
            consumer_group TEXT NOT NULL,
            last_acked_offset INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (stream, consumer_group)
        );

        CREATE TABLE IF NOT EXISTS dead_letters (
            id TEXT PRIMARY KEY,
            original_id TEXT NOT NULL,
            original_priority TEXT NOT NULL,
            original_type TEXT NOT NULL,
            original_payload TEXT NOT NULL,
            original_from TEXT NOT NULL,
            original_to TEXT,
            original_created INTEGER NOT NULL,
            error TEXT NOT NULL,
            retry_count INTEGER NOT NULL,
            dead_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            intent TEXT NOT NULL,
            intent_embedding TEXT,
            template_body TEXT NOT NULL,
            schema TEXT NOT NULL,
            grammar TEXT NOT NULL,
            task_type TEXT NOT NULL,
            status TEXT NOT NULL,
            confidence REAL NOT NULL,
            complexity_score REAL NOT NULL,
            source_tier TEXT NOT NULL,
            source_request_id TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_templates_task_type ON templates(task_type);
        CREATE INDEX IF NOT EXISTS idx_templates_status ON templates(status);

        CREATE TABLE IF NOT EXISTS usage_logs (
            id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL,
            user_input TEXT NOT NULL,
            rendered_output TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            graded INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (template_id) REFERENCES templates(id)
        );

        CREATE INDEX IF NOT EXISTS idx_usage_logs_template ON usage_logs(template_id);
        CREATE INDEX IF NOT EXISTS idx_usage_logs_ungraded ON usage_logs(graded);

        CREATE TABLE IF NOT EXISTS grades (
            id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL,
            usage_log_id TEXT NOT NULL,
            grader_model TEXT NOT NULL,
            verdict TEXT NOT NULL,
            correctness REAL NOT NULL,
            completeness REAL NOT NULL,
            confidence_delta REAL NOT NULL,
            timestamp INTEGER NOT NULL,
            FOREIGN KEY (template_id) REFERENCES templates(id),
            FOREIGN KEY (usage_log_id) REFERENCES usage_logs(id)
        );

        CREATE INDEX IF NOT EXISTS idx_grades_template ON grades(template_id);

        CREATE TABLE IF NOT EXISTS distillation_attempts (
            id TEXT PRIMARY KEY,
            task_type TEXT NOT NULL,
            source_request_id TEXT,
            schema_valid INTEGER NOT NULL,
            compilation_passed INTEGER NOT NULL,
            template_id TEXT,
            failure_reason TEXT,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reasoning_traces (
            id TEXT PRIMARY KEY,
            query TEXT NOT NULL,
            query_embedding TEXT,
            approach TEXT NOT NULL,
            steps BLOB NOT NULL,
            steps_compressed INTEGER NOT NULL DEFAULT 1,
            outcome TEXT NOT NULL,
            success_score REAL NOT NULL,
            reused_count INTEGER NOT NULL,
            tools_used TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            tokens INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            last_used_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_traces_outcome ON reasoning_traces(outcome);
        CREATE INDEX IF NOT EXISTS idx_traces_last_used ON reasoning_traces(last_used_at);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}
