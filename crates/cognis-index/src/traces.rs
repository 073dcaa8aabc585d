//! Reasoning-trace storage. Steps are DEFLATE-compressed before
//! being written to the `steps` BLOB; `steps_compressed` records whether
//! compression was actually applied, because a row written before
//! compression support existed (or one written with deliberately
//! uncompressed steps) must still decode correctly.

use std::io::{Read, Write};
use std::sync::Arc;

use cognis_types::{Id, Outcome, ReasoningStep, ReasoningTrace};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::Result;

fn outcome_str(o: Outcome) -> &'static str {
    match o {
        Outcome::Success => "success",
        Outcome::Partial => "partial",
        Outcome::Failed => "failed",
        Outcome::Interrupted => "interrupted",
    }
}

fn parse_outcome(s: &str) -> Result<Outcome> {
    match s {
        "success" => Ok(Outcome::Success),
        "partial" => Ok(Outcome::Partial),
        "failed" => Ok(Outcome::Failed),
        "interrupted" => Ok(Outcome::Interrupted),
        other => Err(crate::Error::Query(format!("unknown trace outcome: {other}"))),
    }
}

/// Compress a trace's steps. Falls back to raw JSON (and
/// `steps_compressed = false`) if the encoder fails, which in practice
/// only happens under I/O error from the in-memory buffer.
fn compress_steps(steps: &[ReasoningStep]) -> (Vec<u8>, bool) {
    let json = match serde_json::to_vec(steps) {
        Ok(j) => j,
        Err(_) => return (Vec::new(), false),
    };
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(&json).is_err() {
        return (json, false);
    }
    match encoder.finish() {
        Ok(compressed) => (compressed, true),
        Err(_) => (json, false),
    }
}

fn decompress_steps(blob: &[u8], compressed: bool) -> Result<Vec<ReasoningStep>> {
    if !compressed {
        return Ok(serde_json::from_slice(blob)?);
    }
    let mut decoder = DeflateDecoder::new(blob);
    let mut json = Vec::new();
    match decoder.read_to_end(&mut json) {
        Ok(_) => Ok(serde_json::from_slice(&json)?),
        // Defensive fallback: treat the blob as raw JSON if it somehow
        // isn't valid deflate, rather than losing the whole trace.
        Err(_) => Ok(serde_json::from_slice(blob)?),
    }
}

#[derive(Debug, Clone)]
pub struct TraceStore {
    db: Arc<Database>,
}

impl TraceStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, trace: &ReasoningTrace) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let (steps_blob, compressed) = compress_steps(&trace.steps);
        let embedding = trace
            .query_embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let tools_used = serde_json::to_string(&trace.tools_used)?;
        conn.execute(
            "INSERT INTO reasoning_traces
                (id, query, query_embedding, approach, steps, steps_compressed, outcome,
                 success_score, reused_count, tools_used, duration_ms, tokens, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                trace.id.to_string(),
                trace.query,
                embedding,
                trace.approach,
                steps_blob,
                compressed,
                outcome_str(trace.outcome),
                trace.success_score,
                trace.reused_count,
                tools_used,
                trace.duration_ms,
                trace.tokens,
                trace.created_at,
                trace.last_used_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &Id) -> Result<Option<ReasoningTrace>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT id, query, query_embedding, approach, steps, steps_compressed, outcome,
                    success_score, reused_count, tools_used, duration_ms, tokens, created_at, last_used_at
             FROM reasoning_traces WHERE id = ?1",
            params![id.to_string()],
            row_to_trace,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Every trace with an embedding, for the caller to score by cosine
    /// similarity (`cognis_core::similarity`) and pick retrieval
    /// candidates from.
    pub fn all_with_embeddings(&self) -> Result<Vec<ReasoningTrace>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, query, query_embedding, approach, steps, steps_compressed, outcome,
                    success_score, reused_count, tools_used, duration_ms, tokens, created_at, last_used_at
             FROM reasoning_traces WHERE query_embedding IS NOT NULL",
        )?;
        let rows = stmt.query_map([], row_to_trace)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Bump `reused_count` and refresh `last_used_at` for a retrieved
    /// trace.
    pub fn mark_reused(&self, id: &Id, now: i64) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let changed = conn.execute(
            "UPDATE reasoning_traces SET reused_count = reused_count + 1, last_used_at = ?2 WHERE id = ?1",
            params![id.to_string(), now],
        )?;
        if changed == 0 {
            return Err(crate::Error::Query(format!("trace {id} not found")));
        }
        Ok(())
    }

    /// Success/total counts across every stored trace, for the metrics
    /// collector's trace success rate.
    pub fn outcome_success_and_total_counts(&self) -> Result<(u64, u64)> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM reasoning_traces", [], |row| row.get(0))?;
        let success: u64 = conn.query_row(
            "SELECT COUNT(*) FROM reasoning_traces WHERE outcome = ?1",
            params![outcome_str(Outcome::Success)],
            |row| row.get(0),
        )?;
        Ok((success, total))
    }

    /// Delete traces last used before `older_than` whose `success_score`
    /// is below `min_score` and which have never been reused.
    /// `older_than` is the caller's responsibility to keep at least 24h
    /// in the past; a trace with `reused_count > 0` is never a candidate
    /// regardless of age or score.
    pub fn prune(&self, older_than: i64, min_score: f64) -> Result<u64> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let deleted = conn.execute(
            "DELETE FROM reasoning_traces
             WHERE last_used_at < ?1 AND success_score < ?2 AND reused_count = 0",
            params![older_than, min_score],
        )?;
        Ok(deleted as u64)
    }
}

fn row_to_trace(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReasoningTrace> {
    let id: String = row.get(0)?;
    let embedding: Option<String> = row.get(2)?;
    let steps_blob: Vec<u8> = row.get(4)?;
    let compressed: bool = row.get(5)?;
    let outcome: String = row.get(6)?;
    let tools_used: String = row.get(9)?;

    Ok(ReasoningTrace {
        id: decode_id(&id).map_err(to_sql_err)?,
        query: row.get(1)?,
        query_embedding: embedding
            .map(|e| serde_json::from_str(&e))
            .transpose()
            .map_err(|e: serde_json::Error| to_sql_err(e.into()))?,
        approach: row.get(3)?,
        steps: decompress_steps(&steps_blob, compressed).map_err(to_sql_err)?,
        outcome: parse_outcome(&outcome).map_err(to_sql_err)?,
        success_score: row.get(7)?,
        reused_count: row.get(8)?,
        tools_used: serde_json::from_str(&tools_used).map_err(|e: serde_json::Error| to_sql_err(e.into()))?,
        duration_ms: row.get(10)?,
        tokens: row.get(11)?,
        created_at: row.get(12)?,
        last_used_at: row.get(13)?,
    })
}

fn decode_id(s: &str) -> crate::Result<Id> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| crate::Error::Query(format!("malformed id {s}: {e}")))
}

fn to_sql_err(e: crate::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}
