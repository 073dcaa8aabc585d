//! Grade storage. Grades are append-only: a template's confidence is
//! always recomputed from the full history via
//! `cognis_types::recompute_confidence`, never decremented in place, so a
//! crash mid-grade can't leave confidence and history disagreeing.

use std::sync::Arc;

use cognis_types::{Grade, GradeVerdict, Id};
use rusqlite::params;

use crate::db::Database;
use crate::Result;

fn verdict_str(v: GradeVerdict) -> &'static str {
    match v {
        GradeVerdict::Pass => "pass",
        GradeVerdict::Partial => "partial",
        GradeVerdict::Fail => "fail",
    }
}

fn parse_verdict(s: &str) -> Result<GradeVerdict> {
    match s {
        "pass" => Ok(GradeVerdict::Pass),
        "partial" => Ok(GradeVerdict::Partial),
        "fail" => Ok(GradeVerdict::Fail),
        other => Err(crate::Error::Query(format!("unknown grade verdict: {other}"))),
    }
}

#[derive(Debug, Clone)]
pub struct GradeStore {
    db: Arc<Database>,
}

impl GradeStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, grade: &Grade) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.execute(
            "INSERT INTO grades
                (id, template_id, usage_log_id, grader_model, verdict, correctness,
                 completeness, confidence_delta, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                grade.id.to_string(),
                grade.template_id.to_string(),
                grade.usage_log_id.to_string(),
                grade.grader_model,
                verdict_str(grade.verdict),
                grade.correctness,
                grade.completeness,
                grade.confidence_delta,
                grade.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Every delta recorded for `template_id`, in chronological order —
    /// the input to `cognis_types::recompute_confidence`.
    pub fn deltas_for_template(&self, template_id: &Id) -> Result<Vec<f64>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT confidence_delta FROM grades WHERE template_id = ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![template_id.to_string()], |row| row.get::<_, f64>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn list_for_template(&self, template_id: &Id) -> Result<Vec<Grade>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, template_id, usage_log_id, grader_model, verdict, correctness,
                    completeness, confidence_delta, timestamp
             FROM grades WHERE template_id = ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![template_id.to_string()], row_to_grade)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Distribution of verdicts across every grade recorded, for the
    /// metrics aggregation in C6.
    pub fn verdict_counts(&self) -> Result<(u64, u64, u64)> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare("SELECT verdict, COUNT(*) FROM grades GROUP BY verdict")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        let (mut pass, mut partial, mut fail) = (0, 0, 0);
        for row in rows {
            let (verdict, count) = row?;
            match parse_verdict(&verdict).map_err(to_sql_err)? {
                GradeVerdict::Pass => pass = count,
                GradeVerdict::Partial => partial = count,
                GradeVerdict::Fail => fail = count,
            }
        }
        Ok((pass, partial, fail))
    }
}

fn row_to_grade(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grade> {
    let id: String = row.get(0)?;
    let template_id: String = row.get(1)?;
    let usage_log_id: String = row.get(2)?;
    let verdict: String = row.get(4)?;
    Ok(Grade {
        id: decode_id(&id).map_err(to_sql_err)?,
        template_id: decode_id(&template_id).map_err(to_sql_err)?,
        usage_log_id: decode_id(&usage_log_id).map_err(to_sql_err)?,
        grader_model: row.get(3)?,
        verdict: parse_verdict(&verdict).map_err(to_sql_err)?,
        correctness: row.get(5)?,
        completeness: row.get(6)?,
        confidence_delta: row.get(7)?,
        timestamp: row.get(8)?,
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
    use cognis_types::recompute_confidence;

    fn store() -> GradeStore {
        GradeStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn deltas_recompute_matches_spec_scenario() {
        let s = store();
        let template_id = Id::new();
        for verdict in [GradeVerdict::Pass, GradeVerdict::Pass, GradeVerdict::Fail] {
            let grade = Grade::new(template_id, Id::new(), "grader-1", verdict, 1.0, 1.0);
            s.insert(&grade).unwrap();
        }
        let deltas = s.deltas_for_template(&template_id).unwrap();
        assert!((recompute_confidence(deltas) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn verdict_counts_tally_by_kind() {
        let s = store();
        let template_id = Id::new();
        for verdict in [GradeVerdict::Pass, GradeVerdict::Pass, GradeVerdict::Fail, GradeVerdict::Partial] {
            let grade = Grade::new(template_id, Id::new(), "grader-1", verdict, 1.0, 1.0);
            s.insert(&grade).unwrap();
        }
        assert_eq!(s.verdict_counts().unwrap(), (2, 1, 1));
    }
}
