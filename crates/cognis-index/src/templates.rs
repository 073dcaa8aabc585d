//! C6 template storage: CRUD plus the status/confidence transitions the
//! lifecycle state machine drives.

use std::sync::Arc;

use cognis_types::{FlatSchema, Id, SourceTier, Template, TemplateStatus};
use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::Result;

fn status_str(s: TemplateStatus) -> &'static str {
    match s {
        TemplateStatus::Probation => "probation",
        TemplateStatus::Validated => "validated",
        TemplateStatus::Promoted => "promoted",
        TemplateStatus::Deprecated => "deprecated",
    }
}

fn parse_status(s: &str) -> Result<TemplateStatus> {
    match s {
        "probation" => Ok(TemplateStatus::Probation),
        "validated" => Ok(TemplateStatus::Validated),
        "promoted" => Ok(TemplateStatus::Promoted),
        "deprecated" => Ok(TemplateStatus::Deprecated),
        other => Err(crate::Error::Query(format!("unknown template status: {other}"))),
    }
}

fn source_tier_str(s: SourceTier) -> &'static str {
    match s {
        SourceTier::Distillation => "distillation",
        SourceTier::Manual => "manual",
        SourceTier::Synthesis => "synthesis",
    }
}

fn parse_source_tier(s: &str) -> Result<SourceTier> {
    match s {
        "distillation" => Ok(SourceTier::Distillation),
        "manual" => Ok(SourceTier::Manual),
        "synthesis" => Ok(SourceTier::Synthesis),
        other => Err(crate::Error::Query(format!("unknown source tier: {other}"))),
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    db: Arc<Database>,
}

impl TemplateStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, template: &Template) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let embedding = template
            .intent_embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let schema = serde_json::to_string(&template.schema.0)?;
        conn.execute(
            "INSERT INTO templates
                (id, name, intent, intent_embedding, template_body, schema, grammar,
                 task_type, status, confidence, complexity_score, source_tier,
                 source_request_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                template.id.to_string(),
                template.name,
                template.intent,
                embedding,
                template.template_body,
                schema,
                template.grammar,
                template.task_type,
                status_str(template.status),
                template.confidence,
                template.complexity_score,
                source_tier_str(template.source_tier),
                template.source_request_id,
                template.created_at,
                template.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &Id) -> Result<Option<Template>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        conn.query_row(
            "SELECT id, name, intent, intent_embedding, template_body, schema, grammar,
                    task_type, status, confidence, complexity_score, source_tier,
                    source_request_id, created_at, updated_at
             FROM templates WHERE id = ?1",
            params![id.to_string()],
            row_to_template,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Templates with `status = Promoted` for `task_type`, highest
    /// confidence first — the candidate pool for render-time selection.
    pub fn promoted_for_type(&self, task_type: &str) -> Result<Vec<Template>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, intent, intent_embedding, template_body, schema, grammar,
                    task_type, status, confidence, complexity_score, source_tier,
                    source_request_id, created_at, updated_at
             FROM templates WHERE task_type = ?1 AND status = ?2
             ORDER BY confidence DESC",
        )?;
        let rows = stmt.query_map(params![task_type, status_str(TemplateStatus::Promoted)], row_to_template)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn list_by_status(&self, status: TemplateStatus) -> Result<Vec<Template>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, intent, intent_embedding, template_body, schema, grammar,
                    task_type, status, confidence, complexity_score, source_tier,
                    source_request_id, created_at, updated_at
             FROM templates WHERE status = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![status_str(status)], row_to_template)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn list_all(&self) -> Result<Vec<Template>> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, intent, intent_embedding, template_body, schema, grammar,
                    task_type, status, confidence, complexity_score, source_tier,
                    source_request_id, created_at, updated_at
             FROM templates ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_template)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Persist a new confidence (and transitioned status, if any) after a
    /// grading pass. `updated_at` is refreshed to the caller-supplied
    /// timestamp so tests stay deterministic.
    pub fn update_status_and_confidence(
        &self,
        id: &Id,
        status: TemplateStatus,
        confidence: f64,
        updated_at: i64,
    ) -> Result<()> {
        let conn = self.db.conn.lock().expect("db mutex poisoned");
        let changed = conn.execute(
            "UPDATE templates SET status = ?2, confidence = ?3, updated_at = ?4 WHERE id = ?1",
            params![id.to_string(), status_str(status), confidence, updated_at],
        )?;
        if changed == 0 {
            return Err(crate::Error::Query(format!("template {id} not found")));
        }
        Ok(())
    }
}

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<Template> {
    let id: String = row.get(0)?;
    let embedding: Option<String> = row.get(3)?;
    let schema: String = row.get(5)?;
    let status: String = row.get(8)?;
    let source_tier: String = row.get(11)?;

    Ok(Template {
        id: decode_id(&id).map_err(to_sql_err)?,
        name: row.get(1)?,
        intent: row.get(2)?,
        intent_embedding: embedding
            .map(|e| serde_json::from_str(&e))
            .transpose()
            .map_err(|e: serde_json::Error| to_sql_err(e.into()))?,
        template_body: row.get(4)?,
        schema: FlatSchema(
            serde_json::from_str(&schema).map_err(|e: serde_json::Error| to_sql_err(e.into()))?,
        ),
        grammar: row.get(6)?,
        task_type: row.get(7)?,
        status: parse_status(&status).map_err(to_sql_err)?,
        confidence: row.get(9)?,
        complexity_score: row.get(10)?,
        source_tier: parse_source_tier(&source_tier).map_err(to_sql_err)?,
        source_request_id: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
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
    use serde_json::json;

    fn store() -> TemplateStore {
        TemplateStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn sample() -> Template {
        Template::new(
            "summarize",
            "summarize user input",
            "{{.Input | truncate 200}}",
            FlatSchema(json!({"type": "object", "properties": {"summary": {"type": "string"}}})),
            String::new(),
            "reasoning",
            SourceTier::Distillation,
            Some("req-1".to_string()),
        )
    }

    #[test]
    fn insert_and_get_round_trips() {
        let s = store();
        let t = sample();
        s.insert(&t).unwrap();
        let fetched = s.get(&t.id).unwrap().unwrap();
        assert_eq!(fetched, t);
    }

    #[test]
    fn update_status_and_confidence_persists() {
        let s = store();
        let t = sample();
        s.insert(&t).unwrap();
        s.update_status_and_confidence(&t.id, TemplateStatus::Validated, 0.7, 1000)
            .unwrap();
        let fetched = s.get(&t.id).unwrap().unwrap();
        assert_eq!(fetched.status, TemplateStatus::Validated);
        assert_eq!(fetched.confidence, 0.7);
        assert_eq!(fetched.updated_at, 1000);
    }

    #[test]
    fn promoted_for_type_filters_by_status_and_type() {
        let s = store();
        let mut promoted = sample();
        promoted.status = TemplateStatus::Promoted;
        promoted.confidence = 0.9;
        s.insert(&promoted).unwrap();

        let mut probation = sample();
        probation.id = Id::new();
        s.insert(&probation).unwrap();

        let candidates = s.promoted_for_type("reasoning").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, promoted.id);
    }

    #[test]
    fn update_on_missing_template_errors() {
        let s = store();
        let result = s.update_status_and_confidence(&Id::new(), TemplateStatus::Deprecated, 0.0, 0);
        assert!(result.is_err());
    }
}
