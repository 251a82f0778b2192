//! Expression Rule Store
//!
//! `expression_rules` 테이블 CRUD

use std::fmt::Write;

use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::rows::{RuleRow, RULE_COLUMNS};
use super::{active_filter, millis_to_datetime, now_millis, Database};
use crate::error::{AgentError, AgentResult};
use crate::models::{ExpressionRule, ExpressionRuleCreate, ExpressionRulePatch, RuleFilter};

fn validate_threshold(value: f64) -> AgentResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AgentError::InvalidRequest(format!(
            "confidence_threshold must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn select_rule(conn: &Connection, id: &str) -> AgentResult<Option<ExpressionRule>> {
    let row = conn
        .query_row(
            &format!("SELECT {RULE_COLUMNS} FROM expression_rules WHERE id = ?1"),
            [id],
            RuleRow::from_row,
        )
        .optional()?;
    row.map(ExpressionRule::try_from).transpose()
}

impl Database {
    /// 규칙 생성 (id 가 없으면 새로 할당)
    pub fn create_rule(&self, payload: &ExpressionRuleCreate) -> AgentResult<ExpressionRule> {
        validate_threshold(payload.confidence_threshold)?;

        let id = payload.id.unwrap_or_else(Uuid::new_v4);
        let now = now_millis();
        let id_str = id.to_string();
        let timestamp = millis_to_datetime(&id_str, "created_at", now)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO expression_rules
                 (id, emotion, intent, punctuation_adjustment, tts_tone, confidence_threshold, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id_str,
                payload.emotion,
                payload.intent,
                payload.punctuation_adjustment,
                payload.tts_tone,
                payload.confidence_threshold,
                now,
                now,
            ],
        )?;
        tx.commit()?;

        Ok(ExpressionRule {
            id,
            emotion: payload.emotion.clone(),
            intent: payload.intent.clone(),
            punctuation_adjustment: payload.punctuation_adjustment.clone(),
            tts_tone: payload.tts_tone.clone(),
            confidence_threshold: payload.confidence_threshold,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// 규칙 조회 (없으면 `None`)
    pub fn get_rule(&self, id: Uuid) -> AgentResult<Option<ExpressionRule>> {
        let conn = self.conn()?;
        select_rule(&conn, &id.to_string())
    }

    /// 필터(AND 조건) 에 맞는 규칙 목록, 최근 수정 순
    pub fn list_rules(&self, filter: &RuleFilter) -> AgentResult<Vec<ExpressionRule>> {
        let emotion = active_filter(&filter.emotion);
        let intent = active_filter(&filter.intent);

        let mut sql = format!("SELECT {RULE_COLUMNS} FROM expression_rules WHERE 1=1");
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(emotion) = emotion.as_ref() {
            values.push(emotion);
            let _ = write!(sql, " AND emotion = ?{}", values.len());
        }
        if let Some(intent) = intent.as_ref() {
            values.push(intent);
            let _ = write!(sql, " AND intent = ?{}", values.len());
        }
        sql.push_str(" ORDER BY updated_at DESC, rowid DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(values.as_slice(), RuleRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ExpressionRule::try_from).collect()
    }

    /// 부분 수정. 빈 patch 는 조회와 동일 (updated_at 유지)
    pub fn update_rule(
        &self,
        id: Uuid,
        patch: &ExpressionRulePatch,
    ) -> AgentResult<Option<ExpressionRule>> {
        if patch.is_empty() {
            return self.get_rule(id);
        }
        if let Some(threshold) = patch.confidence_threshold {
            validate_threshold(threshold)?;
        }

        let now = now_millis();
        let id_str = id.to_string();

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(v) = patch.emotion.as_ref() {
            assignments.push("emotion");
            values.push(v);
        }
        if let Some(v) = patch.intent.as_ref() {
            assignments.push("intent");
            values.push(v);
        }
        if let Some(v) = patch.punctuation_adjustment.as_ref() {
            assignments.push("punctuation_adjustment");
            values.push(v);
        }
        if let Some(v) = patch.tts_tone.as_ref() {
            assignments.push("tts_tone");
            values.push(v);
        }
        if let Some(v) = patch.confidence_threshold.as_ref() {
            assignments.push("confidence_threshold");
            values.push(v);
        }

        assignments.push("updated_at");
        values.push(&now);

        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        values.push(&id_str);
        let sql = format!(
            "UPDATE expression_rules SET {set_clause} WHERE id = ?{}",
            values.len()
        );

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(&sql, values.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }
        let updated = select_rule(&tx, &id_str)?;
        tx.commit()?;
        Ok(updated)
    }

    /// 규칙 삭제. 없던 id 면 `false`
    pub fn delete_rule(&self, id: Uuid) -> AgentResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute("DELETE FROM expression_rules WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;
        Ok(changed > 0)
    }
}
