//! Translation Session Store
//!
//! `translation_sessions` 테이블 CRUD

use std::fmt::Write;

use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::rows::{encode_json, encode_optional_json, SessionRow, SESSION_COLUMNS};
use super::{active_filter, millis_to_datetime, now_millis, Database};
use crate::error::{AgentError, AgentResult};
use crate::models::{
    SessionFilter, TranslationSession, TranslationSessionCreate, TranslationSessionPatch,
};

fn ensure_glosses(glosses: &[String]) -> AgentResult<()> {
    if glosses.is_empty() {
        return Err(AgentError::InvalidRequest(
            "glosses must contain at least one token".to_string(),
        ));
    }
    Ok(())
}

fn select_session(conn: &Connection, id: &str) -> AgentResult<Option<TranslationSession>> {
    let row = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM translation_sessions WHERE id = ?1"),
            [id],
            SessionRow::from_row,
        )
        .optional()?;
    row.map(TranslationSession::try_from).transpose()
}

/// patch 에 들어 있는 컬럼만 SET 절로 변환
fn patch_assignments(
    patch: &TranslationSessionPatch,
) -> AgentResult<Vec<(&'static str, Box<dyn ToSql>)>> {
    let mut out: Vec<(&'static str, Box<dyn ToSql>)> = Vec::new();

    if let Some(v) = &patch.user_id {
        out.push(("user_id", Box::new(v.clone())));
    }
    if let Some(v) = &patch.glosses {
        ensure_glosses(v)?;
        out.push(("glosses", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.letters {
        out.push(("letters", Box::new(encode_optional_json(v.as_ref())?)));
    }
    if let Some(v) = &patch.preferred_words {
        out.push(("preferred_words", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.context {
        out.push(("context", Box::new(v.clone())));
    }
    if let Some(v) = &patch.input_text {
        out.push(("input_text", Box::new(v.clone())));
    }
    if let Some(v) = patch.compose_confidence {
        out.push(("compose_confidence", Box::new(v)));
    }
    if let Some(v) = &patch.compose_alternatives {
        out.push(("compose_alternatives", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.detected_emotion {
        out.push(("detected_emotion", Box::new(v.clone())));
    }
    if let Some(v) = &patch.detected_intent {
        out.push(("detected_intent", Box::new(v.clone())));
    }
    if let Some(v) = &patch.emphasis {
        out.push(("emphasis", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.adjusted_text {
        out.push(("adjusted_text", Box::new(v.clone())));
    }
    if let Some(v) = &patch.tts_metadata {
        out.push(("tts_metadata", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.tool_metadata {
        out.push(("tool_metadata", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.summary_text {
        out.push(("summary_text", Box::new(v.clone())));
    }
    if let Some(v) = &patch.summary_topics {
        out.push(("summary_topics", Box::new(encode_json(v)?)));
    }
    if let Some(v) = &patch.summary_action_items {
        out.push(("summary_action_items", Box::new(encode_json(v)?)));
    }

    Ok(out)
}

impl Database {
    /// 세션 생성 (초기 상태 전체를 받아 저장)
    pub fn create_session(
        &self,
        payload: &TranslationSessionCreate,
    ) -> AgentResult<TranslationSession> {
        ensure_glosses(&payload.glosses)?;

        let id = payload.id.unwrap_or_else(Uuid::new_v4);
        let now = now_millis();
        let id_str = id.to_string();
        let timestamp = millis_to_datetime(&id_str, "created_at", now)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO translation_sessions ({SESSION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
            ),
            params![
                id_str,
                payload.user_id,
                encode_json(&payload.glosses)?,
                encode_optional_json(payload.letters.as_ref())?,
                encode_json(&payload.preferred_words)?,
                payload.context,
                payload.input_text,
                payload.compose_confidence,
                encode_json(&payload.compose_alternatives)?,
                payload.detected_emotion,
                payload.detected_intent,
                encode_json(&payload.emphasis)?,
                payload.adjusted_text,
                encode_json(&payload.tts_metadata)?,
                encode_json(&payload.tool_metadata)?,
                payload.summary_text,
                encode_json(&payload.summary_topics)?,
                encode_json(&payload.summary_action_items)?,
                now,
                now,
            ],
        )?;
        tx.commit()?;

        Ok(TranslationSession {
            id,
            user_id: payload.user_id.clone(),
            glosses: payload.glosses.clone(),
            letters: payload.letters.clone(),
            preferred_words: payload.preferred_words.clone(),
            context: payload.context.clone(),
            input_text: payload.input_text.clone(),
            compose_confidence: payload.compose_confidence,
            compose_alternatives: payload.compose_alternatives.clone(),
            detected_emotion: payload.detected_emotion.clone(),
            detected_intent: payload.detected_intent.clone(),
            emphasis: payload.emphasis.clone(),
            adjusted_text: payload.adjusted_text.clone(),
            tts_metadata: payload.tts_metadata.clone(),
            tool_metadata: payload.tool_metadata.clone(),
            summary_text: payload.summary_text.clone(),
            summary_topics: payload.summary_topics.clone(),
            summary_action_items: payload.summary_action_items.clone(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// 세션 조회 (없으면 `None`)
    pub fn get_session(&self, id: Uuid) -> AgentResult<Option<TranslationSession>> {
        let conn = self.conn()?;
        select_session(&conn, &id.to_string())
    }

    /// 필터(AND 조건) 에 맞는 세션 목록, 최근 수정 순
    pub fn list_sessions(&self, filter: &SessionFilter) -> AgentResult<Vec<TranslationSession>> {
        let clauses = [
            ("detected_emotion", active_filter(&filter.detected_emotion)),
            ("detected_intent", active_filter(&filter.detected_intent)),
            ("user_id", active_filter(&filter.user_id)),
        ];

        let mut sql = format!("SELECT {SESSION_COLUMNS} FROM translation_sessions WHERE 1=1");
        let mut values: Vec<&dyn ToSql> = Vec::new();
        for (column, value) in &clauses {
            if let Some(value) = value {
                values.push(value);
                let _ = write!(sql, " AND {column} = ?{}", values.len());
            }
        }
        sql.push_str(" ORDER BY updated_at DESC, rowid DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(values.as_slice(), SessionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TranslationSession::try_from).collect()
    }

    /// 부분 수정. 빈 patch 는 조회와 동일 (updated_at 유지)
    pub fn update_session(
        &self,
        id: Uuid,
        patch: &TranslationSessionPatch,
    ) -> AgentResult<Option<TranslationSession>> {
        if patch.is_empty() {
            return self.get_session(id);
        }

        let mut assignments = patch_assignments(patch)?;
        assignments.push(("updated_at", Box::new(now_millis())));

        let id_str = id.to_string();
        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE translation_sessions SET {set_clause} WHERE id = ?{}",
            assignments.len() + 1
        );

        let mut values: Vec<&dyn ToSql> = assignments
            .iter()
            .map(|(_, v)| &**v as &dyn ToSql)
            .collect();
        values.push(&id_str);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(&sql, values.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }
        let updated = select_session(&tx, &id_str)?;
        tx.commit()?;
        Ok(updated)
    }

    /// 세션 삭제. 없던 id 면 `false`
    pub fn delete_session(&self, id: Uuid) -> AgentResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "DELETE FROM translation_sessions WHERE id = ?1",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{JsonMap, TranslationSessionCreate};

    pub fn session_payload(glosses: &[&str]) -> TranslationSessionCreate {
        let mut tts = JsonMap::new();
        tts.insert("voice".into(), "en-female-1".into());
        tts.insert("tone".into(), "soft".into());

        TranslationSessionCreate {
            id: None,
            user_id: Some("user_123".into()),
            glosses: glosses.iter().map(|g| g.to_string()).collect(),
            letters: None,
            preferred_words: Default::default(),
            context: None,
            input_text: "What time is it".into(),
            compose_confidence: 0.9,
            compose_alternatives: vec!["Could you tell me the time?".into()],
            detected_emotion: "frustrated".into(),
            detected_intent: "question".into(),
            emphasis: vec!["time".into()],
            adjusted_text: "What time is it?".into(),
            tts_metadata: tts,
            tool_metadata: Default::default(),
            summary_text: None,
            summary_topics: Vec::new(),
            summary_action_items: Vec::new(),
        }
    }
}
