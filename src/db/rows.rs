//! Row Types
//!
//! SQLite 행의 원시 형태와 public 모델 간 변환.
//! JSON 컬럼은 쓰기 시 직렬화, 읽기 시 역직렬화하며 NULL 은 타입의 빈 값으로
//! 매핑합니다. 역직렬화 실패는 행이 손상된 것으로 보고 에러를 반환합니다.

use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::millis_to_datetime;
use crate::error::{AgentError, AgentResult};
use crate::models::{ExpressionRule, TranslationSession};

pub(crate) const RULE_COLUMNS: &str = "id, emotion, intent, punctuation_adjustment, tts_tone, \
     confidence_threshold, created_at, updated_at";

pub(crate) const SESSION_COLUMNS: &str = "id, user_id, glosses, letters, preferred_words, context, \
     input_text, compose_confidence, compose_alternatives, detected_emotion, detected_intent, \
     emphasis, adjusted_text, tts_metadata, tool_metadata, summary_text, summary_topics, \
     summary_action_items, created_at, updated_at";

/// `expression_rules` 원시 행
#[derive(Debug, Clone)]
pub(crate) struct RuleRow {
    pub id: String,
    pub emotion: String,
    pub intent: String,
    pub punctuation_adjustment: String,
    pub tts_tone: String,
    pub confidence_threshold: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl RuleRow {
    /// `RULE_COLUMNS` 순서로 조회한 행을 매핑
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            emotion: row.get(1)?,
            intent: row.get(2)?,
            punctuation_adjustment: row.get(3)?,
            tts_tone: row.get(4)?,
            confidence_threshold: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<RuleRow> for ExpressionRule {
    type Error = AgentError;

    fn try_from(row: RuleRow) -> AgentResult<Self> {
        Ok(ExpressionRule {
            id: parse_id(&row.id)?,
            created_at: millis_to_datetime(&row.id, "created_at", row.created_at)?,
            updated_at: millis_to_datetime(&row.id, "updated_at", row.updated_at)?,
            emotion: row.emotion,
            intent: row.intent,
            punctuation_adjustment: row.punctuation_adjustment,
            tts_tone: row.tts_tone,
            confidence_threshold: row.confidence_threshold,
        })
    }
}

/// `translation_sessions` 원시 행 (JSON 컬럼은 문자열 그대로)
#[derive(Debug, Clone)]
pub(crate) struct SessionRow {
    pub id: String,
    pub user_id: Option<String>,
    pub glosses: Option<String>,
    pub letters: Option<String>,
    pub preferred_words: Option<String>,
    pub context: Option<String>,
    pub input_text: String,
    pub compose_confidence: f64,
    pub compose_alternatives: Option<String>,
    pub detected_emotion: String,
    pub detected_intent: String,
    pub emphasis: Option<String>,
    pub adjusted_text: String,
    pub tts_metadata: Option<String>,
    pub tool_metadata: Option<String>,
    pub summary_text: Option<String>,
    pub summary_topics: Option<String>,
    pub summary_action_items: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SessionRow {
    /// `SESSION_COLUMNS` 순서로 조회한 행을 매핑
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            glosses: row.get(2)?,
            letters: row.get(3)?,
            preferred_words: row.get(4)?,
            context: row.get(5)?,
            input_text: row.get(6)?,
            compose_confidence: row.get(7)?,
            compose_alternatives: row.get(8)?,
            detected_emotion: row.get(9)?,
            detected_intent: row.get(10)?,
            emphasis: row.get(11)?,
            adjusted_text: row.get(12)?,
            tts_metadata: row.get(13)?,
            tool_metadata: row.get(14)?,
            summary_text: row.get(15)?,
            summary_topics: row.get(16)?,
            summary_action_items: row.get(17)?,
            created_at: row.get(18)?,
            updated_at: row.get(19)?,
        })
    }
}

impl TryFrom<SessionRow> for TranslationSession {
    type Error = AgentError;

    fn try_from(row: SessionRow) -> AgentResult<Self> {
        let id = row.id.as_str();
        Ok(TranslationSession {
            id: parse_id(id)?,
            glosses: decode_json(id, "glosses", row.glosses.as_deref())?,
            letters: decode_json(id, "letters", row.letters.as_deref())?,
            preferred_words: decode_json(id, "preferred_words", row.preferred_words.as_deref())?,
            compose_alternatives: decode_json(
                id,
                "compose_alternatives",
                row.compose_alternatives.as_deref(),
            )?,
            emphasis: decode_json(id, "emphasis", row.emphasis.as_deref())?,
            tts_metadata: decode_json(id, "tts_metadata", row.tts_metadata.as_deref())?,
            tool_metadata: decode_json(id, "tool_metadata", row.tool_metadata.as_deref())?,
            summary_topics: decode_json(id, "summary_topics", row.summary_topics.as_deref())?,
            summary_action_items: decode_json(
                id,
                "summary_action_items",
                row.summary_action_items.as_deref(),
            )?,
            created_at: millis_to_datetime(id, "created_at", row.created_at)?,
            updated_at: millis_to_datetime(id, "updated_at", row.updated_at)?,
            user_id: row.user_id,
            context: row.context,
            input_text: row.input_text,
            compose_confidence: row.compose_confidence,
            detected_emotion: row.detected_emotion,
            detected_intent: row.detected_intent,
            adjusted_text: row.adjusted_text,
            summary_text: row.summary_text,
        })
    }
}

fn parse_id(id: &str) -> AgentResult<Uuid> {
    Uuid::parse_str(id).map_err(|e| AgentError::MalformedRow {
        id: id.to_string(),
        column: "id",
        reason: e.to_string(),
    })
}

/// JSON 컬럼 역직렬화. NULL 이면 타입의 기본값(빈 배열/맵, `None`).
pub(crate) fn decode_json<T>(id: &str, column: &'static str, raw: Option<&str>) -> AgentResult<T>
where
    T: DeserializeOwned + Default,
{
    match raw {
        None => Ok(T::default()),
        Some(text) => serde_json::from_str(text).map_err(|e| AgentError::MalformedRow {
            id: id.to_string(),
            column,
            reason: e.to_string(),
        }),
    }
}

pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> AgentResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// `None` 은 SQL NULL 로 저장
pub(crate) fn encode_optional_json<T: Serialize>(value: Option<&T>) -> AgentResult<Option<String>> {
    value.map(encode_json).transpose()
}
