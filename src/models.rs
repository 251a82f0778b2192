//! ASL Agent Data Models
//!
//! API JSON 과 매핑되는 Rust 데이터 모델

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// 스키마를 TTS 쪽이 소유하는 임의 key→value 맵
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// 규칙 생성 시 confidence_threshold 기본값
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// 원격 응답이 confidence 를 주지 않을 때 세션에 기록하는 값
pub const DEFAULT_COMPOSE_CONFIDENCE: f64 = 1.0;

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

/// `null` 과 "필드 없음" 을 구분하기 위한 역직렬화 헬퍼.
/// 필드가 있으면 `Some(..)`, 없으면 `#[serde(default)]` 로 `None`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ─── Expression Rule ──────────────────────────────────────────

/// emotion/intent → 표현 조정 매핑 규칙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRule {
    pub id: Uuid,
    pub emotion: String,
    pub intent: String,
    pub punctuation_adjustment: String,
    pub tts_tone: String,
    pub confidence_threshold: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionRuleCreate {
    /// 비어 있으면 저장 시 새 UUID 할당
    #[serde(default)]
    pub id: Option<Uuid>,
    pub emotion: String,
    pub intent: String,
    pub punctuation_adjustment: String,
    pub tts_tone: String,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

/// 부분 수정 (있는 필드만 변경)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRulePatch {
    pub emotion: Option<String>,
    pub intent: Option<String>,
    pub punctuation_adjustment: Option<String>,
    pub tts_tone: Option<String>,
    pub confidence_threshold: Option<f64>,
}

impl ExpressionRulePatch {
    pub fn is_empty(&self) -> bool {
        self.emotion.is_none()
            && self.intent.is_none()
            && self.punctuation_adjustment.is_none()
            && self.tts_tone.is_none()
            && self.confidence_threshold.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFilter {
    pub emotion: Option<String>,
    pub intent: Option<String>,
}

// ─── Translation Session ──────────────────────────────────────

/// 번역 세션 하나와 누적 상태
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSession {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub glosses: Vec<String>,
    /// `None` 과 빈 배열은 서로 다른 상태
    pub letters: Option<Vec<String>>,
    pub preferred_words: HashMap<String, String>,
    pub context: Option<String>,
    pub input_text: String,
    pub compose_confidence: f64,
    pub compose_alternatives: Vec<String>,
    pub detected_emotion: String,
    pub detected_intent: String,
    pub emphasis: Vec<String>,
    pub adjusted_text: String,
    pub tts_metadata: JsonMap,
    pub tool_metadata: HashMap<String, String>,
    pub summary_text: Option<String>,
    pub summary_topics: Vec<String>,
    pub summary_action_items: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSessionCreate {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub glosses: Vec<String>,
    #[serde(default)]
    pub letters: Option<Vec<String>>,
    #[serde(default)]
    pub preferred_words: HashMap<String, String>,
    #[serde(default)]
    pub context: Option<String>,
    pub input_text: String,
    pub compose_confidence: f64,
    #[serde(default)]
    pub compose_alternatives: Vec<String>,
    pub detected_emotion: String,
    pub detected_intent: String,
    #[serde(default)]
    pub emphasis: Vec<String>,
    pub adjusted_text: String,
    pub tts_metadata: JsonMap,
    #[serde(default)]
    pub tool_metadata: HashMap<String, String>,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub summary_topics: Vec<String>,
    #[serde(default)]
    pub summary_action_items: Vec<String>,
}

/// 세션 부분 수정.
///
/// nullable 컬럼(`user_id`, `letters`, `context`, `summary_text`)은
/// `Some(None)` 이면 NULL 로 지우고, `None` 이면 건드리지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TranslationSessionPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub user_id: Option<Option<String>>,
    pub glosses: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub letters: Option<Option<Vec<String>>>,
    pub preferred_words: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub context: Option<Option<String>>,
    pub input_text: Option<String>,
    pub compose_confidence: Option<f64>,
    pub compose_alternatives: Option<Vec<String>>,
    pub detected_emotion: Option<String>,
    pub detected_intent: Option<String>,
    pub emphasis: Option<Vec<String>>,
    pub adjusted_text: Option<String>,
    pub tts_metadata: Option<JsonMap>,
    pub tool_metadata: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub summary_text: Option<Option<String>>,
    pub summary_topics: Option<Vec<String>>,
    pub summary_action_items: Option<Vec<String>>,
}

impl TranslationSessionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilter {
    pub detected_emotion: Option<String>,
    pub detected_intent: Option<String>,
    pub user_id: Option<String>,
}

/// 인식기에서 새로 들어온 입력 (세션 compose 용)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionComposeRequest {
    pub glosses: Vec<String>,
    #[serde(default)]
    pub letters: Option<Vec<String>>,
}

// ─── Compose ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeSentenceRequest {
    pub glosses: Vec<String>,
    #[serde(default)]
    pub letters: Option<Vec<String>>,
    #[serde(default)]
    pub context: Option<String>,
    /// 호출 단위 API 키 override
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeSentenceResponse {
    pub text: String,
    pub confidence: Option<f64>,
    pub model: String,
}
