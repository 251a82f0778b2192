//! Translation Session Manager
//!
//! 세션 compose 워크플로우: 로드 → 준비 → 생성 → 병합 → 저장.
//! 저장 전 단계는 모두 읽기 전용이라 실패해도 세션은 그대로 남습니다.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AgentError, AgentResult};
use crate::models::{
    ComposeSentenceRequest, ComposeSentenceResponse, SessionComposeRequest, TranslationSession,
    TranslationSessionPatch, DEFAULT_COMPOSE_CONFIDENCE,
};
use crate::services::composer::TextComposer;

/// 기존 세션 + 새 입력 + 생성 결과로 저장할 변경분 계산 (순수 함수)
///
/// glosses/letters 는 이어 붙이기만 하고, emotion/intent/TTS 등 나머지 필드는
/// 건드리지 않습니다.
pub fn merge_compose(
    session: &TranslationSession,
    payload: &SessionComposeRequest,
    generated: &ComposeSentenceResponse,
) -> TranslationSessionPatch {
    let mut glosses = session.glosses.clone();
    glosses.extend(payload.glosses.iter().cloned());

    let mut letters = session.letters.clone().unwrap_or_default();
    letters.extend(payload.letters.iter().flatten().cloned());
    let letters = (!letters.is_empty()).then_some(letters);

    let text = generated.text.clone();
    let context = match session.context.as_deref() {
        Some(previous) if !previous.is_empty() => format!("{previous} {text}").trim().to_string(),
        _ => text.clone(),
    };

    TranslationSessionPatch {
        glosses: Some(glosses),
        letters: Some(letters),
        context: Some(Some(context)),
        input_text: Some(text.clone()),
        adjusted_text: Some(text),
        compose_confidence: Some(generated.confidence.unwrap_or(DEFAULT_COMPOSE_CONFIDENCE)),
        ..Default::default()
    }
}

/// 세션 compose 오케스트레이터
///
/// 같은 세션에 대한 동시 compose 는 직렬화하지 않습니다 (저장 시 나중 쓰기가 이김).
#[derive(Clone)]
pub struct TranslationSessionManager {
    db: Database,
    composer: Arc<dyn TextComposer>,
}

impl TranslationSessionManager {
    pub fn new(db: Database, composer: Arc<dyn TextComposer>) -> Self {
        Self { db, composer }
    }

    /// 새 인식 입력으로 문장을 생성하고 세션에 누적
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn compose(
        &self,
        session_id: Uuid,
        payload: SessionComposeRequest,
    ) -> AgentResult<TranslationSession> {
        if payload.glosses.is_empty() {
            return Err(AgentError::InvalidRequest(
                "glosses must contain at least one token".to_string(),
            ));
        }

        let session = self
            .db
            .call(move |db| db.get_session(session_id))
            .await?
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;

        let request = ComposeSentenceRequest {
            glosses: payload.glosses.clone(),
            letters: payload.letters.clone(),
            context: Some(session.context.clone().unwrap_or_default()),
            ..Default::default()
        };
        info!(
            glosses = ?request.glosses,
            letters = ?request.letters,
            context_len = request.context.as_deref().map_or(0, str::len),
            "session compose start"
        );

        let generated = self.composer.generate(request).await?;
        info!(model = %generated.model, text = %generated.text, "session compose result");

        let patch = merge_compose(&session, &payload, &generated);
        let updated = self
            .db
            .call(move |db| db.update_session(session_id, &patch))
            .await?;

        match updated {
            Some(session) => {
                info!(glosses = session.glosses.len(), "session compose complete");
                Ok(session)
            }
            None => {
                warn!("session deleted during compose");
                Err(AgentError::SessionNotFound(session_id.to_string()))
            }
        }
    }
}
