//! Standalone Compose Handler

use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::error::{AgentError, AgentResult};
use crate::models::{ComposeSentenceRequest, ComposeSentenceResponse};

/// 세션 없이 문장만 생성 (blocking 경로를 blocking 스레드에서 실행)
pub async fn compose_sentence(
    State(state): State<AppState>,
    Json(payload): Json<ComposeSentenceRequest>,
) -> AgentResult<Json<ComposeSentenceResponse>> {
    let composer = state.composer.clone();
    let response = tokio::task::spawn_blocking(move || composer.compose(&payload))
        .await
        .map_err(|e| AgentError::BlockingTask(e.to_string()))??;
    Ok(Json(response))
}
