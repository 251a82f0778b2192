//! Translation Session Handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{AppState, MessageResponse};
use crate::error::{AgentError, AgentResult};
use crate::models::{
    SessionComposeRequest, SessionFilter, TranslationSession, TranslationSessionCreate,
    TranslationSessionPatch,
};

pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<TranslationSessionCreate>,
) -> AgentResult<(StatusCode, Json<TranslationSession>)> {
    let session = state.db.call(move |db| db.create_session(&payload)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(filter): Query<SessionFilter>,
) -> AgentResult<Json<Vec<TranslationSession>>> {
    let sessions = state.db.call(move |db| db.list_sessions(&filter)).await?;
    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AgentResult<Json<TranslationSession>> {
    state
        .db
        .call(move |db| db.get_session(id))
        .await?
        .map(Json)
        .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))
}

pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TranslationSessionPatch>,
) -> AgentResult<Json<TranslationSession>> {
    state
        .db
        .call(move |db| db.update_session(id, &patch))
        .await?
        .map(Json)
        .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AgentResult<Json<MessageResponse>> {
    if !state.db.call(move |db| db.delete_session(id)).await? {
        return Err(AgentError::SessionNotFound(id.to_string()));
    }
    Ok(MessageResponse::new("TranslationSession deleted successfully."))
}

/// 새 gloss 로 문장 생성 후 세션에 누적
pub async fn compose_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionComposeRequest>,
) -> AgentResult<Json<TranslationSession>> {
    let session = state.sessions.compose(id, payload).await?;
    Ok(Json(session))
}
