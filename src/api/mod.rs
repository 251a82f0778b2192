//! HTTP API
//!
//! axum 라우터. 핸들러는 얇게 유지하고 에러 → 상태 코드 변환은
//! `AgentError: IntoResponse` 에 맡깁니다.

mod compose;
mod rules;
mod sessions;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::services::{SentenceComposer, TranslationSessionManager};

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub composer: SentenceComposer,
    pub sessions: TranslationSessionManager,
}

impl AppState {
    /// 기본 composer 하나를 단독 compose 와 세션 compose 가 함께 사용
    pub fn new(db: Database, composer: SentenceComposer) -> Self {
        let sessions = TranslationSessionManager::new(db.clone(), Arc::new(composer.clone()));
        Self {
            db,
            composer,
            sessions,
        }
    }
}

/// 단순 메시지 응답 (`{"message": ...}`)
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

async fn root() -> Json<MessageResponse> {
    MessageResponse::new("ASL Agent API is running.")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/expression_rules",
            post(rules::create_rule).get(rules::list_rules),
        )
        .route(
            "/expression_rules/{id}",
            get(rules::get_rule)
                .put(rules::update_rule)
                .delete(rules::delete_rule),
        )
        .route(
            "/translation_sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/translation_sessions/{id}",
            get(sessions::get_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/translation_sessions/{id}/compose",
            post(sessions::compose_session),
        )
        .route("/compose/sentence", post(compose::compose_sentence))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
