//! ASL Agent Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// 외부 문장 생성 API 호출 실패
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// ASL Agent 에러
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed {column} on row {id}: {reason}")]
    MalformedRow {
        id: String,
        column: &'static str,
        reason: String,
    },

    #[error("Storage task failed: {0}")]
    StorageTask(String),

    #[error("ExpressionRule not found: {0}")]
    RuleNotFound(String),

    #[error("TranslationSession not found: {0}")]
    SessionNotFound(String),

    #[error("Composer configuration error: {0}")]
    ComposerConfig(String),

    #[error("Compose request failed: {0}")]
    ComposerUpstream(#[from] UpstreamError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Blocking task failed: {0}")]
    BlockingTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 에러 분류 (경계 계층이 응답 상태를 결정하는 기준)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Config,
    Upstream,
    Storage,
    InvalidRequest,
}

impl AgentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgentError::Database(_)
            | AgentError::Pool(_)
            | AgentError::Serialization(_)
            | AgentError::MalformedRow { .. }
            | AgentError::StorageTask(_)
            | AgentError::BlockingTask(_)
            | AgentError::Io(_) => ErrorCategory::Storage,
            AgentError::RuleNotFound(_) | AgentError::SessionNotFound(_) => {
                ErrorCategory::NotFound
            }
            AgentError::ComposerConfig(_) => ErrorCategory::Config,
            AgentError::ComposerUpstream(_) => ErrorCategory::Upstream,
            AgentError::InvalidRequest(_) => ErrorCategory::InvalidRequest,
        }
    }
}

/// API 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&AgentError> for CommandError {
    fn from(error: &AgentError) -> Self {
        let code = match error {
            AgentError::Database(_) => "DB_ERROR",
            AgentError::Pool(_) => "DB_POOL_ERROR",
            AgentError::Serialization(_) => "SERIALIZATION_ERROR",
            AgentError::MalformedRow { .. } => "MALFORMED_ROW",
            AgentError::StorageTask(_) => "STORAGE_TASK_ERROR",
            AgentError::RuleNotFound(_) => "RULE_NOT_FOUND",
            AgentError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AgentError::ComposerConfig(_) => "COMPOSER_CONFIG_ERROR",
            AgentError::ComposerUpstream(_) => "COMPOSER_UPSTREAM_ERROR",
            AgentError::InvalidRequest(_) => "INVALID_REQUEST",
            AgentError::BlockingTask(_) => "BLOCKING_TASK_ERROR",
            AgentError::Io(_) => "IO_ERROR",
        };

        let details = match error {
            AgentError::ComposerUpstream(UpstreamError::Status { body, .. }) => Some(body.clone()),
            _ => None,
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Config | ErrorCategory::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
            ErrorCategory::InvalidRequest => StatusCode::UNPROCESSABLE_ENTITY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(CommandError::from(&self))).into_response()
    }
}

/// 서비스 결과 타입
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            AgentError::SessionNotFound("x".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            AgentError::ComposerConfig("missing".into()).category(),
            ErrorCategory::Config
        );
        assert_eq!(
            AgentError::from(UpstreamError::Malformed("no choices".into())).category(),
            ErrorCategory::Upstream
        );
        assert_eq!(
            AgentError::StorageTask("cancelled".into()).category(),
            ErrorCategory::Storage
        );
    }

    #[test]
    fn test_command_error_carries_upstream_body() {
        let err = AgentError::from(UpstreamError::Status {
            status: 429,
            body: "rate limited".into(),
        });
        let body = CommandError::from(&err);
        assert_eq!(body.code, "COMPOSER_UPSTREAM_ERROR");
        assert_eq!(body.details.as_deref(), Some("rate limited"));
        assert!(body.message.contains("429"));
    }

    #[test]
    fn test_into_response_status() {
        let resp = AgentError::RuleNotFound("abc".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AgentError::ComposerConfig("missing".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = AgentError::from(UpstreamError::Malformed("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = AgentError::InvalidRequest("empty".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
