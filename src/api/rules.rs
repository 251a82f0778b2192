//! Expression Rule Handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{AppState, MessageResponse};
use crate::error::{AgentError, AgentResult};
use crate::models::{ExpressionRule, ExpressionRuleCreate, ExpressionRulePatch, RuleFilter};

pub async fn create_rule(
    State(state): State<AppState>,
    Json(payload): Json<ExpressionRuleCreate>,
) -> AgentResult<(StatusCode, Json<ExpressionRule>)> {
    let rule = state.db.call(move |db| db.create_rule(&payload)).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn list_rules(
    State(state): State<AppState>,
    Query(filter): Query<RuleFilter>,
) -> AgentResult<Json<Vec<ExpressionRule>>> {
    let rules = state.db.call(move |db| db.list_rules(&filter)).await?;
    Ok(Json(rules))
}

pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AgentResult<Json<ExpressionRule>> {
    state
        .db
        .call(move |db| db.get_rule(id))
        .await?
        .map(Json)
        .ok_or_else(|| AgentError::RuleNotFound(id.to_string()))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ExpressionRulePatch>,
) -> AgentResult<Json<ExpressionRule>> {
    state
        .db
        .call(move |db| db.update_rule(id, &patch))
        .await?
        .map(Json)
        .ok_or_else(|| AgentError::RuleNotFound(id.to_string()))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AgentResult<Json<MessageResponse>> {
    if !state.db.call(move |db| db.delete_rule(id)).await? {
        return Err(AgentError::RuleNotFound(id.to_string()));
    }
    Ok(MessageResponse::new("ExpressionRule deleted successfully."))
}
