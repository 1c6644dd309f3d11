use std::collections::BTreeMap;

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::evaluation::submit_answers;
use crate::models::Evaluation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitEvaluationRequest {
    pub interview_id: Option<Uuid>,
    #[serde(default)]
    pub answers: Option<BTreeMap<String, String>>,
}

/// POST /evaluation
pub async fn handle_submit_evaluation(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubmitEvaluationRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let interview_id = req
        .interview_id
        .ok_or_else(|| AppError::Validation("Missing interview_id or answers".to_string()))?;
    let answers = req
        .answers
        .ok_or_else(|| AppError::Validation("Missing interview_id or answers".to_string()))?;

    let evaluation = submit_answers(
        state.store.as_ref(),
        state.evaluator.as_ref(),
        state.config.ai_request_timeout,
        interview_id,
        answers,
    )
    .await?;
    Ok(Json(evaluation))
}

/// GET /evaluation/:id
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Evaluation>, AppError> {
    let evaluation = state
        .store
        .get_evaluation(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Evaluation not found".to_string()))?;
    Ok(Json(evaluation))
}
