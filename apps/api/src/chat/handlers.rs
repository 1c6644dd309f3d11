use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::chat::{Exchange, SessionView};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::Evaluation;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

/// POST /interviews/:id/chat/start
///
/// The body is optional; a missing or unreadable body starts the session in
/// the interview's language.
pub async fn handle_start_session(
    State(state): State<AppState>,
    AppPath(interview_id): AppPath<Uuid>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let view = state
        .orchestrator
        .start_session(interview_id, request.language.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /chat/:session_id/message
pub async fn handle_send_message(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<Uuid>,
    AppJson(req): AppJson<SendMessageRequest>,
) -> Result<Json<Exchange>, AppError> {
    let exchange = state
        .orchestrator
        .send_message(session_id, &req.message)
        .await?;
    Ok(Json(exchange))
}

/// GET /chat/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.orchestrator.get_session(session_id).await?))
}

/// POST /chat/:session_id/end
pub async fn handle_end_session(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<Uuid>,
) -> Result<Json<Evaluation>, AppError> {
    Ok(Json(state.orchestrator.end_session(session_id).await?))
}
