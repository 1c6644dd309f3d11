use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::interviews::{
    CreateInterviewRequest, ListInterviewsQuery, ListInterviewsResponse, ListRequest,
};
use crate::models::Interview;
use crate::state::AppState;

/// POST /interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<Interview>), AppError> {
    let interview = Interview::new(req.validate()?);
    state.store.create_interview(&interview).await?;
    info!(interview_id = %interview.id, language = interview.language.as_str(), "interview created");
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(query): Query<ListInterviewsQuery>,
) -> Result<Json<ListInterviewsResponse>, AppError> {
    let options = match query.into_request() {
        ListRequest::Options(options) => options,
        ListRequest::NoMatch => {
            return Ok(Json(ListInterviewsResponse {
                interviews: Vec::new(),
                total: 0,
            }))
        }
    };
    let page = state.store.list_interviews(&options).await?;
    Ok(Json(ListInterviewsResponse {
        interviews: page.interviews,
        total: page.total,
    }))
}

/// GET /interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Interview>, AppError> {
    let interview = state
        .store
        .get_interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))?;
    Ok(Json(interview))
}
