pub mod health;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::chat::handlers as chat;
use crate::config::Config;
use crate::evaluation::handlers as evaluation;
use crate::interviews::handlers as interviews;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interviews
        .route(
            "/interviews",
            post(interviews::handle_create_interview).get(interviews::handle_list_interviews),
        )
        .route("/interviews/:id", get(interviews::handle_get_interview))
        // Chat sessions
        .route(
            "/interviews/:id/chat/start",
            post(chat::handle_start_session),
        )
        .route("/chat/:session_id", get(chat::handle_get_session))
        .route("/chat/:session_id/message", post(chat::handle_send_message))
        .route("/chat/:session_id/end", post(chat::handle_end_session))
        // Evaluations
        .route("/evaluation", post(evaluation::handle_submit_evaluation))
        .route("/evaluation/:id", get(evaluation::handle_get_evaluation))
        .with_state(state)
}

/// CORS policy from config. No configured origins means permissive.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
