use std::sync::Arc;

use crate::chat::{ChatOrchestrator, MessageCountPolicy};
use crate::config::Config;
use crate::interviewer::{Evaluator, ResponseGenerator};
use crate::store::ConversationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    /// Used directly by `POST /evaluation`; chat sessions go through the orchestrator.
    pub evaluator: Arc<dyn Evaluator>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ResponseGenerator>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        let orchestrator = ChatOrchestrator::new(
            store.clone(),
            generator,
            evaluator.clone(),
            Arc::new(MessageCountPolicy::new(config.max_user_messages)),
            config.ai_request_timeout,
        );
        Self {
            store,
            evaluator,
            orchestrator: Arc::new(orchestrator),
            config,
        }
    }
}
