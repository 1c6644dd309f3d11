//! Chat session state machine: start, message exchange, end + evaluation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::policy::EndOfInterviewPolicy;
use crate::chat::transcript::{history_excluding, reconstruct_qa, user_message_count};
use crate::errors::AppError;
use crate::evaluation::clamp_score;
use crate::interviewer::{
    bounded, EvaluationContext, Evaluator, ResponseGenerator, TurnContext,
};
use crate::models::{ChatMessage, ChatSession, Evaluation, Interview, Language, SessionStatus};
use crate::store::ConversationStore;

/// A session together with its full message log, serialized flat:
/// the session's fields plus `messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

/// Result of one message exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub message: ChatMessage,
    pub ai_response: ChatMessage,
    pub session_status: SessionStatus,
}

type SessionLock = Arc<tokio::sync::Mutex<()>>;

/// Map size past which entries left behind by cancelled waiters are swept.
const STALE_LOCK_SWEEP_THRESHOLD: usize = 1024;

/// One async mutex per session id. An entry lives only while some task
/// holds or waits on it; the last guard to drop removes it.
#[derive(Default)]
struct SessionLocks {
    inner: Mutex<HashMap<Uuid, SessionLock>>,
}

impl SessionLocks {
    async fn lock(&self, session_id: Uuid) -> SessionGuard<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() >= STALE_LOCK_SWEEP_THRESHOLD {
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            map.entry(session_id).or_default().clone()
        };
        SessionGuard {
            locks: self,
            session_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: Uuid,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self
            .locks
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map's own reference left: nobody holds or awaits this lock.
        if map
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.session_id);
        }
    }
}

pub struct ChatOrchestrator {
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn ResponseGenerator>,
    evaluator: Arc<dyn Evaluator>,
    policy: Arc<dyn EndOfInterviewPolicy>,
    timeout: Duration,
    locks: SessionLocks,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generator: Arc<dyn ResponseGenerator>,
        evaluator: Arc<dyn Evaluator>,
        policy: Arc<dyn EndOfInterviewPolicy>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
            policy,
            timeout,
            locks: SessionLocks::default(),
        }
    }

    /// Opens a session on `interview_id` and records the interviewer's greeting.
    ///
    /// An unsupported `language` override falls back to the interview's language.
    /// The session is only persisted once the greeting exists, so a failed
    /// greeting leaves nothing behind.
    pub async fn start_session(
        &self,
        interview_id: Uuid,
        language: Option<&str>,
    ) -> Result<SessionView, AppError> {
        let interview = self.interview(interview_id).await?;
        let language = Language::resolve(language, interview.language);

        let session = ChatSession::new(interview.id, language);
        let context = TurnContext::for_interview(&interview, language);
        let greeting = bounded(self.timeout, self.generator.greeting(session.id, &context)).await?;

        self.store.create_session(&session).await?;
        let greeting = ChatMessage::ai(session.id, greeting);
        self.store.append_message(&greeting).await?;

        info!(
            session_id = %session.id,
            interview_id = %interview.id,
            language = language.as_str(),
            "chat session started"
        );
        Ok(SessionView {
            session,
            messages: vec![greeting],
        })
    }

    /// Records the candidate's message and the interviewer's answer to it.
    ///
    /// The user message is persisted before the generator runs and survives
    /// a generator failure.
    pub async fn send_message(&self, session_id: Uuid, text: &str) -> Result<Exchange, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }

        let _guard = self.locks.lock(session_id).await;

        let mut session = self.session(session_id).await?;
        if session.status.is_terminal() {
            return Err(AppError::InvalidState(
                "Chat session is not active".to_string(),
            ));
        }
        let interview = self.interview(session.interview_id).await?;

        let user_message = ChatMessage::user(session.id, text);
        self.store.append_message(&user_message).await?;

        let messages = self.store.list_messages(session.id).await?;
        let ending = self.policy.should_end(user_message_count(&messages));
        let history = history_excluding(&messages, user_message.id);
        let context = TurnContext::for_interview(&interview, session.language);

        let reply = if ending {
            let context = context.closing();
            bounded(
                self.timeout,
                self.generator
                    .closing(session.id, &history, &user_message.content, &context),
            )
            .await?
        } else {
            bounded(
                self.timeout,
                self.generator
                    .reply(session.id, &history, &user_message.content, &context),
            )
            .await?
        };

        let ai_response = ChatMessage::ai(session.id, reply);
        self.store.append_message(&ai_response).await?;

        if ending && session.complete(Utc::now()) {
            match self.store.update_session(&session).await {
                Ok(()) => info!(session_id = %session.id, "interview reached its end"),
                Err(e) => warn!(
                    session_id = %session.id,
                    error = %e,
                    "closing message stored but session status update failed"
                ),
            }
        }

        Ok(Exchange {
            message: user_message,
            ai_response,
            session_status: session.status,
        })
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let session = self.session(session_id).await?;
        let messages = self.store.list_messages(session_id).await?;
        Ok(SessionView { session, messages })
    }

    /// Completes the session and evaluates the transcript.
    ///
    /// Idempotent: once a session has an evaluation, that evaluation is
    /// returned unchanged. An evaluator failure persists nothing.
    pub async fn end_session(&self, session_id: Uuid) -> Result<Evaluation, AppError> {
        let _guard = self.locks.lock(session_id).await;

        let mut session = self.session(session_id).await?;
        if let Some(existing) = self.store.find_session_evaluation(session.id).await? {
            return Ok(existing);
        }
        if session.status == SessionStatus::Abandoned {
            return Err(AppError::InvalidState(
                "Chat session was abandoned".to_string(),
            ));
        }
        let interview = self.interview(session.interview_id).await?;

        if session.complete(Utc::now()) {
            self.store.update_session(&session).await?;
        }

        let messages = self.store.list_messages(session.id).await?;
        let qa = reconstruct_qa(&messages);
        let context = EvaluationContext::for_interview(&interview, session.language);
        let assessment = bounded(
            self.timeout,
            self.evaluator.evaluate(&qa.questions, &qa.answers, &context),
        )
        .await?;

        let evaluation = Evaluation::new(
            interview.id,
            Some(session.id),
            qa.answer_map(),
            clamp_score(assessment.score),
            assessment.feedback,
        );
        self.store.create_evaluation(&evaluation).await?;

        info!(
            session_id = %session.id,
            evaluation_id = %evaluation.id,
            score = evaluation.score,
            "chat session evaluated"
        );
        Ok(evaluation)
    }

    async fn session(&self, session_id: Uuid) -> Result<ChatSession, AppError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))
    }

    async fn interview(&self, interview_id: Uuid) -> Result<Interview, AppError> {
        self.store
            .get_interview(interview_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::policy::MessageCountPolicy;
    use crate::interviewer::{
        Assessment, HistoryTurn, InterviewerError, ScriptedInterviewer,
    };
    use crate::models::{InterviewType, MessageType, NewInterview};
    use crate::store::{InterviewPage, ListInterviewsOptions, MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingGenerator;

    #[async_trait]
    impl ResponseGenerator for FailingGenerator {
        async fn greeting(&self, _: Uuid, _: &TurnContext) -> Result<String, InterviewerError> {
            Ok("Welcome".to_string())
        }

        async fn reply(
            &self,
            _: Uuid,
            _: &[HistoryTurn],
            _: &str,
            _: &TurnContext,
        ) -> Result<String, InterviewerError> {
            Err(InterviewerError::Timeout(Duration::from_secs(5)))
        }

        async fn closing(
            &self,
            _: Uuid,
            _: &[HistoryTurn],
            _: &str,
            _: &TurnContext,
        ) -> Result<String, InterviewerError> {
            Err(InterviewerError::Timeout(Duration::from_secs(5)))
        }
    }

    /// Records what it was asked and echoes the inputs back.
    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<(usize, String, bool)>>,
    }

    #[async_trait]
    impl ResponseGenerator for RecordingGenerator {
        async fn greeting(&self, _: Uuid, _: &TurnContext) -> Result<String, InterviewerError> {
            Ok("Welcome".to_string())
        }

        async fn reply(
            &self,
            _: Uuid,
            history: &[HistoryTurn],
            input: &str,
            context: &TurnContext,
        ) -> Result<String, InterviewerError> {
            self.seen.lock().unwrap().push((
                history.len(),
                input.to_string(),
                context.is_closing_turn,
            ));
            Ok("Next question".to_string())
        }

        async fn closing(
            &self,
            _: Uuid,
            history: &[HistoryTurn],
            input: &str,
            context: &TurnContext,
        ) -> Result<String, InterviewerError> {
            self.seen.lock().unwrap().push((
                history.len(),
                input.to_string(),
                context.is_closing_turn,
            ));
            Ok("Goodbye".to_string())
        }
    }

    struct FixedEvaluator {
        score: f64,
        calls: AtomicUsize,
    }

    impl FixedEvaluator {
        fn new(score: f64) -> Self {
            Self {
                score,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Evaluator for FixedEvaluator {
        async fn evaluate(
            &self,
            _: &[String],
            _: &[String],
            _: &EvaluationContext,
        ) -> Result<Assessment, InterviewerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Assessment {
                score: self.score,
                feedback: "Fixed feedback".to_string(),
            })
        }
    }

    struct FailingEvaluator;

    #[async_trait]
    impl Evaluator for FailingEvaluator {
        async fn evaluate(
            &self,
            _: &[String],
            _: &[String],
            _: &EvaluationContext,
        ) -> Result<Assessment, InterviewerError> {
            Err(InterviewerError::InvalidOutput("not JSON".to_string()))
        }
    }

    /// Memory store whose session status updates always fail.
    #[derive(Default)]
    struct StuckStatusStore(MemoryStore);

    #[async_trait]
    impl ConversationStore for StuckStatusStore {
        fn backend(&self) -> &'static str {
            "stuck-status"
        }

        async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError> {
            self.0.create_interview(interview).await
        }

        async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
            self.0.get_interview(id).await
        }

        async fn list_interviews(
            &self,
            options: &ListInterviewsOptions,
        ) -> Result<InterviewPage, StoreError> {
            self.0.list_interviews(options).await
        }

        async fn create_session(&self, session: &ChatSession) -> Result<(), StoreError> {
            self.0.create_session(session).await
        }

        async fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>, StoreError> {
            self.0.get_session(id).await
        }

        async fn update_session(&self, _: &ChatSession) -> Result<(), StoreError> {
            Err(StoreError::Corrupt("status column unwritable".to_string()))
        }

        async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
            self.0.append_message(message).await
        }

        async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
            self.0.list_messages(session_id).await
        }

        async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
            self.0.create_evaluation(evaluation).await
        }

        async fn get_evaluation(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError> {
            self.0.get_evaluation(id).await
        }

        async fn find_session_evaluation(
            &self,
            session_id: Uuid,
        ) -> Result<Option<Evaluation>, StoreError> {
            self.0.find_session_evaluation(session_id).await
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        orchestrator: ChatOrchestrator,
        interview: Interview,
    }

    async fn harness(
        generator: Arc<dyn ResponseGenerator>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let interview = Interview::new(NewInterview {
            candidate_name: "Linus".to_string(),
            questions: vec!["Tell me about yourself.".to_string()],
            interview_type: InterviewType::Technical,
            job_title: Some("Backend Engineer".to_string()),
            job_description: None,
            language: Language::En,
        });
        store.create_interview(&interview).await.unwrap();

        let orchestrator = ChatOrchestrator::new(
            store.clone(),
            generator,
            evaluator,
            Arc::new(MessageCountPolicy::default()),
            Duration::from_secs(5),
        );
        Harness {
            store,
            orchestrator,
            interview,
        }
    }

    async fn scripted() -> Harness {
        let interviewer = Arc::new(ScriptedInterviewer::default());
        harness(interviewer.clone(), interviewer).await
    }

    #[tokio::test]
    async fn test_start_session_yields_single_greeting() {
        let h = scripted().await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();

        assert_eq!(view.session.status, SessionStatus::Active);
        assert_eq!(view.session.interview_id, h.interview.id);
        assert_eq!(view.session.language, Language::En);
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].message_type, MessageType::Ai);

        let stored = h.orchestrator.get_session(view.session.id).await.unwrap();
        assert_eq!(stored.messages, view.messages);
    }

    #[tokio::test]
    async fn test_start_session_language_override() {
        let h = scripted().await;
        let view = h
            .orchestrator
            .start_session(h.interview.id, Some("zh-TW"))
            .await
            .unwrap();
        assert_eq!(view.session.language, Language::ZhTw);

        let view = h
            .orchestrator
            .start_session(h.interview.id, Some("klingon"))
            .await
            .unwrap();
        assert_eq!(view.session.language, Language::En);
    }

    #[tokio::test]
    async fn test_start_session_unknown_interview() {
        let h = scripted().await;
        let err = h
            .orchestrator
            .start_session(Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_send_message_appends_user_then_ai() {
        let h = scripted().await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();

        let exchange = h
            .orchestrator
            .send_message(view.session.id, "I'm a developer.")
            .await
            .unwrap();
        assert_eq!(exchange.session_status, SessionStatus::Active);
        assert_eq!(exchange.message.content, "I'm a developer.");
        assert_eq!(exchange.ai_response.message_type, MessageType::Ai);

        let messages = h.store.list_messages(view.session.id).await.unwrap();
        let types: Vec<_> = messages.iter().map(|m| m.message_type).collect();
        assert_eq!(types, vec![MessageType::Ai, MessageType::User, MessageType::Ai]);
        assert_eq!(messages[1].id, exchange.message.id);
        assert_eq!(messages[2].id, exchange.ai_response.id);
    }

    #[tokio::test]
    async fn test_send_message_passes_history_without_current_input() {
        let generator = Arc::new(RecordingGenerator::default());
        let h = harness(generator.clone(), Arc::new(FixedEvaluator::new(0.5))).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();

        h.orchestrator.send_message(view.session.id, "first").await.unwrap();
        h.orchestrator.send_message(view.session.id, "second").await.unwrap();

        let seen = generator.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (1, "first".to_string(), false),
                (3, "second".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_message_rejects_empty_text() {
        let h = scripted().await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        let err = h
            .orchestrator
            .send_message(view.session.id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.store.list_messages(view.session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_unknown_session() {
        let h = scripted().await;
        let err = h
            .orchestrator
            .send_message(Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_generator_failure_keeps_user_message() {
        let h = harness(Arc::new(FailingGenerator), Arc::new(FixedEvaluator::new(0.5))).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();

        let err = h
            .orchestrator
            .send_message(view.session.id, "I'm a developer.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let messages = h.store.list_messages(view.session.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].message_type, MessageType::User);
        assert_eq!(messages[1].content, "I'm a developer.");
    }

    #[tokio::test]
    async fn test_eighth_message_completes_session() {
        let generator = Arc::new(RecordingGenerator::default());
        let h = harness(generator.clone(), Arc::new(FixedEvaluator::new(0.5))).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        let session_id = view.session.id;

        let first = h
            .orchestrator
            .send_message(session_id, "I'm a developer.")
            .await
            .unwrap();
        assert_eq!(first.session_status, SessionStatus::Active);
        assert_eq!(h.store.list_messages(session_id).await.unwrap().len(), 3);

        for i in 2..8 {
            let exchange = h
                .orchestrator
                .send_message(session_id, &format!("answer {i}"))
                .await
                .unwrap();
            assert_eq!(exchange.session_status, SessionStatus::Active);
        }

        let last = h
            .orchestrator
            .send_message(session_id, "answer 8")
            .await
            .unwrap();
        assert_eq!(last.session_status, SessionStatus::Completed);
        assert_eq!(last.ai_response.content, "Goodbye");
        assert!(generator.seen.lock().unwrap().last().unwrap().2);

        let stored = h.orchestrator.get_session(session_id).await.unwrap();
        assert_eq!(stored.session.status, SessionStatus::Completed);
        assert!(stored.session.ended_at.is_some());
        assert_eq!(stored.messages.len(), 17);

        let err = h
            .orchestrator
            .send_message(session_id, "one more")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_end_session_keys_answers_per_user_message() {
        let h = scripted().await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        for i in 0..3 {
            h.orchestrator
                .send_message(view.session.id, &format!("answer {i}"))
                .await
                .unwrap();
        }

        let evaluation = h.orchestrator.end_session(view.session.id).await.unwrap();
        assert_eq!(evaluation.interview_id, h.interview.id);
        assert_eq!(evaluation.session_id, Some(view.session.id));
        assert_eq!(
            evaluation.answers.keys().cloned().collect::<Vec<_>>(),
            vec!["question_0", "question_1", "question_2"]
        );
        assert_eq!(evaluation.answers["question_2"], "answer 2");
        assert_eq!(evaluation.score, 0.8);

        let session = h.store.get_session(view.session.id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_end_session_twice_returns_same_evaluation() {
        let evaluator = Arc::new(FixedEvaluator::new(0.6));
        let h = harness(Arc::new(ScriptedInterviewer::default()), evaluator.clone()).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        h.orchestrator
            .send_message(view.session.id, "hello")
            .await
            .unwrap();

        let first = h.orchestrator.end_session(view.session.id).await.unwrap();
        let second = h.orchestrator.end_session(view.session.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_end_session_clamps_scores() {
        for (raw, expected) in [(1.5, 1.0), (-0.2, 0.0)] {
            let h = harness(
                Arc::new(ScriptedInterviewer::default()),
                Arc::new(FixedEvaluator::new(raw)),
            )
            .await;
            let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
            let evaluation = h.orchestrator.end_session(view.session.id).await.unwrap();
            assert_eq!(evaluation.score, expected);
        }
    }

    #[tokio::test]
    async fn test_end_session_evaluator_failure_persists_nothing() {
        let h = harness(Arc::new(ScriptedInterviewer::default()), Arc::new(FailingEvaluator)).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();

        let err = h.orchestrator.end_session(view.session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(h
            .store
            .find_session_evaluation(view.session.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_end_session_after_auto_completion_evaluates_once() {
        let evaluator = Arc::new(FixedEvaluator::new(0.7));
        let h = harness(Arc::new(ScriptedInterviewer::default()), evaluator.clone()).await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        for i in 0..8 {
            h.orchestrator
                .send_message(view.session.id, &format!("answer {i}"))
                .await
                .unwrap();
        }

        let evaluation = h.orchestrator.end_session(view.session.id).await.unwrap();
        assert_eq!(evaluation.answers.len(), 8);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closing_message_survives_status_update_failure() {
        let store = Arc::new(StuckStatusStore::default());
        let interview = Interview::new(NewInterview {
            candidate_name: "Barbara".to_string(),
            questions: vec!["Why this team?".to_string()],
            interview_type: InterviewType::General,
            job_title: None,
            job_description: None,
            language: Language::En,
        });
        store.create_interview(&interview).await.unwrap();
        let interviewer = Arc::new(ScriptedInterviewer::default());
        let orchestrator = ChatOrchestrator::new(
            store.clone(),
            interviewer.clone(),
            interviewer,
            Arc::new(MessageCountPolicy::default()),
            Duration::from_secs(5),
        );

        let view = orchestrator.start_session(interview.id, None).await.unwrap();
        let session_id = view.session.id;
        for i in 1..8 {
            orchestrator
                .send_message(session_id, &format!("answer {i}"))
                .await
                .unwrap();
        }
        let before = store.list_messages(session_id).await.unwrap().len();

        let last = orchestrator
            .send_message(session_id, "answer 8")
            .await
            .unwrap();
        assert_eq!(last.session_status, SessionStatus::Completed);

        let messages = store.list_messages(session_id).await.unwrap();
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages[messages.len() - 2].id, last.message.id);
        assert_eq!(messages[messages.len() - 1].id, last.ai_response.id);
        assert_eq!(messages[messages.len() - 1].message_type, MessageType::Ai);

        let stored = store.get_session(session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_end_session_unknown_session() {
        let h = scripted().await;
        let err = h.orchestrator.end_session(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_sends_keep_alternation() {
        let h = scripted().await;
        let view = h.orchestrator.start_session(h.interview.id, None).await.unwrap();
        let orchestrator = Arc::new(h.orchestrator);

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let orchestrator = orchestrator.clone();
                let session_id = view.session.id;
                tokio::spawn(async move {
                    orchestrator
                        .send_message(session_id, &format!("answer {i}"))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let messages = h.store.list_messages(view.session.id).await.unwrap();
        assert_eq!(messages.len(), 9);
        for (i, message) in messages.iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageType::Ai
            } else {
                MessageType::User
            };
            assert_eq!(message.message_type, expected);
        }
    }

    #[tokio::test]
    async fn test_session_locks_serialize_and_prune() {
        let locks = SessionLocks::default();
        let id = Uuid::new_v4();

        let guard = locks.lock(id).await;
        assert_eq!(locks.len(), 1);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), locks.lock(id))
                .await
                .is_err()
        );

        let other = locks.lock(Uuid::new_v4()).await;
        assert_eq!(locks.len(), 2);

        drop(guard);
        assert_eq!(locks.len(), 1);
        drop(other);
        assert_eq!(locks.len(), 0);

        let _again = locks.lock(id).await;
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_session_locks_sweep_abandoned_entries() {
        let locks = SessionLocks::default();
        {
            let mut map = locks.inner.lock().unwrap();
            for _ in 0..STALE_LOCK_SWEEP_THRESHOLD {
                map.insert(Uuid::new_v4(), SessionLock::default());
            }
        }

        let _guard = locks.lock(Uuid::new_v4()).await;
        assert_eq!(locks.len(), 1);
    }
}
