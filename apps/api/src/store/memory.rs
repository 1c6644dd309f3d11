//! In-memory `ConversationStore`. Used when no database is configured and in tests.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatSession, Evaluation, Interview};
use crate::store::{
    ConversationStore, InterviewPage, ListInterviewsOptions, SortField, SortOrder, StoreError,
};

#[derive(Default)]
struct Inner {
    interviews: HashMap<Uuid, Interview>,
    sessions: HashMap<Uuid, ChatSession>,
    /// Per-session message log; `Vec` order is the canonical conversation order.
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    evaluations: HashMap<Uuid, Evaluation>,
    /// session_id → evaluation_id
    session_evaluations: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &Interview, b: &Interview, field: SortField) -> Ordering {
    match field {
        SortField::Name => a
            .candidate_name
            .to_lowercase()
            .cmp(&b.candidate_name.to_lowercase())
            .then(a.created_at.cmp(&b.created_at)),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.interviews.insert(interview.id, interview.clone());
        Ok(())
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
        Ok(self.inner.read().await.interviews.get(&id).cloned())
    }

    async fn list_interviews(
        &self,
        options: &ListInterviewsOptions,
    ) -> Result<InterviewPage, StoreError> {
        let inner = self.inner.read().await;
        let mut matched: Vec<&Interview> = inner
            .interviews
            .values()
            .filter(|iv| options.matches(iv))
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare(a, b, options.sort_by);
            match options.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matched.len();
        let interviews = matched
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .cloned()
            .collect();

        Ok(InterviewPage { interviews, total })
    }

    async fn create_session(&self, session: &ChatSession) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id, session.clone());
        inner.messages.entry(session.id).or_default();
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>, StoreError> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }

    async fn update_session(&self, session: &ChatSession) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .sessions
            .get_mut(&session.id)
            .ok_or(StoreError::SessionNotFound(session.id))?;
        *stored = session.clone();
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let log = inner
            .messages
            .get_mut(&message.session_id)
            .ok_or(StoreError::SessionNotFound(message.session_id))?;
        log.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
        self.inner
            .read()
            .await
            .messages
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::SessionNotFound(session_id))
    }

    async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(session_id) = evaluation.session_id {
            inner.session_evaluations.insert(session_id, evaluation.id);
        }
        inner.evaluations.insert(evaluation.id, evaluation.clone());
        Ok(())
    }

    async fn get_evaluation(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError> {
        Ok(self.inner.read().await.evaluations.get(&id).cloned())
    }

    async fn find_session_evaluation(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Evaluation>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .session_evaluations
            .get(&session_id)
            .and_then(|id| inner.evaluations.get(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterviewType, Language, NewInterview};
    use chrono::Duration;

    fn interview(name: &str, minutes_ago: i64) -> Interview {
        let mut iv = Interview::new(NewInterview {
            candidate_name: name.to_string(),
            questions: vec!["Q".to_string()],
            interview_type: InterviewType::General,
            job_title: None,
            job_description: None,
            language: Language::En,
        });
        iv.created_at -= Duration::minutes(minutes_ago);
        iv
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let store = MemoryStore::new();
        let session = ChatSession::new(Uuid::new_v4(), Language::En);
        store.create_session(&session).await.unwrap();

        // Later logical timestamp appended first must still come first.
        let mut first = ChatMessage::ai(session.id, "first");
        first.timestamp += Duration::hours(1);
        let second = ChatMessage::user(session.id, "second");
        store.append_message(&first).await.unwrap();
        store.append_message(&second).await.unwrap();

        let messages = store.list_messages(session.id).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_fails() {
        let store = MemoryStore::new();
        let err = store
            .append_message(&ChatMessage::user(Uuid::new_v4(), "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_session_fails() {
        let store = MemoryStore::new();
        let session = ChatSession::new(Uuid::new_v4(), Language::En);
        let err = store.update_session(&session).await.unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(id) if id == session.id));
    }

    #[tokio::test]
    async fn test_list_paginates_after_filtering() {
        let store = MemoryStore::new();
        for (i, name) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            store
                .create_interview(&interview(name, i as i64))
                .await
                .unwrap();
        }

        let page = store
            .list_interviews(&ListInterviewsOptions {
                limit: 2,
                offset: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        // Newest first: A(0m) B(1m) C(2m) D(3m) E(4m)
        let names: Vec<_> = page
            .interviews
            .iter()
            .map(|iv| iv.candidate_name.as_str())
            .collect();
        assert_eq!(names, vec!["C", "D"]);
    }

    #[tokio::test]
    async fn test_list_sorts_by_name() {
        let store = MemoryStore::new();
        for name in ["Charlie Brown", "alice Johnson", "Bob Smith"] {
            store.create_interview(&interview(name, 0)).await.unwrap();
        }
        let page = store
            .list_interviews(&ListInterviewsOptions {
                sort_by: SortField::Name,
                sort_order: SortOrder::Asc,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = page
            .interviews
            .iter()
            .map(|iv| iv.candidate_name.as_str())
            .collect();
        assert_eq!(names, vec!["alice Johnson", "Bob Smith", "Charlie Brown"]);
    }

    #[tokio::test]
    async fn test_session_evaluation_lookup() {
        let store = MemoryStore::new();
        let session_id = Uuid::new_v4();
        let evaluation = Evaluation::new(
            Uuid::new_v4(),
            Some(session_id),
            Default::default(),
            0.5,
            "ok".to_string(),
        );
        store.create_evaluation(&evaluation).await.unwrap();

        let found = store.find_session_evaluation(session_id).await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(evaluation.id));
        assert!(store
            .find_session_evaluation(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
