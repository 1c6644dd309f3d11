//! Conversation store: durable or in-memory record of interviews, chat
//! sessions, ordered messages, and evaluations.
//!
//! Two backends implement `ConversationStore`:
//! - `MemoryStore`: process-local, used when no `DATABASE_URL` is configured and in tests.
//! - `PgStore`: PostgreSQL via sqlx.
//!
//! `AppState` holds an `Arc<dyn ConversationStore>`, picked at startup.
//!
//! Messages are append-only per session and always returned in insertion order.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatSession, Evaluation, Interview, InterviewStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chat session {0} not found")]
    SessionNotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Listing options
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" | "candidate_name" => Some(SortField::Name),
            "created_at" | "date" => Some(SortField::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filter, sort and pagination options for listing interviews.
#[derive(Debug, Clone, PartialEq)]
pub struct ListInterviewsOptions {
    pub limit: usize,
    pub offset: usize,
    /// Case-insensitive substring match on the candidate name.
    pub candidate_name: Option<String>,
    pub status: Option<InterviewStatus>,
    /// Inclusive lower bound, whole days.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound, whole days.
    pub date_to: Option<NaiveDate>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListInterviewsOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            candidate_name: None,
            status: None,
            date_from: None,
            date_to: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ListInterviewsOptions {
    /// Start of `date_from` as a UTC instant.
    pub fn created_after(&self) -> Option<DateTime<Utc>> {
        self.date_from
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Start of the day after `date_to`, so the whole `date_to` day is included.
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|d| d.succ_opt())
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// In-process filter predicate shared with the memory backend.
    pub fn matches(&self, interview: &Interview) -> bool {
        if let Some(needle) = &self.candidate_name {
            if !interview
                .candidate_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(status) = self.status {
            if interview.status != status {
                return false;
            }
        }
        if let Some(after) = self.created_after() {
            if interview.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before() {
            if interview.created_at >= before {
                return false;
            }
        }
        true
    }
}

/// One page of interviews plus the total number matching the filters.
#[derive(Debug, Clone)]
pub struct InterviewPage {
    pub interviews: Vec<Interview>,
    pub total: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Persistence seam for the interview domain. Implement this to swap backends
/// without touching the orchestrator or handlers.
///
/// Every mutating call is atomic with respect to the aggregate it touches.
/// Cross-aggregate consistency is the orchestrator's concern.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Short backend name for logs and `/health`.
    fn backend(&self) -> &'static str;

    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError>;
    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError>;
    async fn list_interviews(
        &self,
        options: &ListInterviewsOptions,
    ) -> Result<InterviewPage, StoreError>;

    async fn create_session(&self, session: &ChatSession) -> Result<(), StoreError>;
    async fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>, StoreError>;
    /// Overwrites status and timestamps. Fails with `SessionNotFound` for unknown ids.
    async fn update_session(&self, session: &ChatSession) -> Result<(), StoreError>;

    /// Appends after every message already stored for `message.session_id`.
    /// Fails with `SessionNotFound` if the session does not exist.
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError>;
    /// All messages of a session in insertion order.
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, StoreError>;

    async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<(), StoreError>;
    async fn get_evaluation(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError>;
    async fn find_session_evaluation(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Evaluation>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterviewType, Language, NewInterview};

    fn interview(name: &str) -> Interview {
        Interview::new(NewInterview {
            candidate_name: name.to_string(),
            questions: vec!["Q1".to_string()],
            interview_type: InterviewType::General,
            job_title: None,
            job_description: None,
            language: Language::En,
        })
    }

    #[test]
    fn test_candidate_filter_is_case_insensitive() {
        let opts = ListInterviewsOptions {
            candidate_name: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(opts.matches(&interview("Bob Alice")));
        assert!(!opts.matches(&interview("Charlie Brown")));
    }

    #[test]
    fn test_date_to_includes_whole_day() {
        let mut iv = interview("Alice");
        iv.created_at = NaiveDate::from_ymd_opt(2024, 5, 3)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
            .and_utc();
        let opts = ListInterviewsOptions {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 3),
            date_to: NaiveDate::from_ymd_opt(2024, 5, 3),
            ..Default::default()
        };
        assert!(opts.matches(&iv));

        let before = ListInterviewsOptions {
            date_to: NaiveDate::from_ymd_opt(2024, 5, 2),
            ..Default::default()
        };
        assert!(!before.matches(&iv));
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortField::parse("name"), Some(SortField::Name));
        assert_eq!(SortField::parse("created_at"), Some(SortField::CreatedAt));
        assert_eq!(SortField::parse("score"), None);
        assert_eq!(SortOrder::parse("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("sideways"), None);
    }
}
