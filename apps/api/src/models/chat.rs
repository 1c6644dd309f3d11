use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::language::Language;

/// Status of a chat session. Transitions are one-way: `Active` may move to
/// `Completed` or `Abandoned`, and both of those are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            "abandoned" => Some(SessionStatus::Abandoned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Active, SessionStatus::Completed)
                | (SessionStatus::Active, SessionStatus::Abandoned)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub language: Language,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(interview_id: Uuid, language: Language) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            interview_id,
            language,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            ended_at: None,
        }
    }

    /// Moves an active session to `Completed` and stamps the end time.
    /// Returns `false` (and changes nothing) if the session is already terminal.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(SessionStatus::Completed) {
            return false;
        }
        self.status = SessionStatus::Completed;
        self.updated_at = at;
        self.ended_at = Some(at);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Ai,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageType::User),
            "ai" => Some(MessageType::Ai),
            _ => None,
        }
    }
}

/// A single turn in a chat session. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    /// Logical conversation time assigned by the orchestrator.
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: Uuid, message_type: MessageType, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            message_type,
            content: content.into(),
            timestamp: now,
            created_at: now,
        }
    }

    pub fn user(session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageType::User, content)
    }

    pub fn ai(session_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageType::Ai, content)
    }
}
