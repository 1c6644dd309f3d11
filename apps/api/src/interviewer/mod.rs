//! Interviewer collaborators, the external capabilities the chat core
//! depends on: turn generation (`ResponseGenerator`) and answer scoring
//! (`Evaluator`).
//!
//! Backends:
//! - `ScriptedInterviewer`: deterministic, no network. Default when no API key is configured.
//! - `LlmInterviewer`: Claude via `llm_client`.
//!
//! `AppState` holds both as `Arc<dyn Trait>`, chosen at startup.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::LlmError;
use crate::models::{Interview, InterviewType, Language, MessageType};

pub mod llm;
pub mod prompts;
pub mod scripted;

pub use llm::LlmInterviewer;
pub use scripted::ScriptedInterviewer;

pub const DEFAULT_JOB_TITLE: &str = "Software Engineer";

/// Criteria every evaluation is scored against.
pub const DEFAULT_CRITERIA: [&str; 3] = ["technical_competency", "communication", "problem_solving"];

#[derive(Debug, Error)]
pub enum InterviewerError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("collaborator returned invalid output: {0}")]
    InvalidOutput(String),

    #[error("collaborator did not answer within {0:?}")]
    Timeout(Duration),
}

impl InterviewerError {
    /// Stable, non-sensitive label for error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            InterviewerError::Llm(_) => "llm_error",
            InterviewerError::InvalidOutput(_) => "invalid_output",
            InterviewerError::Timeout(_) => "timeout",
        }
    }
}

/// Awaits a collaborator call, failing with `Timeout` once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, InterviewerError>
where
    F: Future<Output = Result<T, InterviewerError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| InterviewerError::Timeout(limit))?
}

// ────────────────────────────────────────────────────────────────────────────
// Typed contexts
// ────────────────────────────────────────────────────────────────────────────

/// Everything a generator may key its output on for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    pub interview_type: InterviewType,
    pub job_title: String,
    pub job_description: String,
    pub language: Language,
    /// Set when the generator must wrap up the interview professionally.
    pub is_closing_turn: bool,
}

impl TurnContext {
    /// Derives the context from the parent interview, applying defaults for
    /// missing job details. `language` is the session's effective language.
    pub fn for_interview(interview: &Interview, language: Language) -> Self {
        Self {
            interview_type: interview.interview_type,
            job_title: job_title(interview),
            job_description: job_description(interview),
            language,
            is_closing_turn: false,
        }
    }

    pub fn closing(mut self) -> Self {
        self.is_closing_turn = true;
        self
    }
}

/// Inputs to an evaluator besides the Q/A pairs themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub job_title: String,
    pub job_description: String,
    pub criteria: Vec<String>,
    pub language: Language,
}

impl EvaluationContext {
    pub fn for_interview(interview: &Interview, language: Language) -> Self {
        Self {
            job_title: job_title(interview),
            job_description: job_description(interview),
            criteria: DEFAULT_CRITERIA.iter().map(|c| c.to_string()).collect(),
            language,
        }
    }
}

fn job_title(interview: &Interview) -> String {
    interview
        .job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_JOB_TITLE)
        .to_string()
}

fn job_description(interview: &Interview) -> String {
    interview
        .job_description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Interview for {} position", interview.candidate_name))
}

/// One prior turn of the conversation, as handed to a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageType,
    pub content: String,
}

/// Raw evaluator output. The score is untrusted until the caller clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: f64,
    pub feedback: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definitions
// ────────────────────────────────────────────────────────────────────────────

/// Produces the interviewer's side of the conversation.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Opening message of a fresh session (empty history, empty input).
    async fn greeting(
        &self,
        session_id: Uuid,
        context: &TurnContext,
    ) -> Result<String, InterviewerError>;

    /// Next interviewer turn. `history` excludes `input`.
    async fn reply(
        &self,
        session_id: Uuid,
        history: &[HistoryTurn],
        input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError>;

    /// Final interviewer turn that wraps the interview up. `history` excludes `input`.
    async fn closing(
        &self,
        session_id: Uuid,
        history: &[HistoryTurn],
        input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError>;
}

/// Scores a set of question/answer pairs.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        questions: &[String],
        answers: &[String],
        context: &EvaluationContext,
    ) -> Result<Assessment, InterviewerError>;
}
