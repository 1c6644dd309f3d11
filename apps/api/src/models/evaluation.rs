use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Synthetic answer key for the zero-based `index`-th answer.
pub fn answer_key(index: usize) -> String {
    format!("question_{index}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub interview_id: Uuid,
    /// Chat session this evaluation was derived from; `None` for direct submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub answers: BTreeMap<String, String>,
    pub score: f64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(
        interview_id: Uuid,
        session_id: Option<Uuid>,
        answers: BTreeMap<String, String>,
        score: f64,
        feedback: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            interview_id,
            session_id,
            answers,
            score,
            feedback,
            created_at: now,
            updated_at: now,
        }
    }
}
