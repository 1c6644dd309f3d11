use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::language::Language;

/// Lifecycle marker for an interview record. Interviews are created as
/// `Draft` and are not mutated afterwards in the current API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Draft => "draft",
            InterviewStatus::Active => "active",
            InterviewStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InterviewStatus::Draft),
            "active" => Some(InterviewStatus::Active),
            "completed" => Some(InterviewStatus::Completed),
            _ => None,
        }
    }
}

/// Flavour of interview. Drives the interviewer persona in prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    #[default]
    General,
    Technical,
    Behavioral,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::General => "general",
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(InterviewType::General),
            "technical" => Some(InterviewType::Technical),
            "behavioral" => Some(InterviewType::Behavioral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    pub candidate_name: String,
    pub questions: Vec<String>,
    pub interview_type: InterviewType,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub language: Language,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new interview record.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub candidate_name: String,
    pub questions: Vec<String>,
    pub interview_type: InterviewType,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub language: Language,
}

impl Interview {
    pub fn new(input: NewInterview) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            candidate_name: input.candidate_name,
            questions: input.questions,
            interview_type: input.interview_type,
            job_title: input.job_title,
            job_description: input.job_description,
            language: input.language,
            status: InterviewStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}
