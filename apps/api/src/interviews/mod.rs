//! Interview records: request validation and list-query parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Interview, InterviewStatus, InterviewType, Language, NewInterview};
use crate::store::{ListInterviewsOptions, SortField, SortOrder, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

pub mod handlers;

#[derive(Debug, Default, Deserialize)]
pub struct CreateInterviewRequest {
    #[serde(default)]
    pub candidate_name: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default, alias = "interview_language")]
    pub language: Option<String>,
    #[serde(default)]
    pub interview_type: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

impl CreateInterviewRequest {
    pub fn validate(self) -> Result<NewInterview, AppError> {
        let candidate_name = self.candidate_name.trim().to_string();
        let questions: Vec<String> = self
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if candidate_name.is_empty() || questions.is_empty() {
            return Err(AppError::Validation(
                "Missing candidate_name or questions".to_string(),
            ));
        }

        let language = match non_blank(self.language) {
            Some(code) => code.parse::<Language>().map_err(|_| {
                AppError::Validation(format!(
                    "Invalid language code. Supported languages: {}",
                    Language::supported_list()
                ))
            })?,
            None => Language::default(),
        };

        let interview_type = match non_blank(self.interview_type) {
            Some(kind) => InterviewType::parse(&kind).ok_or_else(|| {
                AppError::Validation(
                    "Invalid interview type. Supported types: general, technical, behavioral"
                        .to_string(),
                )
            })?,
            None => InterviewType::default(),
        };

        Ok(NewInterview {
            candidate_name,
            questions,
            interview_type,
            job_title: non_blank(self.job_title),
            job_description: non_blank(self.job_description),
            language,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Raw query string of `GET /interviews`. Everything is optional text so a
/// malformed value degrades to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListInterviewsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub page: Option<String>,
    pub candidate_name: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// What a list query asks for.
#[derive(Debug, PartialEq)]
pub enum ListRequest {
    Options(ListInterviewsOptions),
    /// The status filter names no known status, so nothing can match.
    NoMatch,
}

impl ListInterviewsQuery {
    pub fn into_request(self) -> ListRequest {
        let limit = match parse_number(self.limit.as_deref()) {
            Some(0) | None => DEFAULT_PAGE_LIMIT,
            Some(n) => n.min(MAX_PAGE_LIMIT),
        };
        let offset = match parse_number(self.page.as_deref()) {
            Some(page) if page > 0 => (page - 1).saturating_mul(limit),
            _ => parse_number(self.offset.as_deref()).unwrap_or(0),
        };

        let status = match non_blank(self.status) {
            Some(s) => match InterviewStatus::parse(&s.to_ascii_lowercase()) {
                Some(status) => Some(status),
                None => return ListRequest::NoMatch,
            },
            None => None,
        };

        ListRequest::Options(ListInterviewsOptions {
            limit,
            offset,
            candidate_name: non_blank(self.candidate_name),
            status,
            date_from: parse_date(self.date_from.as_deref()),
            date_to: parse_date(self.date_to.as_deref()),
            sort_by: self
                .sort_by
                .as_deref()
                .and_then(SortField::parse)
                .unwrap_or_default(),
            sort_order: self
                .sort_order
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
        })
    }
}

fn parse_number(value: Option<&str>) -> Option<usize> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
}

#[derive(Debug, Serialize)]
pub struct ListInterviewsResponse {
    pub interviews: Vec<Interview>,
    pub total: usize,
}
