//! PostgreSQL-backed `ConversationStore`.
//!
//! Message order is the `chat_messages.seq` BIGSERIAL, never the logical timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{
    ChatMessage, ChatSession, Evaluation, Interview, InterviewStatus, InterviewType, Language,
    MessageType, SessionStatus,
};
use crate::store::{
    ConversationStore, InterviewPage, ListInterviewsOptions, SortField, SortOrder, StoreError,
};

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct InterviewRow {
    id: Uuid,
    candidate_name: String,
    questions: Json<Vec<String>>,
    interview_type: String,
    job_title: Option<String>,
    job_description: Option<String>,
    language: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    interview_id: Uuid,
    language: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    session_id: Uuid,
    message_type: String,
    content: String,
    timestamp: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct EvaluationRow {
    id: Uuid,
    interview_id: Uuid,
    session_id: Option<Uuid>,
    answers: Json<BTreeMap<String, String>>,
    score: f64,
    feedback: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(table: &str, id: Uuid, field: &str, value: &str) -> StoreError {
    StoreError::Corrupt(format!("{table} {id}: invalid {field} '{value}'"))
}

impl TryFrom<InterviewRow> for Interview {
    type Error = StoreError;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        Ok(Interview {
            id: row.id,
            candidate_name: row.candidate_name,
            questions: row.questions.0,
            interview_type: InterviewType::parse(&row.interview_type).ok_or_else(|| {
                corrupt("interview", row.id, "interview_type", &row.interview_type)
            })?,
            job_title: row.job_title,
            job_description: row.job_description,
            language: row
                .language
                .parse()
                .map_err(|_| corrupt("interview", row.id, "language", &row.language))?,
            status: InterviewStatus::parse(&row.status)
                .ok_or_else(|| corrupt("interview", row.id, "status", &row.status))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<SessionRow> for ChatSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let language: Language = row
            .language
            .parse()
            .map_err(|_| corrupt("chat_session", row.id, "language", &row.language))?;
        Ok(ChatSession {
            id: row.id,
            interview_id: row.interview_id,
            language,
            status: SessionStatus::parse(&row.status)
                .ok_or_else(|| corrupt("chat_session", row.id, "status", &row.status))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ended_at: row.ended_at,
        })
    }
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            id: row.id,
            session_id: row.session_id,
            message_type: MessageType::parse(&row.message_type)
                .ok_or_else(|| corrupt("chat_message", row.id, "type", &row.message_type))?,
            content: row.content,
            timestamp: row.timestamp,
            created_at: row.created_at,
        })
    }
}

impl From<EvaluationRow> for Evaluation {
    fn from(row: EvaluationRow) -> Self {
        Evaluation {
            id: row.id,
            interview_id: row.interview_id,
            session_id: row.session_id,
            answers: row.answers.0,
            score: row.score,
            feedback: row.feedback,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, options: &ListInterviewsOptions) {
    builder.push(" WHERE TRUE");
    if let Some(name) = &options.candidate_name {
        builder
            .push(" AND position(lower(")
            .push_bind(name.clone())
            .push(") in lower(candidate_name)) > 0");
    }
    if let Some(status) = options.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(after) = options.created_after() {
        builder.push(" AND created_at >= ").push_bind(after);
    }
    if let Some(before) = options.created_before() {
        builder.push(" AND created_at < ").push_bind(before);
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl ConversationStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create_interview(&self, interview: &Interview) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, candidate_name, questions, interview_type, job_title,
                 job_description, language, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(interview.id)
        .bind(&interview.candidate_name)
        .bind(Json(&interview.questions))
        .bind(interview.interview_type.as_str())
        .bind(&interview.job_title)
        .bind(&interview.job_description)
        .bind(interview.language.as_str())
        .bind(interview.status.as_str())
        .bind(interview.created_at)
        .bind(interview.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
        let row: Option<InterviewRow> = sqlx::query_as("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Interview::try_from).transpose()
    }

    async fn list_interviews(
        &self,
        options: &ListInterviewsOptions,
    ) -> Result<InterviewPage, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM interviews");
        push_filters(&mut count, options);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM interviews");
        push_filters(&mut select, options);
        let direction = match options.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        match options.sort_by {
            SortField::Name => select.push(format!(
                " ORDER BY lower(candidate_name) {direction}, created_at {direction}"
            )),
            SortField::CreatedAt => select.push(format!(" ORDER BY created_at {direction}")),
        };
        select
            .push(" LIMIT ")
            .push_bind(options.limit as i64)
            .push(" OFFSET ")
            .push_bind(options.offset as i64);

        let rows: Vec<InterviewRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let interviews = rows
            .into_iter()
            .map(Interview::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InterviewPage {
            interviews,
            total: total.max(0) as usize,
        })
    }

    async fn create_session(&self, session: &ChatSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_sessions
                (id, interview_id, language, status, created_at, updated_at, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.interview_id)
        .bind(session.language.as_str())
        .bind(session.status.as_str())
        .bind(session.created_at)
        .bind(session.updated_at)
        .bind(session.ended_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM chat_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ChatSession::try_from).transpose()
    }

    async fn update_session(&self, session: &ChatSession) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET status = $1, updated_at = $2, ended_at = $3 WHERE id = $4",
        )
        .bind(session.status.as_str())
        .bind(session.updated_at)
        .bind(session.ended_at)
        .bind(session.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SessionNotFound(session.id));
        }
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages
                (id, session_id, message_type, content, timestamp, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(message.session_id)
        .bind(message.message_type.as_str())
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::SessionNotFound(message.session_id)
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(())
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chat_sessions WHERE id = $1)")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StoreError::SessionNotFound(session_id));
        }

        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, message_type, content, timestamp, created_at
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn create_evaluation(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO evaluations
                (id, interview_id, session_id, answers, score, feedback, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(evaluation.id)
        .bind(evaluation.interview_id)
        .bind(evaluation.session_id)
        .bind(Json(&evaluation.answers))
        .bind(evaluation.score)
        .bind(&evaluation.feedback)
        .bind(evaluation.created_at)
        .bind(evaluation.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_evaluation(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError> {
        let row: Option<EvaluationRow> =
            sqlx::query_as("SELECT * FROM evaluations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Evaluation::from))
    }

    async fn find_session_evaluation(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Evaluation>, StoreError> {
        let row: Option<EvaluationRow> =
            sqlx::query_as("SELECT * FROM evaluations WHERE session_id = $1 LIMIT 1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Evaluation::from))
    }
}
