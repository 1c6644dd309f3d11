use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::interviewer::prompts::{
    evaluation_prompt, evaluation_system, interviewer_system, GREETING_REQUEST,
};
use crate::interviewer::{
    Assessment, EvaluationContext, Evaluator, HistoryTurn, InterviewerError, ResponseGenerator,
    TurnContext,
};
use crate::llm_client::{LlmClient, LlmError, LlmRole, LlmTurn};
use crate::models::MessageType;

/// Interviewer backed by Claude. Both traits share one client.
pub struct LlmInterviewer {
    llm: LlmClient,
}

impl LlmInterviewer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn turn(
        &self,
        session_id: Uuid,
        history: &[HistoryTurn],
        input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        let system = interviewer_system(context);
        let turns = to_llm_turns(history, input);
        debug!(
            %session_id,
            turns = turns.len(),
            closing = context.is_closing_turn,
            "requesting interviewer turn"
        );
        Ok(self.llm.converse_text(&system, &turns).await?)
    }
}

/// Converts stored history into a Messages API conversation.
///
/// The API requires the first turn to come from the user and roles to
/// alternate, so a leading interviewer message is preceded by the greeting
/// request and consecutive same-role turns are merged.
pub(crate) fn to_llm_turns(history: &[HistoryTurn], input: &str) -> Vec<LlmTurn> {
    let mut turns: Vec<LlmTurn> = Vec::with_capacity(history.len() + 2);

    let current = (!input.trim().is_empty()).then(|| HistoryTurn {
        role: MessageType::User,
        content: input.to_string(),
    });

    for turn in history.iter().chain(current.iter()) {
        let role = match turn.role {
            MessageType::User => LlmRole::User,
            MessageType::Ai => LlmRole::Assistant,
        };
        if turns.is_empty() && role == LlmRole::Assistant {
            turns.push(LlmTurn::user(GREETING_REQUEST));
        }
        match turns.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.content);
            }
            _ => turns.push(LlmTurn {
                role,
                content: turn.content.clone(),
            }),
        }
    }

    if turns.last().map_or(true, |t| t.role == LlmRole::Assistant) {
        turns.push(LlmTurn::user(GREETING_REQUEST));
    }
    turns
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    score: f64,
    feedback: String,
}

#[async_trait]
impl ResponseGenerator for LlmInterviewer {
    async fn greeting(
        &self,
        session_id: Uuid,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        self.turn(session_id, &[], "", context).await
    }

    async fn reply(
        &self,
        session_id: Uuid,
        history: &[HistoryTurn],
        input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        self.turn(session_id, history, input, context).await
    }

    async fn closing(
        &self,
        session_id: Uuid,
        history: &[HistoryTurn],
        input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        let context = context.clone().closing();
        self.turn(session_id, history, input, &context).await
    }
}

#[async_trait]
impl Evaluator for LlmInterviewer {
    async fn evaluate(
        &self,
        questions: &[String],
        answers: &[String],
        context: &EvaluationContext,
    ) -> Result<Assessment, InterviewerError> {
        let prompt = evaluation_prompt(questions, answers, context);
        let raw: RawAssessment = self
            .llm
            .call_json(&prompt, evaluation_system())
            .await
            .map_err(|e| match e {
                LlmError::Parse(e) => {
                    InterviewerError::InvalidOutput(format!("evaluation was not valid JSON: {e}"))
                }
                other => InterviewerError::Llm(other),
            })?;

        if !raw.score.is_finite() {
            return Err(InterviewerError::InvalidOutput(format!(
                "score is not a finite number: {}",
                raw.score
            )));
        }

        Ok(Assessment {
            score: raw.score,
            feedback: raw.feedback.trim().to_string(),
        })
    }
}
