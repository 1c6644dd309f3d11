//! Evaluation pipeline shared by chat sessions and direct submissions.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviewer::{bounded, EvaluationContext, Evaluator};
use crate::models::{answer_key, Evaluation, Interview};
use crate::store::ConversationStore;

pub mod handlers;

/// Forces an evaluator score into `[0, 1]`. Non-finite scores become 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Answers aligned to the interview's questions: the i-th entry is the value
/// under `question_<i>`, or empty when the candidate skipped it.
pub fn align_answers(interview: &Interview, answers: &BTreeMap<String, String>) -> Vec<String> {
    (0..interview.questions.len())
        .map(|i| answers.get(&answer_key(i)).cloned().unwrap_or_default())
        .collect()
}

/// Scores a direct submission and persists the result.
pub async fn submit_answers(
    store: &dyn ConversationStore,
    evaluator: &dyn Evaluator,
    timeout: Duration,
    interview_id: Uuid,
    answers: BTreeMap<String, String>,
) -> Result<Evaluation, AppError> {
    let interview = store
        .get_interview(interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))?;

    let aligned = align_answers(&interview, &answers);
    let context = EvaluationContext::for_interview(&interview, interview.language);
    let assessment = bounded(
        timeout,
        evaluator.evaluate(&interview.questions, &aligned, &context),
    )
    .await?;

    let evaluation = Evaluation::new(
        interview.id,
        None,
        answers,
        clamp_score(assessment.score),
        assessment.feedback,
    );
    store.create_evaluation(&evaluation).await?;

    info!(
        evaluation_id = %evaluation.id,
        interview_id = %interview.id,
        score = evaluation.score,
        "direct submission evaluated"
    );
    Ok(evaluation)
}
