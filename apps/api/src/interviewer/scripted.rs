//! Deterministic interviewer. No network, no randomness: the same inputs
//! always produce the same turns and the same score.

use async_trait::async_trait;
use uuid::Uuid;

use crate::interviewer::{
    Assessment, EvaluationContext, Evaluator, HistoryTurn, InterviewerError, ResponseGenerator,
    TurnContext,
};
use crate::models::Language;

pub const DEFAULT_SCRIPTED_SCORE: f64 = 0.8;

const FOLLOW_UPS_EN: [&str; 7] = [
    "Thank you for sharing that. Can you tell me more about your experience and the technologies you've worked with?",
    "That's interesting. How do you approach problem-solving when faced with complex technical challenges?",
    "I appreciate the detail. Could you walk me through a specific project where you demonstrated leadership?",
    "Thanks for explaining. What motivates you in your professional work, and how do you keep your skills current?",
    "That's a good example. How do you handle working under pressure and tight deadlines?",
    "I see. Can you describe a situation where you had to collaborate with a cross-functional team?",
    "Thank you. What are your career goals for the next few years?",
];

const FOLLOW_UPS_ZH_TW: [&str; 7] = [
    "謝謝您的分享。可以再多談談您的經驗以及使用過的技術嗎？",
    "很有意思。遇到複雜的技術挑戰時，您通常如何解決問題？",
    "感謝您的詳細說明。可以舉一個您展現領導能力的具體專案嗎？",
    "謝謝您的說明。工作上是什麼在激勵您？您如何持續精進自己的技能？",
    "這是很好的例子。您如何面對工作壓力與緊迫的期限？",
    "了解。可以描述一次您與跨部門團隊合作的經驗嗎？",
    "謝謝。您未來幾年的職涯目標是什麼？",
];

/// Rule-table interviewer used when no LLM is configured, and in tests.
#[derive(Debug, Clone)]
pub struct ScriptedInterviewer {
    score: f64,
}

impl Default for ScriptedInterviewer {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPTED_SCORE)
    }
}

impl ScriptedInterviewer {
    pub fn new(score: f64) -> Self {
        Self { score }
    }

    fn greeting_text(context: &TurnContext) -> String {
        match context.language {
            Language::En => format!(
                "Hello, and welcome to your {} interview for the {} role. \
                To start, could you briefly introduce yourself?",
                context.interview_type.as_str(),
                context.job_title
            ),
            Language::ZhTw => format!(
                "您好，歡迎參加{}職位的面試。首先，可以請您簡單介紹一下自己嗎？",
                context.job_title
            ),
        }
    }

    fn follow_up(history_len: usize, language: Language) -> &'static str {
        let table: &[&str] = match language {
            Language::En => &FOLLOW_UPS_EN,
            Language::ZhTw => &FOLLOW_UPS_ZH_TW,
        };
        table[history_len % table.len()]
    }

    fn closing_text(context: &TurnContext) -> String {
        match context.language {
            Language::En => format!(
                "That concludes our interview for the {} role. Thank you for your time \
                and thoughtful answers. We will follow up with your evaluation shortly.",
                context.job_title
            ),
            Language::ZhTw => format!(
                "{}職位的面試到此結束。感謝您撥冗參加並認真回答，我們稍後會提供評估結果。",
                context.job_title
            ),
        }
    }

    fn feedback(&self, answered: usize, context: &EvaluationContext) -> String {
        let criteria = context.criteria.join(", ");
        match context.language {
            Language::En => format!(
                "Overall assessment for {}: {} answered question(s) reviewed against {}. \
                Responses were clear and structured. Consider adding more concrete examples \
                and implementation details.",
                context.job_title, answered, criteria
            ),
            Language::ZhTw => format!(
                "{}整體評估：共審閱 {} 題回答，評估面向為 {}。回答清楚且有條理，建議補充更多具體實例與實作細節。",
                context.job_title, answered, criteria
            ),
        }
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedInterviewer {
    async fn greeting(
        &self,
        _session_id: Uuid,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        Ok(Self::greeting_text(context))
    }

    async fn reply(
        &self,
        _session_id: Uuid,
        history: &[HistoryTurn],
        _input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        Ok(Self::follow_up(history.len(), context.language).to_string())
    }

    async fn closing(
        &self,
        _session_id: Uuid,
        _history: &[HistoryTurn],
        _input: &str,
        context: &TurnContext,
    ) -> Result<String, InterviewerError> {
        Ok(Self::closing_text(context))
    }
}

#[async_trait]
impl Evaluator for ScriptedInterviewer {
    async fn evaluate(
        &self,
        _questions: &[String],
        answers: &[String],
        context: &EvaluationContext,
    ) -> Result<Assessment, InterviewerError> {
        let answered = answers.iter().filter(|a| !a.trim().is_empty()).count();
        if answered == 0 {
            return Ok(Assessment {
                score: 0.0,
                feedback: "No answers provided.".to_string(),
            });
        }
        Ok(Assessment {
            score: self.score,
            feedback: self.feedback(answered, context),
        })
    }
}
