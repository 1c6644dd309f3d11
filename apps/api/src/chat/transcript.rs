//! Projections of a session's message log. Both the per-turn history view
//! and the Q/A reconstruction used for evaluation come from here, so the
//! auto-end path and the explicit end path see identical inputs.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::interviewer::HistoryTurn;
use crate::models::{answer_key, ChatMessage, MessageType};

pub fn user_message_count(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .filter(|m| m.message_type == MessageType::User)
        .count()
}

/// History handed to the generator: every message except `current`, in
/// insertion order.
pub fn history_excluding(messages: &[ChatMessage], current: Uuid) -> Vec<HistoryTurn> {
    messages
        .iter()
        .filter(|m| m.id != current)
        .map(|m| HistoryTurn {
            role: m.message_type,
            content: m.content.clone(),
        })
        .collect()
}

/// Questions and answers recovered from a message log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QaPairs {
    /// Every AI message, in order.
    pub questions: Vec<String>,
    /// Every user message, in order.
    pub answers: Vec<String>,
}

impl QaPairs {
    /// `question_<k>` → k-th user message (zero-based).
    pub fn answer_map(&self) -> BTreeMap<String, String> {
        self.answers
            .iter()
            .enumerate()
            .map(|(k, answer)| (answer_key(k), answer.clone()))
            .collect()
    }
}

pub fn reconstruct_qa(messages: &[ChatMessage]) -> QaPairs {
    let mut pairs = QaPairs::default();
    for message in messages {
        match message.message_type {
            MessageType::Ai => pairs.questions.push(message.content.clone()),
            MessageType::User => pairs.answers.push(message.content.clone()),
        }
    }
    pairs
}
