pub mod chat;
pub mod evaluation;
pub mod interview;
pub mod language;

pub use chat::{ChatMessage, ChatSession, MessageType, SessionStatus};
pub use evaluation::{answer_key, Evaluation};
pub use interview::{Interview, InterviewStatus, InterviewType, NewInterview};
pub use language::Language;
