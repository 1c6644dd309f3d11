/// Number of user messages after which an interview wraps up.
pub const DEFAULT_MAX_USER_MESSAGES: usize = 8;

/// Decides when an interview has run its course.
///
/// The orchestrator consults this after every user message. Implementations
/// must be pure: the same count always yields the same answer.
pub trait EndOfInterviewPolicy: Send + Sync {
    fn should_end(&self, user_message_count: usize) -> bool;
}

/// Ends the interview once the candidate has sent `threshold` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCountPolicy {
    threshold: usize,
}

impl MessageCountPolicy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for MessageCountPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_USER_MESSAGES)
    }
}

impl EndOfInterviewPolicy for MessageCountPolicy {
    fn should_end(&self, user_message_count: usize) -> bool {
        user_message_count >= self.threshold
    }
}
