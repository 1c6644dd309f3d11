pub mod handlers;
pub mod orchestrator;
pub mod policy;
pub mod transcript;

pub use orchestrator::{ChatOrchestrator, Exchange, SessionView};
pub use policy::{EndOfInterviewPolicy, MessageCountPolicy};
