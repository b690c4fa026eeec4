mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{PracticeSession, SessionSettings, SessionStatus};
pub use workflow::{AdvanceOutcome, CompletionOutcome, PracticeLoopService, SubmitOutcome};
