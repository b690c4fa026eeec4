#![forbid(unsafe_code)]

pub mod award;
pub mod error;
pub mod feedback;
pub mod sampler;
pub mod sessions;

pub use renshu_core::Clock;

pub use award::{AchievementReporter, AwardBook};
pub use error::{AudioError, SessionError};
pub use feedback::{
    AudioBackend, Cue, Feedback, FeedbackDispatcher, HttpSpeechBackend, NullAudio, SpeechConfig,
    SpeechOptions,
};
pub use sessions::{
    AdvanceOutcome, CompletionOutcome, PracticeLoopService, PracticeSession, SessionProgress,
    SessionSettings, SessionStatus, SubmitOutcome,
};
