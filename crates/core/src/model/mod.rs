mod achievement;
mod answer;
mod ids;
mod item;
mod pool;
mod summary;

pub use achievement::{Achievement, AchievementError, AwardReceipt};
pub use answer::{Answer, SubmissionRecord};
pub use ids::{AchievementId, ItemId, SessionId, UnitKey};
pub use item::{
    BLANK_MARKER, DrillItem, FillInBlank, Flashcard, ItemError, ItemKind, MultipleChoice,
    ReorderPuzzle,
};
pub use pool::{ItemPool, PoolError};
pub use summary::{SessionSummary, SessionSummaryError};
