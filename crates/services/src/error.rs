//! Shared error types for the services crate.

use thiserror::Error;

use renshu_core::model::{ItemId, SessionSummaryError};
use storage::repository::StorageError;

/// Errors emitted by the practice session state machine and loop service.
///
/// Transition errors (`AlreadyStarted` through `Unanswered`) are rejections:
/// the session state is left untouched, and callers whose UI already prevents
/// the transition may simply drop them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("session has not started")]
    NotStarted,

    #[error("session already completed")]
    Completed,

    #[error("session is not complete")]
    Incomplete,

    #[error("answer submitted for {submitted}, current item is {current}")]
    ItemMismatch { current: ItemId, submitted: ItemId },

    #[error("current item already has a recorded answer")]
    AlreadyAnswered,

    #[error("current item has no recorded answer")]
    Unanswered,

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by audio backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AudioError {
    #[error("speech backend is not configured")]
    Disabled,

    #[error("speech request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
