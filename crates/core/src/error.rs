use thiserror::Error;

use crate::model::{AchievementError, ItemError, PoolError, SessionSummaryError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Achievement(#[from] AchievementError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
