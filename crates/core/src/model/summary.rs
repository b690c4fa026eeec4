use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::answer::SubmissionRecord;
use crate::model::ids::UnitKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many items for a single session: {len}")]
    TooManyItems { len: usize },

    #[error("total items ({total}) does not match correct + incorrect ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Aggregate record of one completed practice session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    unit_key: UnitKey,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_items: u32,
    correct: u32,
    incorrect: u32,
    score: u32,
    best_streak: u32,
}

impl SessionSummary {
    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` for reversed timestamps
    /// and `SessionSummaryError::CountMismatch` when counts do not align.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        unit_key: UnitKey,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total_items: u32,
        correct: u32,
        incorrect: u32,
        score: u32,
        best_streak: u32,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let sum = correct + incorrect;
        if sum != total_items {
            return Err(SessionSummaryError::CountMismatch {
                total: total_items,
                sum,
            });
        }

        Ok(Self {
            unit_key,
            started_at,
            completed_at,
            total_items,
            correct,
            incorrect,
            score,
            best_streak,
        })
    }

    /// Build a summary from a session's submission records.
    ///
    /// Score and best streak are recomputed from the records, which are in
    /// submission order.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is
    /// before `started_at`, or `TooManyItems` if the record count cannot fit
    /// in `u32`.
    pub fn from_records(
        unit_key: UnitKey,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        records: &[SubmissionRecord],
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let total_items = u32::try_from(records.len())
            .map_err(|_| SessionSummaryError::TooManyItems { len: records.len() })?;

        let mut correct = 0_u32;
        let mut score = 0_u32;
        let mut streak = 0_u32;
        let mut best_streak = 0_u32;
        for record in records {
            score = score.saturating_add(record.verdict.points);
            if record.verdict.correct {
                correct = correct.saturating_add(1);
                streak = streak.saturating_add(1);
                best_streak = best_streak.max(streak);
            } else {
                streak = 0;
            }
        }

        Self::from_persisted(
            unit_key,
            started_at,
            completed_at,
            total_items,
            correct,
            total_items - correct,
            score,
            best_streak,
        )
    }

    #[must_use]
    pub fn unit_key(&self) -> &UnitKey {
        &self.unit_key
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, ItemId};
    use crate::scoring::Verdict;
    use crate::time::fixed_now;

    fn record(id: &str, correct: bool, points: u32) -> SubmissionRecord {
        SubmissionRecord::new(
            ItemId::new(id),
            Answer::choice("x"),
            Verdict { correct, points },
        )
    }

    #[test]
    fn summary_counts_and_streaks_from_records() {
        let now = fixed_now();
        let records = vec![
            record("a", true, 100),
            record("b", true, 100),
            record("c", false, 0),
            record("d", true, 100),
        ];

        let summary =
            SessionSummary::from_records(UnitKey::new("N5_B3"), now, now, &records).unwrap();

        assert_eq!(summary.total_items(), 4);
        assert_eq!(summary.correct(), 3);
        assert_eq!(summary.incorrect(), 1);
        assert_eq!(summary.score(), 300);
        assert_eq!(summary.best_streak(), 2);
    }

    #[test]
    fn empty_session_summarizes_to_zeroes() {
        let now = fixed_now();
        let summary = SessionSummary::from_records(UnitKey::new("N5_B3"), now, now, &[]).unwrap();
        assert_eq!(summary.total_items(), 0);
        assert_eq!(summary.score(), 0);
    }

    #[test]
    fn reversed_timestamps_are_rejected() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::minutes(5);
        let err = SessionSummary::from_records(UnitKey::new("N5_B3"), now, earlier, &[])
            .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn persisted_counts_must_align() {
        let now = fixed_now();
        let err = SessionSummary::from_persisted(
            UnitKey::new("N5_B3"),
            now,
            now,
            5,
            2,
            2,
            200,
            2,
        )
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::CountMismatch { total: 5, sum: 4 });
    }
}
