use crate::model::ids::ItemId;
use crate::scoring::Verdict;

/// A learner's submission for one drill item.
///
/// The variant is expected to match the item's kind; a mismatched submission
/// is scoreable (always incorrect), never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Chosen option of a multiple choice item, by value.
    Choice(String),
    /// Entry picked from a fill-in-the-blank answer bank.
    Blank(String),
    /// Token order submitted for a reorder puzzle.
    Sequence(Vec<String>),
    /// Flashcard self-grade: did the learner recall the back side?
    Recall(bool),
}

impl Answer {
    #[must_use]
    pub fn choice(option: impl Into<String>) -> Self {
        Answer::Choice(option.into())
    }

    #[must_use]
    pub fn blank(entry: impl Into<String>) -> Self {
        Answer::Blank(entry.into())
    }

    #[must_use]
    pub fn sequence<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Sequence(tokens.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn recall(remembered: bool) -> Self {
        Answer::Recall(remembered)
    }
}

/// One scored submission inside a session, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub item_id: ItemId,
    pub answer: Answer,
    pub verdict: Verdict,
}

impl SubmissionRecord {
    #[must_use]
    pub fn new(item_id: ItemId, answer: Answer, verdict: Verdict) -> Self {
        Self {
            item_id,
            answer,
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_helper_collects_tokens() {
        let answer = Answer::sequence(["薬を", "飲まずに", "寝た。"]);
        assert_eq!(
            answer,
            Answer::Sequence(vec![
                "薬を".to_owned(),
                "飲まずに".to_owned(),
                "寝た。".to_owned()
            ])
        );
    }

    #[test]
    fn record_keeps_submission_and_verdict() {
        let record = SubmissionRecord::new(
            ItemId::new("q1"),
            Answer::choice("a"),
            Verdict {
                correct: true,
                points: 100,
            },
        );
        assert!(record.verdict.correct);
        assert_eq!(record.verdict.points, 100);
    }
}
