use std::sync::Arc;

use tracing::warn;

use renshu_core::model::{Answer, AwardReceipt, ItemId, ItemPool, SessionSummary, UnitKey};
use renshu_core::scoring::Verdict;
use renshu_core::time::Clock;
use storage::repository::{ProgressRepository, SessionSummaryRepository};

use super::service::{PracticeSession, SessionSettings, SessionStatus};
use crate::award::{AchievementReporter, AwardBook};
use crate::error::SessionError;
use crate::feedback::{AudioBackend, Feedback, FeedbackDispatcher};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of answering the current item through the loop service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub verdict: Verdict,
    pub feedback: Feedback,
}

/// Side effects recorded when a session completed.
///
/// `receipt` is absent when the unit has no configured award or the award
/// write failed; `summary_id` is absent when the summary write failed. Both
/// can be retried with `finalize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub receipt: Option<AwardReceipt>,
    pub summary_id: Option<i64>,
}

/// Result of advancing through the loop service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub is_complete: bool,
    pub completion: Option<CompletionOutcome>,
}

//
// ─── LOOP SERVICE ──────────────────────────────────────────────────────────────
//

/// Orchestrates a practice session end to end for a screen.
///
/// Submissions trigger feedback, and the completing advance reports the
/// unit's achievement and appends a session summary, at most once per
/// session instance. Both side effects are non-fatal: a dead speaker or an
/// unreachable progress store degrades to a missing sound or a missed award,
/// never a blocked quiz.
#[derive(Clone)]
pub struct PracticeLoopService {
    clock: Clock,
    dispatcher: FeedbackDispatcher,
    reporter: AchievementReporter,
    summaries: Arc<dyn SessionSummaryRepository>,
    awards: AwardBook,
}

impl PracticeLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        audio: Arc<dyn AudioBackend>,
        progress: Arc<dyn ProgressRepository>,
        summaries: Arc<dyn SessionSummaryRepository>,
        awards: AwardBook,
    ) -> Self {
        Self {
            clock,
            dispatcher: FeedbackDispatcher::new(audio),
            reporter: AchievementReporter::new(progress),
            summaries,
            awards,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &FeedbackDispatcher {
        &self.dispatcher
    }

    /// Start a new session for a unit.
    ///
    /// A degenerate draw (empty pool or zero sample size) completes on the
    /// spot, in which case the completion side effects run here and their
    /// results are readable from the returned session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot start.
    pub async fn start_session(
        &self,
        unit_key: UnitKey,
        pool: ItemPool,
        settings: SessionSettings,
    ) -> Result<PracticeSession, SessionError> {
        let mut session = PracticeSession::new(unit_key, pool, settings).with_clock(self.clock);
        session.start()?;

        if session.is_complete() {
            self.complete(&mut session).await;
        }

        Ok(session)
    }

    /// Answer the current item: score it, then play the cue and reveal the
    /// explanation.
    ///
    /// # Errors
    ///
    /// Propagates the state machine's transition rejections unchanged.
    pub async fn submit_answer(
        &self,
        session: &mut PracticeSession,
        item_id: &ItemId,
        answer: Answer,
    ) -> Result<SubmitOutcome, SessionError> {
        let verdict = session.submit(item_id, answer)?.verdict;

        let Some(item) = session.current_item() else {
            return Err(SessionError::Completed);
        };
        let feedback = self.dispatcher.dispatch(verdict, item).await;

        Ok(SubmitOutcome { verdict, feedback })
    }

    /// Advance past the answered current item; on the completing advance,
    /// report the achievement and append the summary.
    ///
    /// # Errors
    ///
    /// Propagates the state machine's transition rejections unchanged. Side
    /// effect failures never surface here.
    pub async fn advance(
        &self,
        session: &mut PracticeSession,
    ) -> Result<AdvanceOutcome, SessionError> {
        let status = session.advance()?;

        let completion = if status == SessionStatus::Completed {
            Some(self.complete(session).await)
        } else {
            None
        };

        Ok(AdvanceOutcome {
            is_complete: status == SessionStatus::Completed,
            completion,
        })
    }

    /// Retry the completion side effects for a completed session.
    ///
    /// Useful when the award or summary write failed on completion (e.g. a
    /// transient storage error). Still at most once per session instance:
    /// whatever already succeeded is not repeated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session has not completed,
    /// or `SessionError::Storage` when a retried write fails again.
    pub async fn finalize(
        &self,
        session: &mut PracticeSession,
    ) -> Result<CompletionOutcome, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::Incomplete);
        }
        let summary = session.build_summary()?;

        let mut receipt = None;
        if !session.awarded() {
            let achievement = self.awards.achievement_for(session.unit_key()).cloned();
            if let Some(achievement) = achievement {
                let awarded = self
                    .reporter
                    .award_on_completion(
                        session.unit_key(),
                        &achievement,
                        summary.completed_at(),
                        Some(completion_meta(&summary)),
                    )
                    .await?;
                session.mark_awarded();
                receipt = Some(awarded);
            } else {
                session.mark_awarded();
            }
        }

        let summary_id = match session.summary_id() {
            Some(id) => id,
            None => {
                let id = self.summaries.append_summary(&summary).await?;
                session.set_summary_id(id);
                id
            }
        };

        Ok(CompletionOutcome {
            receipt,
            summary_id: Some(summary_id),
        })
    }

    /// Run the completion side effects, swallowing failures.
    async fn complete(&self, session: &mut PracticeSession) -> CompletionOutcome {
        let summary = match session.build_summary() {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(unit = %session.unit_key(), error = %err, "session summary build failed");
                None
            }
        };

        let mut receipt = None;
        if !session.awarded() {
            let achievement = self.awards.achievement_for(session.unit_key()).cloned();
            if let Some(achievement) = achievement {
                let completed_at = session.completed_at().unwrap_or_else(|| self.clock.now());
                let meta = summary.as_ref().map(completion_meta);
                match self
                    .reporter
                    .award_on_completion(session.unit_key(), &achievement, completed_at, meta)
                    .await
                {
                    Ok(awarded) => {
                        session.mark_awarded();
                        receipt = Some(awarded);
                    }
                    Err(err) => {
                        warn!(unit = %session.unit_key(), error = %err, "achievement award failed");
                    }
                }
            } else {
                session.mark_awarded();
            }
        }

        let mut summary_id = session.summary_id();
        if summary_id.is_none() {
            if let Some(summary) = &summary {
                match self.summaries.append_summary(summary).await {
                    Ok(id) => {
                        session.set_summary_id(id);
                        summary_id = Some(id);
                    }
                    Err(err) => {
                        warn!(unit = %session.unit_key(), error = %err, "summary append failed");
                    }
                }
            }
        }

        CompletionOutcome {
            receipt,
            summary_id,
        }
    }
}

fn completion_meta(summary: &SessionSummary) -> serde_json::Value {
    serde_json::json!({
        "score": summary.score(),
        "total": summary.total_items(),
        "best_streak": summary.best_streak(),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
