use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use renshu_core::model::{
    Answer, DrillItem, ItemId, ItemPool, SessionId, SessionSummary, SubmissionRecord, UnitKey,
};
use renshu_core::scoring::ScoringPolicy;
use renshu_core::time::Clock;

use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::sampler;

//
// ─── STATUS & SETTINGS ─────────────────────────────────────────────────────────
//

/// Lifecycle of a practice session. `Completed` is terminal except for
/// `reset`, which starts over with a fresh sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Per-unit configuration for a session: how many items to draw and how to
/// score them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub sample_size: usize,
    pub scoring: ScoringPolicy,
}

impl SessionSettings {
    #[must_use]
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            scoring: ScoringPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice session for one lesson unit.
///
/// Samples items from the unit's pool on `start` and steps through them
/// sequentially: submit an answer for the current item, then advance. Every
/// transition is synchronous, and a rejected transition leaves the session
/// untouched, so screens that fail to disable a button get a no-op instead
/// of a crash.
pub struct PracticeSession {
    session_id: SessionId,
    unit_key: UnitKey,
    pool: ItemPool,
    settings: SessionSettings,
    clock: Clock,
    status: SessionStatus,
    items: Vec<DrillItem>,
    current: usize,
    records: Vec<SubmissionRecord>,
    score: u32,
    streak: u32,
    best_streak: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    awarded: bool,
    summary_id: Option<i64>,
}

impl PracticeSession {
    /// Create a session in the `NotStarted` state.
    #[must_use]
    pub fn new(unit_key: UnitKey, pool: ItemPool, settings: SessionSettings) -> Self {
        Self {
            session_id: SessionId::new(),
            unit_key,
            pool,
            settings,
            clock: Clock::default(),
            status: SessionStatus::NotStarted,
            items: Vec::new(),
            current: 0,
            records: Vec::new(),
            score: 0,
            streak: 0,
            best_streak: 0,
            started_at: None,
            completed_at: None,
            awarded: false,
            summary_id: None,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn unit_key(&self) -> &UnitKey {
        &self.unit_key
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Items sampled for this run, in presentation order. Empty before start.
    #[must_use]
    pub fn items(&self) -> &[DrillItem] {
        &self.items
    }

    #[must_use]
    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Consecutive correct answers; resets to zero on any incorrect answer.
    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn summary_id(&self) -> Option<i64> {
        self.summary_id
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&DrillItem> {
        if self.status == SessionStatus::InProgress {
            self.items.get(self.current)
        } else {
            None
        }
    }

    /// Whether the current item already has a recorded answer.
    #[must_use]
    pub fn answered_current(&self) -> bool {
        self.records.len() > self.current
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.items.len(),
            answered: self.records.len(),
            remaining: self.items.len().saturating_sub(self.records.len()),
            score: self.score,
            streak: self.streak,
            is_complete: self.is_complete(),
        }
    }

    /// Start the session, sampling items with the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is in
    /// `NotStarted`; nothing changes in that case.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.start_with_rng(&mut rand::rng())
    }

    /// Start the session with an injected random source.
    ///
    /// Draws `sample_size` items from the pool. An empty draw (empty pool or
    /// a zero sample size) completes the session immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is in
    /// `NotStarted`.
    pub fn start_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        if self.status != SessionStatus::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }

        let now = self.clock.now();
        self.items = sampler::sample_items(rng, &self.pool, self.settings.sample_size);
        self.current = 0;
        self.records.clear();
        self.score = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.started_at = Some(now);
        self.awarded = false;
        self.summary_id = None;

        if self.items.is_empty() {
            self.status = SessionStatus::Completed;
            self.completed_at = Some(now);
        } else {
            self.status = SessionStatus::InProgress;
            self.completed_at = None;
        }

        Ok(())
    }

    /// Record and score an answer for the current item.
    ///
    /// # Errors
    ///
    /// Rejects without mutating state when the session is not in progress
    /// (`NotStarted`/`Completed`), the id does not name the current item
    /// (`ItemMismatch`), or the current item was already answered
    /// (`AlreadyAnswered`).
    pub fn submit(
        &mut self,
        item_id: &ItemId,
        answer: Answer,
    ) -> Result<&SubmissionRecord, SessionError> {
        match self.status {
            SessionStatus::NotStarted => return Err(SessionError::NotStarted),
            SessionStatus::Completed => return Err(SessionError::Completed),
            SessionStatus::InProgress => {}
        }

        let Some(item) = self.items.get(self.current) else {
            return Err(SessionError::Completed);
        };
        if item.id() != item_id {
            return Err(SessionError::ItemMismatch {
                current: item.id().clone(),
                submitted: item_id.clone(),
            });
        }
        if self.answered_current() {
            return Err(SessionError::AlreadyAnswered);
        }

        let verdict = self.settings.scoring.score(item, &answer);
        self.score = self.score.saturating_add(verdict.points);
        if verdict.correct {
            self.streak = self.streak.saturating_add(1);
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }

        self.records
            .push(SubmissionRecord::new(item_id.clone(), answer, verdict));
        self.records.last().ok_or(SessionError::Completed)
    }

    /// Move past the current item once it has a recorded answer.
    ///
    /// Advancing past the last item completes the session.
    ///
    /// # Errors
    ///
    /// Rejects without mutating state when the session is not in progress or
    /// the current item has no recorded answer (`Unanswered`).
    pub fn advance(&mut self) -> Result<SessionStatus, SessionError> {
        match self.status {
            SessionStatus::NotStarted => return Err(SessionError::NotStarted),
            SessionStatus::Completed => return Err(SessionError::Completed),
            SessionStatus::InProgress => {}
        }
        if !self.answered_current() {
            return Err(SessionError::Unanswered);
        }

        self.current += 1;
        if self.current >= self.items.len() {
            self.status = SessionStatus::Completed;
            self.completed_at = Some(self.clock.now());
        }

        Ok(self.status)
    }

    /// Discard this run and start over with a freshly sampled item set.
    ///
    /// Allowed from any state.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible to match `start` semantics.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.reset_with_rng(&mut rand::rng())
    }

    /// Reset with an injected random source.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible to match `start` semantics.
    pub fn reset_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        self.status = SessionStatus::NotStarted;
        self.start_with_rng(rng)
    }

    /// Build the summary for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` before completion.
    pub fn build_summary(&self) -> Result<SessionSummary, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete);
        }
        let started_at = self.started_at.ok_or(SessionError::Incomplete)?;
        let completed_at = self.completed_at.ok_or(SessionError::Incomplete)?;

        Ok(SessionSummary::from_records(
            self.unit_key.clone(),
            started_at,
            completed_at,
            &self.records,
        )?)
    }

    pub(crate) fn awarded(&self) -> bool {
        self.awarded
    }

    pub(crate) fn mark_awarded(&mut self) {
        self.awarded = true;
    }

    pub(crate) fn set_summary_id(&mut self, id: i64) {
        self.summary_id = Some(id);
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("session_id", &self.session_id)
            .field("unit_key", &self.unit_key)
            .field("status", &self.status)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("records_len", &self.records.len())
            .field("score", &self.score)
            .field("streak", &self.streak)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
