use async_trait::async_trait;
use chrono::{DateTime, Utc};
use renshu_core::model::{AchievementId, SessionSummary, UnitKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted completion mark for a lesson unit.
///
/// One record per unit key; writing a second record for the same key is the
/// idempotent no-op that keeps replayed units from double-counting XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub unit_key: UnitKey,
    pub achievement_id: Option<AchievementId>,
    pub points: u32,
    pub completed_at: DateTime<Utc>,
    /// Free-form JSON payload (score, totals) attached by the reporter.
    pub meta: Option<String>,
}

/// Repository contract for unit completion marks and accumulated XP.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert the record unless one already exists for its unit key.
    ///
    /// Returns `true` when the record was written (first completion) and
    /// `false` when the unit was already marked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached or written.
    async fn try_award(&self, record: &ProgressRecord) -> Result<bool, StorageError>;

    /// Fetch the completion mark for a unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit was never completed.
    async fn get_progress(&self, unit_key: &UnitKey) -> Result<ProgressRecord, StorageError>;

    /// All completion marks, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Sum of points across all completion marks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn total_xp(&self) -> Result<u64, StorageError>;
}

/// Repository contract for the append-only session summary log.
#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Append a summary and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError>;

    /// Summaries for a unit, newest first, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_summaries(
        &self,
        unit_key: &UnitKey,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<UnitKey, ProgressRecord>>>,
    summaries: Arc<Mutex<Vec<(i64, SessionSummary)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn try_award(&self, record: &ProgressRecord) -> Result<bool, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&record.unit_key) {
            return Ok(false);
        }
        guard.insert(record.unit_key.clone(), record.clone());
        Ok(true)
    }

    async fn get_progress(&self, unit_key: &UnitKey) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(unit_key).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ProgressRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(records)
    }

    async fn total_xp(&self) -> Result<u64, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().map(|r| u64::from(r.points)).sum())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let mut guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.push((id, summary.clone()));
        Ok(id)
    }

    async fn list_summaries(
        &self,
        unit_key: &UnitKey,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .rev()
            .filter(|(_, s)| s.unit_key() == unit_key)
            .take(limit as usize)
            .map(|(_, s)| s.clone())
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub summaries: Arc<dyn SessionSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let summaries: Arc<dyn SessionSummaryRepository> = Arc::new(repo);
        Self {
            progress,
            summaries,
        }
    }
}
