use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use renshu_core::model::{Achievement, AwardReceipt, UnitKey};
use storage::repository::{ProgressRecord, ProgressRepository, StorageError};

//
// ─── AWARD BOOK ────────────────────────────────────────────────────────────────
//

/// Content-authored table mapping lesson units to their completion reward.
///
/// Units without an entry complete silently; what a unit is worth is lesson
/// configuration, not engine logic.
#[derive(Clone, Default)]
pub struct AwardBook {
    entries: HashMap<UnitKey, Achievement>,
}

impl AwardBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_award(mut self, unit_key: UnitKey, achievement: Achievement) -> Self {
        self.entries.insert(unit_key, achievement);
        self
    }

    #[must_use]
    pub fn achievement_for(&self, unit_key: &UnitKey) -> Option<&Achievement> {
        self.entries.get(unit_key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── REPORTER ──────────────────────────────────────────────────────────────────
//

/// Reports unit completions to the progress store, once per unit key.
///
/// Idempotence lives in the store: a replayed unit finds its completion mark
/// already present and comes back with `first_time: false`, leaving
/// accumulated XP untouched. The session's own once-per-instance guard sits
/// on top of this in the loop service.
#[derive(Clone)]
pub struct AchievementReporter {
    progress: Arc<dyn ProgressRepository>,
}

impl AchievementReporter {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>) -> Self {
        Self { progress }
    }

    /// Record a completion and return whether it was the first for this unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress store cannot be reached.
    pub async fn award_on_completion(
        &self,
        unit_key: &UnitKey,
        achievement: &Achievement,
        completed_at: DateTime<Utc>,
        meta: Option<serde_json::Value>,
    ) -> Result<AwardReceipt, StorageError> {
        let record = ProgressRecord {
            unit_key: unit_key.clone(),
            achievement_id: Some(achievement.id().clone()),
            points: achievement.xp(),
            completed_at,
            meta: meta.map(|value| value.to_string()),
        };
        let first_time = self.progress.try_award(&record).await?;
        Ok(AwardReceipt { first_time })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use renshu_core::model::AchievementId;
    use renshu_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn achievement(id: &str, xp: u32) -> Achievement {
        Achievement::new(AchievementId::new(id), "Logro", xp).unwrap()
    }

    #[tokio::test]
    async fn second_award_is_not_first_time_and_xp_counts_once() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = AchievementReporter::new(repo.clone());
        let unit = UnitKey::new("unit_masen_neg");
        let reward = achievement("unit_masen_neg", 10);

        let first = reporter
            .award_on_completion(&unit, &reward, fixed_now(), None)
            .await
            .unwrap();
        assert!(first.first_time);

        let second = reporter
            .award_on_completion(&unit, &reward, fixed_now(), None)
            .await
            .unwrap();
        assert!(!second.first_time);

        assert_eq!(repo.total_xp().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn award_persists_meta_payload() {
        let repo = Arc::new(InMemoryRepository::new());
        let reporter = AchievementReporter::new(repo.clone());
        let unit = UnitKey::new("n3_b3_u1");

        reporter
            .award_on_completion(
                &unit,
                &achievement("n3_b3_u1", 30),
                fixed_now(),
                Some(serde_json::json!({"score": 300, "total": 3})),
            )
            .await
            .unwrap();

        let stored = repo.get_progress(&unit).await.unwrap();
        assert_eq!(stored.points, 30);
        let meta: serde_json::Value =
            serde_json::from_str(stored.meta.as_deref().unwrap()).unwrap();
        assert_eq!(meta["score"], 300);
    }

    #[test]
    fn book_lookup_by_unit_key() {
        let book = AwardBook::new()
            .with_award(UnitKey::new("N5_B3"), achievement("n5_b3", 30))
            .with_award(UnitKey::new("N5_B4"), achievement("n5_b4", 25));

        assert_eq!(book.len(), 2);
        assert_eq!(
            book.achievement_for(&UnitKey::new("N5_B3")).unwrap().xp(),
            30
        );
        assert!(book.achievement_for(&UnitKey::new("N9")).is_none());
    }
}
