use thiserror::Error;

use crate::model::ids::AchievementId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AchievementError {
    #[error("achievement title must not be empty")]
    EmptyTitle,
}

/// A persisted, once-per-id reward granting experience points.
///
/// Owned by the progress backend; this crate only carries the shape that
/// lessons configure and the reporter forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    id: AchievementId,
    title: String,
    xp: u32,
}

impl Achievement {
    /// # Errors
    ///
    /// Returns `AchievementError::EmptyTitle` for a blank title.
    pub fn new(
        id: AchievementId,
        title: impl Into<String>,
        xp: u32,
    ) -> Result<Self, AchievementError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AchievementError::EmptyTitle);
        }
        Ok(Self { id, title, xp })
    }

    #[must_use]
    pub fn id(&self) -> &AchievementId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }
}

/// Result of reporting a completion to the progress backend.
///
/// `first_time` is false on every replay of an already-awarded id; replays
/// never change accumulated XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardReceipt {
    pub first_time: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn achievement_requires_a_title() {
        let err = Achievement::new(AchievementId::new("n5_bienvenida"), "  ", 5).unwrap_err();
        assert_eq!(err, AchievementError::EmptyTitle);
    }

    #[test]
    fn achievement_carries_xp() {
        let achievement =
            Achievement::new(AchievementId::new("n3_b3_u1"), "Gramática B3", 30).unwrap();
        assert_eq!(achievement.xp(), 30);
        assert_eq!(achievement.id().as_str(), "n3_b3_u1");
    }
}
