use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::ItemId;
use crate::model::item::DrillItem;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("duplicate item id in pool: {0}")]
    DuplicateId(ItemId),
}

/// The authored collection of drill items for one lesson topic.
///
/// Pools are immutable once built and safe to share between sessions; every
/// session samples its own working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPool {
    items: Vec<DrillItem>,
}

impl ItemPool {
    /// Build a pool, checking that item ids are unique.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::DuplicateId` naming the first repeated id.
    pub fn new(items: Vec<DrillItem>) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id().clone()) {
                return Err(PoolError::DuplicateId(item.id().clone()));
            }
        }
        Ok(Self { items })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[DrillItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&DrillItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrillItem> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a ItemPool {
    type Item = &'a DrillItem;
    type IntoIter = std::slice::Iter<'a, DrillItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
