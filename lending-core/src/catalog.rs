//! Catalog and stock ledger
//!
//! The catalog owns title records; the stock ledger owns per-branch copy
//! counts and is the single source of truth for "is a copy available."
//!
//! Each (title, branch) pair is an independent mutual-exclusion domain:
//! all counter mutation happens under that key's map entry lock, so
//! reservations are linearizable per key and operations on different
//! keys never contend.

use crate::error::StockError;
use crate::types::{BranchId, StockKey, StockRecord, Title, TitleId, TitleUpdate};
use dashmap::DashMap;

/// Title catalog
#[derive(Debug, Default)]
pub struct Catalog {
    titles: DashMap<TitleId, Title>,
}

impl Catalog {
    /// Create empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a title record
    pub fn add_title(&self, title: Title) {
        self.titles.insert(title.id.clone(), title);
    }

    /// Apply an explicit edit; returns the updated record
    pub fn edit_title(&self, id: &TitleId, update: TitleUpdate) -> Option<Title> {
        let mut entry = self.titles.get_mut(id)?;
        if let Some(name) = update.name {
            entry.name = name;
        }
        if let Some(author) = update.author {
            entry.author = author;
        }
        if let Some(publisher) = update.publisher {
            entry.publisher = publisher;
        }
        if let Some(year) = update.year {
            entry.year = year;
        }
        if let Some(category) = update.category {
            entry.category = category;
        }
        if let Some(description) = update.description {
            entry.description = Some(description);
        }
        Some(entry.clone())
    }

    /// Get a title by id
    pub fn get_title(&self, id: &TitleId) -> Option<Title> {
        self.titles.get(id).map(|t| t.clone())
    }

    /// All titles (for the catalog page projection)
    pub fn list_titles(&self) -> Vec<Title> {
        self.titles.iter().map(|t| t.clone()).collect()
    }

    /// Number of catalogued titles
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// True if no titles are catalogued
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Per-branch copy counts, keyed by (title, branch)
#[derive(Debug, Default)]
pub struct StockLedger {
    records: DashMap<StockKey, StockRecord>,
}

impl StockLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve one copy for a borrow
    ///
    /// Atomic per key: two concurrent reservations against the last
    /// remaining copy cannot both succeed.
    pub fn reserve_copy(
        &self,
        title_id: &TitleId,
        branch_id: &BranchId,
    ) -> Result<(), StockError> {
        let key = StockKey::new(title_id.clone(), branch_id.clone());
        let mut record = self.records.get_mut(&key).ok_or_else(|| StockError::NotFound {
            title_id: title_id.clone(),
            branch_id: branch_id.clone(),
        })?;

        if record.available_copies == 0 {
            return Err(StockError::Unavailable {
                title_id: title_id.clone(),
                branch_id: branch_id.clone(),
            });
        }

        record.available_copies -= 1;
        Ok(())
    }

    /// Release one copy after a return
    ///
    /// An increment past `total_copies` signals a bug upstream; it is
    /// rejected as `Inconsistent` and never applied.
    pub fn release_copy(
        &self,
        title_id: &TitleId,
        branch_id: &BranchId,
    ) -> Result<(), StockError> {
        let key = StockKey::new(title_id.clone(), branch_id.clone());
        let mut record = self.records.get_mut(&key).ok_or_else(|| StockError::NotFound {
            title_id: title_id.clone(),
            branch_id: branch_id.clone(),
        })?;

        if record.available_copies >= record.total_copies {
            return Err(StockError::Inconsistent {
                key: key.clone(),
                detail: format!(
                    "release would exceed total: available={} total={}",
                    record.available_copies, record.total_copies
                ),
            });
        }

        record.available_copies += 1;
        Ok(())
    }

    /// Administrative restock: adjust total and available together
    ///
    /// A positive delta on an unknown key creates the record. A negative
    /// delta may not reduce the total below the number of currently
    /// borrowed copies, and may not drive either counter negative.
    pub fn restock(
        &self,
        title_id: &TitleId,
        branch_id: &BranchId,
        delta: i64,
    ) -> Result<StockRecord, StockError> {
        let key = StockKey::new(title_id.clone(), branch_id.clone());

        if delta >= 0 {
            let delta = delta as u32;
            let mut record = self.records.entry(key).or_insert(StockRecord {
                total_copies: 0,
                available_copies: 0,
            });
            record.total_copies += delta;
            record.available_copies += delta;
            return Ok(*record);
        }

        let removed = (-delta) as u32;
        let mut record = self.records.get_mut(&key).ok_or_else(|| StockError::NotFound {
            title_id: title_id.clone(),
            branch_id: branch_id.clone(),
        })?;

        if removed > record.available_copies {
            return Err(StockError::Inconsistent {
                key: key.clone(),
                detail: format!(
                    "cannot remove {} copies: only {} on the shelf ({} borrowed)",
                    removed,
                    record.available_copies,
                    record.borrowed_copies()
                ),
            });
        }

        record.total_copies -= removed;
        record.available_copies -= removed;
        Ok(*record)
    }

    /// Current counts for one (title, branch) pair
    pub fn get(&self, title_id: &TitleId, branch_id: &BranchId) -> Option<StockRecord> {
        let key = StockKey::new(title_id.clone(), branch_id.clone());
        self.records.get(&key).map(|r| *r)
    }

    /// All stock records (for the stock page projection)
    pub fn list(&self) -> Vec<(StockKey, StockRecord)> {
        self.records
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key_parts() -> (TitleId, BranchId) {
        (TitleId::new("BK001"), BranchId::new("CB01"))
    }

    #[test]
    fn test_reserve_and_release_round_trip() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        ledger.restock(&title, &branch, 2).unwrap();

        ledger.reserve_copy(&title, &branch).unwrap();
        assert_eq!(ledger.get(&title, &branch).unwrap().available_copies, 1);

        ledger.release_copy(&title, &branch).unwrap();
        assert_eq!(ledger.get(&title, &branch).unwrap().available_copies, 2);
    }

    #[test]
    fn test_reserve_unknown_key() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        assert!(matches!(
            ledger.reserve_copy(&title, &branch),
            Err(StockError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reserve_exhausted_stock() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        ledger.restock(&title, &branch, 1).unwrap();

        ledger.reserve_copy(&title, &branch).unwrap();
        assert!(matches!(
            ledger.reserve_copy(&title, &branch),
            Err(StockError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_release_past_total_is_inconsistent() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        ledger.restock(&title, &branch, 1).unwrap();

        let err = ledger.release_copy(&title, &branch).unwrap_err();
        assert!(matches!(err, StockError::Inconsistent { .. }));
        // The bad increment was not applied
        assert_eq!(ledger.get(&title, &branch).unwrap().available_copies, 1);
    }

    #[test]
    fn test_restock_negative_delta_respects_borrowed_copies() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        ledger.restock(&title, &branch, 3).unwrap();
        ledger.reserve_copy(&title, &branch).unwrap();
        ledger.reserve_copy(&title, &branch).unwrap();

        // 1 on the shelf, 2 borrowed: removing 2 would strand a borrow
        assert!(matches!(
            ledger.restock(&title, &branch, -2),
            Err(StockError::Inconsistent { .. })
        ));

        let rec = ledger.restock(&title, &branch, -1).unwrap();
        assert_eq!(rec.total_copies, 2);
        assert_eq!(rec.available_copies, 0);
    }

    #[test]
    fn test_restock_negative_unknown_key() {
        let ledger = StockLedger::new();
        let (title, branch) = key_parts();
        assert!(matches!(
            ledger.restock(&title, &branch, -1),
            Err(StockError::NotFound { .. })
        ));
    }

    #[test]
    fn test_catalog_edit() {
        let catalog = Catalog::new();
        let id = TitleId::new("BK001");
        catalog.add_title(Title {
            id: id.clone(),
            isbn: "978-602-03-1234-5".to_string(),
            name: "Laskar Pelangi".to_string(),
            author: "Andrea Hirata".to_string(),
            publisher: "Bentang Pustaka".to_string(),
            year: 2005,
            category: "Fiksi".to_string(),
            description: None,
            created_at: Utc::now(),
        });

        let updated = catalog
            .edit_title(
                &id,
                TitleUpdate {
                    category: Some("Novel".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.category, "Novel");
        assert_eq!(updated.name, "Laskar Pelangi");

        assert!(catalog
            .edit_title(&TitleId::new("BK999"), TitleUpdate::default())
            .is_none());
    }
}
