use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{SavedPostStore, StoreError, StoreResult};
use crate::models::{sort_newest_first, SavedPostRecord, User};

#[derive(Debug, Default)]
struct MemoryTables {
    users: Vec<User>,
    saved_posts: Vec<SavedPostRecord>,
}

/// Process-local fallback store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryTables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryTables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl SavedPostStore for MemoryStore {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    fn has_users(&self) -> StoreResult<bool> {
        Ok(!self.read()?.users.is_empty())
    }

    fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.write()?;
        match tables.users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => tables.users.push(user.clone()),
        }
        Ok(())
    }

    fn list_saved(&self, user_id: &str) -> StoreResult<Vec<SavedPostRecord>> {
        let mut records: Vec<SavedPostRecord> = self
            .read()?
            .saved_posts
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();

        sort_newest_first(&mut records);
        Ok(records)
    }

    fn find_saved(&self, user_id: &str, post_id: &str) -> StoreResult<Option<SavedPostRecord>> {
        Ok(self
            .read()?
            .saved_posts
            .iter()
            .find(|record| record.matches(user_id, post_id))
            .cloned())
    }

    fn insert_saved(&self, record: &SavedPostRecord) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables
            .saved_posts
            .iter()
            .any(|existing| existing.matches(&record.user_id, &record.post_id))
        {
            return Ok(false);
        }

        tables.saved_posts.push(record.clone());
        Ok(true)
    }

    fn remove_saved(&self, user_id: &str, post_id: &str) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let before = tables.saved_posts.len();
        tables
            .saved_posts
            .retain(|record| !record.matches(user_id, post_id));
        Ok(tables.saved_posts.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_has_no_users() {
        let store = MemoryStore::new();
        assert!(!store.has_users().unwrap());
        assert!(store.list_saved("anyone").unwrap().is_empty());
    }

    #[test]
    fn test_insert_saved_is_unique_per_pair() {
        let store = MemoryStore::new();
        let record = SavedPostRecord::new("u1", "101", "X", "");

        assert!(store.insert_saved(&record).unwrap());
        assert!(!store.insert_saved(&record).unwrap());
        // Same post, different user is fine
        assert!(store
            .insert_saved(&SavedPostRecord::new("u2", "101", "X", ""))
            .unwrap());

        assert_eq!(store.list_saved("u1").unwrap().len(), 1);
        assert_eq!(store.list_saved("u2").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_leaves_records_untouched() {
        let store = MemoryStore::new();
        store
            .insert_saved(&SavedPostRecord::new("u1", "101", "X", ""))
            .unwrap();

        assert!(!store.remove_saved("u1", "nonexistent").unwrap());
        assert!(store.find_saved("u1", "101").unwrap().is_some());
    }
}
