use redb::ReadableTable;
use serde::{de::DeserializeOwned, Serialize};

use super::{SavedPostStore, StoreResult};
use crate::db::{tables, Db};
use crate::models::{sort_newest_first, SavedPostRecord, SavedPostRow, User, UserRecord};

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Primary store backed by the embedded redb database
#[derive(Clone)]
pub struct RedbStore {
    db: Db,
}

impl RedbStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

impl SavedPostStore for RedbStore {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(tables::SAVED_POSTS)?;
        Ok(())
    }

    fn has_users(&self) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;
        let has_users = users.first()?.is_some();
        Ok(has_users)
    }

    fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;

        let record: Option<UserRecord> = users
            .get(user_id)?
            .map(|bytes| decode(bytes.value()))
            .transpose()?;

        Ok(record.map(|record| User::from_record(user_id, record)))
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        let bytes = encode(&user.to_record())?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(tables::USERS)?;
            users.insert(user.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;

        tracing::info!("User {} created", user.id);
        Ok(())
    }

    fn list_saved(&self, user_id: &str) -> StoreResult<Vec<SavedPostRecord>> {
        let read_txn = self.db.begin_read()?;
        let saved_posts = read_txn.open_table(tables::SAVED_POSTS)?;

        // (user_id, "") sorts before every post of that user
        let start: (&str, &str) = (user_id, "");
        let mut records = Vec::new();
        for entry in saved_posts.range(start..)? {
            let (key, value) = entry?;
            let (owner, post_id) = key.value();
            if owner != user_id {
                break;
            }
            let row: SavedPostRow = decode(value.value())?;
            records.push(SavedPostRecord::from_row(owner, post_id, row));
        }

        sort_newest_first(&mut records);
        Ok(records)
    }

    fn find_saved(&self, user_id: &str, post_id: &str) -> StoreResult<Option<SavedPostRecord>> {
        let read_txn = self.db.begin_read()?;
        let saved_posts = read_txn.open_table(tables::SAVED_POSTS)?;

        let row: Option<SavedPostRow> = saved_posts
            .get((user_id, post_id))?
            .map(|bytes| decode(bytes.value()))
            .transpose()?;

        Ok(row.map(|row| SavedPostRecord::from_row(user_id, post_id, row)))
    }

    fn insert_saved(&self, record: &SavedPostRecord) -> StoreResult<bool> {
        let bytes = encode(&record.to_row())?;
        let key = (record.user_id.as_str(), record.post_id.as_str());

        let write_txn = self.db.begin_write()?;
        {
            let mut saved_posts = write_txn.open_table(tables::SAVED_POSTS)?;

            // Uniqueness is checked inside the same write transaction
            if saved_posts.get(key)?.is_some() {
                return Ok(false);
            }

            saved_posts.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(true)
    }

    fn remove_saved(&self, user_id: &str, post_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut saved_posts = write_txn.open_table(tables::SAVED_POSTS)?;
            let removed = saved_posts.remove((user_id, post_id))?.is_some();
            removed
        };
        write_txn.commit()?;

        Ok(removed)
    }
}
