use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{id_from_string_or_number, millis_to_datetime};

/// Where a saved-post record currently lives from the client's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageOrigin {
    #[default]
    Remote,
    Local,
}

/// Reconciliation state of a cached record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    /// Matches the server
    #[default]
    Synced,
    /// Saved locally, not yet accepted by the server
    PendingSave,
    /// Removed locally, still present on the server
    PendingDelete,
    /// The server refused the pending change; kept for the user to see
    Conflict,
}

impl SyncState {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncState::Synced)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SyncState::PendingSave | SyncState::PendingDelete)
    }
}

/// The association between a user and a post they bookmarked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostRecord {
    /// Server-side document id; absent for records only saved locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub post_id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub storage_origin: StorageOrigin,
    #[serde(default, skip_serializing_if = "SyncState::is_synced")]
    pub sync_state: SyncState,
}

impl SavedPostRecord {
    /// A new server-side record with a fresh time-ordered id
    pub fn new(
        user_id: impl Into<String>,
        post_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(Uuid::now_v7().to_string()),
            user_id: user_id.into(),
            post_id: post_id.into(),
            title: title.into(),
            category: category.into(),
            saved_at: Utc::now(),
            storage_origin: StorageOrigin::Remote,
            sync_state: SyncState::Synced,
        }
    }

    /// A record saved on this device only, waiting to be pushed
    pub fn local(
        user_id: impl Into<String>,
        post_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            storage_origin: StorageOrigin::Local,
            sync_state: SyncState::PendingSave,
            ..Self::new(user_id, post_id, title, category)
        }
    }

    pub fn matches(&self, user_id: &str, post_id: &str) -> bool {
        self.user_id == user_id && self.post_id == post_id
    }

    /// Whether this record makes its post count as saved
    pub fn counts_as_saved(&self) -> bool {
        self.sync_state != SyncState::PendingDelete
    }

    pub fn to_row(&self) -> SavedPostRow {
        SavedPostRow {
            id: self.id.clone().unwrap_or_else(|| Uuid::now_v7().to_string()),
            title: self.title.clone(),
            category: self.category.clone(),
            saved_at: self.saved_at.timestamp_millis(),
        }
    }

    pub fn from_row(user_id: &str, post_id: &str, row: SavedPostRow) -> Self {
        Self {
            id: Some(row.id),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            title: row.title,
            category: row.category,
            saved_at: millis_to_datetime(row.saved_at),
            storage_origin: StorageOrigin::Remote,
            sync_state: SyncState::Synced,
        }
    }
}

/// Saved-post row stored in redb under the `(user_id, post_id)` key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPostRow {
    pub id: String,
    pub title: String,
    pub category: String,
    /// When the post was saved (Unix milliseconds)
    pub saved_at: i64,
}

/// Newest first; ties broken by id so listings are stable
pub fn sort_newest_first(records: &mut [SavedPostRecord]) {
    records.sort_by(|a, b| {
        b.saved_at
            .cmp(&a.saved_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
