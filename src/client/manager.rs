use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use super::api::{ClientError, SavedPostsApi};
use super::cache::{self, CacheError, FileCache, LocalCache};
use super::notify::{Notification, NotificationKind, Notifier};
use super::session::Session;
use crate::config::ClientConfig;
use crate::constants::ANONYMOUS_USER_ID;
use crate::models::{Post, SavedPostRecord, StorageOrigin, SyncState};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not signed in")]
    SignedOut,
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Outcome of a reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Pending saves the server accepted
    pub pushed: usize,
    /// Pending deletes the server applied
    pub removed: usize,
    /// Pending changes the server refused
    pub conflicts: usize,
    /// Pending changes left for a later pass
    pub remaining: usize,
}

/// Why a toggle was applied to the local mirror only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfflineReason {
    SignedOut,
    Unreachable,
    RemoteFailed,
}

impl OfflineReason {
    fn notification(self, action: &str) -> (NotificationKind, String) {
        match self {
            OfflineReason::SignedOut => (
                NotificationKind::Warning,
                format!("Post {action} locally (offline). Log in to sync your saved posts."),
            ),
            OfflineReason::Unreachable => (
                NotificationKind::Warning,
                format!("Server unreachable. Post {action} locally (offline)."),
            ),
            OfflineReason::RemoteFailed => (
                NotificationKind::Info,
                format!("Could not sync with the server, using local data. Post {action} locally (offline)."),
            ),
        }
    }
}

/// Manager shared between tasks; the mutex serialises toggles
pub type SharedSavedPosts = Arc<Mutex<SavedPostsManager>>;

/// Client-side owner of the user's saved posts.
///
/// Keeps an in-memory mirror of the saved-post records and a copy of it in
/// the local cache, and hides whether a change reached the server or was only
/// applied on this device. Every mutation rewrites the cache before the
/// mirror, so both always hold the same records.
pub struct SavedPostsManager {
    api: SavedPostsApi,
    cache: Arc<dyn LocalCache>,
    session: Option<Session>,
    mirror: Vec<SavedPostRecord>,
    notifier: Notifier,
    probe_timeout: Duration,
}

impl SavedPostsManager {
    /// Create a manager, restoring the mirror from the cache
    pub fn new(api: SavedPostsApi, cache: Arc<dyn LocalCache>, probe_timeout: Duration) -> Self {
        let mirror = match cache::load_records(cache.as_ref()) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved-posts cache: {}", e);
                Vec::new()
            }
        };

        Self {
            api,
            cache,
            session: None,
            mirror,
            notifier: Notifier::default(),
            probe_timeout,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, SyncError> {
        let api = SavedPostsApi::new(&config.api_base_url)?;
        let cache = Arc::new(FileCache::new(&config.cache_dir)?);
        Ok(Self::new(api, cache, config.health_probe_timeout()))
    }

    pub fn into_shared(self) -> SharedSavedPosts {
        Arc::new(Mutex::new(self))
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Make `session` the current user.
    ///
    /// Records of any other signed-in user are dropped from the mirror and
    /// the cache; records saved anonymously stay and are synced later.
    pub fn sign_in(&mut self, session: Session) -> Result<(), SyncError> {
        tracing::info!("Signed in as {}", session.user_id);

        let owned_by = |record: &SavedPostRecord| {
            record.user_id == session.user_id || record.user_id == ANONYMOUS_USER_ID
        };
        if !self.mirror.iter().all(owned_by) {
            tracing::info!("Dropping cached saved posts of a previous user");
            let records = self.mirror.iter().filter(|r| owned_by(r)).cloned().collect();
            self.commit(records)?;
        }

        self.session = Some(session);
        Ok(())
    }

    /// Forget the session together with its saved posts
    pub fn sign_out(&mut self) -> Result<(), SyncError> {
        if let Some(session) = self.session.take() {
            tracing::info!("Signed out {}", session.user_id);
        }
        self.commit(Vec::new())?;
        Ok(())
    }

    /// Whether the post is saved for the current user, as far as this device knows
    pub fn is_saved(&self, post_id: &str) -> bool {
        let post_id = post_id.trim();
        self.saved_posts().any(|record| record.post_id == post_id)
    }

    /// Records of the current user that count as saved, in mirror order
    pub fn saved_posts(&self) -> impl Iterator<Item = &SavedPostRecord> {
        self.mirror
            .iter()
            .filter(move |record| self.owns(record) && record.counts_as_saved())
    }

    /// Signed out, every cached record is shown
    fn owns(&self, record: &SavedPostRecord) -> bool {
        match &self.session {
            Some(session) => {
                record.user_id == session.user_id || record.user_id == ANONYMOUS_USER_ID
            }
            None => true,
        }
    }

    /// Every mirrored record, including pending deletes
    pub fn records(&self) -> &[SavedPostRecord] {
        &self.mirror
    }

    pub fn has_pending_changes(&self) -> bool {
        self.mirror.iter().any(|record| record.sync_state.is_pending())
    }

    /// The toast currently on screen
    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifier.last()
    }

    pub fn dismiss_notification(&mut self) {
        self.notifier.dismiss();
    }

    /// Save the post if it is not saved, unsave it otherwise.
    ///
    /// Returns the new saved state. Remote trouble never fails the call: the
    /// change is applied locally and reconciled later.
    pub async fn toggle_save(&mut self, post: &Post) -> Result<bool, SyncError> {
        if !post.has_id() {
            self.notifier
                .show("Error: Cannot save invalid post", NotificationKind::Error);
            return Err(SyncError::InvalidInput("post has no id".to_string()));
        }
        // The server stores post ids trimmed
        let post = &Post {
            id: post.id.trim().to_string(),
            ..post.clone()
        };

        let Some(session) = self.session.clone() else {
            let target = !self.is_saved(&post.id);
            return self.apply_locally(post, ANONYMOUS_USER_ID, target, OfflineReason::SignedOut);
        };

        if let Err(e) = self.api.health(self.probe_timeout).await {
            tracing::warn!("Health probe failed, switching to local-only mode: {}", e);
            let target = !self.is_saved(&post.id);
            return self.apply_locally(post, &session.user_id, target, OfflineReason::Unreachable);
        }

        // Decide after the probe; the mirror may have changed meanwhile
        let target = !self.is_saved(&post.id);
        let outcome = if target {
            self.api
                .save(&session, &post.id, &post.title, &post.category)
                .await
                .map(Some)
        } else {
            self.api.unsave(&session, &post.id).await.map(|()| None)
        };

        match outcome {
            Ok(record) => self.apply_remote(post, &session, target, record),
            // The server is already in the target state
            Err(e) if target && e.is_already_saved() => {
                self.apply_remote(post, &session, target, None)
            }
            Err(e) if !target && e.is_saved_post_not_found() => {
                self.apply_remote(post, &session, target, None)
            }
            Err(e) => {
                tracing::warn!("Remote update of post {} failed: {}", post.id, e);
                self.apply_locally(post, &session.user_id, target, OfflineReason::RemoteFailed)
            }
        }
    }

    /// Replace the mirror with the server's list, keeping unsynced local changes.
    ///
    /// Falls back to the cached records when the server cannot be reached.
    pub async fn refresh_saved_posts(&mut self) -> Result<(), SyncError> {
        let Some(session) = self.session.clone() else {
            self.mirror = cache::load_records(self.cache.as_ref())?;
            return Ok(());
        };

        if self.has_pending_changes() {
            if let Err(e) = self.sync_pending().await {
                tracing::warn!("Could not push pending saved-post changes: {}", e);
            }
        }

        match self.api.list(&session).await {
            Ok(mut records) => {
                for local in self.mirror.iter().filter(|r| !r.sync_state.is_synced()) {
                    records.retain(|r| r.post_id != local.post_id);
                    records.push(local.clone());
                }
                self.commit(records)?;
                tracing::info!("Refreshed {} saved posts from the server", self.mirror.len());
                self.notifier
                    .show("Posts refreshed from server", NotificationKind::Success);
            }
            Err(e) => {
                tracing::warn!("Refreshing saved posts failed: {}", e);
                match cache::load_records(self.cache.as_ref()) {
                    Ok(records) => self.mirror = records,
                    Err(ce) => tracing::error!("Error reading saved posts from cache: {}", ce),
                }
                self.notifier.show(
                    "Using locally saved posts (offline mode)",
                    NotificationKind::Warning,
                );
            }
        }

        Ok(())
    }

    /// Replay pending local changes against the server.
    ///
    /// Records saved while signed out are handed to the signed-in user.
    /// Stops at the first transport failure; what is left stays pending.
    pub async fn sync_pending(&mut self) -> Result<SyncReport, SyncError> {
        let session = self.session.clone().ok_or(SyncError::SignedOut)?;
        self.api.health(self.probe_timeout).await?;

        let mut report = SyncReport::default();
        let mut next = Vec::with_capacity(self.mirror.len());
        let mut reachable = true;

        for mut record in self.mirror.clone() {
            if !reachable || !record.sync_state.is_pending() {
                if record.sync_state.is_pending() {
                    report.remaining += 1;
                }
                next.push(record);
                continue;
            }

            match record.sync_state {
                SyncState::PendingSave => {
                    if record.user_id == ANONYMOUS_USER_ID {
                        record.user_id = session.user_id.clone();
                    }

                    match self
                        .api
                        .save(&session, &record.post_id, &record.title, &record.category)
                        .await
                    {
                        Ok(saved) => {
                            report.pushed += 1;
                            next.push(saved);
                        }
                        Err(e) if e.is_already_saved() => {
                            report.pushed += 1;
                            record.storage_origin = StorageOrigin::Remote;
                            record.sync_state = SyncState::Synced;
                            next.push(record);
                        }
                        Err(e) if e.is_user_not_found() => {
                            tracing::warn!(
                                "Server cannot create user {} for saved post {}: {}",
                                session.user_id,
                                record.post_id,
                                e
                            );
                            report.conflicts += 1;
                            record.sync_state = SyncState::Conflict;
                            next.push(record);
                        }
                        Err(e) if e.is_rejection() => {
                            tracing::warn!("Server refused saved post {}: {}", record.post_id, e);
                            report.conflicts += 1;
                            record.sync_state = SyncState::Conflict;
                            next.push(record);
                        }
                        Err(e) => {
                            tracing::warn!("Sync interrupted: {}", e);
                            reachable = false;
                            report.remaining += 1;
                            next.push(record);
                        }
                    }
                }
                SyncState::PendingDelete => {
                    match self.api.unsave(&session, &record.post_id).await {
                        Ok(()) => report.removed += 1,
                        Err(e) if e.is_saved_post_not_found() => report.removed += 1,
                        Err(e) if e.is_rejection() => {
                            tracing::warn!("Server refused unsave of {}: {}", record.post_id, e);
                            report.conflicts += 1;
                            record.sync_state = SyncState::Conflict;
                            next.push(record);
                        }
                        Err(e) => {
                            tracing::warn!("Sync interrupted: {}", e);
                            reachable = false;
                            report.remaining += 1;
                            next.push(record);
                        }
                    }
                }
                SyncState::Synced | SyncState::Conflict => next.push(record),
            }
        }

        self.commit(next)?;

        tracing::info!("Saved-post sync finished: {:?}", report);
        if report.pushed + report.removed > 0 {
            self.notifier.show(
                format!(
                    "Synced {} offline change(s) with the server",
                    report.pushed + report.removed
                ),
                NotificationKind::Success,
            );
        }

        Ok(report)
    }

    /// Persist `records`, then make them the mirror
    fn commit(&mut self, records: Vec<SavedPostRecord>) -> Result<(), CacheError> {
        cache::store_records(self.cache.as_ref(), &records)?;
        self.mirror = records;
        Ok(())
    }

    fn apply_remote(
        &mut self,
        post: &Post,
        session: &Session,
        target: bool,
        record: Option<SavedPostRecord>,
    ) -> Result<bool, SyncError> {
        let mut records = self.mirror.clone();
        records.retain(|r| r.post_id != post.id);

        if target {
            let mut record = record.unwrap_or_else(|| SavedPostRecord {
                id: None,
                ..SavedPostRecord::new(
                    session.user_id.as_str(),
                    post.id.as_str(),
                    post.title.as_str(),
                    post.category.as_str(),
                )
            });
            record.storage_origin = StorageOrigin::Remote;
            record.sync_state = SyncState::Synced;
            records.push(record);

            self.commit(records)?;
            self.notifier
                .show("Post saved successfully", NotificationKind::Success);
        } else {
            self.commit(records)?;
            self.notifier
                .show("Post removed from saved items", NotificationKind::Info);
        }

        Ok(target)
    }

    fn apply_locally(
        &mut self,
        post: &Post,
        user_id: &str,
        target: bool,
        reason: OfflineReason,
    ) -> Result<bool, SyncError> {
        if self.is_saved(&post.id) == target {
            tracing::debug!("Post {} already in the requested state", post.id);
            return Ok(target);
        }

        let mut records = self.mirror.clone();
        let existing = records.iter().position(|r| r.post_id == post.id);

        if target {
            match existing {
                // Unsaved offline but never deleted on the server
                Some(index) => records[index].sync_state = SyncState::Synced,
                None => records.push(SavedPostRecord::local(
                    user_id,
                    post.id.as_str(),
                    post.title.as_str(),
                    post.category.as_str(),
                )),
            }
        } else if let Some(index) = existing {
            match records[index].sync_state {
                SyncState::Synced => records[index].sync_state = SyncState::PendingDelete,
                SyncState::PendingSave | SyncState::Conflict | SyncState::PendingDelete => {
                    records.remove(index);
                }
            }
        }

        self.commit(records)?;

        let (kind, message) = reason.notification(if target { "saved" } else { "removed" });
        self.notifier.show(message, kind);

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryCache;

    fn offline_manager(cache: Arc<MemoryCache>) -> SavedPostsManager {
        // Never contacted while signed out
        let api = SavedPostsApi::new("http://127.0.0.1:9").unwrap();
        SavedPostsManager::new(api, cache, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_invalid_post_is_rejected_with_error_notification() {
        let mut manager = offline_manager(Arc::new(MemoryCache::new()));

        let result = manager.toggle_save(&Post::new("", "No id", "")).await;

        assert!(matches!(result, Err(SyncError::InvalidInput(_))));
        assert_eq!(
            manager.last_notification().unwrap().kind,
            NotificationKind::Error
        );
        assert!(manager.records().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_toggle_is_local_with_warning() {
        let cache = Arc::new(MemoryCache::new());
        let mut manager = offline_manager(cache.clone());

        let saved = manager
            .toggle_save(&Post::new("101", "X", "Dreams"))
            .await
            .unwrap();

        assert!(saved);
        assert!(manager.is_saved("101"));

        let record = &manager.records()[0];
        assert_eq!(record.user_id, ANONYMOUS_USER_ID);
        assert_eq!(record.storage_origin, StorageOrigin::Local);
        assert_eq!(record.sync_state, SyncState::PendingSave);

        let notification = manager.last_notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Warning);
        assert!(notification.message.contains("Log in"));

        assert_eq!(cache::load_records(cache.as_ref()).unwrap(), manager.records());
    }

    #[tokio::test]
    async fn test_local_unsave_of_synced_record_marks_pending_delete() {
        let cache = Arc::new(MemoryCache::new());
        let synced = SavedPostRecord::new("u1", "101", "X", "");
        cache::store_records(cache.as_ref(), &[synced]).unwrap();

        let mut manager = offline_manager(cache.clone());
        assert!(manager.is_saved("101"));

        let saved = manager
            .toggle_save(&Post::new("101", "X", ""))
            .await
            .unwrap();
        assert!(!saved);
        assert!(!manager.is_saved("101"));
        assert_eq!(manager.records()[0].sync_state, SyncState::PendingDelete);

        // Saving again offline restores the synced record instead of duplicating it
        let saved = manager
            .toggle_save(&Post::new("101", "X", ""))
            .await
            .unwrap();
        assert!(saved);
        assert_eq!(manager.records().len(), 1);
        assert_eq!(manager.records()[0].sync_state, SyncState::Synced);
    }

    #[tokio::test]
    async fn test_local_unsave_of_pending_save_drops_record() {
        let cache = Arc::new(MemoryCache::new());
        let mut manager = offline_manager(cache.clone());
        let post = Post::new("101", "X", "");

        manager.toggle_save(&post).await.unwrap();
        manager.toggle_save(&post).await.unwrap();

        assert!(manager.records().is_empty());
        assert!(cache::load_records(cache.as_ref()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_cache_starts_empty() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set(crate::constants::SAVED_POSTS_CACHE_KEY, "not json")
            .unwrap();

        let manager = offline_manager(cache);
        assert!(manager.records().is_empty());
    }

    #[test]
    fn test_from_config_uses_file_cache() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ClientConfig {
            api_base_url: "http://localhost:8080".to_string(),
            health_probe_timeout_ms: 250,
            cache_dir: temp_dir.path().join("cache").to_string_lossy().to_string(),
        };

        let manager = SavedPostsManager::from_config(&config).unwrap();
        assert_eq!(manager.probe_timeout, Duration::from_millis(250));
        assert!(temp_dir.path().join("cache").is_dir());

        let config = ClientConfig {
            api_base_url: "localhost:8080".to_string(),
            ..config
        };
        assert!(matches!(
            SavedPostsManager::from_config(&config),
            Err(SyncError::Client(ClientError::InvalidConfiguration(_)))
        ));
    }

    #[tokio::test]
    async fn test_sync_pending_requires_session() {
        let mut manager = offline_manager(Arc::new(MemoryCache::new()));
        assert!(matches!(
            manager.sync_pending().await,
            Err(SyncError::SignedOut)
        ));
    }
}
