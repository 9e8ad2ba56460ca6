//! Saved-post operations shared by both storage tiers.
//!
//! Every rule (user existence, uniqueness, not-found) is evaluated against
//! whichever tier [`FailoverStore`] hands us, so the primary and the fallback
//! behave identically.

use crate::constants::ERR_MISSING_FIELDS;
use crate::error::{AppError, Result};
use crate::models::{SavedPostRecord, User};
use crate::store::{FailoverStore, StorageMode};

/// Input of [`SavedPostsController::create_saved`]
#[derive(Debug, Clone, Default)]
pub struct NewSavedPost {
    pub post_id: String,
    pub title: String,
    pub category: String,
    /// Lets the server create a user it has not seen yet
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone)]
pub struct SavedPostsController {
    store: FailoverStore,
}

impl SavedPostsController {
    pub fn new(store: FailoverStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &FailoverStore {
        &self.store
    }

    /// All saved posts of a user, newest first.
    ///
    /// An unknown user is only rejected when at least one user exists.
    pub async fn list_saved(&self, user_id: &str) -> Result<(Vec<SavedPostRecord>, StorageMode)> {
        let user_id = user_id.to_string();
        self.store
            .run("list_saved", move |store| {
                if store.find_user(&user_id)?.is_none() && store.has_users()? {
                    return Err(AppError::UserNotFound);
                }
                Ok(store.list_saved(&user_id)?)
            })
            .await
    }

    /// Save a post for a user, creating the user when an email is supplied
    pub async fn create_saved(
        &self,
        user_id: &str,
        new_post: NewSavedPost,
    ) -> Result<(SavedPostRecord, StorageMode)> {
        if user_id.trim().is_empty()
            || new_post.post_id.trim().is_empty()
            || new_post.title.trim().is_empty()
        {
            return Err(AppError::InvalidInput(ERR_MISSING_FIELDS.to_string()));
        }

        let user_id = user_id.to_string();
        let email = new_post
            .email
            .clone()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        let (record, mode) = self
            .store
            .run("create_saved", move |store| {
                if store.find_user(&user_id)?.is_none() {
                    let Some(email) = email.as_deref() else {
                        return Err(AppError::UnknownUserWithoutEmail);
                    };
                    store.insert_user(&User::new(
                        user_id.as_str(),
                        email,
                        new_post.display_name.clone(),
                    ))?;
                }

                let record = SavedPostRecord::new(
                    user_id.as_str(),
                    new_post.post_id.trim(),
                    new_post.title.as_str(),
                    new_post.category.as_str(),
                );
                if !store.insert_saved(&record)? {
                    return Err(AppError::AlreadySaved);
                }
                Ok(record)
            })
            .await?;

        tracing::info!(
            "Post {} saved for user {} ({})",
            record.post_id,
            record.user_id,
            mode.as_str()
        );
        Ok((record, mode))
    }

    /// Post ids are matched trimmed, the way `create_saved` stores them
    pub async fn delete_saved(&self, user_id: &str, post_id: &str) -> Result<StorageMode> {
        let (user_id, post_id) = (user_id.to_string(), post_id.trim().to_string());
        let ((), mode) = self
            .store
            .run("delete_saved", move |store| {
                if !store.remove_saved(&user_id, &post_id)? {
                    return Err(AppError::SavedPostNotFound);
                }
                Ok(())
            })
            .await?;
        Ok(mode)
    }

    pub async fn check_saved(&self, user_id: &str, post_id: &str) -> Result<(bool, StorageMode)> {
        let (user_id, post_id) = (user_id.to_string(), post_id.trim().to_string());
        self.store
            .run("check_saved", move |store| {
                Ok(store.find_saved(&user_id, &post_id)?.is_some())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn controller() -> SavedPostsController {
        SavedPostsController::new(FailoverStore::fallback_only(Arc::new(MemoryStore::new())))
    }

    fn new_post(post_id: &str, email: Option<&str>) -> NewSavedPost {
        NewSavedPost {
            post_id: post_id.to_string(),
            title: format!("Post {post_id}"),
            category: "Dreams".to_string(),
            email: email.map(str::to_string),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_save_conflicts_and_keeps_one_record() {
        let controller = controller();

        controller
            .create_saved("u1", new_post("101", Some("u1@example.com")))
            .await
            .unwrap();
        let second = controller
            .create_saved("u1", new_post("101", Some("u1@example.com")))
            .await;

        assert!(matches!(second, Err(AppError::AlreadySaved)));
        let (records, _) = controller.list_saved("u1").await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_without_email_is_rejected() {
        let controller = controller();
        let result = controller.create_saved("ghost", new_post("101", None)).await;
        assert!(matches!(result, Err(AppError::UnknownUserWithoutEmail)));
    }

    #[tokio::test]
    async fn test_blank_email_counts_as_missing() {
        let controller = controller();
        let result = controller
            .create_saved("ghost", new_post("101", Some("  ")))
            .await;
        assert!(matches!(result, Err(AppError::UnknownUserWithoutEmail)));
    }

    #[tokio::test]
    async fn test_missing_title_is_invalid_input() {
        let controller = controller();
        let mut post = new_post("101", Some("u1@example.com"));
        post.title = String::new();

        let result = controller.create_saved("u1", post).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_list_allows_any_user_while_no_users_exist() {
        let controller = controller();
        let (records, mode) = controller.list_saved("anyone").await.unwrap();
        assert!(records.is_empty());
        assert_eq!(mode, StorageMode::InMemory);

        controller
            .create_saved("u1", new_post("101", Some("u1@example.com")))
            .await
            .unwrap();

        let result = controller.list_saved("anyone").await;
        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_padded_post_id_can_be_checked_and_deleted() {
        let controller = controller();
        controller
            .create_saved("u1", new_post(" 101 ", Some("u1@example.com")))
            .await
            .unwrap();

        let (saved, _) = controller.check_saved("u1", " 101 ").await.unwrap();
        assert!(saved);
        let (saved, _) = controller.check_saved("u1", "101").await.unwrap();
        assert!(saved);

        controller.delete_saved("u1", " 101 ").await.unwrap();
        let (saved, _) = controller.check_saved("u1", "101").await.unwrap();
        assert!(!saved);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found_and_leaves_records() {
        let controller = controller();
        controller
            .create_saved("u1", new_post("101", Some("u1@example.com")))
            .await
            .unwrap();

        let result = controller.delete_saved("u1", "nonexistent").await;
        assert!(matches!(result, Err(AppError::SavedPostNotFound)));

        let (saved, _) = controller.check_saved("u1", "101").await.unwrap();
        assert!(saved);
    }
}
