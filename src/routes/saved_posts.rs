use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::ERR_MISSING_FIELDS;
use crate::controller::NewSavedPost;
use crate::error::{AppError, Result};
use crate::models::{optional_id_from_string_or_number, SavedPostRecord, User};
use crate::store::StorageMode;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePostRequest {
    /// Older clients post the whole post object, whose id field is `id`
    #[serde(default, alias = "id", deserialize_with = "optional_id_from_string_or_number")]
    pub post_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostsListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<SavedPostRecord>,
    pub storage_mode: StorageMode,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostResponse {
    pub success: bool,
    pub data: SavedPostRecord,
    pub message: String,
    pub storage_mode: StorageMode,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsavePostResponse {
    pub success: bool,
    pub message: String,
    pub storage_mode: StorageMode,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSavedResponse {
    pub success: bool,
    pub is_saved: bool,
    pub storage_mode: StorageMode,
    pub timestamp: String,
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if !User::validate_id(user_id) {
        tracing::warn!("Invalid user ID format: {:?}", user_id);
        return Err(AppError::InvalidInput("Invalid user ID format".to_string()));
    }
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// List a user's saved posts, newest first
///
/// GET /api/saved-posts/:userId
pub async fn list_saved_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SavedPostsListResponse>> {
    validate_user_id(&user_id)?;

    let (data, storage_mode) = state.controller.list_saved(&user_id).await?;

    tracing::debug!("Listed {} saved posts for user {}", data.len(), user_id);

    Ok(Json(SavedPostsListResponse {
        success: true,
        count: data.len(),
        data,
        storage_mode,
        timestamp: now_rfc3339(),
    }))
}

/// Save a post for a user
///
/// POST /api/saved-posts/:userId
///
/// Returns 201 with the new record, 400 if fields are missing or the post is
/// already saved, 404 if the user is unknown and no email was supplied.
pub async fn save_post(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<SavePostRequest>,
) -> Result<(StatusCode, Json<SavedPostResponse>)> {
    validate_user_id(&user_id)?;

    let (Some(post_id), Some(title)) = (payload.post_id, payload.title) else {
        return Err(AppError::InvalidInput(ERR_MISSING_FIELDS.to_string()));
    };

    let new_post = NewSavedPost {
        post_id,
        title,
        category: payload.category.unwrap_or_default(),
        email: payload.email,
        display_name: payload.display_name,
    };

    let (data, storage_mode) = state.controller.create_saved(&user_id, new_post).await?;

    Ok((
        StatusCode::CREATED,
        Json(SavedPostResponse {
            success: true,
            data,
            message: "Post saved successfully".to_string(),
            storage_mode,
            timestamp: now_rfc3339(),
        }),
    ))
}

/// Remove a post from a user's saved list
///
/// DELETE /api/saved-posts/:userId/:postId
pub async fn unsave_post(
    State(state): State<AppState>,
    Path((user_id, post_id)): Path<(String, String)>,
) -> Result<Json<UnsavePostResponse>> {
    validate_user_id(&user_id)?;

    let storage_mode = state.controller.delete_saved(&user_id, &post_id).await?;

    tracing::info!("Post {} unsaved for user {}", post_id, user_id);

    Ok(Json(UnsavePostResponse {
        success: true,
        message: "Post unsaved successfully".to_string(),
        storage_mode,
        timestamp: now_rfc3339(),
    }))
}

/// Check whether a user saved a post
///
/// GET /api/saved-posts/:userId/:postId
pub async fn check_saved_post(
    State(state): State<AppState>,
    Path((user_id, post_id)): Path<(String, String)>,
) -> Result<Json<CheckSavedResponse>> {
    validate_user_id(&user_id)?;

    let (is_saved, storage_mode) = state.controller.check_saved(&user_id, &post_id).await?;

    Ok(Json(CheckSavedResponse {
        success: true,
        is_saved,
        storage_mode,
        timestamp: now_rfc3339(),
    }))
}
