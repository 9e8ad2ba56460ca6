use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id_from_string_or_number;

/// A shared thought. Owned by the post-creation flow; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Minimal post carrying only what the saved list needs
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            category: category.into(),
            author_id: None,
            is_anonymous: false,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    /// A post can only be saved when it carries an id
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
