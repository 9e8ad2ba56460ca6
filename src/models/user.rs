use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::millis_to_datetime;

/// User record stored in redb
/// Uses Unix milliseconds for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub display_name: String,
    /// When the user was created (Unix milliseconds)
    pub created_at: i64,
}

/// User model for API responses and the in-memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user that was first seen on a save request
    pub fn new(id: impl Into<String>, email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    /// Validate a user ID received in a request path
    pub fn validate_id(id: &str) -> bool {
        let id = id.trim();
        !id.is_empty() && id.len() <= 128 && !id.chars().any(char::is_control)
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at.timestamp_millis(),
        }
    }

    pub fn from_record(id: &str, record: UserRecord) -> Self {
        Self {
            id: id.to_string(),
            email: record.email,
            display_name: record.display_name,
            created_at: millis_to_datetime(record.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        // Firebase-style uid
        assert!(User::validate_id("nQ3b2fK9xTQaYp1Lr7cZ0vW8mE42"));

        // Empty or blank
        assert!(!User::validate_id(""));
        assert!(!User::validate_id("   "));

        // Too long
        assert!(!User::validate_id(&"a".repeat(129)));

        // Control characters
        assert!(!User::validate_id("user\n1"));
    }

    #[test]
    fn test_user_record_round_trip_keeps_millis() {
        let user = User::new("uid-1", "ada@example.com", Some("Ada".to_string()));
        let restored = User::from_record("uid-1", user.to_record());

        assert_eq!(restored.email, "ada@example.com");
        assert_eq!(restored.display_name, "Ada");
        assert_eq!(
            restored.created_at.timestamp_millis(),
            user.created_at.timestamp_millis()
        );
    }
}
