pub mod post;
pub mod saved_post;
pub mod user;

pub use post::Post;
pub use saved_post::{sort_newest_first, SavedPostRecord, SavedPostRow, StorageOrigin, SyncState};
pub use user::{User, UserRecord};

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Convert Unix milliseconds to a UTC timestamp, defaulting to now if out of range
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

/// Accept an identifier sent either as a JSON string or a JSON number.
///
/// Older clients send numeric post ids (`101`), newer ones strings (`"101"`);
/// both name the same post.
pub fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

/// Optional variant of [`id_from_string_or_number`]; `null` and missing map to `None`
pub fn optional_id_from_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}
