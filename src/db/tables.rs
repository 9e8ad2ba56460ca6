use redb::TableDefinition;

/// Users table: user_id -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Saved posts table: (user_id, post_id) -> SavedPostRow (serialized)
/// The tuple key keeps one user's records contiguous for range scans
/// and makes the (user, post) pair unique.
pub const SAVED_POSTS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("saved_posts");
