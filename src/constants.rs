/// Upper bound for the client's liveness probe before it degrades to local-only mode
pub const HEALTH_PROBE_TIMEOUT_MS: u64 = 3_000;

/// How long a notification stays visible before it is dismissed automatically
pub const NOTIFICATION_TTL_SECS: i64 = 3;

/// Local cache key holding the JSON array of saved-post records
pub const SAVED_POSTS_CACHE_KEY: &str = "savedPosts";

/// Owner of records saved while nobody is signed in
/// Re-owned by the first user that signs in and syncs
pub const ANONYMOUS_USER_ID: &str = "anonymous";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for save requests without the required fields
pub const ERR_MISSING_FIELDS: &str = "Please provide userId, postId and title";

/// Error message for unknown users
pub const ERR_USER_NOT_FOUND: &str = "User not found";

/// Error message for unknown users on save, when no email was supplied to create one
pub const ERR_USER_NOT_FOUND_NO_EMAIL: &str =
    "User not found and email not provided to create user";

/// Error message for unsaving a post that was never saved
pub const ERR_SAVED_POST_NOT_FOUND: &str = "Saved post not found";

/// Error message for duplicate saves
pub const ERR_ALREADY_SAVED: &str = "Post already saved by this user";

// =============================================================================
// Error Codes (machine readable, returned next to the message)
// =============================================================================

pub const CODE_INVALID_INPUT: &str = "INVALID_INPUT";
pub const CODE_USER_NOT_FOUND: &str = "USER_NOT_FOUND";
pub const CODE_SAVED_POST_NOT_FOUND: &str = "SAVED_POST_NOT_FOUND";
pub const CODE_ALREADY_SAVED: &str = "ALREADY_SAVED";
pub const CODE_SERVER_ERROR: &str = "SERVER_ERROR";
