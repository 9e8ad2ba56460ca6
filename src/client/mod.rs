//! Client side of saved-post synchronization.
//!
//! [`SavedPostsManager`] talks to the server through [`SavedPostsApi`] and
//! keeps a device-local mirror in a [`LocalCache`] so saves and unsaves keep
//! working while the server is unreachable or the user is signed out.

pub mod api;
pub mod cache;
pub mod manager;
pub mod notify;
pub mod session;

pub use api::{ClientError, HealthStatus, SavedPostsApi};
pub use cache::{CacheError, FileCache, LocalCache, MemoryCache};
pub use manager::{SavedPostsManager, SharedSavedPosts, SyncError, SyncReport};
pub use notify::{Notification, NotificationKind, Notifier};
pub use session::Session;
