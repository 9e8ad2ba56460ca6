use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::{CircuitBreaker, SavedPostStore};
use crate::error::{AppError, Result};

/// Which tier answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StorageMode {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "in-memory")]
    InMemory,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Remote => "remote",
            StorageMode::InMemory => "in-memory",
        }
    }
}

/// Routes store operations to the primary tier and fails over to the fallback
#[derive(Clone)]
pub struct FailoverStore {
    primary: Option<Arc<dyn SavedPostStore>>,
    fallback: Arc<dyn SavedPostStore>,
    breaker: Arc<CircuitBreaker>,
}

impl FailoverStore {
    pub fn new(
        primary: Arc<dyn SavedPostStore>,
        fallback: Arc<dyn SavedPostStore>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self {
            primary: Some(primary),
            fallback,
            breaker: Arc::new(CircuitBreaker::new(retry_after)),
        }
    }

    /// No usable primary (disabled, or it failed to open at startup)
    pub fn fallback_only(fallback: Arc<dyn SavedPostStore>) -> Self {
        Self {
            primary: None,
            fallback,
            breaker: Arc::new(CircuitBreaker::tripped(None)),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Tier the next request is expected to hit
    pub fn storage_mode(&self) -> StorageMode {
        if self.primary.is_some() && self.breaker.is_closed() {
            StorageMode::Remote
        } else {
            StorageMode::InMemory
        }
    }

    /// Ping the primary without touching the breaker.
    ///
    /// A primary abandoned by a sticky failover is not pinged again.
    pub async fn primary_reachable(&self) -> bool {
        let Some(primary) = self.primary.clone() else {
            return false;
        };
        if self.breaker.is_permanently_open() {
            return false;
        }

        match tokio::task::spawn_blocking(move || primary.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Primary store ping failed: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("Primary store ping task failed: {}", e);
                false
            }
        }
    }

    /// Run `op` against the primary if the breaker allows it; on a backend
    /// failure trip the breaker and run the same `op` against the fallback.
    ///
    /// Domain errors from the primary are returned unchanged. A backend
    /// failure of the fallback becomes [`AppError::ServerError`].
    pub async fn run<T, F>(&self, operation: &'static str, op: F) -> Result<(T, StorageMode)>
    where
        T: Send + 'static,
        F: Fn(&dyn SavedPostStore) -> Result<T> + Send + Sync + 'static,
    {
        let op = Arc::new(op);

        if let Some(primary) = self.primary.clone() {
            if self.breaker.allow_request() {
                let attempt = Arc::clone(&op);
                let outcome = tokio::task::spawn_blocking(move || attempt(primary.as_ref()))
                    .await
                    .map_err(AppError::from)
                    .and_then(|result| result);

                match outcome {
                    Err(e) if e.is_backend_failure() => {
                        tracing::warn!(
                            "Primary store failed during {}, falling back to {} store: {}",
                            operation,
                            self.fallback.name(),
                            e
                        );
                        self.breaker.record_failure();
                    }
                    outcome => {
                        self.breaker.record_success();
                        return outcome.map(|value| (value, StorageMode::Remote));
                    }
                }
            }
        }

        let fallback = Arc::clone(&self.fallback);
        let value = tokio::task::spawn_blocking(move || op(fallback.as_ref()))
            .await
            .map_err(AppError::from)
            .and_then(|result| result)
            .map_err(|e| {
                if e.is_backend_failure() {
                    AppError::ServerError(format!("{operation}: {e}"))
                } else {
                    e
                }
            })?;

        Ok((value, StorageMode::InMemory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SavedPostRecord, User};
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Primary whose every call fails and is counted
    #[derive(Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl BrokenStore {
        fn fail<T>(&self) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    impl SavedPostStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn ping(&self) -> StoreResult<()> {
            self.fail()
        }
        fn has_users(&self) -> StoreResult<bool> {
            self.fail()
        }
        fn find_user(&self, _: &str) -> StoreResult<Option<User>> {
            self.fail()
        }
        fn insert_user(&self, _: &User) -> StoreResult<()> {
            self.fail()
        }
        fn list_saved(&self, _: &str) -> StoreResult<Vec<SavedPostRecord>> {
            self.fail()
        }
        fn find_saved(&self, _: &str, _: &str) -> StoreResult<Option<SavedPostRecord>> {
            self.fail()
        }
        fn insert_saved(&self, _: &SavedPostRecord) -> StoreResult<bool> {
            self.fail()
        }
        fn remove_saved(&self, _: &str, _: &str) -> StoreResult<bool> {
            self.fail()
        }
    }

    #[tokio::test]
    async fn test_failover_is_sticky_without_retry_interval() {
        let primary = Arc::new(BrokenStore::default());
        let store = FailoverStore::new(primary.clone(), Arc::new(MemoryStore::new()), None);
        assert_eq!(store.storage_mode(), StorageMode::Remote);

        for _ in 0..3 {
            let (saved, mode) = store
                .run("list", |s| Ok(s.list_saved("u1")?))
                .await
                .unwrap();
            assert!(saved.is_empty());
            assert_eq!(mode, StorageMode::InMemory);
        }

        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.storage_mode(), StorageMode::InMemory);
    }

    #[tokio::test]
    async fn test_abandoned_primary_is_not_pinged() {
        let primary = Arc::new(BrokenStore::default());
        let store = FailoverStore::new(primary.clone(), Arc::new(MemoryStore::new()), None);

        store.run("list", |s| Ok(s.list_saved("u1")?)).await.unwrap();
        assert!(!store.primary_reachable().await);
        assert!(!store.primary_reachable().await);

        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retrying_primary_is_still_pinged() {
        let primary = Arc::new(BrokenStore::default());
        let store = FailoverStore::new(
            primary.clone(),
            Arc::new(MemoryStore::new()),
            Some(Duration::from_secs(60)),
        );

        store.run("list", |s| Ok(s.list_saved("u1")?)).await.unwrap();
        assert!(!store.primary_reachable().await);

        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_domain_errors_do_not_trip_breaker() {
        let store = FailoverStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            None,
        );

        let result: Result<((), StorageMode)> =
            store.run("delete", |_| Err(AppError::SavedPostNotFound)).await;

        assert!(matches!(result, Err(AppError::SavedPostNotFound)));
        assert!(store.breaker().is_closed());
    }

    #[tokio::test]
    async fn test_fallback_failure_is_server_error() {
        let store = FailoverStore::fallback_only(Arc::new(BrokenStore::default()));

        let result = store.run("check", |s| Ok(s.find_saved("u1", "1")?)).await;
        assert!(matches!(result, Err(AppError::ServerError(_))));
    }

    #[tokio::test]
    async fn test_primary_retried_after_cooldown() {
        let primary = Arc::new(BrokenStore::default());
        let store = FailoverStore::new(
            primary.clone(),
            Arc::new(MemoryStore::new()),
            Some(Duration::ZERO),
        );

        store.run("list", |s| Ok(s.list_saved("u1")?)).await.unwrap();
        store.run("list", |s| Ok(s.list_saved("u1")?)).await.unwrap();

        // Each request gets a trial against the primary once the cooldown is over
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }
}
