use std::sync::Mutex;
use std::time::{Duration, Instant};

/// State of the primary store's circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests go to the primary
    Closed,
    /// The primary failed at `since`; requests go to the fallback
    Open { since: Instant },
    /// One trial request is on its way to the primary
    HalfOpen,
}

/// Circuit breaker guarding the primary store.
///
/// Without a retry interval an open breaker never closes again, which keeps
/// failover sticky for the lifetime of the process.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    retry_after: Option<Duration>,
}

impl CircuitBreaker {
    pub fn new(retry_after: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed),
            retry_after,
        }
    }

    /// A breaker that starts open, for a primary that never came up
    pub fn tripped(retry_after: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(BreakerState::Open {
                since: Instant::now(),
            }),
            retry_after,
        }
    }

    pub fn state(&self) -> BreakerState {
        *self.lock()
    }

    /// Whether the next request may use the primary
    pub fn allow_request(&self) -> bool {
        self.allow_request_at(Instant::now())
    }

    pub fn allow_request_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        match *state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => false,
            BreakerState::Open { since } => match self.retry_after {
                Some(retry_after) if now.saturating_duration_since(since) >= retry_after => {
                    tracing::info!("Primary store cooldown elapsed, sending a trial request");
                    *state = BreakerState::HalfOpen;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        if *state != BreakerState::Closed {
            tracing::info!("Primary store recovered, closing circuit");
            *state = BreakerState::Closed;
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    pub fn record_failure_at(&self, now: Instant) {
        *self.lock() = BreakerState::Open { since: now };
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Open with no retry interval: the primary will never be tried again
    pub fn is_permanently_open(&self) -> bool {
        self.retry_after.is_none() && !self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == BreakerState::Closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        // The state is a plain enum, a panic mid-update cannot leave it torn
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
