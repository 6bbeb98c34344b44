//! Per-client-IP token bucket rate limiting.
//!
//! # Responsibilities
//! - One lazily created bucket per (pool, client IP)
//! - Independent pools so abuse of one endpoint cannot starve another
//! - Evict entries that have been idle longer than the retention period
//!
//! # Design Decisions
//! - Each pool owns exactly one `RwLock`; pools never share locks
//! - Lookups take the read lock; creation re-checks under the write lock so
//!   concurrent first requests from one IP share a single bucket
//! - Per-entry state sits behind its own mutex, so admission for one IP is
//!   linearizable while other IPs proceed under the shared read lock

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::config::{PoolPolicy, RateLimitConfig};
use crate::lifecycle::Sweeper;
use crate::observability::metrics;

/// A continuously refilling token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    /// Withdraw one token, or report how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - self.tokens) / refill_rate;
            Err(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
        }
    }
}

#[derive(Debug)]
struct EntryState {
    bucket: TokenBucket,
    last_seen: Instant,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// A named pool of per-IP buckets sharing one policy.
#[derive(Debug)]
pub struct RateLimiterPool {
    name: &'static str,
    rate: f64,
    burst: f64,
    entries: RwLock<HashMap<IpAddr, Mutex<EntryState>>>,
}

impl RateLimiterPool {
    pub fn new(name: &'static str, policy: PoolPolicy) -> Self {
        Self {
            name,
            rate: policy.requests_per_second,
            burst: f64::from(policy.burst),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Try to admit one request from `ip`.
    pub fn acquire(&self, ip: IpAddr) -> Admission {
        self.acquire_at(ip, Instant::now())
    }

    fn acquire_at(&self, ip: IpAddr, now: Instant) -> Admission {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&ip) {
                return self.admit(&mut entry.lock(), now);
            }
        }

        let mut entries = self.entries.write();
        // Another request may have created the entry between the two locks.
        let entry = entries.entry(ip).or_insert_with(|| {
            Mutex::new(EntryState {
                bucket: TokenBucket::new(self.burst, now),
                last_seen: now,
            })
        });
        let admission = self.admit(entry.get_mut(), now);
        let size = entries.len();
        drop(entries);

        metrics::record_limiter_entries(self.name, size);
        admission
    }

    fn admit(&self, state: &mut EntryState, now: Instant) -> Admission {
        state.last_seen = now;
        match state.bucket.try_acquire(self.burst, self.rate, now) {
            Ok(()) => Admission::Allowed,
            Err(retry_after) => Admission::Limited { retry_after },
        }
    }

    /// Remove entries not seen within `retention`. Returns how many were removed.
    pub fn evict_idle(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.get_mut().last_seen) <= retention);
        let removed = before - entries.len();
        let size = entries.len();
        drop(entries);

        metrics::record_limiter_entries(self.name, size);
        if removed > 0 {
            tracing::debug!(pool = self.name, removed, remaining = size, "Evicted idle rate limiter entries");
        }
        removed
    }

    /// Number of tracked client IPs.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The general API pool and the stricter login pool.
#[derive(Debug, Clone)]
pub struct RateLimiterRegistry {
    pub api: Arc<RateLimiterPool>,
    pub login: Arc<RateLimiterPool>,
    cleanup_interval: Duration,
    idle_retention: Duration,
}

impl RateLimiterRegistry {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: Arc::new(RateLimiterPool::new("api", config.api)),
            login: Arc::new(RateLimiterPool::new("login", config.login)),
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs),
            idle_retention: Duration::from_secs(config.idle_retention_secs),
        }
    }

    /// Evict idle entries from every pool.
    pub fn evict_idle(&self) -> usize {
        self.api.evict_idle(self.idle_retention) + self.login.evict_idle(self.idle_retention)
    }

    /// Start the periodic eviction task. Dropping the handle stops it.
    pub fn spawn_cleanup(&self) -> Sweeper {
        let registry = self.clone();
        Sweeper::spawn("rate-limiter-cleanup", self.cleanup_interval, move || {
            registry.evict_idle();
        })
    }
}
