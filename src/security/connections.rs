//! Per-client-IP concurrent connection limits for WebSocket sessions.
//!
//! # Responsibilities
//! - Count open long-lived connections per client IP
//! - Refuse new connections once an IP reaches `max_per_ip`
//! - Release the slot on every exit path of the connection
//!
//! # Design Decisions
//! - A slot is an RAII guard; release runs in `Drop`, so normal close, error,
//!   abrupt disconnect and panic unwinding all decrement
//! - Entries that reach zero are removed, keeping the map bounded by the
//!   number of IPs with open connections
//! - A periodic sweep drops any zero entries left behind

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::lifecycle::Sweeper;
use crate::observability::metrics;

/// Tracks open WebSocket connections per client IP.
#[derive(Debug)]
pub struct ConnectionLimiter {
    counts: RwLock<HashMap<IpAddr, usize>>,
    max_per_ip: usize,
}

impl ConnectionLimiter {
    pub fn new(max_per_ip: usize) -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
            max_per_ip,
        }
    }

    pub fn max_per_ip(&self) -> usize {
        self.max_per_ip
    }

    /// Claim a slot for `ip`, or `None` when the IP is at its limit.
    pub fn try_acquire(self: &Arc<Self>, ip: IpAddr) -> Option<ConnectionSlot> {
        {
            let mut counts = self.counts.write();
            let current = counts.entry(ip).or_insert(0);
            if *current >= self.max_per_ip {
                return None;
            }
            *current += 1;
        }
        metrics::record_ws_connection_opened();

        Some(ConnectionSlot {
            inner: Arc::new(SlotInner {
                limiter: Arc::clone(self),
                ip,
            }),
        })
    }

    /// Give back one slot for `ip`. Called by [`ConnectionSlot`] on drop.
    fn release(&self, ip: IpAddr) {
        let mut counts = self.counts.write();
        match counts.get_mut(&ip) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                counts.remove(&ip);
            }
            None => {
                drop(counts);
                tracing::warn!(client_ip = %ip, "Released a connection slot that was not held");
                return;
            }
        }
        drop(counts);
        metrics::record_ws_connection_closed();
    }

    /// Open connections for `ip`.
    pub fn active(&self, ip: IpAddr) -> usize {
        self.counts.read().get(&ip).copied().unwrap_or(0)
    }

    /// Number of IPs currently tracked.
    pub fn tracked_ips(&self) -> usize {
        self.counts.read().len()
    }

    /// Remove zero-count entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut counts = self.counts.write();
        let before = counts.len();
        counts.retain(|_, count| *count > 0);
        before - counts.len()
    }

    /// Start the periodic sweep. Dropping the handle stops it.
    pub fn spawn_sweep(self: &Arc<Self>, period: Duration) -> Sweeper {
        let limiter = Arc::clone(self);
        Sweeper::spawn("connection-sweep", period, move || {
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, "Swept empty connection counters");
            }
        })
    }
}

#[derive(Debug)]
struct SlotInner {
    limiter: Arc<ConnectionLimiter>,
    ip: IpAddr,
}

impl Drop for SlotInner {
    fn drop(&mut self) {
        self.limiter.release(self.ip);
        tracing::trace!(client_ip = %self.ip, "Connection slot released");
    }
}

/// A held connection slot. Clones share the slot; it is released when the
/// last clone is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionSlot {
    inner: Arc<SlotInner>,
}

impl ConnectionSlot {
    pub fn ip(&self) -> IpAddr {
        self.inner.ip
    }
}
