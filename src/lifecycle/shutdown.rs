//! Shutdown coordination for the console edge.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Backed by a watch channel so that tasks subscribing after the trigger
/// still observe it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Receiving half handed to long-running tasks.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered, or the coordinator dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let signal = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("signal should already be set");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn dropping_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("waiter should be released");
    }
}
