//! Cancellable periodic background tasks.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Handle to a periodic task. Dropping it aborts the task; [`Sweeper::stop`]
/// lets a running tick finish first.
#[derive(Debug)]
pub struct Sweeper {
    name: &'static str,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Run `tick` every `period`, first after one full period.
    pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(task = name, period_secs = period.as_secs(), "Sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick(),
                    _ = &mut stop_rx => break,
                }
            }
            tracing::debug!(task = name, "Sweeper stopped");
        });

        Self {
            name,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(task = self.name, error = %e, "Sweeper ended abnormally");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
