use super::service::{PassOutcome, RefreshServiceApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Drives scheduled refresh passes on a fixed cadence.
pub struct RefreshScheduler {
    service: Arc<dyn RefreshServiceApi>,
    cadence: Duration,
    initial_delay: Duration,
}

/// Handle to a running scheduler loop
pub struct SchedulerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop. A pass in flight is cancelled and its guard released.
    pub async fn stop(self) {
        let _ = self.cancel_tx.send(());
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Refresh scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl RefreshScheduler {
    pub fn new(service: Arc<dyn RefreshServiceApi>, cadence: Duration, initial_delay: Duration) -> Self {
        Self {
            service,
            cadence,
            initial_delay,
        }
    }

    pub fn start(self) -> SchedulerHandle {
        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);

        let join = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.initial_delay, self.cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                cadence_secs = self.cadence.as_secs(),
                initial_delay_secs = self.initial_delay.as_secs(),
                "Refresh scheduler started"
            );

            loop {
                tokio::select! {
                    _ = cancel_rx.recv() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = cancel_rx.recv() => break,
                            result = self.service.run_pass() => match result {
                                Ok(PassOutcome::Completed(_)) => {}
                                Ok(PassOutcome::Skipped) => {
                                    tracing::info!("Scheduled pass skipped, previous pass still running");
                                }
                                Err(e) => {
                                    tracing::error!(error = %e, "Scheduled refresh pass failed");
                                }
                            },
                        }
                    }
                }
            }

            tracing::info!("Refresh scheduler stopped");
        });

        SchedulerHandle { cancel_tx, join }
    }
}
