//! The delivery loop: drains the alert queue on a fixed cadence and hands
//! each record to the notifier, enforcing a minimum gap between consecutive
//! notifications so alerts never arrive in a burst.

use crate::core::{Alert, Notifier};
use crate::queue::AlertQueue;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration, Instant};
use tracing::{debug, error, info};

/// Single serialized consumer of the [`AlertQueue`].
///
/// Runs as its own task so its pacing sleeps never stall the feed
/// connections' I/O. Exactly one instance per process.
pub struct DeliveryLoop {
    queue: Arc<AlertQueue>,
    notifier: Arc<dyn Notifier>,
    /// Minimum gap between two consecutive dispatches.
    pacing: Duration,
    /// How often the loop wakes up to drain the queue.
    cadence: Duration,
    last_dispatch: Option<Instant>,
}

impl DeliveryLoop {
    pub fn new(
        queue: Arc<AlertQueue>,
        notifier: Arc<dyn Notifier>,
        pacing: Duration,
        cadence: Duration,
    ) -> Self {
        Self {
            queue,
            notifier,
            pacing,
            cadence,
            last_dispatch: None,
        }
    }

    /// Runs until the shutdown signal fires.
    ///
    /// Each wake-up drains everything queued at that moment and dispatches it
    /// in insertion order; a record is held back until `pacing` has elapsed
    /// since the previous dispatch. A notifier failure is logged and the next
    /// record is still attempted. Alerts still queued at shutdown are
    /// discarded, not persisted.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            notifier = self.notifier.name(),
            pacing_secs = self.pacing.as_secs_f64(),
            cadence_secs = self.cadence.as_secs_f64(),
            "Delivery loop started"
        );
        let mut timer = interval(self.cadence);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    self.discard_remaining();
                    break;
                }
                _ = timer.tick() => {
                    let batch = self.queue.drain();
                    if batch.is_empty() {
                        continue;
                    }
                    debug!(count = batch.len(), "Drained alert queue");
                    for alert in &batch {
                        if !self.dispatch_paced(alert, &mut shutdown_rx).await {
                            self.discard_remaining();
                            return;
                        }
                    }
                }
            }
        }
        info!("Delivery loop finished.");
    }

    /// Waits out the remaining pacing gap, then dispatches one alert.
    /// Returns `false` if shutdown interrupted the wait.
    async fn dispatch_paced(
        &mut self,
        alert: &Alert,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> bool {
        if let Some(last) = self.last_dispatch {
            let since = last.elapsed();
            if since < self.pacing {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => return false,
                    _ = sleep(self.pacing - since) => {}
                }
            }
        }

        debug!(search = %alert.search_name, "Dispatching alert");
        if let Err(e) = self.notifier.notify(alert).await {
            error!(
                notifier = self.notifier.name(),
                search = %alert.search_name,
                error = %e,
                "Notifier failed, continuing with next alert"
            );
        }
        // A failed dispatch still counts for pacing purposes.
        self.last_dispatch = Some(Instant::now());
        true
    }

    fn discard_remaining(&self) {
        let dropped = self.queue.drain().len();
        if dropped > 0 {
            info!(dropped, "Shutting down, discarding undelivered alerts");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the paused-clock instant of every dispatch.
    struct RecordingNotifier {
        dispatches: Mutex<Vec<(Instant, String)>>,
        fail_first: bool,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                dispatches: Mutex::new(Vec::new()),
                fail_first: false,
            }
        }

        fn failing_first() -> Self {
            Self {
                dispatches: Mutex::new(Vec::new()),
                fail_first: true,
            }
        }

        fn dispatched(&self) -> Vec<(Instant, String)> {
            self.dispatches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, alert: &Alert) -> Result<()> {
            let mut dispatches = self.dispatches.lock().unwrap();
            let first = dispatches.is_empty();
            dispatches.push((Instant::now(), alert.message.clone()));
            if first && self.fail_first {
                return Err(anyhow!("notifier exploded"));
            }
            Ok(())
        }
    }

    fn loop_under_test(
        notifier: Arc<RecordingNotifier>,
        pacing_secs: u64,
    ) -> (Arc<AlertQueue>, DeliveryLoop) {
        let queue = Arc::new(AlertQueue::new());
        let delivery = DeliveryLoop::new(
            queue.clone(),
            notifier,
            Duration::from_secs(pacing_secs),
            Duration::from_secs(1),
        );
        (queue, delivery)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_paced_out() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, delivery) = loop_under_test(notifier.clone(), 5);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let start = Instant::now();
        for i in 0..3 {
            queue.push(Alert::new("s", format!("alert-{i}"), "listing"));
        }
        let handle = tokio::spawn(delivery.run(shutdown_rx));

        // Give the loop ample paused-clock time to work through the burst.
        tokio::time::sleep(Duration::from_secs(30)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let dispatches = notifier.dispatched();
        assert_eq!(dispatches.len(), 3);
        let order: Vec<_> = dispatches.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(order, vec!["alert-0", "alert-1", "alert-2"]);

        // Consecutive dispatches must be at least the pacing interval apart.
        for pair in dispatches.windows(2) {
            let gap = pair[1].0 - pair[0].0;
            assert!(
                gap >= Duration::from_secs(5),
                "dispatch gap {gap:?} shorter than pacing"
            );
        }
        // And the whole burst drains without extra slack: t, t+5, t+10.
        assert!(dispatches[2].0 - start <= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_failure_does_not_stop_delivery() {
        let notifier = Arc::new(RecordingNotifier::failing_first());
        let (queue, delivery) = loop_under_test(notifier.clone(), 1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        queue.push(Alert::new("s", "boom", "listing"));
        queue.push(Alert::new("s", "fine", "listing"));
        let handle = tokio::spawn(delivery.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let order: Vec<_> = notifier
            .dispatched()
            .iter()
            .map(|(_, m)| m.clone())
            .collect();
        assert_eq!(order, vec!["boom", "fine"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_queued_alerts() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, delivery) = loop_under_test(notifier.clone(), 60);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(delivery.run(shutdown_rx));
        tokio::time::sleep(Duration::from_secs(2)).await;

        // These arrive but shutdown fires before pacing lets them all out.
        for i in 0..5 {
            queue.push(Alert::new("s", format!("late-{i}"), "listing"));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // At most one got through before the 60s pacing gap; none remain queued.
        assert!(notifier.dispatched().len() <= 1);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_loop_dispatches_nothing() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (queue, delivery) = loop_under_test(notifier.clone(), 5);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(delivery.run(shutdown_rx));
        tokio::time::sleep(Duration::from_secs(20)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(notifier.dispatched().is_empty());
        assert!(queue.is_empty());
    }
}
