//! Manages the lifecycle of all spawned tasks in the application.

use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A centralized manager for all spawned tasks.
///
/// Tracks the `JoinHandle` of every task it spawns and hands out clones of
/// the process-wide shutdown receiver, so that graceful shutdown is one
/// `shutdown().await` that joins everything.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns a named task and records its handle.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        self.handles.lock().unwrap().push((name, handle));
    }

    /// Returns a clone of the shutdown receiver for a task to select on.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Waits for every managed task to finish. Panicked tasks are reported;
    /// they do not abort the join of their siblings.
    pub async fn shutdown(self) {
        let handles = self.handles.lock().unwrap().drain(..).collect::<Vec<_>>();
        info!(count = handles.len(), "Waiting for tasks to complete");

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut panicked = 0;
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name = name, "Task shut down gracefully."),
                Err(e) => {
                    panicked += 1;
                    error!(task_name = name, error = ?e, "Task panicked during shutdown.");
                }
            }
        }

        if panicked == 0 {
            info!("All tasks shut down gracefully.");
        } else {
            error!(panicked, "Some tasks panicked during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_joins_spawned_tasks() {
        let (tx, rx) = watch::channel(false);
        let manager = TaskManager::new(rx);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let mut task_shutdown_rx = manager.get_shutdown_rx();
        manager.spawn("waiter", async move {
            task_shutdown_rx.changed().await.ok();
            done_tx.send(()).ok();
        });

        tx.send(true).unwrap();
        manager.shutdown().await;
        done_rx.await.expect("task should have observed shutdown");
    }
}
