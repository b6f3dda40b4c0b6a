//! The main application logic, decoupled from the entry point.

use crate::{
    analytics::{HttpAnalytics, NoopAnalytics},
    config::Config,
    core::{Analytics, Notifier},
    delivery::DeliveryLoop,
    manager,
    notify::{LogNotifier, WebhookNotifier},
    queue::AlertQueue,
    task_manager::TaskManager,
};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    queue: Arc<AlertQueue>,
    feeds_started: usize,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The shared alert queue; the replay entry point pushes into it.
    pub fn queue(&self) -> Arc<AlertQueue> {
        self.queue.clone()
    }

    pub fn feeds_started(&self) -> usize {
        self.feeds_started
    }

    /// Waits for the shutdown signal, then joins every task.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;
        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates constructing the application's components from running them,
/// and provides override points so tests can substitute the notifier or the
/// analytics collaborator.
pub struct AppBuilder {
    config: Config,
    notifier_override: Option<Arc<dyn Notifier>>,
    analytics_override: Option<Arc<dyn Analytics>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            notifier_override: None,
            analytics_override: None,
        }
    }

    /// Overrides the notifier, e.g. with a recording fake in tests.
    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    /// Overrides the analytics collaborator.
    pub fn analytics_override(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics_override = Some(analytics);
        self
    }

    /// Builds and starts all application components, returning a runnable
    /// `App`. Failures here are fatal configuration-level errors; no feed
    /// connection is started if anything fails.
    pub fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        let analytics = match self.analytics_override {
            Some(analytics) => analytics,
            None => match &config.analytics {
                Some(cfg) => Arc::new(HttpAnalytics::new(cfg.endpoint.clone())?) as Arc<dyn Analytics>,
                None => Arc::new(NoopAnalytics),
            },
        };

        let notifier = match self.notifier_override {
            Some(notifier) => notifier,
            None => match &config.notify.webhook_url {
                Some(url) => Arc::new(WebhookNotifier::new(url.clone())?) as Arc<dyn Notifier>,
                None => Arc::new(LogNotifier),
            },
        };

        analytics.track(
            "app_started",
            json!({ "searches": config.searches.len(), "notifier": notifier.name() }),
        );

        let queue = Arc::new(AlertQueue::new());

        let delivery = DeliveryLoop::new(
            queue.clone(),
            notifier,
            config.notification_interval(),
            config.iteration_wait(),
        );
        task_manager.spawn("DeliveryLoop", delivery.run(task_manager.get_shutdown_rx()));

        let feeds_started = manager::start_feeds(&config, &queue, &task_manager);
        info!(feeds_started, "tradewatch initialized, watching for listings");

        Ok(App {
            task_manager,
            queue,
            feeds_started,
        })
    }
}
