//! tradewatch - live trade-search alert watcher
//!
//! Entry point: loads configuration, wires up the application, and drives the
//! two top-level modes (live run and offline replay).

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::info;
use tradewatch::{
    analytics::{HttpAnalytics, NoopAnalytics},
    app::App,
    cli::{Cli, Command},
    config::Config,
    core::Analytics,
    replay, supervision,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration errors are fatal and must be reported before any
    // connection starts.
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tradewatch: {e:#}");
            if !cli.no_wait {
                pause_before_exit();
            }
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_level);
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Notification Spacing: {}s", config.notification_seconds);
    info!("Delivery Cadence: {}s", config.iteration_wait_time_seconds);
    info!("Keepalive Window: {}s", config.keepalive_timeframe_seconds);
    info!("Reconnect Delay: {}s", config.retry_timeframe_seconds);
    info!("API URL: {}", config.api_url);
    info!("Searches: {}", config.searches.len());
    info!(
        "Webhook Notifier: {}",
        if config.notify.webhook_url.is_some() {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!(
        "Analytics: {}",
        if config.analytics.is_some() {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_live(config, shutdown_tx, shutdown_rx).await,
        Command::Replay { capture } => {
            run_replay(config, &capture, shutdown_tx, shutdown_rx).await
        }
    }

    if !cli.no_wait {
        pause_before_exit();
    }
    Ok(())
}

/// Live mode: connect to every configured search and run until ctrl-c.
async fn run_live(
    config: Config,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
) {
    let analytics = build_analytics(&config);

    supervision::run_reported("live run", &analytics, async {
        let app = App::builder(config)
            .analytics_override(analytics.clone())
            .build(shutdown_rx)?;

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received. Shutting down gracefully...");
        shutdown_tx.send(true).ok();
        app.run().await
    })
    .await;
}

/// Replay mode: push a recorded capture through the pipeline, let the
/// delivery loop pace it out, then shut down.
async fn run_replay(
    mut config: Config,
    capture_path: &std::path::Path,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
) {
    // Replay never tracks usage and never opens live connections.
    let analytics: Arc<dyn Analytics> = Arc::new(NoopAnalytics);
    config.searches.clear();

    let iteration_wait = config.iteration_wait();
    let notification_interval = config.notification_interval();

    supervision::run_reported("replay", &analytics, async {
        let app = App::builder(config)
            .analytics_override(analytics.clone())
            .build(shutdown_rx)?;

        let frames = replay::load_capture(capture_path)?;
        let queued = replay::replay_into(&frames, &app.queue());
        info!(
            frames = frames.len(),
            queued, "Replayed capture into the alert queue"
        );

        // Wait for the queue to drain, then for the in-flight batch to pace
        // out, before signalling shutdown.
        while !app.queue().is_empty() {
            sleep(iteration_wait).await;
        }
        sleep(notification_interval * (queued.max(1) as u32)).await;

        shutdown_tx.send(true).ok();
        app.run().await
    })
    .await;
}

fn build_analytics(config: &Config) -> Arc<dyn Analytics> {
    match &config.analytics {
        Some(cfg) => match HttpAnalytics::new(cfg.endpoint.clone()) {
            Ok(analytics) => Arc::new(analytics),
            Err(e) => {
                eprintln!("tradewatch: analytics disabled: {e:#}");
                Arc::new(NoopAnalytics)
            }
        },
        None => Arc::new(NoopAnalytics),
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Terminal confirmation before the process exits, so the last notifications
/// stay on screen. Invoked only at the top-level entry points.
fn pause_before_exit() {
    println!("Press enter to exit.");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
