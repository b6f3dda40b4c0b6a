//! tradewatch - live trade-search alert watcher
//!
//! Watches named live search subscriptions over persistent WebSocket
//! connections, translates feed frames into normalized alerts, and delivers
//! them at a paced rate so notifications are never lost, duplicated, or
//! delivered in a burst.

pub mod analytics;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod delivery;
pub mod feed;
pub mod manager;
pub mod notify;
pub mod queue;
pub mod replay;
pub mod supervision;
pub mod task_manager;
pub mod translate;
pub mod uri;

// Re-export core types for convenience
pub use crate::core::{Alert, Analytics, Notifier};
