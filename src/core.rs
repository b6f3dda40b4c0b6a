//! Core domain types and service traits for tradewatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized, user-notifiable event derived from one feed message.
///
/// Immutable once created. Owned by the alert queue from creation until the
/// delivery loop dequeues it, then by the delivery path until dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// Name of the search subscription that produced this alert.
    pub search_name: String,
    /// The translated payload, e.g. a ready-to-send whisper message.
    pub message: String,
    /// Category tag for the kind of event (e.g. "listing").
    pub category: String,
    /// Timestamp when the alert was created.
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Creates a new alert timestamped now.
    pub fn new(
        search_name: impl Into<String>,
        message: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            search_name: search_name.into(),
            message: message.into(),
            category: category.into(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Dispatches one alert to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A unique, descriptive name for the notifier (e.g. "log", "webhook").
    /// Used for logging.
    fn name(&self) -> &str;

    /// Delivers a single alert to the user-facing destination.
    ///
    /// # Returns
    /// * `Ok(())` if the notification was raised
    /// * `Err` if delivery failed; the caller logs and moves on, it never
    ///   retries
    async fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Optional usage-tracking collaborator.
///
/// The application must function identically with tracking absent; see
/// [`crate::analytics::NoopAnalytics`].
pub trait Analytics: Send + Sync {
    /// Records a named event with arbitrary JSON properties. Must never
    /// block or fail the caller.
    fn track(&self, event: &str, properties: Value);
}
