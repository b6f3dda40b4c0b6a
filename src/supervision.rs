//! Supervision boundary for top-level units of work.
//!
//! A supervised unit of work that fails is logged and reported to analytics,
//! and the error stops there: it never propagates to sibling tasks or past
//! the boundary.

use crate::core::Analytics;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

/// Runs a fallible unit of work to completion, reporting any failure.
pub async fn run_reported<F>(name: &str, analytics: &Arc<dyn Analytics>, work: F)
where
    F: Future<Output = anyhow::Result<()>>,
{
    if let Err(e) = work.await {
        error!(task = name, error = ?e, "Supervised task failed");
        analytics.track(
            "fatal_error",
            json!({ "task": name, "error": e.to_string() }),
        );
    }
}
