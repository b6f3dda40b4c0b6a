//! Offline replay: push a recorded feed capture through the live pipeline.
//!
//! A capture file is a JSON array of frames as they arrived from the feed,
//! each tagged with the subscription that produced it. Replaying one runs the
//! same translation and delivery pacing as a live session, without opening
//! any connection.

use crate::queue::AlertQueue;
use crate::translate;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// One captured frame: the subscription it came from plus the raw text.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedFrame {
    pub search_name: String,
    pub frame: String,
}

/// Parses a capture file.
pub fn load_capture(path: &Path) -> Result<Vec<CapturedFrame>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capture file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Capture file {} is not valid JSON", path.display()))
}

/// Pushes every translatable frame into the queue in recorded order.
/// Untranslatable frames are skipped with a warning, same as live traffic.
/// Returns the number of alerts queued.
pub fn replay_into(frames: &[CapturedFrame], queue: &AlertQueue) -> usize {
    let mut queued = 0;
    for captured in frames {
        match translate::translate(&captured.search_name, &captured.frame) {
            Ok(Some(alert)) => {
                queue.push(alert);
                queued += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    search = %captured.search_name,
                    error = %e,
                    "Skipping untranslatable captured frame"
                );
            }
        }
    }
    queued
}
