//! Translation of raw feed frames into alert records.
//!
//! The live search feed pushes JSON frames. A `notify` frame carries a new
//! listing with a ready-made whisper message; everything else (heartbeats,
//! subscription acks) carries no user-visible content.

use crate::core::Alert;
use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Translates one raw feed frame into at most one alert.
///
/// Pure and deterministic apart from the alert timestamp, so it is testable
/// in isolation.
///
/// # Returns
/// * `Ok(Some(alert))` for a `notify` frame
/// * `Ok(None)` for control frames that carry no listing
/// * `Err` if the frame is malformed; the caller logs and drops it
pub fn translate(search_name: &str, text: &str) -> Result<Option<Alert>> {
    // Temporary struct for the feed's frame envelope
    #[derive(Deserialize)]
    struct FeedFrame {
        #[serde(rename = "type")]
        kind: String,
        whisper: Option<String>,
        category: Option<String>,
    }

    let frame: FeedFrame = serde_json::from_str(text)?;
    if frame.kind != "notify" {
        return Ok(None);
    }

    let whisper = frame
        .whisper
        .ok_or_else(|| anyhow!("notify frame is missing the whisper field"))?;
    let category = frame.category.unwrap_or_else(|| "listing".to_string());
    Ok(Some(Alert::new(search_name, whisper, category)))
}
