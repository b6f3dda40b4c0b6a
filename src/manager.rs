//! The connection manager: one feed connection per configured subscription.

use crate::config::Config;
use crate::feed::FeedConnection;
use crate::queue::AlertQueue;
use crate::task_manager::TaskManager;
use crate::uri;
use std::sync::Arc;
use tracing::info;

/// Builds and starts one [`FeedConnection`] task per entry in the
/// subscription map, all multiplexed onto the shared runtime. An empty map
/// starts nothing and the runtime idles.
///
/// Returns the number of connections started.
pub fn start_feeds(config: &Config, queue: &Arc<AlertQueue>, tasks: &TaskManager) -> usize {
    for (name, search_id) in &config.searches {
        let search_page = uri::live_search_uri(&config.web_url, search_id);
        let ws_uri = uri::live_ws_uri(&config.api_url, search_id);
        info!(feed = %name, page = %search_page, "Watching live search");

        let connection = FeedConnection::new(
            name.clone(),
            ws_uri,
            config.keepalive_timeframe(),
            config.retry_timeframe(),
            queue.clone(),
        );
        tasks.spawn("FeedConnection", connection.run(tasks.get_shutdown_rx()));
    }

    let started = config.searches.len();
    if started == 0 {
        info!("No searches configured, starting no feed connections");
    }
    started
}
