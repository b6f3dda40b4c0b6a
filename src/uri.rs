//! Builds the browser-facing and streaming endpoints for a search identifier.

/// The live search results page for a search id, for humans to open.
pub fn live_search_uri(web_url: &str, search_id: &str) -> String {
    format!("{}/search/{}/live", web_url.trim_end_matches('/'), search_id)
}

/// The WebSocket endpoint that pushes new results for a search id.
pub fn live_ws_uri(api_url: &str, search_id: &str) -> String {
    format!("{}/{}", api_url.trim_end_matches('/'), search_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_search_uri() {
        assert_eq!(
            live_search_uri("http://poe.trade", "abcDEF"),
            "http://poe.trade/search/abcDEF/live"
        );
    }

    #[test]
    fn test_live_ws_uri() {
        assert_eq!(
            live_ws_uri("ws://live.poe.trade", "abcDEF"),
            "ws://live.poe.trade/abcDEF"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        assert_eq!(
            live_ws_uri("ws://live.poe.trade/", "abcDEF"),
            "ws://live.poe.trade/abcDEF"
        );
        assert_eq!(
            live_search_uri("http://poe.trade/", "abcDEF"),
            "http://poe.trade/search/abcDEF/live"
        );
    }
}
