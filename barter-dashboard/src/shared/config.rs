//! Dashboard configuration
//!
//! Environment variables (invalid or zero values fall back to the default):
//! - `DASHBOARD_API_URL` REST base URL, default `http://127.0.0.1:5000`
//! - `DASHBOARD_WS_URL` push channel URL, default `ws://127.0.0.1:5000/ws`
//! - `DASHBOARD_PAGE_LIMIT` records per table page, default `10`
//! - `DASHBOARD_CANDLE_WINDOW` candles kept for charts, default `30`
//! - `DASHBOARD_REQUEST_TIMEOUT_SECS` per-request timeout, default `10`

use crate::shared::{websocket::WebSocketConfig, window::DEFAULT_CANDLE_WINDOW};
use std::{str::FromStr, time::Duration};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// REST base URL
    pub api_url: String,
    /// Push channel
    pub websocket: WebSocketConfig,
    /// Records per table page, fixed for the session
    pub page_limit: u32,
    /// Candles kept in the tick window
    pub candle_window: usize,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            websocket: WebSocketConfig::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            candle_window: DEFAULT_CANDLE_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    /// Load from `DASHBOARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, eg/ a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = non_empty("DASHBOARD_API_URL").unwrap_or(defaults.api_url);
        let websocket = non_empty("DASHBOARD_WS_URL")
            .map(WebSocketConfig::new)
            .unwrap_or(defaults.websocket);

        Self {
            api_url,
            websocket,
            page_limit: parse_positive(&lookup, "DASHBOARD_PAGE_LIMIT")
                .unwrap_or(defaults.page_limit),
            candle_window: parse_positive(&lookup, "DASHBOARD_CANDLE_WINDOW")
                .unwrap_or(defaults.candle_window),
            request_timeout: parse_positive(&lookup, "DASHBOARD_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_websocket(mut self, websocket: WebSocketConfig) -> Self {
        self.websocket = websocket;
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn with_candle_window(mut self, window: usize) -> Self {
        self.candle_window = window.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_positive<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.websocket.url, "ws://127.0.0.1:5000/ws");
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.candle_window, 30);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("DASHBOARD_API_URL", "https://dashboard.example.com/api"),
            ("DASHBOARD_WS_URL", "wss://dashboard.example.com/ws"),
            ("DASHBOARD_PAGE_LIMIT", "25"),
            ("DASHBOARD_CANDLE_WINDOW", "60"),
            ("DASHBOARD_REQUEST_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.api_url, "https://dashboard.example.com/api");
        assert_eq!(config.websocket.url, "wss://dashboard.example.com/ws");
        assert_eq!(config.page_limit, 25);
        assert_eq!(config.candle_window, 60);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("DASHBOARD_API_URL", "  "),
            ("DASHBOARD_PAGE_LIMIT", "0"),
            ("DASHBOARD_CANDLE_WINDOW", "-5"),
            ("DASHBOARD_REQUEST_TIMEOUT_SECS", "soon"),
        ]));

        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_config_builder() {
        let config = DashboardConfig::default()
            .with_api_url("http://localhost:8080")
            .with_websocket(WebSocketConfig::new("ws://localhost:8080/ws"))
            .with_page_limit(0)
            .with_candle_window(50)
            .with_request_timeout(Duration::from_secs(1));

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.websocket.url, "ws://localhost:8080/ws");
        assert_eq!(config.page_limit, 1);
        assert_eq!(config.candle_window, 50);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
    }
}
