use thiserror::Error;

/// All errors generated in `barter-dashboard`.
///
/// Errors never escape a [`DashboardSession`](crate::DashboardSession): they are logged and the
/// last-known-good state is kept.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum DashboardError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode payload: {0}")]
    Decode(String),

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unknown push event: {0}")]
    UnknownEvent(String),
}

impl DashboardError {
    /// Determine if an error leaves dashboard state stale but consistent, ie/ retrying the same
    /// operation later may succeed.
    ///
    /// Payload errors (malformed data, unknown events, bad configuration) are not transient.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transient(&self) -> bool {
        match self {
            DashboardError::Request(_) | DashboardError::Socket(_) => true,
            // Client errors will fail identically on retry, server errors may not
            DashboardError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<url::ParseError> for DashboardError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DashboardError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(error.to_string())
    }
}
