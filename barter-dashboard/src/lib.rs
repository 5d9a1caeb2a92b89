/// Barter Dashboard - client-side state layer for a live trading dashboard
///
/// Reconciles three asynchronous data sources into one consistent view model:
/// - paginated, filtered signal & trade queries against the REST backend
/// - push events over WebSocket: stats snapshots, single live records and the last price
/// - a high-frequency tick stream of OHLCV candles
///
/// The library includes:
/// - Filtered pagination controller with stale-response protection
/// - Live record merging into a fixed-size page
/// - Bounded candle window with chart axis bounds
/// - Aggregate stats mirror with display placeholders
/// - A [`DashboardSession`] event loop publishing [`DashboardView`] snapshots
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{
    Candle, Direction, LiveRecord, PageRecord, PendingOrder, PushEvent, PushEventMessage,
    SignalRecord, SignalStrength, StatsSnapshot, TradeRecord, TradeStatus,
};

pub use shared::config::DashboardConfig;
pub use shared::error::DashboardError;

pub use shared::pagination::{
    ApplyOutcome, FilterSet, FilterUpdate, PageDescriptor, PageRequest, PageView, PaginatedView,
    QueryPage, QueryParams, RequestToken,
};
pub use shared::live::LivePage;
pub use shared::window::{CandleSeries, CandleWindow, PriceBounds, DEFAULT_CANDLE_WINDOW};
pub use shared::stats::{SnapshotOrigin, StatsMirror, StatsView};

pub use shared::query::{HttpDashboardApi, RecordQuery, StatsSource};
pub use shared::source::{ChannelSource, ChannelSourceHandle, ConnectionStatus, EventSource, Subscription};
pub use shared::websocket::{WebSocketConfig, WebSocketSource};

pub use shared::session::{Command, DashboardSession, DashboardView, Table};
