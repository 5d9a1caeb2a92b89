/// Core data types for dashboard records, candles, stats and push events
///
/// These types match the JSON shapes served by the dashboard backend over HTTP and pushed over
/// the WebSocket channel.

use crate::shared::{
    de::{
        de_f64, de_lenient, de_opt_f64, de_opt_timestamp, de_opt_u64, de_timestamp, value_to_f64,
    },
    error::DashboardError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade or signal direction.
///
/// Signal tables use `BUY` / `SELL`, trade tables use `LONG` / `SHORT`. Unrecognised values are
/// preserved in [`Direction::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Buy,
    Sell,
    Long,
    Short,
    Neutral,
    Other(String),
}

impl Direction {
    /// Wire representation, also used for query parameters.
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
            Direction::Neutral => "NEUTRAL",
            Direction::Other(other) => other.as_str(),
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Direction::Buy | Direction::Long)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Direction::Sell | Direction::Short)
    }
}

impl From<&str> for Direction {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "BUY" => Direction::Buy,
            "SELL" => Direction::Sell,
            "LONG" => Direction::Long,
            "SHORT" => Direction::Short,
            "NEUTRAL" => Direction::Neutral,
            _ => Direction::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Direction> for String {
    fn from(value: Direction) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signal strength classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
    #[default]
    Unknown,
}

impl SignalStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStrength::Strong => "strong",
            SignalStrength::Medium => "medium",
            SignalStrength::Weak => "weak",
            SignalStrength::Unknown => "unknown",
        }
    }
}

impl From<Option<String>> for SignalStrength {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("strong") => SignalStrength::Strong,
            Some("medium") => SignalStrength::Medium,
            Some("weak") => SignalStrength::Weak,
            _ => SignalStrength::Unknown,
        }
    }
}

impl From<SignalStrength> for String {
    fn from(value: SignalStrength) -> Self {
        value.as_str().to_string()
    }
}

/// Outcome classification of a trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TradeStatus {
    Winner,
    Loser,
    Open,
    #[default]
    Unknown,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Winner => "WINNER",
            TradeStatus::Loser => "LOSER",
            TradeStatus::Open => "OPEN",
            TradeStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<Option<String>> for TradeStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim).map(str::to_ascii_uppercase).as_deref() {
            Some("WINNER") => TradeStatus::Winner,
            Some("LOSER") => TradeStatus::Loser,
            Some("OPEN") => TradeStatus::Open,
            _ => TradeStatus::Unknown,
        }
    }
}

impl From<TradeStatus> for String {
    fn from(value: TradeStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Common view of a row in a paginated table.
///
/// Rows are immutable once received and ordered most-recent first within a page.
pub trait PageRecord: fmt::Debug + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn timestamp(&self) -> DateTime<Utc>;

    fn direction(&self) -> &Direction;

    fn price(&self) -> f64;
}

/// A trading signal row (`/get_signal_details`, `liveSignal` push).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub direction: Direction,
    /// BUY / SELL action label
    #[serde(default, deserialize_with = "de_lenient")]
    pub signal: Option<Direction>,
    #[serde(deserialize_with = "de_timestamp")]
    pub signal_time: DateTime<Utc>,
    #[serde(deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(default)]
    pub strength: SignalStrength,
}

impl PageRecord for SignalRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.signal_time
    }

    fn direction(&self) -> &Direction {
        &self.direction
    }

    fn price(&self) -> f64 {
        self.price
    }
}

/// A trade row (`/get_trade_details`, `liveTrade` push).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(deserialize_with = "de_f64")]
    pub entry_price: f64,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub exit_price: Option<f64>,
    pub direction: Direction,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub traded_quantity: Option<f64>,
    #[serde(default)]
    pub current_status: String,
    #[serde(default)]
    pub trade_status: TradeStatus,
    #[serde(default, deserialize_with = "de_lenient")]
    pub profit_loss: Option<Decimal>,
    #[serde(deserialize_with = "de_timestamp")]
    pub entry_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub exit_time: Option<DateTime<Utc>>,
}

impl TradeRecord {
    /// Check if the trade has been exited
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some() || self.exit_price.is_some()
    }

    /// Check if the trade closed in profit
    pub fn is_profitable(&self) -> bool {
        self.profit_loss
            .map(|pnl| pnl.is_sign_positive() && !pnl.is_zero())
            .unwrap_or(false)
    }
}

impl PageRecord for TradeRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.entry_time
    }

    fn direction(&self) -> &Direction {
        &self.direction
    }

    fn price(&self) -> f64 {
        self.entry_price
    }
}

/// Summary of the order currently awaiting fill or resolution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub exit_price: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient")]
    pub direction: Option<Direction>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub target: Option<f64>,
    /// PENDING, OPEN, CLOSED, CANCELLED
    #[serde(default)]
    pub current_status: String,
    /// WIN, LOSS, RUNNING, BREAKEVEN
    #[serde(default)]
    pub trade_status: String,
    /// Strategy that produced the order, eg/ EMA, RSI, MACD
    #[serde(default)]
    pub signal_type: String,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub entry_time: Option<DateTime<Utc>>,
}

/// Aggregate trade statistics, replaced wholesale on every push or pull.
///
/// Every field is optional: a missing or malformed field means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub total_trades: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub winning_trades: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub losing_trades: Option<u64>,
    /// Win rate as a percentage (0..=100)
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub win_rate: Option<f64>,
    /// Number of long / buy trades
    #[serde(rename = "most_buy_direction", default, deserialize_with = "de_opt_u64")]
    pub long_count: Option<u64>,
    /// Number of short / sell trades
    #[serde(rename = "most_sell_direction", default, deserialize_with = "de_opt_u64")]
    pub short_count: Option<u64>,
    /// Cumulative realised loss
    #[serde(rename = "totalLose", default, deserialize_with = "de_lenient")]
    pub total_loss: Option<Decimal>,
    #[serde(rename = "pending_orders", default, deserialize_with = "de_lenient")]
    pub pending_order: Option<PendingOrder>,
}

impl StatsSnapshot {
    /// Win rate percentage, preferring the server figure and falling back to
    /// `winning / total * 100`. `None` when neither is defined.
    pub fn win_rate(&self) -> Option<f64> {
        self.win_rate.or_else(|| match (self.winning_trades, self.total_trades) {
            (Some(winning), Some(total)) if total > 0 => {
                Some(winning as f64 / total as f64 * 100.0)
            }
            _ => None,
        })
    }

    /// Average loss per losing trade. `None` when there are no losing trades.
    pub fn average_loss(&self) -> Option<Decimal> {
        match (self.total_loss, self.losing_trades) {
            (Some(total_loss), Some(losing)) if losing > 0 => {
                total_loss.checked_div(Decimal::from(losing))
            }
            _ => None,
        }
    }
}

/// A single OHLCV candle from the tick stream.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Candle {
    #[serde(deserialize_with = "de_timestamp")]
    pub time: DateTime<Utc>,
    #[serde(deserialize_with = "de_f64")]
    pub open: f64,
    #[serde(deserialize_with = "de_f64")]
    pub high: f64,
    #[serde(deserialize_with = "de_f64")]
    pub low: f64,
    #[serde(deserialize_with = "de_f64")]
    pub close: f64,
    #[serde(deserialize_with = "de_f64")]
    pub volume: f64,
}

impl Candle {
    /// Check if the candle closed at or above its open
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_height(&self) -> f64 {
        self.body_high() - self.body_low()
    }

    /// Length of the upper wick
    pub fn wick_top(&self) -> f64 {
        self.high - self.body_high()
    }

    /// Length of the lower wick
    pub fn wick_bottom(&self) -> f64 {
        self.body_low() - self.low
    }
}

/// Push event names accepted from the WebSocket channel.
pub mod event {
    pub const STATS: &[&str] = &["tradeDetails", "snapshot"];
    pub const TICK: &[&str] = &["binance_kline", "tick"];
    pub const PRICE: &[&str] = &["binance_price", "price"];
    pub const SIGNAL: &[&str] = &["signal", "liveSignal"];
    pub const TRADE: &[&str] = &["trade", "liveTrade"];
    pub const WELCOME: &str = "welcome";
}

/// Push event envelope from the WebSocket channel
///
/// `data` is deserialized based on the `event` field, see [`PushEvent`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PushEventMessage {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl PushEventMessage {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn is_welcome(&self) -> bool {
        self.event == event::WELCOME
    }
}

/// A single record pushed outside of any query.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveRecord {
    Signal(SignalRecord),
    Trade(TradeRecord),
}

/// Typed push event.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Snapshot(StatsSnapshot),
    Record(LiveRecord),
    Tick(Candle),
    Price(f64),
}

impl TryFrom<PushEventMessage> for PushEvent {
    type Error = DashboardError;

    fn try_from(message: PushEventMessage) -> Result<Self, Self::Error> {
        let PushEventMessage { event: name, data } = message;
        let name = name.as_str();

        if event::STATS.contains(&name) {
            // Malformed snapshot fields are unknown, never fatal
            let stats = match data {
                serde_json::Value::Object(_) => serde_json::from_value(data)?,
                _ => StatsSnapshot::default(),
            };
            Ok(PushEvent::Snapshot(stats))
        } else if event::TICK.contains(&name) {
            Ok(PushEvent::Tick(serde_json::from_value(data)?))
        } else if event::PRICE.contains(&name) {
            value_to_f64(&data)
                .or_else(|| data.get("price").and_then(value_to_f64))
                .map(PushEvent::Price)
                .ok_or_else(|| DashboardError::Decode(format!("invalid price payload: {data}")))
        } else if event::SIGNAL.contains(&name) {
            Ok(PushEvent::Record(LiveRecord::Signal(serde_json::from_value(data)?)))
        } else if event::TRADE.contains(&name) {
            Ok(PushEvent::Record(LiveRecord::Trade(serde_json::from_value(data)?)))
        } else {
            Err(DashboardError::UnknownEvent(name.to_string()))
        }
    }
}
