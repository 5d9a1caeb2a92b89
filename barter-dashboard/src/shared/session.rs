//! Dashboard session event loop
//!
//! A [`DashboardSession`] owns the signal and trade tables, the candle window, the stats mirror
//! and the push subscription. User [`Command`]s, push events, connection status updates and
//! query completions are handled strictly one at a time on a single task; queries run as futures
//! polled by the same loop, so other events keep flowing while a query is outstanding.
//!
//! After every handled event the session publishes an immutable [`DashboardView`] through a
//! [`tokio::sync::watch`] channel.

use crate::shared::{
    config::DashboardConfig,
    error::DashboardError,
    pagination::{
        ApplyOutcome, FilterUpdate, PageRequest, PageView, PaginatedView, QueryPage, RequestToken,
    },
    query::{HttpDashboardApi, RecordQuery, StatsSource},
    source::{ConnectionStatus, EventSource},
    stats::{StatsMirror, StatsView},
    types::{LiveRecord, PushEvent, SignalRecord, StatsSnapshot, TradeRecord},
    window::{CandleSeries, CandleWindow, PriceBounds},
};
use futures::{future::BoxFuture, stream::FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Paginated tables owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Signals,
    Trades,
}

/// User intent fed into a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFilter { table: Table, update: FilterUpdate },
    SetPage { table: Table, page: u32 },
    NextPage(Table),
    PrevPage(Table),
    Refresh(Table),
    ResetFilters(Table),
    RefreshStats,
    Shutdown,
}

/// Immutable view model published after every handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub signals: PageView<SignalRecord>,
    pub trades: PageView<TradeRecord>,
    /// Candle window, oldest first
    pub candles: CandleSeries,
    pub price_bounds: Option<PriceBounds>,
    pub max_volume: Option<f64>,
    pub last_price: Option<f64>,
    pub stats: StatsView,
    pub connection: ConnectionStatus,
}

/// Outcome of an in-flight request.
enum Completion {
    Signals(RequestToken, Result<QueryPage<SignalRecord>, DashboardError>),
    Trades(RequestToken, Result<QueryPage<TradeRecord>, DashboardError>),
    Stats(Result<StatsSnapshot, DashboardError>),
}

pub struct DashboardSession {
    signals: PaginatedView<SignalRecord>,
    trades: PaginatedView<TradeRecord>,
    candles: CandleWindow,
    stats: StatsMirror,
    last_price: Option<f64>,
    connection: ConnectionStatus,
    has_connected: bool,
    signal_query: Arc<dyn RecordQuery<SignalRecord>>,
    trade_query: Arc<dyn RecordQuery<TradeRecord>>,
    stats_source: Arc<dyn StatsSource>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    view_tx: watch::Sender<DashboardView>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("signals", &self.signals)
            .field("trades", &self.trades)
            .field("candles", &self.candles)
            .field("stats", &self.stats)
            .field("last_price", &self.last_price)
            .field("connection", &self.connection)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl DashboardSession {
    /// Construct a session and the receiver its [`DashboardView`]s are published to.
    pub fn new(
        config: &DashboardConfig,
        signal_query: Arc<dyn RecordQuery<SignalRecord>>,
        trade_query: Arc<dyn RecordQuery<TradeRecord>>,
        stats_source: Arc<dyn StatsSource>,
    ) -> (Self, watch::Receiver<DashboardView>) {
        let signals = PaginatedView::new("signals", config.page_limit);
        let trades = PaginatedView::new("trades", config.page_limit);
        let candles = CandleWindow::new(config.candle_window);
        let stats = StatsMirror::new();

        let view = DashboardView {
            signals: signals.snapshot(),
            trades: trades.snapshot(),
            candles: candles.snapshot(),
            price_bounds: None,
            max_volume: None,
            last_price: None,
            stats: stats.view(),
            connection: ConnectionStatus::Disconnected,
        };
        let (view_tx, view_rx) = watch::channel(view);

        let session = Self {
            signals,
            trades,
            candles,
            stats,
            last_price: None,
            connection: ConnectionStatus::Disconnected,
            has_connected: false,
            signal_query,
            trade_query,
            stats_source,
            in_flight: FuturesUnordered::new(),
            view_tx,
        };

        (session, view_rx)
    }

    /// Construct a session backed by the REST API at `config.api_url`.
    pub fn with_http_api(
        config: &DashboardConfig,
    ) -> Result<(Self, watch::Receiver<DashboardView>), DashboardError> {
        let api = Arc::new(HttpDashboardApi::new(config)?);
        Ok(Self::new(config, api.clone(), api.clone(), api))
    }

    /// Current view model.
    pub fn view(&self) -> DashboardView {
        DashboardView {
            signals: self.signals.snapshot(),
            trades: self.trades.snapshot(),
            candles: self.candles.snapshot(),
            price_bounds: self.candles.price_bounds(),
            max_volume: self.candles.max_volume(),
            last_price: self.last_price,
            stats: self.stats.view(),
            connection: self.connection,
        }
    }

    pub fn signals(&self) -> &PaginatedView<SignalRecord> {
        &self.signals
    }

    pub fn trades(&self) -> &PaginatedView<TradeRecord> {
        &self.trades
    }

    pub fn candles(&self) -> &CandleWindow {
        &self.candles
    }

    pub fn stats(&self) -> &StatsMirror {
        &self.stats
    }

    /// Run until [`Command::Shutdown`] or until every command sender is dropped.
    ///
    /// The push subscription is opened once on entry and released on exit.
    pub async fn run<S>(mut self, source: S, mut commands: mpsc::Receiver<Command>)
    where
        S: EventSource,
    {
        let mut subscription = source.subscribe();
        info!("dashboard session started");

        let request = self.signals.refresh();
        self.dispatch_signals(request);
        let request = self.trades.refresh();
        self.dispatch_trades(request);
        self.publish();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = subscription.events.recv() => self.handle_event(event),
                Some(status) = subscription.status.recv() => self.handle_status(status),
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.handle_completion(completion)
                }
            }

            self.publish();
        }

        subscription.close().await;
        info!(abandoned = self.in_flight.len(), "dashboard session stopped");
    }

    fn handle_command(&mut self, command: Command) {
        debug!(?command, "handling command");

        match command {
            Command::SetFilter { table, update } => match table {
                Table::Signals => {
                    let request = self.signals.set_filter(update);
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.set_filter(update);
                    self.dispatch_trades(request)
                }
            },
            Command::SetPage { table, page } => match table {
                Table::Signals => {
                    let request = self.signals.set_page(page);
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.set_page(page);
                    self.dispatch_trades(request)
                }
            },
            Command::NextPage(table) => match table {
                Table::Signals => {
                    let request = self.signals.next_page();
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.next_page();
                    self.dispatch_trades(request)
                }
            },
            Command::PrevPage(table) => match table {
                Table::Signals => {
                    let request = self.signals.prev_page();
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.prev_page();
                    self.dispatch_trades(request)
                }
            },
            Command::Refresh(table) => match table {
                Table::Signals => {
                    let request = self.signals.refresh();
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.refresh();
                    self.dispatch_trades(request)
                }
            },
            Command::ResetFilters(table) => match table {
                Table::Signals => {
                    let request = self.signals.reset_filters();
                    self.dispatch_signals(request)
                }
                Table::Trades => {
                    let request = self.trades.reset_filters();
                    self.dispatch_trades(request)
                }
            },
            Command::RefreshStats => self.dispatch_stats(),
            Command::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::Snapshot(snapshot) => self.stats.on_snapshot(snapshot),
            PushEvent::Record(LiveRecord::Signal(record)) => self.signals.merge_live(record),
            PushEvent::Record(LiveRecord::Trade(record)) => self.trades.merge_live(record),
            PushEvent::Tick(candle) => self.candles.push(candle),
            PushEvent::Price(price) => self.last_price = Some(price),
        }
    }

    fn handle_status(&mut self, status: ConnectionStatus) {
        debug!(?status, "push channel status");

        if status == ConnectionStatus::Connected {
            if self.has_connected {
                info!("push channel reconnected, resetting candle window and stats");
                self.candles.reset();
                self.stats.reset();
            }
            self.has_connected = true;
        }

        self.connection = status;
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Signals(token, result) => {
                if let ApplyOutcome::Clamped(request) = self.signals.apply(token, result) {
                    self.dispatch_signals(request);
                }
            }
            Completion::Trades(token, result) => {
                if let ApplyOutcome::Clamped(request) = self.trades.apply(token, result) {
                    self.dispatch_trades(request);
                }
            }
            Completion::Stats(result) => {
                self.stats.apply_refresh(result);
            }
        }
    }

    fn dispatch_signals(&mut self, request: impl Into<Option<PageRequest>>) {
        let Some(request) = request.into() else {
            return;
        };

        let query = Arc::clone(&self.signal_query);
        self.in_flight.push(Box::pin(async move {
            let result = query.query(&request).await;
            Completion::Signals(request.token, result)
        }));
    }

    fn dispatch_trades(&mut self, request: impl Into<Option<PageRequest>>) {
        let Some(request) = request.into() else {
            return;
        };

        let query = Arc::clone(&self.trade_query);
        self.in_flight.push(Box::pin(async move {
            let result = query.query(&request).await;
            Completion::Trades(request.token, result)
        }));
    }

    fn dispatch_stats(&mut self) {
        let source = Arc::clone(&self.stats_source);
        self.in_flight.push(Box::pin(async move {
            Completion::Stats(source.fetch_stats().await)
        }));
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}
