use barter_dashboard::{
    shared::display::{format_currency, format_opt_price, PLACEHOLDER},
    Command, DashboardConfig, DashboardSession, WebSocketSource,
};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialise INFO Tracing log subscriber
    init_logging();

    let config = DashboardConfig::from_env();
    info!(
        api = %config.api_url,
        websocket = %config.websocket.url,
        page_limit = config.page_limit,
        "starting headless dashboard session"
    );

    let (session, mut view) = match DashboardSession::with_http_api(&config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to construct dashboard session");
            return;
        }
    };

    let (command_tx, command_rx) = mpsc::channel(16);
    let source = WebSocketSource::new(config.websocket.clone());
    let mut session = tokio::spawn(session.run(source, command_rx));

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = view.borrow_and_update().clone();
                info!(
                    connection = ?snapshot.connection,
                    signals = snapshot.signals.records.len(),
                    signal_page = %format!("{}/{}", snapshot.signals.descriptor.page, snapshot.signals.descriptor.max_page()),
                    trades = snapshot.trades.records.len(),
                    candles = snapshot.candles.len(),
                    last_price = %format_opt_price(snapshot.last_price),
                    latest_close = %snapshot.candles.latest().map(|c| format_currency(c.close)).unwrap_or_else(|| PLACEHOLDER.to_string()),
                    total_trades = %snapshot.stats.total_trades,
                    win_rate = %snapshot.stats.win_rate,
                    "dashboard view updated"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received, shutting down");
                let _ = command_tx.send(Command::Shutdown).await;
                break;
            }
            _ = &mut session => {
                break;
            }
        }
    }

    if !session.is_finished() {
        let _ = session.await;
    }
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
