/// WebSocket push channel for the dashboard backend
///
/// Provides automatic reconnection, heartbeat, and event parsing

use crate::shared::{
    error::DashboardError,
    source::{ConnectionStatus, EventSource, Subscription},
    types::{PushEvent, PushEventMessage},
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// WebSocket client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketConfig {
    /// WebSocket server URL
    pub url: String,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Reconnection delay after disconnect
    pub reconnect_delay: Duration,
    /// Maximum channel buffer size for events
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/ws".to_string(),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            channel_buffer_size: 1000,
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size.max(1);
        self
    }
}

/// Auto-reconnecting WebSocket [`EventSource`].
#[derive(Debug, Clone)]
pub struct WebSocketSource {
    config: WebSocketConfig,
}

impl WebSocketSource {
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

impl EventSource for WebSocketSource {
    /// Spawn the connection loop. Must be called from within a tokio runtime.
    fn subscribe(self) -> Subscription {
        // Install rustls crypto provider for WSS connections
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let (status_tx, status_rx) = mpsc::channel(10);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_websocket_loop(
            self.config,
            event_tx,
            status_tx,
            shutdown_rx,
        ));

        Subscription::new(event_rx, status_rx, shutdown_tx, Some(task))
    }
}

/// What to do with a single text frame.
#[derive(Debug, PartialEq)]
enum Frame {
    Event(PushEvent),
    Skip,
}

/// Parse a text frame into a typed event. Malformed or unknown frames are skipped.
fn parse_frame(text: &str) -> Frame {
    let message = match serde_json::from_str::<PushEventMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            // Welcome frames may not use the event envelope
            let is_welcome = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|value| {
                    value
                        .get("type")
                        .and_then(|kind| kind.as_str())
                        .map(|kind| kind == "welcome")
                })
                .unwrap_or(false);

            if is_welcome {
                debug!("Received welcome message");
            } else {
                error!("Failed to parse message: {}", e);
                debug!("Raw message: {}", text);
            }
            return Frame::Skip;
        }
    };

    if message.is_welcome() {
        debug!("Received welcome message");
        return Frame::Skip;
    }

    let name = message.event.clone();
    match PushEvent::try_from(message) {
        Ok(event) => Frame::Event(event),
        Err(DashboardError::UnknownEvent(_)) => {
            debug!(event = %name, "Ignoring unknown push event");
            Frame::Skip
        }
        Err(e) => {
            warn!(event = %name, error = %e, "Dropping malformed push event");
            Frame::Skip
        }
    }
}

/// Main WebSocket connection loop with auto-reconnect
async fn run_websocket_loop(
    config: WebSocketConfig,
    event_tx: mpsc::Sender<PushEvent>,
    status_tx: mpsc::Sender<ConnectionStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    info!("Starting WebSocket client for {}", config.url);

    loop {
        // Notify about reconnection attempt
        let _ = status_tx.send(ConnectionStatus::Reconnecting).await;

        let connection = tokio::select! {
            connection = connect_async(&config.url) => connection,
            _ = &mut shutdown_rx => {
                debug!("Subscription released while connecting");
                return;
            }
        };

        match connection {
            Ok((ws_stream, _)) => {
                info!("Connected to WebSocket server at {}", config.url);
                let _ = status_tx.send(ConnectionStatus::Connected).await;

                let (mut write, mut read) = ws_stream.split();

                // Spawn ping task to keep connection alive
                let ping_interval = config.ping_interval;
                let (ping_shutdown_tx, mut ping_shutdown_rx) = mpsc::channel::<()>(1);

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(ping_interval);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if write.send(Message::Ping(vec![].into())).await.is_err() {
                                    debug!("Failed to send ping, connection likely dead");
                                    break;
                                }
                            }
                            _ = ping_shutdown_rx.recv() => {
                                debug!("Ping task shutting down");
                                let _ = write.close().await;
                                break;
                            }
                        }
                    }
                });

                // Main message reading loop
                let mut released = false;
                loop {
                    let msg = tokio::select! {
                        msg = read.next() => msg,
                        _ = &mut shutdown_rx => {
                            released = true;
                            break;
                        }
                    };

                    let Some(msg) = msg else {
                        break;
                    };

                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Frame::Event(event) = parse_frame(&text) {
                                if event_tx.send(event).await.is_err() {
                                    warn!("Event receiver dropped, stopping client");
                                    released = true;
                                    break;
                                }
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("Server closed connection");
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                            // Heartbeat messages - tungstenite handles these automatically
                        }
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }

                // Stop ping task
                let _ = ping_shutdown_tx.send(()).await;

                if released {
                    info!("WebSocket subscription released");
                    return;
                }

                // Notify disconnection
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
                warn!("Connection closed, will reconnect...");
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", config.url, e);
                let _ = status_tx.send(ConnectionStatus::Disconnected).await;
            }
        }

        // Wait before reconnecting
        debug!(
            "Waiting {:?} before reconnecting...",
            config.reconnect_delay
        );
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            _ = &mut shutdown_rx => {
                debug!("Subscription released while waiting to reconnect");
                return;
            }
        }
    }
}
