//! Push event sources
//!
//! An [`EventSource`] is opened exactly once into a [`Subscription`]: a stream of typed
//! [`PushEvent`]s plus a stream of [`ConnectionStatus`] updates. Dropping or closing the
//! subscription releases the underlying channel.

use crate::shared::{error::DashboardError, types::PushEvent};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::debug;

/// Connection status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Producer of push events for a [`DashboardSession`](crate::DashboardSession).
pub trait EventSource {
    /// Open the long-lived subscription.
    fn subscribe(self) -> Subscription;
}

/// Open push channel. Released on [`Subscription::close`] or drop.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) events: mpsc::Receiver<PushEvent>,
    pub(crate) status: mpsc::Receiver<ConnectionStatus>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Construct a subscription; `shutdown` is signalled on release and `task`, if any, is the
    /// producer task to await on [`Subscription::close`].
    pub fn new(
        events: mpsc::Receiver<PushEvent>,
        status: mpsc::Receiver<ConnectionStatus>,
        shutdown: oneshot::Sender<()>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            events,
            status,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub async fn next_event(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    pub async fn next_status(&mut self) -> Option<ConnectionStatus> {
        self.status.recv().await
    }

    /// Signal the producer to stop and wait for it to finish.
    pub async fn close(mut self) {
        self.release();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                debug!(%error, "push event task ended abnormally");
            }
        }
    }

    fn release(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            debug!("releasing push event subscription");
            let _ = shutdown.send(());
        }
        self.events.close();
        self.status.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// In-memory [`EventSource`] driven through a [`ChannelSourceHandle`].
#[derive(Debug)]
pub struct ChannelSource {
    events: mpsc::Receiver<PushEvent>,
    status: mpsc::Receiver<ConnectionStatus>,
    shutdown: oneshot::Sender<()>,
}

/// Sending half of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelSourceHandle {
    events: mpsc::Sender<PushEvent>,
    status: mpsc::Sender<ConnectionStatus>,
    released: oneshot::Receiver<()>,
}

impl ChannelSource {
    pub fn new(buffer: usize) -> (Self, ChannelSourceHandle) {
        let buffer = buffer.max(1);
        let (event_tx, event_rx) = mpsc::channel(buffer);
        let (status_tx, status_rx) = mpsc::channel(buffer);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        (
            Self {
                events: event_rx,
                status: status_rx,
                shutdown: shutdown_tx,
            },
            ChannelSourceHandle {
                events: event_tx,
                status: status_tx,
                released: shutdown_rx,
            },
        )
    }
}

impl EventSource for ChannelSource {
    fn subscribe(self) -> Subscription {
        Subscription::new(self.events, self.status, self.shutdown, None)
    }
}

impl ChannelSourceHandle {
    pub async fn send_event(&self, event: PushEvent) -> Result<(), DashboardError> {
        self.events
            .send(event)
            .await
            .map_err(|_| DashboardError::Socket("push event subscription released".to_string()))
    }

    pub async fn send_status(&self, status: ConnectionStatus) -> Result<(), DashboardError> {
        self.status
            .send(status)
            .await
            .map_err(|_| DashboardError::Socket("push event subscription released".to_string()))
    }

    /// Check if the subscription has been closed or dropped.
    pub fn is_released(&mut self) -> bool {
        !matches!(
            self.released.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }

    /// Wait until the subscription has been closed or dropped.
    pub async fn released(self) {
        let _ = self.released.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let (source, handle) = ChannelSource::new(8);
        let mut subscription = source.subscribe();

        handle.send_event(PushEvent::Price(1.0)).await.unwrap();
        handle.send_event(PushEvent::Price(2.0)).await.unwrap();
        handle.send_status(ConnectionStatus::Connected).await.unwrap();

        assert_eq!(subscription.next_event().await, Some(PushEvent::Price(1.0)));
        assert_eq!(subscription.next_event().await, Some(PushEvent::Price(2.0)));
        assert_eq!(subscription.next_status().await, Some(ConnectionStatus::Connected));
    }

    #[tokio::test]
    async fn test_subscription_drop_releases() {
        let (source, mut handle) = ChannelSource::new(8);
        let subscription = source.subscribe();
        assert!(!handle.is_released());

        drop(subscription);

        assert!(handle.is_released());
        assert!(handle.send_event(PushEvent::Price(1.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_subscription_close_releases() {
        let (source, handle) = ChannelSource::new(8);
        let subscription = source.subscribe();

        subscription.close().await;

        assert!(handle.send_status(ConnectionStatus::Connected).await.is_err());
        handle.released().await;
    }

    #[tokio::test]
    async fn test_subscription_close_awaits_task() {
        let (_event_tx, event_rx) = mpsc::channel(1);
        let (_status_tx, status_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let _ = shutdown_rx.await;
            let _ = done_tx.send(());
        });

        Subscription::new(event_rx, status_rx, shutdown_tx, Some(task))
            .close()
            .await;

        assert!(done_rx.await.is_ok());
    }
}
