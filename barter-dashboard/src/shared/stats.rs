//! Aggregate stats mirror
//!
//! Holds the latest [`StatsSnapshot`], replaced wholesale by push events and manual pulls. A
//! field absent from the newest snapshot is unknown, never the value from an older snapshot.

use crate::shared::{
    display::{format_count, format_opt_decimal, format_percent},
    error::DashboardError,
    query::StatsSource,
    types::{PendingOrder, StatsSnapshot},
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// How the current snapshot arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotOrigin {
    Push,
    Pull,
}

#[derive(Debug, Clone, Default)]
pub struct StatsMirror {
    snapshot: Option<StatsSnapshot>,
    origin: Option<SnapshotOrigin>,
    updated_at: Option<DateTime<Utc>>,
}

impl StatsMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirror with a pushed snapshot.
    pub fn on_snapshot(&mut self, snapshot: StatsSnapshot) {
        self.replace(snapshot, SnapshotOrigin::Push);
    }

    /// Apply the outcome of a manual pull. Failures keep the prior snapshot.
    ///
    /// Returns `true` if the snapshot was replaced.
    pub fn apply_refresh(&mut self, result: Result<StatsSnapshot, DashboardError>) -> bool {
        match result {
            Ok(snapshot) => {
                self.replace(snapshot, SnapshotOrigin::Pull);
                true
            }
            Err(error) => {
                warn!(%error, "stats refresh failed, keeping last snapshot");
                false
            }
        }
    }

    /// Pull a snapshot from `source` and apply it.
    pub async fn refresh<S>(&mut self, source: &S) -> bool
    where
        S: StatsSource + ?Sized,
    {
        let result = source.fetch_stats().await;
        self.apply_refresh(result)
    }

    /// Return to the "no snapshot yet" state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn origin(&self) -> Option<SnapshotOrigin> {
        self.origin
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn view(&self) -> StatsView {
        StatsView::from(self)
    }

    fn replace(&mut self, snapshot: StatsSnapshot, origin: SnapshotOrigin) {
        debug!(?origin, total_trades = ?snapshot.total_trades, "replacing stats snapshot");
        self.snapshot = Some(snapshot);
        self.origin = Some(origin);
        self.updated_at = Some(Utc::now());
    }
}

/// Render-ready stats figures. Unknown and undefined values are the `--` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub total_trades: String,
    pub winning_trades: String,
    pub losing_trades: String,
    pub win_rate: String,
    pub long_count: String,
    pub short_count: String,
    pub total_loss: String,
    pub average_loss: String,
    pub pending_order: Option<PendingOrder>,
    pub origin: Option<SnapshotOrigin>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&StatsMirror> for StatsView {
    fn from(mirror: &StatsMirror) -> Self {
        let empty = StatsSnapshot::default();
        let snapshot = mirror.snapshot.as_ref().unwrap_or(&empty);

        Self {
            total_trades: format_count(snapshot.total_trades),
            winning_trades: format_count(snapshot.winning_trades),
            losing_trades: format_count(snapshot.losing_trades),
            win_rate: format_percent(snapshot.win_rate()),
            long_count: format_count(snapshot.long_count),
            short_count: format_count(snapshot.short_count),
            total_loss: format_opt_decimal(snapshot.total_loss),
            average_loss: format_opt_decimal(snapshot.average_loss()),
            pending_order: snapshot.pending_order.clone(),
            origin: mirror.origin,
            updated_at: mirror.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::display::PLACEHOLDER;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedStats(Result<StatsSnapshot, DashboardError>);

    #[async_trait]
    impl StatsSource for FixedStats {
        async fn fetch_stats(&self) -> Result<StatsSnapshot, DashboardError> {
            self.0.clone()
        }
    }

    fn full_snapshot() -> StatsSnapshot {
        StatsSnapshot {
            total_trades: Some(20),
            winning_trades: Some(12),
            losing_trades: Some(8),
            win_rate: Some(60.0),
            long_count: Some(11),
            short_count: Some(9),
            total_loss: Some(dec!(-400)),
            pending_order: None,
        }
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(full_snapshot());

        mirror.on_snapshot(StatsSnapshot {
            total_trades: Some(21),
            ..Default::default()
        });

        let snapshot = mirror.snapshot().unwrap();
        assert_eq!(snapshot.total_trades, Some(21));
        assert_eq!(snapshot.winning_trades, None);
        assert_eq!(snapshot.total_loss, None);
        assert_eq!(mirror.origin(), Some(SnapshotOrigin::Push));
    }

    #[test]
    fn test_view_formats_figures() {
        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(full_snapshot());

        let view = mirror.view();
        assert_eq!(view.total_trades, "20");
        assert_eq!(view.win_rate, "60.00%");
        assert_eq!(view.total_loss, "-400.00");
        assert_eq!(view.average_loss, "-50.00");
        assert!(view.updated_at.is_some());
    }

    #[test]
    fn test_view_placeholders() {
        let mirror = StatsMirror::new();
        let view = mirror.view();

        assert_eq!(view.total_trades, PLACEHOLDER);
        assert_eq!(view.win_rate, PLACEHOLDER);
        assert_eq!(view.average_loss, PLACEHOLDER);
        assert_eq!(view.origin, None);

        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(StatsSnapshot {
            total_trades: Some(0),
            winning_trades: Some(0),
            losing_trades: Some(0),
            total_loss: Some(dec!(0)),
            ..Default::default()
        });
        let view = mirror.view();

        assert_eq!(view.total_trades, "0");
        assert_eq!(view.win_rate, PLACEHOLDER);
        assert_eq!(view.average_loss, PLACEHOLDER);
    }

    #[test]
    fn test_reset() {
        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(full_snapshot());

        mirror.reset();

        assert!(mirror.snapshot().is_none());
        assert!(mirror.updated_at().is_none());
    }

    #[tokio::test]
    async fn test_refresh_success_replaces() {
        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(full_snapshot());

        let source = FixedStats(Ok(StatsSnapshot {
            total_trades: Some(30),
            ..Default::default()
        }));

        assert!(mirror.refresh(&source).await);
        assert_eq!(mirror.snapshot().unwrap().total_trades, Some(30));
        assert_eq!(mirror.origin(), Some(SnapshotOrigin::Pull));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_prior() {
        let mut mirror = StatsMirror::new();
        mirror.on_snapshot(full_snapshot());

        let source = FixedStats(Err(DashboardError::Request("timed out".to_string())));

        assert!(!mirror.refresh(&source).await);
        assert_eq!(mirror.snapshot(), Some(&full_snapshot()));
        assert_eq!(mirror.origin(), Some(SnapshotOrigin::Push));
    }
}
