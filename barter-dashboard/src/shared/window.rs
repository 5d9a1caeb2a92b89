//! Bounded candle window fed by the tick stream
//!
//! Every tick becomes one candle appended at the back; once the window holds `capacity` candles
//! the oldest is evicted first. Candles are never merged, even when timestamps collide.

use crate::shared::types::Candle;
use std::{collections::VecDeque, ops::Deref, sync::Arc};

/// Default number of candles kept in the window
pub const DEFAULT_CANDLE_WINDOW: usize = 30;

/// Padding applied to the lowest low when computing the price axis
const PRICE_PADDING_LOW: f64 = 0.9999;

/// Padding applied to the highest high when computing the price axis
const PRICE_PADDING_HIGH: f64 = 1.0001;

/// Padded price axis bounds over every candle in a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// FIFO ring buffer of the most recent candles.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl Default for CandleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CANDLE_WINDOW)
    }
}

impl CandleWindow {
    /// Create a new window holding at most `capacity` candles (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, candle: Candle) {
        if self.candles.len() >= self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended candle
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Discard every candle, eg/ after the push channel reconnects.
    pub fn reset(&mut self) {
        self.candles.clear();
    }

    /// Get last N candles as references
    pub fn last_n(&self, n: usize) -> Vec<&Candle> {
        let start = self.candles.len().saturating_sub(n);
        self.candles.range(start..).collect()
    }

    /// Immutable copy of the window, oldest first.
    pub fn snapshot(&self) -> CandleSeries {
        CandleSeries(self.candles.iter().copied().collect())
    }

    /// Price axis bounds: min of lows × 0.9999 and max of highs × 1.0001.
    pub fn price_bounds(&self) -> Option<PriceBounds> {
        if self.candles.is_empty() {
            return None;
        }

        let (low, high) = self
            .candles
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), candle| {
                (low.min(candle.low), high.max(candle.high))
            });

        if !low.is_finite() || !high.is_finite() {
            return None;
        }

        Some(PriceBounds {
            min: low * PRICE_PADDING_LOW,
            max: high * PRICE_PADDING_HIGH,
        })
    }

    /// Largest volume in the window; the volume axis spans `0..=max`.
    pub fn max_volume(&self) -> Option<f64> {
        self.candles
            .iter()
            .map(|candle| candle.volume)
            .filter(|volume| volume.is_finite())
            .fold(None, |max: Option<f64>, volume| {
                Some(max.map_or(volume, |max| max.max(volume)))
            })
    }
}

/// Cheaply cloneable, ordered, finite snapshot of a [`CandleWindow`].
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries(Arc<[Candle]>);

impl Default for CandleSeries {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl CandleSeries {
    pub fn latest(&self) -> Option<&Candle> {
        self.0.last()
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
