use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar as delivered by the market-data collaborator.
///
/// Only `close` is mandatory. Missing or non-finite `high`/`low` fall back to
/// `close`; a missing volume reads as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl PricePoint {
    /// Bar carrying only a close.
    pub fn from_close(date: DateTime<Utc>, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    pub fn high(&self) -> f64 {
        self.high.filter(|h| h.is_finite()).unwrap_or(self.close)
    }

    pub fn low(&self) -> f64 {
        self.low.filter(|l| l.is_finite()).unwrap_or(self.close)
    }

    pub fn volume(&self) -> f64 {
        self.volume.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Midpoint of the bar's high/low range.
    pub fn midpoint(&self) -> f64 {
        (self.high() + self.low()) / 2.0
    }
}

// ---------------------------------------------------------------------------
// PriceSeries -- validated, immutable snapshot
// ---------------------------------------------------------------------------

/// Ordered price history for one (symbol, timeframe) request.
///
/// Guarantees: non-empty, dates strictly ascending, every close finite. Once
/// built the series is never mutated; derived series are computed from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(EngineError::EmptySeries);
        }
        for (index, point) in points.iter().enumerate() {
            if !point.close.is_finite() {
                return Err(EngineError::NonFiniteClose { index });
            }
            if index > 0 && point.date <= points[index - 1].date {
                return Err(EngineError::UnorderedDates { index });
            }
        }
        trace!(len = points.len(), "price series validated");
        Ok(Self { points })
    }

    /// Build a series from parallel date/close arrays.
    pub fn from_closes(dates: &[DateTime<Utc>], closes: &[f64]) -> Result<Self> {
        crate::error::ensure_same_len("dates", dates.len(), "closes", closes.len())?;
        let points = dates
            .iter()
            .zip(closes)
            .map(|(&date, &close)| PricePoint::from_close(date, close))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.points.iter().map(PricePoint::high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.points.iter().map(PricePoint::low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(PricePoint::volume).collect()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    /// The most recent `count` points (or the whole series if shorter).
    pub fn tail(&self, count: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(count);
        &self.points[start..]
    }

    /// Highest and lowest close over the whole series.
    pub fn close_range(&self) -> (f64, f64) {
        self.points.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(hi, lo), p| (hi.max(p.close), lo.min(p.close)),
        )
    }

    /// Absolute and percentage change from the first to the last close.
    /// The percentage is zero when the first close is zero.
    pub fn period_change(&self) -> (f64, f64) {
        let first = self.first().close;
        let change = self.last().close - first;
        let pct = if first != 0.0 { change / first * 100.0 } else { 0.0 };
        (change, pct)
    }

    /// Rescale `other` onto this series' price axis so both start at the same
    /// value: `other[j] / other[0] * self[0]`.
    ///
    /// Bars are paired by relative position, `j = floor(i · m / n)`, so a
    /// comparison ticker with a different bar count still spans the chart.
    /// `None` when either first close is zero.
    pub fn normalize_comparison(&self, other: &PriceSeries) -> Option<Vec<f64>> {
        let own_first = self.first().close;
        let other_first = other.first().close;
        if own_first == 0.0 || other_first == 0.0 {
            debug!(own_first, other_first, "comparison: zero first close, not normalised");
            return None;
        }

        let n = self.len();
        let m = other.len();
        let normalized = (0..n)
            .map(|i| other.points[i * m / n].close / other_first * own_first)
            .collect();
        Some(normalized)
    }
}
