// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar after the first:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the simple trailing mean of the last `period` TR values, so the
// first ATR lands on index `period` of the price series (TR starts at 1).
//
// The tranche strategy compares the current ATR against the median of every
// rolling ATR in the loaded history to scale its offsets.
//
// Default period: 14
// =============================================================================

use serde::Serialize;
use tracing::trace;

use crate::error::{ensure_period, Result};
use crate::indicators::sma::rolling_mean;
use crate::indicators::{last_defined, IndicatorSeries};
use crate::market_data::PricePoint;

pub const DEFAULT_ATR_PERIOD: usize = 14;

/// Current ATR alongside the median of all rolling ATR values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtrSnapshot {
    pub current: f64,
    pub median: f64,
    pub values: IndicatorSeries,
}

/// True range per bar, aligned to `points`; index 0 has no previous close.
pub fn true_ranges(points: &[PricePoint]) -> IndicatorSeries {
    let mut out = Vec::with_capacity(points.len());
    if points.is_empty() {
        return out;
    }
    out.push(None);

    for pair in points.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let high = bar.high();
        let low = bar.low();

        let hl = high - low;
        let hc = (high - prev.close).abs();
        let lc = (low - prev.close).abs();

        let tr = hl.max(hc).max(lc);
        out.push(tr.is_finite().then_some(tr));
    }

    out
}

/// Rolling ATR aligned to `points`.
///
/// # Returns
/// `Err` when `period` is zero. Entries before index `period` are `None`
/// (we need `period` TR values, each requiring a previous bar).
pub fn calculate_atr(points: &[PricePoint], period: usize) -> Result<IndicatorSeries> {
    ensure_period("atr", period)?;
    Ok(rolling_mean(&true_ranges(points), period))
}

/// Latest ATR and the median ATR over the available history.
///
/// The median is the upper median of the defined rolling values
/// (`sorted[len / 2]`). `None` when the history is too short for a single
/// ATR value.
pub fn atr_snapshot(points: &[PricePoint], period: usize) -> Result<Option<AtrSnapshot>> {
    let values = calculate_atr(points, period)?;
    let Some(current) = last_defined(&values) else {
        return Ok(None);
    };

    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let median = sorted[sorted.len() / 2];

    trace!(current, median, samples = sorted.len(), "ATR snapshot");
    Ok(Some(AtrSnapshot {
        current,
        median,
        values,
    }))
}
