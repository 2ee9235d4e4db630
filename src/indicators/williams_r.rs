// =============================================================================
// Williams %R
// =============================================================================
//
//   %R = (highestHigh - close) / (highestHigh - lowestLow) * -100
//
// Reads in [-100, 0] for well-formed bars: 0 at the top of the trailing range,
// -100 at the bottom. Same flat-window guard as the Stochastic oscillator.

use crate::error::{ensure_period, ensure_same_len, Result};
use crate::indicators::{rolling_extremes, IndicatorSeries};

pub const DEFAULT_WILLIAMS_PERIOD: usize = 14;

pub fn calculate_williams_r(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<IndicatorSeries> {
    ensure_period("williams %R", period)?;
    ensure_same_len("highs", highs.len(), "closes", closes.len())?;
    ensure_same_len("lows", lows.len(), "closes", closes.len())?;

    Ok(rolling_extremes(highs, lows, period)
        .into_iter()
        .zip(closes)
        .map(|(extremes, &close)| {
            let (hh, ll) = extremes?;
            let range = hh - ll;
            if range == 0.0 || !close.is_finite() {
                return None;
            }
            let value = (hh - close) / range * -100.0;
            value.is_finite().then_some(value)
        })
        .collect())
}
