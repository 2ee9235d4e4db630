// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
//   %K = (close - lowestLow) / (highestHigh - lowestLow) * 100
//   %D = SMA(%K, d)
//
// highestHigh / lowestLow are taken over the trailing `k` bars. A flat window
// (highestHigh == lowestLow) has no defined %K. %D is unavailable whenever
// any %K inside its window is unavailable.
// =============================================================================

use serde::Serialize;

use crate::error::{ensure_period, ensure_same_len, Result};
use crate::indicators::sma::rolling_mean;
use crate::indicators::{rolling_extremes, IndicatorSeries};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stochastic {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

/// Compute %K and %D, both aligned to the inputs.
///
/// Values are not clamped: a close outside its bar's high/low (bad data)
/// reads outside [0, 100].
pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Result<Stochastic> {
    ensure_period("stochastic %K", k_period)?;
    ensure_period("stochastic %D", d_period)?;
    ensure_same_len("highs", highs.len(), "closes", closes.len())?;
    ensure_same_len("lows", lows.len(), "closes", closes.len())?;

    let k: IndicatorSeries = rolling_extremes(highs, lows, k_period)
        .into_iter()
        .zip(closes)
        .map(|(extremes, &close)| {
            let (hh, ll) = extremes?;
            let range = hh - ll;
            if range == 0.0 || !close.is_finite() {
                return None;
            }
            let value = (close - ll) / range * 100.0;
            value.is_finite().then_some(value)
        })
        .collect();

    let d = rolling_mean(&k, d_period);
    Ok(Stochastic { k, d })
}
