// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), σ being the population standard deviation of
// the same trailing window. The Band Width (BBW) is the normalised distance:
// BBW = (upper - lower) / middle * 100.
//
// The chart draws all three bands; BBW feeds the summary panel.

use serde::Serialize;

use crate::error::{ensure_period, EngineError, Result};
use crate::indicators::sma::calculate_sma;
use crate::indicators::IndicatorSeries;

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;

/// Per-index Bollinger output, each series aligned to the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
    /// Bollinger Band Width in percent; `None` where the middle band is zero.
    pub bandwidth: IndicatorSeries,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// Returns `BollingerBands` containing:
/// - `upper`     = SMA + `num_std` * σ
/// - `middle`    = SMA
/// - `lower`     = SMA - `num_std` * σ
/// - `bandwidth` = (upper - lower) / middle * 100
///
/// Entries are `None` wherever the SMA is (window not yet full, or a
/// non-finite value inside the window). `num_std` must be finite and
/// non-negative so that `upper >= middle >= lower` holds.
pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    num_std: f64,
) -> Result<BollingerBands> {
    ensure_period("bollinger", period)?;
    if !num_std.is_finite() || num_std < 0.0 {
        return Err(EngineError::InvalidParameter {
            name: "bollinger num_std",
            value: num_std,
        });
    }

    let middle = calculate_sma(closes, period)?;
    let n = closes.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut bandwidth = vec![None; n];

    for (i, mid) in middle.iter().enumerate() {
        let Some(mid) = *mid else { continue };

        let window = &closes[i + 1 - period..=i];
        let variance = window.iter().map(|x| (x - mid).powi(2)).sum::<f64>() / period as f64;
        let offset = num_std * variance.sqrt();
        if !offset.is_finite() {
            continue;
        }

        let up = mid + offset;
        let lo = mid - offset;
        upper[i] = Some(up);
        lower[i] = Some(lo);

        if mid != 0.0 {
            let width = (up - lo) / mid * 100.0;
            if width.is_finite() {
                bandwidth[i] = Some(width);
            }
        }
    }

    Ok(BollingerBands {
        upper,
        middle,
        lower,
        bandwidth,
    })
}
