// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: Compute price changes (deltas) from consecutive closes.
// Step 2: Seed average gain / average loss with the simple mean of the first
//          `period` gains / losses. The first RSI lands on index `period`.
// Step 3: Apply Wilder's smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4: RSI = 100 when avg_loss == 0, else 100 - 100 / (1 + gain / loss).
// =============================================================================

use crate::error::{ensure_period, Result};
use crate::indicators::IndicatorSeries;

/// Default look-back for the chart RSI.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Compute the RSI series for `closes`, aligned to the input.
///
/// # Edge cases
/// - `period == 0` => `EngineError::InvalidPeriod`
/// - `closes.len() < period + 1` => every entry `None` (need `period` deltas)
/// - A non-finite delta ends the series (all later entries `None`).
pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<IndicatorSeries> {
    ensure_period("rsi", period)?;
    let mut out = vec![None; closes.len()];
    if closes.len() < period + 1 {
        return Ok(out);
    }

    // --- Seed averages with the mean of the first `period` deltas ------------
    let mut sum_gain = 0.0_f64;
    let mut sum_loss = 0.0_f64;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        if !delta.is_finite() {
            return Ok(out);
        }
        let (gain, loss) = split_delta(delta);
        sum_gain += gain;
        sum_loss += loss;
    }

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    // --- Wilder's smoothing for subsequent values ----------------------------
    for i in (period + 1)..closes.len() {
        let delta = closes[i] - closes[i - 1];
        if !delta.is_finite() {
            break;
        }
        let (gain, loss) = split_delta(delta);
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => out[i] = Some(rsi),
            None => break,
        }
    }

    Ok(out)
}

// =============================================================================
// Internal helpers
// =============================================================================

fn split_delta(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else if delta < 0.0 {
        (0.0, -delta)
    } else {
        (0.0, 0.0)
    }
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Average loss of exactly zero (including a flat market) reads as 100.
pub(crate) fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };

    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        None
    }
}
