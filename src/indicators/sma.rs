// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = (x_{t-period+1} + ... + x_t) / period
//
// Maintained as a moving sum so the whole series is computed in O(n). The first
// `period - 1` entries are unavailable.
// =============================================================================

use crate::error::{ensure_period, Result};
use crate::indicators::IndicatorSeries;

/// Compute the SMA series for `values` with look-back `period`.
///
/// # Edge cases
/// - `period == 0` => `EngineError::InvalidPeriod`
/// - `values.len() < period` => every entry `None`
/// - A non-finite value makes every window that contains it `None`.
pub fn calculate_sma(values: &[f64], period: usize) -> Result<IndicatorSeries> {
    ensure_period("sma", period)?;
    let as_optional: Vec<Option<f64>> = values
        .iter()
        .map(|&v| if v.is_finite() { Some(v) } else { None })
        .collect();
    Ok(rolling_mean(&as_optional, period))
}

/// SMA over the last `current_len` bars, computed on a longer `history` whose
/// tail is the displayed window.
///
/// Lets an overlay such as SMA(200) be defined from the first displayed bar
/// when enough earlier bars were fetched. The result always has
/// `current_len` entries; it is left-padded with `None` when `history` is
/// shorter than `current_len`.
pub fn sma_with_history(
    history: &[f64],
    current_len: usize,
    period: usize,
) -> Result<IndicatorSeries> {
    let full = calculate_sma(history, period)?;
    if full.len() >= current_len {
        return Ok(full[full.len() - current_len..].to_vec());
    }
    let mut padded = vec![None; current_len - full.len()];
    padded.extend(full);
    Ok(padded)
}

/// Trailing mean over optional inputs; a window containing any `None` is
/// itself `None`.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> IndicatorSeries {
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0_f64;
    let mut missing = 0_usize;
    let period_f = period as f64;

    for i in 0..values.len() {
        match values[i] {
            Some(v) => sum += v,
            None => missing += 1,
        }
        if i >= period {
            match values[i - period] {
                Some(old) => sum -= old,
                None => missing -= 1,
            }
        }

        if i + 1 >= period && missing == 0 {
            out.push(Some(sum / period_f));
        } else {
            out.push(None);
        }
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn closes20() -> Vec<f64> {
        vec![
            100.0, 101.0, 99.0, 102.0, 98.0, 103.0, 104.0, 100.0, 105.0, 106.0,
            104.0, 107.0, 108.0, 103.0, 109.0, 110.0, 108.0, 111.0, 112.0, 109.0,
        ]
    }

    #[test]
    fn sma_period_zero() {
        assert_eq!(
            calculate_sma(&[1.0, 2.0], 0).unwrap_err(),
            EngineError::InvalidPeriod { name: "sma", value: 0 }
        );
    }

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn sma_insufficient_data_is_all_none() {
        let out = calculate_sma(&[1.0, 2.0, 3.0], 5).unwrap();
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn sma_concrete_scenario() {
        let closes = closes20();
        let sma = calculate_sma(&closes, 5).unwrap();
        assert_eq!(sma.len(), 20);
        assert!(sma[3].is_none());
        let expected = (100.0 + 101.0 + 99.0 + 102.0 + 98.0) / 5.0;
        assert!((sma[4].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn sma_leading_none_count_and_window_means() {
        let closes = closes20();
        for period in 1..=closes.len() {
            let sma = calculate_sma(&closes, period).unwrap();
            assert_eq!(sma.len(), closes.len());
            let leading = sma.iter().take_while(|v| v.is_none()).count();
            assert_eq!(leading, period - 1, "period {period}");
            for i in (period - 1)..closes.len() {
                let window = &closes[i + 1 - period..=i];
                let mean = window.iter().sum::<f64>() / period as f64;
                assert!(
                    (sma[i].unwrap() - mean).abs() < 1e-9,
                    "period {period} index {i}"
                );
            }
        }
    }

    #[test]
    fn sma_nan_blocks_its_windows_only() {
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0];
        let sma = calculate_sma(&values, 2).unwrap();
        assert_eq!(sma[1], Some(1.5));
        assert_eq!(sma[2], None);
        assert_eq!(sma[3], None);
        assert_eq!(sma[4], Some(4.5));
        assert_eq!(sma[5], Some(5.5));
    }

    #[test]
    fn sma_with_history_takes_the_tail() {
        let history: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = sma_with_history(&history, 4, 5).unwrap();
        assert_eq!(out.len(), 4);
        // Windows ending at history indices 6..=9.
        assert_eq!(out[0], Some(5.0));
        assert_eq!(out[3], Some(8.0));
    }

    #[test]
    fn sma_with_history_pads_short_history() {
        let out = sma_with_history(&[1.0, 2.0, 3.0], 5, 2).unwrap();
        assert_eq!(out, vec![None, None, None, Some(1.5), Some(2.5)]);
    }
}
