// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value sits at index `period - 1` and is seeded with the SMA of
// the first `period` values.
// =============================================================================

use crate::error::{ensure_period, Result};
use crate::indicators::IndicatorSeries;

/// Compute the EMA series for `values` with look-back `period`, aligned to
/// the input.
///
/// # Edge cases
/// - `period == 0` => `EngineError::InvalidPeriod`
/// - `values.len() < period` => every entry `None`
/// - A non-finite value inside the seed window leaves the series empty; a
///   non-finite value after the seed ends the series there (all later
///   entries `None`). Downstream consumers should not trust a broken series.
pub fn calculate_ema(values: &[f64], period: usize) -> Result<IndicatorSeries> {
    ensure_period("ema", period)?;
    let mut out = vec![None; values.len()];
    if values.len() < period {
        return Ok(out);
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values. Summed in index order so the
    // seed is bit-identical to the SMA at the same index.
    let mut sum = 0.0_f64;
    for &v in &values[..period] {
        sum += v;
    }
    let seed = sum / period as f64;
    if !seed.is_finite() {
        return Ok(out);
    }
    out[period - 1] = Some(seed);

    let mut prev_ema = seed;
    for (i, &value) in values.iter().enumerate().skip(period) {
        let ema = value * multiplier + prev_ema * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        out[i] = Some(ema);
        prev_ema = ema;
    }

    Ok(out)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::sma::calculate_sma;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_err());
    }

    #[test]
    fn ema_insufficient_data() {
        assert_eq!(calculate_ema(&[1.0, 2.0], 5).unwrap(), vec![None, None]);
    }

    #[test]
    fn ema_period_equals_length() {
        let ema = calculate_ema(&[2.0, 4.0, 6.0], 3).unwrap();
        assert_eq!(ema, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn ema_seed_equals_sma_exactly() {
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89,
        ];
        for period in 1..=closes.len() {
            let ema = calculate_ema(&closes, period).unwrap();
            let sma = calculate_sma(&closes, period).unwrap();
            assert_eq!(ema[period - 1], sma[period - 1], "period {period}");
        }
    }

    #[test]
    fn ema_known_values() {
        // 5-period EMA of [1..=10]: seed 3.0, multiplier 1/3.
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&closes, 5).unwrap();
        assert_eq!(ema.len(), 10);
        assert!(ema[..4].iter().all(Option::is_none));

        let mult = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((ema[4].unwrap() - expected).abs() < 1e-12);
        for i in 5..10 {
            expected = closes[i] * mult + expected * (1.0 - mult);
            assert!((ema[i].unwrap() - expected).abs() < 1e-12, "index {i}");
        }
    }

    #[test]
    fn ema_stops_at_nan() {
        let ema = calculate_ema(&[1.0, 2.0, 3.0, f64::NAN, 5.0], 3).unwrap();
        assert_eq!(ema, vec![None, None, Some(2.0), None, None]);
    }
}
