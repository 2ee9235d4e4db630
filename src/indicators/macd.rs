// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   MACD line  = EMA(fast) - EMA(slow)          (aligned to the input)
//   Signal     = EMA(signal) of the MACD line
//   Histogram  = MACD line - Signal             (per input index)
//
// The signal EMA runs over the defined MACD values only (the leading warm-up
// gap is dropped first). Where the resulting values are placed is governed by
// `SignalAlignment`:
//
//   Aligned:    each signal value goes back to the input index of the MACD
//               value it was computed from. Histogram compares like with like.
//   Compacted:  the signal array is indexed as if it started at input index
//               0, which is how the legacy dashboard charts indexed it. The
//               histogram then subtracts a signal value that belongs to a
//               later bar. Kept for output compatibility with that chart.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{ensure_period, Result};
use crate::indicators::ema::calculate_ema;
use crate::indicators::IndicatorSeries;

/// Placement of the signal line relative to the MACD line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAlignment {
    Aligned,
    Compacted,
}

impl Default for SignalAlignment {
    fn default() -> Self {
        Self::Aligned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    #[serde(default)]
    pub alignment: SignalAlignment,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            alignment: SignalAlignment::Aligned,
        }
    }
}

/// MACD output; all three series have the input's length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Macd {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Compute MACD, signal and histogram for `values`.
pub fn calculate_macd(values: &[f64], params: MacdParams) -> Result<Macd> {
    ensure_period("macd fast", params.fast)?;
    ensure_period("macd slow", params.slow)?;
    ensure_period("macd signal", params.signal)?;

    let ema_fast = calculate_ema(values, params.fast)?;
    let ema_slow = calculate_ema(values, params.slow)?;

    let macd: IndicatorSeries = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    // Drop unavailable entries, remembering where each defined value lived.
    let (positions, compact): (Vec<usize>, Vec<f64>) = macd
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .unzip();
    let compact_signal = calculate_ema(&compact, params.signal)?;

    let mut signal = vec![None; values.len()];
    match params.alignment {
        SignalAlignment::Aligned => {
            for (&pos, value) in positions.iter().zip(&compact_signal) {
                signal[pos] = *value;
            }
        }
        SignalAlignment::Compacted => {
            for (slot, value) in signal.iter_mut().zip(&compact_signal) {
                *slot = *value;
            }
        }
    }

    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    Ok(Macd {
        macd,
        signal,
        histogram,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn macd_rejects_zero_periods() {
        let params = MacdParams {
            signal: 0,
            ..MacdParams::default()
        };
        assert!(calculate_macd(&wave(50), params).is_err());
    }

    #[test]
    fn macd_lengths_match_input() {
        let values = wave(80);
        let out = calculate_macd(&values, MacdParams::default()).unwrap();
        assert_eq!(out.macd.len(), 80);
        assert_eq!(out.signal.len(), 80);
        assert_eq!(out.histogram.len(), 80);
    }

    #[test]
    fn macd_line_is_fast_minus_slow() {
        let values = wave(60);
        let out = calculate_macd(&values, MacdParams::default()).unwrap();
        let fast = calculate_ema(&values, 12).unwrap();
        let slow = calculate_ema(&values, 26).unwrap();
        assert!(out.macd[..25].iter().all(Option::is_none));
        for i in 25..60 {
            assert_eq!(out.macd[i], Some(fast[i].unwrap() - slow[i].unwrap()));
        }
    }

    #[test]
    fn aligned_signal_starts_after_both_warmups() {
        let values = wave(80);
        let out = calculate_macd(&values, MacdParams::default()).unwrap();
        // MACD defined from 25, signal needs 9 MACD values => index 33.
        assert!(out.signal[..33].iter().all(Option::is_none));
        assert!(out.signal[33..].iter().all(Option::is_some));
        assert_eq!(
            out.histogram[40],
            Some(out.macd[40].unwrap() - out.signal[40].unwrap())
        );
    }

    #[test]
    fn compacted_signal_reproduces_legacy_indexing() {
        let values = wave(80);
        let params = MacdParams {
            alignment: SignalAlignment::Compacted,
            ..MacdParams::default()
        };
        let legacy = calculate_macd(&values, params).unwrap();
        let aligned = calculate_macd(&values, MacdParams::default()).unwrap();

        // Compact signal value k sits at index k instead of 25 + k.
        assert_eq!(legacy.signal[8], aligned.signal[33]);
        assert_eq!(legacy.signal[54], aligned.signal[79]);
        assert!(legacy.signal[55..].iter().all(Option::is_none));

        // Histogram is only defined where both lines overlap: 25..=54.
        assert!(legacy.histogram[..25].iter().all(Option::is_none));
        assert_eq!(
            legacy.histogram[30],
            Some(legacy.macd[30].unwrap() - aligned.signal[55].unwrap())
        );
        assert!(legacy.histogram[55..].iter().all(Option::is_none));
    }

    #[test]
    fn short_input_is_all_none() {
        let out = calculate_macd(&wave(20), MacdParams::default()).unwrap();
        assert!(out.macd.iter().all(Option::is_none));
        assert!(out.signal.iter().all(Option::is_none));
        assert!(out.histogram.iter().all(Option::is_none));
    }
}
