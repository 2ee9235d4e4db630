// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the chart indicators. Every
// function returns an `IndicatorSeries` aligned 1:1 with its input: an entry is
// `None` wherever the defining window cannot be filled, and it stays `None`.
// Zero periods and mismatched input lengths are contract violations and come
// back as `EngineError`.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod summary;
pub mod williams_r;

use std::collections::VecDeque;

pub use atr::{atr_snapshot, calculate_atr, AtrSnapshot};
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, Macd, MacdParams, SignalAlignment};
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, sma_with_history};
pub use stochastic::{calculate_stochastic, Stochastic};
pub use summary::{summarize, BandPosition, IndicatorReading, IndicatorSummary};
pub use williams_r::calculate_williams_r;

/// Per-index indicator output; `None` marks an unavailable entry.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Last defined value of a series, if any.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

/// Trailing highest-high / lowest-low for each index.
///
/// Uses monotonic deques so the scan stays O(n) regardless of `period`. An
/// index is `None` until the window is full and whenever the window contains
/// a non-finite high or low.
pub(crate) fn rolling_extremes(
    highs: &[f64],
    lows: &[f64],
    period: usize,
) -> Vec<Option<(f64, f64)>> {
    let mut out = Vec::with_capacity(highs.len());
    let mut max_q: VecDeque<usize> = VecDeque::new();
    let mut min_q: VecDeque<usize> = VecDeque::new();
    let mut last_bad: Option<usize> = None;

    for i in 0..highs.len() {
        if highs[i].is_finite() && lows[i].is_finite() {
            while max_q.back().is_some_and(|&j| highs[j] <= highs[i]) {
                max_q.pop_back();
            }
            max_q.push_back(i);
            while min_q.back().is_some_and(|&j| lows[j] >= lows[i]) {
                min_q.pop_back();
            }
            min_q.push_back(i);
        } else {
            last_bad = Some(i);
        }

        let start = (i + 1).saturating_sub(period);
        while max_q.front().is_some_and(|&j| j < start) {
            max_q.pop_front();
        }
        while min_q.front().is_some_and(|&j| j < start) {
            min_q.pop_front();
        }

        let full = i + 1 >= period;
        let clean = last_bad.map_or(true, |bad| bad < start);
        match (full && clean, max_q.front(), min_q.front()) {
            (true, Some(&hi), Some(&lo)) => out.push(Some((highs[hi], lows[lo]))),
            _ => out.push(None),
        }
    }

    out
}
