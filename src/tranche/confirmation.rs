// =============================================================================
// Tranche Confirmation Scan
// =============================================================================
//
// Looks at the trailing `lookback_bars` (10) for evidence that buyers are
// defending a tranche level. Three independent checks:
//
//   Reversal Candle: bar low touched the level (low <= level * 1.01), the
//                    close beat the previous close and sits above the
//                    bar's midpoint.
//   RSI Turning Up:  short RSI over min(7, bars - 1) changes (plain
//                    averages) is below 40 and above its value one bar
//                    earlier. Both readings need a non-zero average loss.
//   Volume Spike:    last volume > 1.5 x mean of the last 5 volumes
//                    (current bar included) while price is within 2% of
//                    the level.
//
// Fewer than `lookback_bars` bars => unconfirmed.
// =============================================================================

use std::collections::BTreeSet;

use serde::Serialize;

use crate::indicators::rsi::rsi_from_averages;
use crate::market_data::PricePoint;
use crate::runtime_config::ConfirmationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfirmationKind {
    ReversalCandle,
    RsiTurningUp,
    VolumeSpike,
}

impl std::fmt::Display for ConfirmationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReversalCandle => write!(f, "Reversal Candle"),
            Self::RsiTurningUp => write!(f, "RSI Turning Up"),
            Self::VolumeSpike => write!(f, "Volume Spike"),
        }
    }
}

/// Outcome of the scan for one level. `confirmed` is true exactly when at
/// least one signal fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmationSignal {
    pub confirmed: bool,
    pub signals: BTreeSet<ConfirmationKind>,
}

impl ConfirmationSignal {
    pub fn from_signals(signals: BTreeSet<ConfirmationKind>) -> Self {
        Self {
            confirmed: !signals.is_empty(),
            signals,
        }
    }

    /// Signal labels in display order.
    pub fn labels(&self) -> Vec<String> {
        self.signals.iter().map(ToString::to_string).collect()
    }
}

/// Run the three checks against `level` over the tail of `points`.
pub fn scan_confirmations(
    points: &[PricePoint],
    level: f64,
    params: &ConfirmationParams,
) -> ConfirmationSignal {
    let lookback = params.lookback_bars.max(2);
    if points.len() < lookback || !level.is_finite() || level <= 0.0 {
        return ConfirmationSignal::default();
    }

    let recent = &points[points.len() - lookback..];
    let mut signals = BTreeSet::new();

    if is_reversal_candle(recent, level, params) {
        signals.insert(ConfirmationKind::ReversalCandle);
    }
    if is_rsi_turning_up(recent, params) {
        signals.insert(ConfirmationKind::RsiTurningUp);
    }
    if is_volume_spike(recent, level, params) {
        signals.insert(ConfirmationKind::VolumeSpike);
    }

    ConfirmationSignal::from_signals(signals)
}

// --- Individual checks -------------------------------------------------------

fn is_reversal_candle(recent: &[PricePoint], level: f64, params: &ConfirmationParams) -> bool {
    let [.., prev, current] = recent else {
        return false;
    };
    current.low() <= level * (1.0 + params.touch_tolerance)
        && current.close > prev.close
        && current.close > current.midpoint()
}

fn is_rsi_turning_up(recent: &[PricePoint], params: &ConfirmationParams) -> bool {
    let changes: Vec<f64> = recent.windows(2).map(|w| w[1].close - w[0].close).collect();
    let period = params.rsi_period.min(recent.len() - 1);
    if period == 0 || changes.len() < period + 1 {
        return false;
    }

    let now = simple_rsi(&changes[changes.len() - period..]);
    let before = simple_rsi(&changes[changes.len() - period - 1..changes.len() - 1]);
    match (now, before) {
        (Some(now), Some(before)) => now < params.rsi_threshold && now > before,
        _ => false,
    }
}

/// RSI from plain averages of `changes`; `None` without any loss.
fn simple_rsi(changes: &[f64]) -> Option<f64> {
    let n = changes.len() as f64;
    let avg_gain = changes.iter().map(|c| c.max(0.0)).sum::<f64>() / n;
    let avg_loss = changes.iter().map(|c| (-c).max(0.0)).sum::<f64>() / n;
    if avg_loss > 0.0 {
        rsi_from_averages(avg_gain, avg_loss)
    } else {
        None
    }
}

fn is_volume_spike(recent: &[PricePoint], level: f64, params: &ConfirmationParams) -> bool {
    let window = params.volume_window;
    if window == 0 || recent.len() < window {
        return false;
    }
    let Some(current) = recent.last() else {
        return false;
    };
    let volume = current.volume();
    if volume <= 0.0 {
        return false;
    }

    let average = recent[recent.len() - window..]
        .iter()
        .map(PricePoint::volume)
        .sum::<f64>()
        / window as f64;
    volume > average * params.volume_multiple
        && (current.close - level).abs() / level < params.proximity
}
