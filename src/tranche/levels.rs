// =============================================================================
// 3-Tranche Support Levels
// =============================================================================
//
// Three staged entry prices below the current price, built from the
// timeframe's Fibonacci retracements and pushed lower by volatility:
//
//   range     = high - low                  (max / min close of the series)
//   Fib38.2   = high - 0.382 * range
//   Fib50     = high - 0.500 * range
//   Fib61.8   = high - 0.618 * range
//
//   volAdj    = ATR / medianATR
//   tranche1  = Fib38.2 - ATR * 0.5 * volAdj * mult
//   tranche2  = Fib50   - ATR * 1.0 * volAdj * mult
//   tranche3  = Fib61.8 - ATR * 1.5 * volAdj * mult
//
// `mult` comes from the timeframe's volatility bucket (0.2 / 0.5 / 1.0). The
// raw Fibonacci levels are used when no positive ATR / median is available.
//
// Normalisation keeps every level inside the band
//   (low + minFromLow, currentPrice * 0.99)
// with a minimum gap between neighbours. Levels that cannot satisfy both are
// spread evenly over the band instead. A degenerate range or band yields no
// levels at all.
//
// Capital weights are fixed at 20 / 30 / 50 percent.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;
use crate::indicators::atr_snapshot;
use crate::market_data::PriceSeries;
use crate::runtime_config::{ConfirmationParams, TrancheParams};
use crate::tranche::confirmation::{scan_confirmations, ConfirmationSignal};
use crate::types::{Timeframe, VolatilityBucket};

const FIB_RATIOS: [f64; 3] = [0.382, 0.500, 0.618];
const ATR_STEPS: [f64; 3] = [0.5, 1.0, 1.5];
const CEILING_FRACTION: f64 = 0.99;

/// Relative slack when checking the enforced gap, absorbing rounding in
/// `prev - spacing`.
const SPACING_SLACK: f64 = 1e-9;

/// One of the three staged entries, from most aggressive to most conservative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tranche {
    First,
    Second,
    Third,
}

impl Tranche {
    pub const ALL: [Tranche; 3] = [Tranche::First, Tranche::Second, Tranche::Third];

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }
}

impl std::fmt::Display for Tranche {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tranche {}", self.index() + 1)
    }
}

/// Capital allocation per tranche.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrancheWeights {
    pub tranche1: f64,
    pub tranche2: f64,
    pub tranche3: f64,
}

impl TrancheWeights {
    pub const STANDARD: TrancheWeights = TrancheWeights {
        tranche1: 0.20,
        tranche2: 0.30,
        tranche3: 0.50,
    };

    pub fn weight(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::First => self.tranche1,
            Tranche::Second => self.tranche2,
            Tranche::Third => self.tranche3,
        }
    }
}

impl Default for TrancheWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Published tranche levels. Never mutated: refinement builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrancheLevels {
    pub tranche1: f64,
    pub tranche2: f64,
    pub tranche3: f64,
    pub weights: TrancheWeights,
    pub confirmations: BTreeMap<Tranche, ConfirmationSignal>,
    pub current_price: f64,
    /// Highest close of the timeframe.
    pub high: f64,
    /// Lowest close of the timeframe.
    pub low: f64,
    pub atr: Option<f64>,
    pub vol_adjusted: bool,
    pub timeframe: Timeframe,
}

impl TrancheLevels {
    pub fn level(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::First => self.tranche1,
            Tranche::Second => self.tranche2,
            Tranche::Third => self.tranche3,
        }
    }

    pub fn confirmation(&self, tranche: Tranche) -> Option<&ConfirmationSignal> {
        self.confirmations.get(&tranche)
    }

    /// A copy of these levels carrying the confirmation scan for each
    /// tranche, computed over the tail of `series`.
    pub fn with_confirmations(&self, series: &PriceSeries, params: &ConfirmationParams) -> Self {
        let confirmations = Tranche::ALL
            .iter()
            .map(|&t| (t, scan_confirmations(series.points(), self.level(t), params)))
            .collect();
        Self {
            confirmations,
            ..self.clone()
        }
    }
}

/// Compute provisional (unconfirmed) tranche levels for `series`.
///
/// `Ok(None)` when the geometry is degenerate: flat series, current price at
/// or below the band floor, or any non-finite intermediate.
pub fn compute_tranche_levels(
    series: &PriceSeries,
    timeframe: Timeframe,
    params: &TrancheParams,
) -> Result<Option<TrancheLevels>> {
    let current_price = series.last().close;
    let (high, low) = series.close_range();
    let range = high - low;
    if !range.is_finite() || range <= 0.0 || current_price <= 0.0 {
        debug!(%timeframe, high, low, current_price, "3-Tranche: invalid price range");
        return Ok(None);
    }

    let bucket = timeframe.volatility_bucket();
    let fib = FIB_RATIOS.map(|ratio| high - range * ratio);

    // --- Step 1: ATR offset below each Fibonacci level -----------------------
    let snapshot = atr_snapshot(series.points(), params.atr_period)?;
    let usable_atr = snapshot
        .as_ref()
        .filter(|s| s.current > 0.0 && s.median > 0.0)
        .map(|s| (s.current, s.current / s.median));

    let raw = match usable_atr {
        Some((atr, vol_adj)) => {
            let mult = bucket.atr_multiplier();
            [0, 1, 2].map(|i| fib[i] - atr * ATR_STEPS[i] * vol_adj * mult)
        }
        None => fib,
    };
    trace!(?raw, ?fib, atr = ?usable_atr, "3-Tranche: raw levels");

    // --- Step 2: fit the levels into the visible band ------------------------
    let Some(levels) = normalize_levels(raw, low, range, current_price, bucket) else {
        debug!(%timeframe, ?raw, "3-Tranche: levels do not fit a valid band");
        return Ok(None);
    };

    let confirmations = Tranche::ALL
        .iter()
        .map(|&t| (t, ConfirmationSignal::default()))
        .collect();

    Ok(Some(TrancheLevels {
        tranche1: levels[0],
        tranche2: levels[1],
        tranche3: levels[2],
        weights: TrancheWeights::STANDARD,
        confirmations,
        current_price,
        high,
        low,
        atr: snapshot.map(|s| s.current),
        vol_adjusted: usable_atr.is_some(),
        timeframe,
    }))
}

/// Clamp, order and space the three raw levels; `None` when no valid
/// arrangement exists.
fn normalize_levels(
    raw: [f64; 3],
    low: f64,
    range: f64,
    current_price: f64,
    bucket: VolatilityBucket,
) -> Option<[f64; 3]> {
    let floor = low + range * bucket.min_from_low_fraction();
    let ceiling = current_price * CEILING_FRACTION;
    let band = ceiling - floor;
    if !band.is_finite() || band <= 0.0 || raw.iter().any(|l| !l.is_finite()) {
        return None;
    }

    let spacing = range * bucket.min_spacing_fraction();
    let clamp = |level: f64| level.min(ceiling).max(floor);

    let mut sorted = raw.map(clamp);
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut levels = [0.0_f64; 3];
    for i in 0..3 {
        let mut level = clamp(sorted[i]);
        if i > 0 && levels[i - 1] - level < spacing {
            level = levels[i - 1] - spacing;
        }
        levels[i] = clamp(level);
    }

    let spaced = levels
        .windows(2)
        .all(|w| w[0] - w[1] >= spacing * (1.0 - SPACING_SLACK));
    let in_band = levels.iter().all(|&l| l >= floor && l <= ceiling);
    if !spaced || !in_band {
        let step = band / 3.0;
        levels = [ceiling, ceiling - step, ceiling - 2.0 * step];
    }

    let ordered = low < levels[2] && levels[2] < levels[1] && levels[1] < levels[0];
    let below_price = levels[0] < current_price;
    (ordered && below_price && levels.iter().all(|l| l.is_finite())).then_some(levels)
}
