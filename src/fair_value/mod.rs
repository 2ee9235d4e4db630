// =============================================================================
// Fair Value Estimator
// =============================================================================
//
//   smoothed EPS  = trailing 4-report mean of the EPS history
//   neutral P/E   = median(price / smoothed EPS) over the last 10 years
//   fair value(d) = EPS(d) · neutral P/E
//
// EPS(d) is interpolated linearly between report dates and held flat before
// the first and after the last report. The lookback is anchored at the last
// price date so identical inputs always give identical output.
// =============================================================================

pub mod eps;
pub mod pe;

pub use eps::{smooth_eps, EpsInterpolator};
pub use pe::{median, neutral_pe, NeutralPe, PeSource};

use serde::Serialize;
use tracing::debug;

use crate::indicators::IndicatorSeries;
use crate::market_data::{EpsObservation, EpsSeries, PriceSeries};
use crate::runtime_config::FairValueParams;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairValueEstimate {
    pub neutral_pe: Option<f64>,
    pub pe_source: Option<PeSource>,
    pub historical_ratios: Vec<f64>,
    pub smoothed_eps: Vec<EpsObservation>,
    /// Aligned with the price series dates.
    pub series: IndicatorSeries,
}

impl FairValueEstimate {
    /// Fair value at the last price bar, if defined.
    pub fn latest(&self) -> Option<f64> {
        self.series.last().copied().flatten()
    }
}

pub fn estimate_fair_value(
    prices: &PriceSeries,
    eps: &EpsSeries,
    trailing_pe: Option<f64>,
    params: &FairValueParams,
) -> FairValueEstimate {
    let smoothed = smooth_eps(eps, params.smoothing_window);
    let as_of = prices.last().date;
    let pe = neutral_pe(&smoothed, prices, as_of, params, trailing_pe);

    let interpolator = EpsInterpolator::new(smoothed.clone());
    let series: IndicatorSeries = match &pe {
        Some(pe) => prices
            .points()
            .iter()
            .map(|p| {
                let e = interpolator.at(p.date)?;
                let fair = e * pe.value;
                (e > 0.0 && fair.is_finite() && fair > 0.0).then_some(fair)
            })
            .collect(),
        None => vec![None; prices.len()],
    };

    if eps.is_empty() {
        debug!("no EPS history, fair value unavailable");
    }

    match pe {
        Some(NeutralPe {
            value,
            source,
            ratios,
        }) => FairValueEstimate {
            neutral_pe: Some(value),
            pe_source: Some(source),
            historical_ratios: ratios,
            smoothed_eps: smoothed,
            series,
        },
        None => FairValueEstimate {
            neutral_pe: None,
            pe_source: None,
            historical_ratios: Vec::new(),
            smoothed_eps: smoothed,
            series,
        },
    }
}
