//! 200-day moving-average trend filter shown next to the tranche levels.
//!
//! Informational only: the levels are computed whether or not the filter
//! passes.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::indicators::calculate_sma;
use crate::market_data::PriceSeries;

const MA_PERIOD: usize = 200;
const MIN_MA_VALUES: usize = 10;
const SLOPE_SPAN: usize = 20;
/// A 200-DMA falling less than 2% over the slope span counts as flattening.
const FLATTENING_SLOPE: f64 = -0.02;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendFilter {
    pub active: bool,
    pub reason: String,
    pub warning: bool,
}

impl TrendFilter {
    fn bypassed(reason: &str) -> Self {
        Self {
            active: true,
            reason: reason.to_string(),
            warning: true,
        }
    }
}

/// Evaluate the filter on `series`: active while price is above its 200-DMA
/// or the 200-DMA is not in a steep decline.
pub fn trend_filter(series: &PriceSeries) -> Result<TrendFilter> {
    trend_filter_with_period(series, MA_PERIOD)
}

fn trend_filter_with_period(series: &PriceSeries, ma_period: usize) -> Result<TrendFilter> {
    if series.len() < ma_period {
        return Ok(TrendFilter::bypassed(
            "Insufficient data for 200-DMA - trend filter bypassed",
        ));
    }

    let closes = series.closes();
    let ma: Vec<f64> = calculate_sma(&closes, ma_period)?.into_iter().flatten().collect();
    if ma.len() < MIN_MA_VALUES {
        return Ok(TrendFilter::bypassed(
            "Cannot calculate 200-DMA - trend filter bypassed",
        ));
    }

    let price = series.last().close;
    let current_ma = ma[ma.len() - 1];
    let price_above = price > current_ma;

    let recent = &ma[ma.len().saturating_sub(SLOPE_SPAN)..];
    let slope = (recent[recent.len() - 1] - recent[0]) / recent[0];
    let flattening = slope > FLATTENING_SLOPE;

    debug!(price, current_ma, slope, "200-DMA trend filter");

    let filter = if price_above || flattening {
        TrendFilter {
            active: true,
            reason: if price_above {
                "Price above 200-DMA".to_string()
            } else {
                "200-DMA flattening".to_string()
            },
            warning: false,
        }
    } else {
        TrendFilter {
            active: false,
            reason: "Trend filter not met: price below 200-DMA and steep downtrend".to_string(),
            warning: false,
        }
    };
    Ok(filter)
}
