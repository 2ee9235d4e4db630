// =============================================================================
// Chart Overlays — every computed layer for one chart request
// =============================================================================
//
// A request is a displayed price series for a timeframe, optionally with:
//   - a longer history ending at the same bar (moving averages, trend fit)
//   - an EPS history and trailing P/E (fair value)
//   - a comparison ticker rescaled onto the displayed price axis
//   - an option chain (gamma exposure and call/put walls)
//
// Each layer is computed independently and absent layers stay absent: a
// missing fair value never prevents the tranche levels, and so on.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::fair_value::{estimate_fair_value, FairValueEstimate};
use crate::indicators::bollinger::DEFAULT_NUM_STD;
use crate::indicators::stochastic::DEFAULT_D_PERIOD;
use crate::indicators::{
    calculate_bollinger, calculate_macd, calculate_rsi, calculate_stochastic,
    calculate_williams_r, sma_with_history, summarize, BollingerBands, IndicatorSeries,
    IndicatorSummary, Macd, MacdParams, Stochastic,
};
use crate::market_data::{EpsSeries, PriceSeries};
use crate::options::{gamma_profile, GammaProfile, OptionChain};
use crate::regression::{NeutralValueBands, RegressionModel};
use crate::runtime_config::EngineConfig;
use crate::tranche::{
    compute_tranche_levels, identify_support_levels, trend_filter, TrancheLevels, TrendFilter,
    DEFAULT_SUPPORT_WINDOW,
};
use crate::types::Timeframe;

/// Periods of the moving-average overlays drawn on the price chart.
pub const OVERLAY_MA_PERIODS: [usize; 3] = [50, 100, 200];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverageOverlay {
    pub period: usize,
    pub values: IndicatorSeries,
}

/// Optional inputs beyond the displayed series.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayInputs<'a> {
    /// Longer history whose last bar is the displayed series' last bar.
    pub long_history: Option<&'a PriceSeries>,
    pub eps: Option<&'a EpsSeries>,
    pub trailing_pe: Option<f64>,
    /// Ticker drawn against the displayed series, same timeframe.
    pub comparison: Option<&'a PriceSeries>,
    pub options: Option<&'a OptionChain>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOverlays {
    pub timeframe: Timeframe,
    /// Absolute and percentage change between first and last close.
    pub period_change: (f64, f64),
    pub summary: IndicatorSummary,
    pub moving_averages: Vec<MovingAverageOverlay>,
    pub bollinger: BollingerBands,
    pub macd: Macd,
    pub rsi: IndicatorSeries,
    pub stochastic: Stochastic,
    pub williams_r: IndicatorSeries,
    pub regression: Option<RegressionModel>,
    pub neutral_value: Option<NeutralValueBands>,
    pub tranche_levels: Option<TrancheLevels>,
    pub trend_filter: TrendFilter,
    pub support_levels: Vec<f64>,
    pub fair_value: Option<FairValueEstimate>,
    /// Comparison closes on the displayed series' price axis.
    pub comparison: Option<Vec<f64>>,
    pub gamma: Option<GammaProfile>,
}

impl ChartOverlays {
    pub fn compute(
        series: &PriceSeries,
        timeframe: Timeframe,
        inputs: OverlayInputs<'_>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let dates = series.dates();

        // --- Indicator panels (periods fitted to the series) -----------------
        let summary = summarize(series, timeframe, config.macd_alignment)?;
        let periods = summary.periods;

        let bollinger = calculate_bollinger(&closes, periods.bollinger, DEFAULT_NUM_STD)?;
        let macd = calculate_macd(
            &closes,
            MacdParams {
                fast: periods.macd_fast,
                slow: periods.macd_slow,
                signal: periods.macd_signal,
                alignment: config.macd_alignment,
            },
        )?;
        let rsi = calculate_rsi(&closes, periods.rsi)?;
        let stochastic =
            calculate_stochastic(&highs, &lows, &closes, periods.stochastic, DEFAULT_D_PERIOD)?;
        let williams_r = calculate_williams_r(&highs, &lows, &closes, periods.williams_r)?;

        // --- Moving averages over the longer history -------------------------
        let history = match inputs.long_history {
            Some(long) if long.last().date == series.last().date => long,
            Some(long) => {
                debug!(
                    long_end = %long.last().date,
                    shown_end = %series.last().date,
                    "long history does not end at the displayed bar, ignoring it"
                );
                series
            }
            None => series,
        };
        let history_closes = history.closes();
        let moving_averages = OVERLAY_MA_PERIODS
            .iter()
            .map(|&period| {
                Ok(MovingAverageOverlay {
                    period,
                    values: sma_with_history(&history_closes, series.len(), period)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // --- Neutral value ---------------------------------------------------
        let regression = RegressionModel::fit_long_horizon(history, &config.regression);
        let neutral_value = regression
            .as_ref()
            .map(|model| NeutralValueBands::evaluate(model, &dates));

        // --- 3-Tranche -------------------------------------------------------
        let tranche_levels = compute_tranche_levels(series, timeframe, &config.tranche)?
            .map(|levels| levels.with_confirmations(series, &config.confirmation));
        let trend_filter = trend_filter(series)?;
        let support_levels = identify_support_levels(&closes, DEFAULT_SUPPORT_WINDOW);

        // --- Fair value ------------------------------------------------------
        let fair_value = inputs
            .eps
            .map(|eps| estimate_fair_value(series, eps, inputs.trailing_pe, &config.fair_value));

        // --- Comparison and options ------------------------------------------
        let comparison = inputs
            .comparison
            .and_then(|other| series.normalize_comparison(other));
        let gamma = inputs
            .options
            .and_then(|chain| gamma_profile(chain, Some(series.last().close), &config.options));

        Ok(Self {
            timeframe,
            period_change: series.period_change(),
            summary,
            moving_averages,
            bollinger,
            macd,
            rsi,
            stochastic,
            williams_r,
            regression,
            neutral_value,
            tranche_levels,
            trend_filter,
            support_levels,
            fair_value,
            comparison,
            gamma,
        })
    }

    pub fn moving_average(&self, period: usize) -> Option<&MovingAverageOverlay> {
        self.moving_averages.iter().find(|m| m.period == period)
    }
}
