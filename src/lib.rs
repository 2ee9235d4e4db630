// =============================================================================
// chart-quant — Quantitative engine behind the stock chart
// =============================================================================
//
// Pure computations over immutable price and EPS snapshots:
//   indicators:   SMA/EMA/RSI/MACD/Bollinger/Stochastic/Williams %R/ATR
//   regression:   long-horizon exponential trend and its sigma bands
//   tranche:      3-Tranche support levels, confirmations, trend filter
//   fair_value:   smoothed EPS times a median historical P/E
//   options:      Black-Scholes gamma exposure and call/put walls
//   overlays:     all of the above for a single chart request
//
// The library logs through `tracing` and never installs a subscriber.
// =============================================================================

pub mod error;
pub mod fair_value;
pub mod indicators;
pub mod market_data;
pub mod options;
pub mod overlays;
pub mod regression;
pub mod runtime_config;
pub mod tranche;
pub mod types;

pub use error::{EngineError, Result};
pub use market_data::{EpsFrequency, EpsObservation, EpsSeries, PricePoint, PriceSeries};
pub use options::{GammaProfile, OptionChain};
pub use overlays::{ChartOverlays, OverlayInputs};
pub use runtime_config::EngineConfig;
pub use types::Timeframe;
