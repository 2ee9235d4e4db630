// =============================================================================
// Indicator Summary Panel
// =============================================================================
//
// Latest reading of every chart indicator for one timeframe, each classified
// into a directional bias. Oscillator thresholds tighten on the shorter
// timeframes, where swings are larger:
//
//   Indicator     VeryShort      Short        Long
//   RSI           75 / 25        72 / 28      70 / 30
//   Stochastic    85 / 15        80 / 20      80 / 20
//   Williams %R   -15 / -85      -20 / -80    -20 / -80
//
// Overbought reads Bearish, oversold reads Bullish. Moving averages are
// Bullish while price trades above them. MACD is Bullish above its signal.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::indicators::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    calculate_stochastic, calculate_williams_r, last_defined, MacdParams, SignalAlignment,
};
use crate::market_data::PriceSeries;
use crate::types::{IndicatorPeriods, SignalBias, Timeframe, VolatilityBucket};

/// Where the latest close sits relative to the Bollinger envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BandPosition {
    Above,
    Middle,
    Below,
}

impl std::fmt::Display for BandPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "Above"),
            Self::Middle => write!(f, "Middle"),
            Self::Below => write!(f, "Below"),
        }
    }
}

/// One tile of the summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReading {
    pub label: String,
    pub value: Option<f64>,
    pub bias: SignalBias,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub timeframe: Timeframe,
    /// Periods actually used (shrunk for short series).
    pub periods: IndicatorPeriods,
    pub price: f64,
    pub band_position: Option<BandPosition>,
    pub readings: Vec<IndicatorReading>,
}

impl IndicatorSummary {
    pub fn reading(&self, label_prefix: &str) -> Option<&IndicatorReading> {
        self.readings.iter().find(|r| r.label.starts_with(label_prefix))
    }
}

/// Oscillator thresholds as (overbought, oversold).
fn rsi_thresholds(bucket: VolatilityBucket) -> (f64, f64) {
    match bucket {
        VolatilityBucket::VeryShort => (75.0, 25.0),
        VolatilityBucket::Short => (72.0, 28.0),
        VolatilityBucket::Long => (70.0, 30.0),
    }
}

fn stochastic_thresholds(bucket: VolatilityBucket) -> (f64, f64) {
    match bucket {
        VolatilityBucket::VeryShort => (85.0, 15.0),
        _ => (80.0, 20.0),
    }
}

fn williams_thresholds(bucket: VolatilityBucket) -> (f64, f64) {
    match bucket {
        VolatilityBucket::VeryShort => (-15.0, -85.0),
        _ => (-20.0, -80.0),
    }
}

fn oscillator_bias(value: Option<f64>, (overbought, oversold): (f64, f64)) -> SignalBias {
    match value {
        Some(v) if v > overbought => SignalBias::Bearish,
        Some(v) if v < oversold => SignalBias::Bullish,
        _ => SignalBias::Neutral,
    }
}

fn trend_bias(price: f64, average: Option<f64>) -> SignalBias {
    match average {
        Some(avg) if price > avg => SignalBias::Bullish,
        Some(_) => SignalBias::Bearish,
        None => SignalBias::Neutral,
    }
}

/// Compute the summary panel for `series` on `timeframe`.
pub fn summarize(
    series: &PriceSeries,
    timeframe: Timeframe,
    alignment: SignalAlignment,
) -> Result<IndicatorSummary> {
    let closes = series.closes();
    let highs = series.highs();
    let lows = series.lows();
    let price = series.last().close;
    let bucket = timeframe.volatility_bucket();

    let periods = timeframe.indicator_periods().fitted_to(closes.len());
    if periods != timeframe.indicator_periods() {
        debug!(
            %timeframe,
            bars = closes.len(),
            "Series shorter than indicator periods -- using shrunk periods"
        );
    }

    let sma_short = last_defined(&calculate_sma(&closes, periods.sma_short)?);
    let sma_long = last_defined(&calculate_sma(&closes, periods.sma_long)?);
    let ema = last_defined(&calculate_ema(&closes, periods.ema)?);
    let rsi = last_defined(&calculate_rsi(&closes, periods.rsi)?);
    let macd = calculate_macd(
        &closes,
        MacdParams {
            fast: periods.macd_fast,
            slow: periods.macd_slow,
            signal: periods.macd_signal,
            alignment,
        },
    )?;
    let bands = calculate_bollinger(&closes, periods.bollinger, 2.0)?;
    let stoch = calculate_stochastic(&highs, &lows, &closes, periods.stochastic, 3)?;
    let williams = last_defined(&calculate_williams_r(&highs, &lows, &closes, periods.williams_r)?);

    // The panel reads the final bar only; a gap there means "no reading".
    let macd_value = macd.macd.last().copied().flatten();
    let signal_value = macd.signal.last().copied().flatten();
    let macd_bias = match (macd_value, signal_value) {
        (Some(m), Some(s)) if m > s => SignalBias::Bullish,
        (Some(_), Some(_)) => SignalBias::Bearish,
        _ => SignalBias::Neutral,
    };

    let upper = bands.upper.last().copied().flatten();
    let lower = bands.lower.last().copied().flatten();
    let band_position = match (upper, lower) {
        (Some(u), _) if price > u => Some(BandPosition::Above),
        (_, Some(l)) if price < l => Some(BandPosition::Below),
        (Some(_), Some(_)) => Some(BandPosition::Middle),
        _ => None,
    };
    let band_bias = match band_position {
        Some(BandPosition::Above) => SignalBias::Bearish,
        Some(BandPosition::Below) => SignalBias::Bullish,
        _ => SignalBias::Neutral,
    };

    let stoch_k = stoch.k.last().copied().flatten();

    let readings = vec![
        IndicatorReading {
            label: format!("SMA {}", periods.sma_short),
            value: sma_short,
            bias: trend_bias(price, sma_short),
        },
        IndicatorReading {
            label: format!("SMA {}", periods.sma_long),
            value: sma_long,
            bias: trend_bias(price, sma_long),
        },
        IndicatorReading {
            label: format!("EMA {}", periods.ema),
            value: ema,
            bias: trend_bias(price, ema),
        },
        IndicatorReading {
            label: format!("RSI {}", periods.rsi),
            value: rsi,
            bias: oscillator_bias(rsi, rsi_thresholds(bucket)),
        },
        IndicatorReading {
            label: "MACD".to_string(),
            value: macd_value,
            bias: macd_bias,
        },
        IndicatorReading {
            label: format!("Bollinger {}", periods.bollinger),
            value: Some(price),
            bias: band_bias,
        },
        IndicatorReading {
            label: format!("Stochastic {}", periods.stochastic),
            value: stoch_k,
            bias: oscillator_bias(stoch_k, stochastic_thresholds(bucket)),
        },
        IndicatorReading {
            label: format!("Williams %R {}", periods.williams_r),
            value: williams,
            bias: oscillator_bias(williams, williams_thresholds(bucket)),
        },
    ];

    Ok(IndicatorSummary {
        timeframe,
        periods,
        price,
        band_position,
        readings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn dates(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn rising(n: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        PriceSeries::from_closes(&dates(n), &closes).unwrap()
    }

    #[test]
    fn thresholds_tighten_on_short_timeframes() {
        use VolatilityBucket::{Long, Short, VeryShort};

        let rsi = |v: f64, bucket| oscillator_bias(Some(v), rsi_thresholds(bucket));
        assert_eq!(rsi(73.0, VeryShort), SignalBias::Neutral);
        assert_eq!(rsi(73.0, Short), SignalBias::Bearish);
        assert_eq!(rsi(29.0, Long), SignalBias::Bullish);

        let williams = |v: f64| oscillator_bias(Some(v), williams_thresholds(VeryShort));
        assert_eq!(williams(-10.0), SignalBias::Bearish);
        assert_eq!(williams(-82.0), SignalBias::Neutral);

        assert_eq!(
            oscillator_bias(None, stochastic_thresholds(Long)),
            SignalBias::Neutral
        );
    }

    #[test]
    fn rising_series_reads_bullish_trend_and_overbought() {
        let summary =
            summarize(&rising(300), Timeframe::OneYear, SignalAlignment::Aligned).unwrap();
        assert_eq!(summary.readings.len(), 8);
        assert_eq!(summary.reading("SMA 20").unwrap().bias, SignalBias::Bullish);
        assert_eq!(summary.reading("SMA 50").unwrap().bias, SignalBias::Bullish);
        assert_eq!(summary.reading("EMA").unwrap().bias, SignalBias::Bullish);
        // Only gains: RSI pinned at 100 and overbought.
        let rsi = summary.reading("RSI").unwrap();
        assert_eq!(rsi.value, Some(100.0));
        assert_eq!(rsi.bias, SignalBias::Bearish);
        // Close is the top of every trailing window.
        assert_eq!(summary.reading("Williams").unwrap().bias, SignalBias::Bearish);
        assert_eq!(summary.reading("Stochastic").unwrap().bias, SignalBias::Bearish);
    }

    #[test]
    fn short_series_uses_shrunk_periods() {
        let summary =
            summarize(&rising(20), Timeframe::FiveYears, SignalAlignment::Aligned).unwrap();
        assert_eq!(summary.periods.sma_short, 6);
        assert_eq!(summary.periods.sma_long, 12);
        assert_eq!(summary.periods.rsi, 10);
        assert!(summary.reading("SMA 6").unwrap().value.is_some());
    }

    #[test]
    fn band_position_for_final_spike() {
        let mut closes = vec![100.0; 40];
        closes.push(130.0);
        let series = PriceSeries::from_closes(&dates(41), &closes).unwrap();
        let summary = summarize(&series, Timeframe::OneYear, SignalAlignment::Aligned).unwrap();
        assert_eq!(summary.band_position, Some(BandPosition::Above));
        assert_eq!(summary.reading("Bollinger").unwrap().bias, SignalBias::Bearish);
    }

    #[test]
    fn single_bar_summary_is_neutral() {
        let summary = summarize(&rising(1), Timeframe::OneDay, SignalAlignment::Aligned).unwrap();
        // A one-bar band has zero width; the close sits on it.
        assert_eq!(summary.band_position, Some(BandPosition::Middle));
        for reading in &summary.readings {
            if reading.label.starts_with("Bollinger") {
                continue;
            }
            assert_eq!(reading.bias, SignalBias::Neutral, "{}", reading.label);
        }
    }
}
