// =============================================================================
// Shared types used across the chart-quant engine
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Chart timeframe selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "max")]
    Max,
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::OneYear
    }
}

impl Timeframe {
    pub const ALL: [Timeframe; 12] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::YearToDate,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::Max,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::YearToDate => "ytd",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::Max => "max",
        }
    }

    /// Bucket that drives the tranche ATR multiplier and spacing rules.
    pub fn volatility_bucket(self) -> VolatilityBucket {
        match self {
            Self::OneDay | Self::FiveDays | Self::OneWeek => VolatilityBucket::VeryShort,
            Self::OneMonth | Self::ThreeMonths => VolatilityBucket::Short,
            _ => VolatilityBucket::Long,
        }
    }

    /// Bucket that selects indicator look-back periods.
    pub fn period_profile(self) -> PeriodProfile {
        match self {
            Self::OneDay | Self::FiveDays => PeriodProfile::VeryShort,
            Self::OneWeek | Self::OneMonth => PeriodProfile::Short,
            Self::ThreeMonths | Self::SixMonths => PeriodProfile::Medium,
            Self::YearToDate | Self::OneYear | Self::TwoYears => PeriodProfile::Standard,
            Self::FiveYears | Self::TenYears | Self::Max => PeriodProfile::Long,
        }
    }

    pub fn indicator_periods(self) -> IndicatorPeriods {
        self.period_profile().periods()
    }

    /// Bar interval the data collaborator fetches for this timeframe.
    pub fn bar_interval(self) -> &'static str {
        match self {
            Self::OneDay => "1m",
            Self::FiveDays => "5m",
            Self::OneWeek => "15m",
            _ => "1d",
        }
    }

    pub fn is_intraday(self) -> bool {
        matches!(self, Self::OneDay | Self::FiveDays | Self::OneWeek)
    }

    /// Approximate number of daily trading sessions covered. `None` for
    /// intraday timeframes, whose bars are not daily.
    pub fn approx_trading_days(self) -> Option<usize> {
        match self {
            Self::OneDay | Self::FiveDays | Self::OneWeek => None,
            Self::OneMonth => Some(21),
            Self::ThreeMonths => Some(63),
            Self::SixMonths => Some(126),
            Self::YearToDate | Self::OneYear => Some(252),
            Self::TwoYears => Some(504),
            Self::FiveYears => Some(1260),
            Self::TenYears => Some(2520),
            Self::Max => Some(10_000),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Timeframe {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.token() == token)
            .ok_or_else(|| EngineError::UnknownTimeframe(s.to_string()))
    }
}

/// Volatility bucket for the 3-tranche strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityBucket {
    /// Intraday through one week.
    VeryShort,
    /// One to three months.
    Short,
    Long,
}

impl VolatilityBucket {
    /// Scale applied to the ATR offset below each Fibonacci level.
    pub fn atr_multiplier(self) -> f64 {
        match self {
            Self::VeryShort => 0.2,
            Self::Short => 0.5,
            Self::Long => 1.0,
        }
    }

    /// Minimum gap between adjacent tranches, as a fraction of the range.
    pub fn min_spacing_fraction(self) -> f64 {
        match self {
            Self::Short => 0.02,
            Self::VeryShort | Self::Long => 0.05,
        }
    }

    /// Minimum distance of the lowest tranche above the low, as a fraction
    /// of the range.
    pub fn min_from_low_fraction(self) -> f64 {
        match self {
            Self::Short => 0.01,
            Self::VeryShort | Self::Long => 0.02,
        }
    }
}

impl std::fmt::Display for VolatilityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryShort => write!(f, "VERY_SHORT"),
            Self::Short => write!(f, "SHORT"),
            Self::Long => write!(f, "LONG"),
        }
    }
}

/// Indicator period profile, one per timeframe group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodProfile {
    VeryShort,
    Short,
    Medium,
    Standard,
    Long,
}

/// Look-back periods for every indicator shown in the summary panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPeriods {
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger: usize,
    pub stochastic: usize,
    pub williams_r: usize,
}

impl PeriodProfile {
    pub fn periods(self) -> IndicatorPeriods {
        match self {
            Self::VeryShort => IndicatorPeriods {
                sma_short: 5,
                sma_long: 10,
                ema: 8,
                rsi: 7,
                macd_fast: 8,
                macd_slow: 17,
                macd_signal: 6,
                bollinger: 10,
                stochastic: 7,
                williams_r: 7,
            },
            Self::Short => IndicatorPeriods {
                sma_short: 10,
                sma_long: 20,
                ema: 10,
                rsi: 9,
                macd_fast: 10,
                macd_slow: 21,
                macd_signal: 7,
                bollinger: 15,
                stochastic: 9,
                williams_r: 9,
            },
            Self::Medium | Self::Standard => IndicatorPeriods {
                sma_short: 20,
                sma_long: 50,
                ema: 12,
                rsi: 14,
                macd_fast: 12,
                macd_slow: 26,
                macd_signal: 9,
                bollinger: 20,
                stochastic: 14,
                williams_r: 14,
            },
            Self::Long => IndicatorPeriods {
                sma_short: 50,
                sma_long: 200,
                ema: 26,
                rsi: 14,
                macd_fast: 12,
                macd_slow: 26,
                macd_signal: 9,
                bollinger: 20,
                stochastic: 14,
                williams_r: 14,
            },
        }
    }
}

impl IndicatorPeriods {
    /// Longest window any indicator in this record needs.
    pub fn max_period(&self) -> usize {
        self.sma_long
            .max(self.macd_slow)
            .max(self.bollinger)
            .max(self.stochastic)
    }

    /// Shrink the periods to fit a short series. Each period is capped at a
    /// fraction of the available bars, with small floors so the averages stay
    /// meaningful. Returns `self` unchanged when the series is long enough.
    pub fn fitted_to(&self, available: usize) -> IndicatorPeriods {
        if available >= self.max_period() {
            return *self;
        }
        let cap = |period: usize, fraction: f64| period.min((available as f64 * fraction) as usize);
        IndicatorPeriods {
            sma_short: cap(self.sma_short, 0.3).max(3),
            sma_long: cap(self.sma_long, 0.6).max(5),
            ema: cap(self.ema, 0.3).max(1),
            rsi: cap(self.rsi, 0.5).max(5),
            macd_fast: cap(self.macd_fast, 0.3).max(1),
            macd_slow: cap(self.macd_slow, 0.6).max(1),
            macd_signal: cap(self.macd_signal, 0.3).max(1),
            bollinger: cap(self.bollinger, 0.5).max(1),
            stochastic: cap(self.stochastic, 0.5).max(1),
            williams_r: cap(self.williams_r, 0.5).max(1),
        }
    }
}

/// Directional reading of a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalBias {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for SignalBias {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for SignalBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_tokens_roundtrip() {
        for tf in Timeframe::ALL {
            let parsed: Timeframe = tf.token().parse().unwrap();
            assert_eq!(parsed, tf);
            assert_eq!(tf.to_string(), tf.token());
        }
    }

    #[test]
    fn timeframe_parse_is_case_insensitive() {
        assert_eq!("YTD".parse::<Timeframe>().unwrap(), Timeframe::YearToDate);
        assert_eq!(" 5y ".parse::<Timeframe>().unwrap(), Timeframe::FiveYears);
    }

    #[test]
    fn unknown_timeframe_is_an_error() {
        let err = "2w".parse::<Timeframe>().unwrap_err();
        assert_eq!(err, EngineError::UnknownTimeframe("2w".to_string()));
    }

    #[test]
    fn timeframe_serde_uses_tokens() {
        let json = serde_json::to_string(&Timeframe::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
        let tf: Timeframe = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(tf, Timeframe::Max);
    }

    #[test]
    fn volatility_buckets() {
        assert_eq!(Timeframe::OneDay.volatility_bucket(), VolatilityBucket::VeryShort);
        assert_eq!(Timeframe::OneWeek.volatility_bucket(), VolatilityBucket::VeryShort);
        assert_eq!(Timeframe::OneMonth.volatility_bucket(), VolatilityBucket::Short);
        assert_eq!(Timeframe::ThreeMonths.volatility_bucket(), VolatilityBucket::Short);
        assert_eq!(Timeframe::SixMonths.volatility_bucket(), VolatilityBucket::Long);
        assert_eq!(Timeframe::Max.volatility_bucket(), VolatilityBucket::Long);
        assert_eq!(VolatilityBucket::VeryShort.atr_multiplier(), 0.2);
        assert_eq!(VolatilityBucket::Short.atr_multiplier(), 0.5);
        assert_eq!(VolatilityBucket::Long.atr_multiplier(), 1.0);
    }

    #[test]
    fn period_profiles_are_exhaustive() {
        assert_eq!(Timeframe::FiveDays.indicator_periods().rsi, 7);
        assert_eq!(Timeframe::OneWeek.indicator_periods().macd_slow, 21);
        assert_eq!(Timeframe::SixMonths.indicator_periods().sma_long, 50);
        assert_eq!(Timeframe::YearToDate.period_profile(), PeriodProfile::Standard);
        assert_eq!(Timeframe::TenYears.indicator_periods().sma_long, 200);
    }

    #[test]
    fn fitted_periods_shrink_for_short_series() {
        let periods = Timeframe::Max.indicator_periods();
        let fitted = periods.fitted_to(40);
        assert_eq!(fitted.sma_short, 12);
        assert_eq!(fitted.sma_long, 24);
        assert_eq!(fitted.rsi, 14);
        assert!(fitted.max_period() <= 40);

        let untouched = periods.fitted_to(500);
        assert_eq!(untouched, periods);
    }

    #[test]
    fn fitted_periods_respect_floors() {
        let fitted = Timeframe::OneYear.indicator_periods().fitted_to(6);
        assert_eq!(fitted.sma_short, 3);
        assert_eq!(fitted.sma_long, 5);
        assert_eq!(fitted.rsi, 5);
        assert!(fitted.macd_fast >= 1);
    }

    #[test]
    fn intraday_intervals() {
        assert_eq!(Timeframe::OneDay.bar_interval(), "1m");
        assert_eq!(Timeframe::OneWeek.bar_interval(), "15m");
        assert_eq!(Timeframe::OneYear.bar_interval(), "1d");
        assert!(Timeframe::FiveDays.is_intraday());
        assert_eq!(Timeframe::FiveDays.approx_trading_days(), None);
        assert_eq!(Timeframe::TwoYears.approx_trading_days(), Some(504));
    }
}
