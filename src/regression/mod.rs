// =============================================================================
// Trend Regression — Long-horizon exponential fit ("Neutral Value")
// =============================================================================
//
// Model:  P̂(t) = a · e^(b·t),  t = fractional days since the earliest price.
//
// Linearised as  ln P = ln a + b·t  and solved by ordinary least squares:
//
//   denom = n·Σt² − (Σt)²
//   b     = (n·Σt·lnP − Σt·Σ lnP) / denom
//   ln a  = (Σ lnP − b·Σt) / n
//
// The spread of prices around the trend is measured in log space:
//   ε_i       = ln P_i − ln P̂(t_i)
//   sigma_log = population standard deviation of ε
//
// The fitted curve is only meaningful from the first date that went into the
// fit onwards; dates before `window_start` evaluate to `None`.
// =============================================================================

pub mod neutral_value;

pub use neutral_value::NeutralValueBands;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::market_data::PriceSeries;
use crate::runtime_config::RegressionParams;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Smallest |n·Σt² − (Σt)²| accepted before the fit is declared degenerate.
const MIN_DENOMINATOR: f64 = 1e-10;

/// Fitted exponential trend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionModel {
    pub a: f64,
    pub b: f64,
    pub first_date: DateTime<Utc>,
    pub sigma_log: f64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Prices that survived filtering and went into the fit.
    pub observations: usize,
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

impl RegressionModel {
    /// Fit the exponential trend to `(date, price)` observations.
    ///
    /// Non-finite and non-positive prices are dropped first. Order of the
    /// input does not matter: time is measured from the earliest kept date.
    ///
    /// Returns `None` when:
    /// - Fewer than two prices survive filtering.
    /// - Every kept date is identical (zero variance in t).
    pub fn fit(observations: &[(DateTime<Utc>, f64)]) -> Option<Self> {
        let kept: Vec<(DateTime<Utc>, f64)> = observations
            .iter()
            .copied()
            .filter(|(_, p)| p.is_finite() && *p > 0.0)
            .collect();

        if kept.len() < 2 {
            debug!(kept = kept.len(), "Regression: fewer than two usable prices");
            return None;
        }

        let window_start = kept.iter().map(|(d, _)| *d).min()?;
        let window_end = kept.iter().map(|(d, _)| *d).max()?;

        // --- Step 1: accumulate the OLS sums in one pass --------------------
        let n = kept.len() as f64;
        let mut sum_t = 0.0_f64;
        let mut sum_y = 0.0_f64;
        let mut sum_ty = 0.0_f64;
        let mut sum_t2 = 0.0_f64;
        for &(date, price) in &kept {
            let t = days_between(window_start, date);
            let y = price.ln();
            sum_t += t;
            sum_y += y;
            sum_ty += t * y;
            sum_t2 += t * t;
        }

        let denominator = n * sum_t2 - sum_t * sum_t;
        if denominator.abs() < MIN_DENOMINATOR {
            debug!("Regression: degenerate fit (zero variance in time)");
            return None;
        }

        let b = (n * sum_ty - sum_t * sum_y) / denominator;
        let ln_a = (sum_y - b * sum_t) / n;
        let a = ln_a.exp();
        if !a.is_finite() || !b.is_finite() {
            debug!(ln_a, b, "Regression: non-finite coefficients");
            return None;
        }

        // --- Step 2: log residuals and their population σ -------------------
        let residuals: Vec<f64> = kept
            .iter()
            .map(|&(date, price)| price.ln() - (ln_a + b * days_between(window_start, date)))
            .collect();
        let mean = residuals.iter().sum::<f64>() / n;
        let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let sigma_log = variance.sqrt();

        trace!(
            a,
            b,
            sigma_log,
            observations = kept.len(),
            %window_start,
            %window_end,
            "Regression: exponential trend fitted"
        );

        Some(Self {
            a,
            b,
            first_date: window_start,
            sigma_log,
            window_start,
            window_end,
            observations: kept.len(),
        })
    }

    /// Fit the trend to the trailing `lookback_years` of `series`.
    ///
    /// Mirrors the dashboard loader: only the last
    /// `lookback_years × trading_days_per_year` bars are used, and at least
    /// `min_observations` valid prices are required.
    pub fn fit_long_horizon(series: &PriceSeries, params: &RegressionParams) -> Option<Self> {
        let window = series.tail(params.max_points());
        let observations: Vec<(DateTime<Utc>, f64)> =
            window.iter().map(|p| (p.date, p.close)).collect();

        let valid = observations
            .iter()
            .filter(|(_, p)| p.is_finite() && *p > 0.0)
            .count();
        if valid < params.min_observations {
            debug!(
                valid,
                required = params.min_observations,
                "Regression: not enough valid prices for the long-horizon fit"
            );
            return None;
        }

        Self::fit(&observations)
    }

    /// Trend value at `date`.
    ///
    /// `None` before `window_start` and whenever the result is not a finite
    /// positive price.
    pub fn evaluate(&self, date: DateTime<Utc>) -> Option<f64> {
        if date < self.window_start {
            return None;
        }
        let value = self.a * (self.b * days_between(self.first_date, date)).exp();
        (value.is_finite() && value > 0.0).then_some(value)
    }

    /// Evaluate the trend at each of `dates`.
    pub fn evaluate_all(&self, dates: &[DateTime<Utc>]) -> Vec<Option<f64>> {
        dates.iter().map(|d| self.evaluate(*d)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 3, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn exponential(a: f64, b: f64, days: i64) -> Vec<(DateTime<Utc>, f64)> {
        (0..days).map(|t| (day(t), a * (b * t as f64).exp())).collect()
    }

    #[test]
    fn test_noiseless_round_trip() {
        let model = RegressionModel::fit(&exponential(50.0, 0.0003, 2_000)).unwrap();
        assert!((model.a - 50.0).abs() / 50.0 < 1e-9, "a = {}", model.a);
        assert!((model.b - 0.0003).abs() < 1e-12, "b = {}", model.b);
        assert!(model.sigma_log < 1e-9);
        assert_eq!(model.observations, 2_000);
        assert_eq!(model.window_start, day(0));
        assert_eq!(model.window_end, day(1_999));
    }

    #[test]
    fn test_insufficient_data_returns_none() {
        assert!(RegressionModel::fit(&[]).is_none());
        assert!(RegressionModel::fit(&[(day(0), 10.0)]).is_none());
        // Second point is dropped as non-positive.
        assert!(RegressionModel::fit(&[(day(0), 10.0), (day(1), 0.0)]).is_none());
    }

    #[test]
    fn test_identical_dates_are_degenerate() {
        let obs = [(day(5), 10.0), (day(5), 11.0), (day(5), 12.0)];
        assert!(RegressionModel::fit(&obs).is_none());
    }

    #[test]
    fn test_invalid_prices_are_filtered() {
        let mut obs = exponential(20.0, 0.001, 100);
        obs.push((day(100), f64::NAN));
        obs.push((day(101), -3.0));
        let model = RegressionModel::fit(&obs).unwrap();
        assert_eq!(model.observations, 100);
        assert_eq!(model.window_end, day(99));
    }

    #[test]
    fn test_unordered_input_fits_the_same() {
        let obs = exponential(20.0, 0.001, 50);
        let mut reversed = obs.clone();
        reversed.reverse();
        let a = RegressionModel::fit(&obs).unwrap();
        let b = RegressionModel::fit(&reversed).unwrap();
        assert_eq!(a.first_date, b.first_date);
        assert!((a.b - b.b).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_before_window_is_none() {
        let obs: Vec<_> = exponential(10.0, 0.0005, 300)
            .into_iter()
            .map(|(d, p)| (d + Duration::days(100), p))
            .collect();
        let model = RegressionModel::fit(&obs).unwrap();
        assert!(model.evaluate(day(99)).is_none());
        assert!((model.evaluate(day(100)).unwrap() - 10.0).abs() < 1e-6);
        // Extrapolation forward is allowed.
        assert!(model.evaluate(day(1_000)).is_some());
    }

    #[test]
    fn test_evaluate_overflow_is_none() {
        let model = RegressionModel::fit(&exponential(10.0, 0.5, 50)).unwrap();
        assert!(model.evaluate(day(10_000)).is_none());
    }

    #[test]
    fn test_sigma_log_of_alternating_residuals() {
        // Flat trend with prices alternating ±5% in log space.
        let obs: Vec<_> = (0..200)
            .map(|t| {
                let eps = if t % 2 == 0 { 0.05 } else { -0.05 };
                (day(t), 100.0 * f64::exp(eps))
            })
            .collect();
        let model = RegressionModel::fit(&obs).unwrap();
        assert!((model.sigma_log - 0.05).abs() < 1e-3, "sigma = {}", model.sigma_log);
    }

    #[test]
    fn test_long_horizon_takes_trailing_window() {
        let obs = exponential(5.0, 0.0002, 400);
        let dates: Vec<_> = obs.iter().map(|(d, _)| *d).collect();
        let closes: Vec<_> = obs.iter().map(|(_, p)| *p).collect();
        let series = PriceSeries::from_closes(&dates, &closes).unwrap();

        let params = RegressionParams {
            lookback_years: 1,
            trading_days_per_year: 252,
            min_observations: 10,
        };
        let model = RegressionModel::fit_long_horizon(&series, &params).unwrap();
        assert_eq!(model.observations, 252);
        assert_eq!(model.window_start, day(148));
        assert!(model.evaluate(day(100)).is_none());
    }

    #[test]
    fn test_long_horizon_minimum_observations() {
        let obs = exponential(5.0, 0.0002, 9);
        let dates: Vec<_> = obs.iter().map(|(d, _)| *d).collect();
        let closes: Vec<_> = obs.iter().map(|(_, p)| *p).collect();
        let series = PriceSeries::from_closes(&dates, &closes).unwrap();
        assert!(RegressionModel::fit_long_horizon(&series, &RegressionParams::default()).is_none());
    }

    #[test]
    fn test_determinism() {
        let obs = exponential(33.0, 0.0007, 500);
        assert_eq!(RegressionModel::fit(&obs), RegressionModel::fit(&obs));
    }
}
