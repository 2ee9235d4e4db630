//! Neutral-value overlay: the fitted trend plus ±1σ / ±2σ envelopes.
//!
//! Band k is `neutral · e^(k · sigma_log)`, so the bands are symmetric in log
//! space and `plus_k · minus_k == neutral²` at every defined index.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::indicators::IndicatorSeries;
use crate::regression::RegressionModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeutralValueBands {
    pub neutral: IndicatorSeries,
    pub plus_1sd: IndicatorSeries,
    pub minus_1sd: IndicatorSeries,
    pub plus_2sd: IndicatorSeries,
    pub minus_2sd: IndicatorSeries,
}

impl NeutralValueBands {
    /// Evaluate the trend and its envelopes at each of `dates`.
    pub fn evaluate(model: &RegressionModel, dates: &[DateTime<Utc>]) -> Self {
        let neutral = model.evaluate_all(dates);
        let band = |k: f64| -> IndicatorSeries {
            let factor = (k * model.sigma_log).exp();
            neutral
                .iter()
                .map(|v| v.map(|n| n * factor).filter(|b| b.is_finite()))
                .collect()
        };

        Self {
            plus_1sd: band(1.0),
            minus_1sd: band(-1.0),
            plus_2sd: band(2.0),
            minus_2sd: band(-2.0),
            neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn noisy_model() -> RegressionModel {
        let obs: Vec<_> = (0..400)
            .map(|t| {
                let wobble = (t as f64 * 0.37).sin() * 0.08;
                (day(t), 40.0 * (0.0004 * t as f64 + wobble).exp())
            })
            .collect();
        RegressionModel::fit(&obs).unwrap()
    }

    #[test]
    fn bands_are_log_symmetric() {
        let model = noisy_model();
        assert!(model.sigma_log > 0.0);
        let dates: Vec<_> = (0..400).step_by(7).map(day).collect();
        let bands = NeutralValueBands::evaluate(&model, &dates);

        for i in 0..dates.len() {
            let n = bands.neutral[i].unwrap();
            let (p1, m1) = (bands.plus_1sd[i].unwrap(), bands.minus_1sd[i].unwrap());
            let (p2, m2) = (bands.plus_2sd[i].unwrap(), bands.minus_2sd[i].unwrap());
            assert!(m2 < m1 && m1 < n && n < p1 && p1 < p2);
            assert!((p1 * m1 - n * n).abs() / (n * n) < 1e-12);
            assert!((p2 * m2 - n * n).abs() / (n * n) < 1e-12);
            assert!((p1 / n - model.sigma_log.exp()).abs() < 1e-12);
        }
    }

    #[test]
    fn bands_share_the_neutral_gaps() {
        let model = noisy_model();
        let dates = vec![day(-30), day(0), day(10)];
        let bands = NeutralValueBands::evaluate(&model, &dates);
        assert_eq!(bands.neutral.len(), 3);
        assert!(bands.neutral[0].is_none());
        assert!(bands.plus_2sd[0].is_none());
        assert!(bands.minus_1sd[0].is_none());
        assert!(bands.neutral[1].is_some());
        assert!(bands.plus_1sd[2].is_some());
    }
}
