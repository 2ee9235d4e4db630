//! EPS smoothing and per-date interpolation.

use chrono::{DateTime, Utc};

use crate::market_data::{EpsObservation, EpsSeries};

/// Trailing mean over `window` reports. The first `window - 1` reports
/// average whatever history exists so far. A zero window is treated as 1.
pub fn smooth_eps(eps: &EpsSeries, window: usize) -> Vec<EpsObservation> {
    let window = window.max(1);
    let obs = eps.observations();
    let mut out = Vec::with_capacity(obs.len());
    let mut sum = 0.0;

    for (i, o) in obs.iter().enumerate() {
        sum += o.eps;
        if i >= window {
            sum -= obs[i - window].eps;
        }
        let count = (i + 1).min(window);
        out.push(EpsObservation {
            date: o.date,
            eps: sum / count as f64,
        });
    }
    out
}

/// Piecewise-linear EPS between report dates, flat outside the reported range.
#[derive(Debug, Clone)]
pub struct EpsInterpolator {
    points: Vec<EpsObservation>,
}

impl EpsInterpolator {
    /// `points` must be ascending by date, as `smooth_eps` returns them.
    pub fn new(points: Vec<EpsObservation>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn at(&self, date: DateTime<Utc>) -> Option<f64> {
        let first = self.points.first()?;
        // Number of reports dated on or before `date`.
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            return Some(first.eps);
        }
        if idx == self.points.len() {
            return self.points.last().map(|p| p.eps);
        }

        let before = &self.points[idx - 1];
        let after = &self.points[idx];
        let total = (after.date - before.date).num_milliseconds() as f64;
        let elapsed = (date - before.date).num_milliseconds() as f64;
        let t = if total > 0.0 { elapsed / total } else { 0.0 };
        Some(before.eps + (after.eps - before.eps) * t)
    }
}
