use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One reported earnings-per-share figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsObservation {
    pub date: DateTime<Utc>,
    pub eps: f64,
}

/// Reporting cadence of an EPS series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpsFrequency {
    Quarterly,
    Annual,
}

/// Ascending EPS history of finite values.
///
/// Loss quarters (zero or negative EPS) are kept: they belong in the trailing
/// average. Only the P/E and fair-value steps require a positive EPS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpsSeries {
    frequency: EpsFrequency,
    observations: Vec<EpsObservation>,
}

impl EpsSeries {
    pub fn new(frequency: EpsFrequency, mut observations: Vec<EpsObservation>) -> Self {
        let before = observations.len();
        observations.retain(|o| o.eps.is_finite());
        if observations.len() != before {
            warn!(
                dropped = before - observations.len(),
                kept = observations.len(),
                "EPS series: dropped non-finite reports"
            );
        }
        // Stable sort keeps input order for equal report dates.
        observations.sort_by_key(|o| o.date);
        Self {
            frequency,
            observations,
        }
    }

    /// Quarterly reports when any are usable, otherwise annual.
    pub fn preferred(quarterly: Vec<EpsObservation>, annual: Vec<EpsObservation>) -> Self {
        let quarterly = Self::new(EpsFrequency::Quarterly, quarterly);
        if !quarterly.is_empty() {
            return quarterly;
        }
        Self::new(EpsFrequency::Annual, annual)
    }

    pub fn frequency(&self) -> EpsFrequency {
        self.frequency
    }

    pub fn observations(&self) -> &[EpsObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(month: u32, eps: f64) -> EpsObservation {
        EpsObservation {
            date: Utc.with_ymd_and_hms(2021, month, 1, 0, 0, 0).unwrap(),
            eps,
        }
    }

    #[test]
    fn keeps_losses_drops_non_finite_and_sorts() {
        let series = EpsSeries::new(
            EpsFrequency::Quarterly,
            vec![obs(7, 1.5), obs(1, 1.0), obs(4, -0.2), obs(10, f64::NAN)],
        );
        let values: Vec<f64> = series.observations().iter().map(|o| o.eps).collect();
        assert_eq!(values, vec![1.0, -0.2, 1.5]);
    }

    #[test]
    fn preferred_falls_back_to_annual() {
        let series = EpsSeries::preferred(vec![obs(1, f64::NAN)], vec![obs(1, 4.0)]);
        assert_eq!(series.frequency(), EpsFrequency::Annual);
        assert_eq!(series.len(), 1);

        let series = EpsSeries::preferred(vec![obs(1, -1.0)], vec![obs(1, 4.0)]);
        assert_eq!(series.frequency(), EpsFrequency::Quarterly);
    }
}
