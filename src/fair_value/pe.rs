// =============================================================================
// Neutral P/E — median of historical price / smoothed-EPS ratios
// =============================================================================
//
// Every smoothed EPS report inside the lookback window is paired with the
// closest price bar, provided that bar lies strictly within `max_match_days`
// of the report. The neutral multiple is the median of the resulting ratios
// (mean of the two middle values for an even count).
//
// With no usable pair the trailing P/E is used instead, when it is finite and
// positive.
// =============================================================================

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::market_data::{EpsObservation, PricePoint, PriceSeries};
use crate::runtime_config::FairValueParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeSource {
    HistoricalMedian,
    TrailingFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeutralPe {
    pub value: f64,
    pub source: PeSource,
    /// Ratios the median was taken over; empty for the fallback.
    pub ratios: Vec<f64>,
}

/// Median of `values`; `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Bar closest to `date` (earlier bar on a tie).
fn nearest_bar(points: &[PricePoint], date: DateTime<Utc>) -> Option<&PricePoint> {
    let idx = points.partition_point(|p| p.date < date);
    let before = idx.checked_sub(1).and_then(|i| points.get(i));
    let after = points.get(idx);
    match (before, after) {
        (Some(b), Some(a)) => {
            if (a.date - date) < (date - b.date) {
                Some(a)
            } else {
                Some(b)
            }
        }
        (b, a) => b.or(a),
    }
}

/// Earliest EPS date considered when anchored at `as_of`.
fn lookback_start(as_of: DateTime<Utc>, years: i64) -> Option<DateTime<Utc>> {
    let months = u32::try_from(years.max(0).saturating_mul(12)).ok()?;
    as_of.checked_sub_months(Months::new(months))
}

pub fn neutral_pe(
    smoothed: &[EpsObservation],
    prices: &PriceSeries,
    as_of: DateTime<Utc>,
    params: &FairValueParams,
    trailing_pe: Option<f64>,
) -> Option<NeutralPe> {
    let start = lookback_start(as_of, params.lookback_years);
    let max_gap = Duration::days(params.max_match_days);
    let points = prices.points();

    let ratios: Vec<f64> = smoothed
        .iter()
        .filter(|o| start.map_or(true, |s| o.date >= s))
        .filter_map(|o| {
            let bar = nearest_bar(points, o.date)?;
            let gap = if bar.date >= o.date {
                bar.date - o.date
            } else {
                o.date - bar.date
            };
            if gap >= max_gap || bar.close <= 0.0 || o.eps <= 0.0 {
                return None;
            }
            let pe = bar.close / o.eps;
            (pe.is_finite() && pe > 0.0).then_some(pe)
        })
        .collect();

    if let Some(value) = median(&ratios) {
        trace!(value, pairs = ratios.len(), "neutral P/E from history");
        return Some(NeutralPe {
            value,
            source: PeSource::HistoricalMedian,
            ratios,
        });
    }

    match trailing_pe {
        Some(pe) if pe.is_finite() && pe > 0.0 => {
            debug!(pe, "no historical P/E pairs, using trailing P/E");
            Some(NeutralPe {
                value: pe,
                source: PeSource::TrailingFallback,
                ratios: Vec::new(),
            })
        }
        _ => {
            debug!("no neutral P/E available");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn prices(start: DateTime<Utc>, days: i64, close: impl Fn(i64) -> f64) -> PriceSeries {
        let dates: Vec<_> = (0..days).map(|i| start + Duration::days(i)).collect();
        let closes: Vec<f64> = (0..days).map(close).collect();
        PriceSeries::from_closes(&dates, &closes).unwrap()
    }

    fn obs(date: DateTime<Utc>, eps: f64) -> EpsObservation {
        EpsObservation { date, eps }
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn median_of_paired_ratios() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = prices(start, 400, |_| 100.0);
        let smoothed = vec![
            obs(start + Duration::days(10), 10.0),
            obs(start + Duration::days(100), 5.0),
            obs(start + Duration::days(200), 4.0),
        ];
        let pe = neutral_pe(
            &smoothed,
            &series,
            series.last().date,
            &FairValueParams::default(),
            None,
        )
        .unwrap();
        assert_eq!(pe.source, PeSource::HistoricalMedian);
        assert_eq!(pe.value, 20.0);
        assert_eq!(pe.ratios.len(), 3);
    }

    #[test]
    fn loss_reports_are_not_paired() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = prices(start, 300, |_| 60.0);
        let smoothed = vec![
            obs(start + Duration::days(10), 3.0),
            obs(start + Duration::days(100), -1.0),
            obs(start + Duration::days(190), 0.0),
        ];
        let pe = neutral_pe(
            &smoothed,
            &series,
            series.last().date,
            &FairValueParams::default(),
            None,
        )
        .unwrap();
        assert_eq!(pe.ratios, vec![20.0]);
        assert_eq!(pe.value, 20.0);
    }

    #[test]
    fn match_window_is_strict() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = prices(start, 10, |_| 50.0);
        let last = series.last().date;
        let params = FairValueParams::default();

        let exactly_90 = vec![obs(last + Duration::days(90), 5.0)];
        assert!(neutral_pe(&exactly_90, &series, last, &params, None).is_none());

        let within = vec![obs(last + Duration::days(89), 5.0)];
        assert_eq!(neutral_pe(&within, &series, last, &params, None).unwrap().value, 10.0);
    }

    #[test]
    fn old_reports_are_outside_lookback() {
        let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let series = prices(start, 365 * 15, |_| 100.0);
        let smoothed = vec![obs(start + Duration::days(30), 1.0)];
        let pe = neutral_pe(
            &smoothed,
            &series,
            series.last().date,
            &FairValueParams::default(),
            Some(18.0),
        )
        .unwrap();
        assert_eq!(pe.source, PeSource::TrailingFallback);
        assert_eq!(pe.value, 18.0);
        assert!(pe.ratios.is_empty());
    }

    #[test]
    fn invalid_trailing_pe_gives_nothing() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let series = prices(start, 10, |_| 50.0);
        let last = series.last().date;
        let params = FairValueParams::default();
        assert!(neutral_pe(&[], &series, last, &params, Some(-3.0)).is_none());
        assert!(neutral_pe(&[], &series, last, &params, Some(f64::NAN)).is_none());
        assert!(neutral_pe(&[], &series, last, &params, None).is_none());
    }

    #[test]
    fn nearest_bar_prefers_earlier_on_tie() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let dates = vec![start, start + Duration::days(2)];
        let series = PriceSeries::from_closes(&dates, &[1.0, 2.0]).unwrap();
        let bar = nearest_bar(series.points(), start + Duration::days(1)).unwrap();
        assert_eq!(bar.close, 1.0);
        let bar = nearest_bar(series.points(), start + Duration::hours(36)).unwrap();
        assert_eq!(bar.close, 2.0);
    }
}
