use crate::reconciler::ReconciledSeries;
use crate::schema::{DataOrigin, DataPoint};
use crate::trend::FittedTrend;
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPoint {
    pub year: i32,
    pub actual_value: Option<f64>,
    pub predicted_value: f64,
    pub origin: DataOrigin,
}

impl From<&DataPoint> for ProjectedPoint {
    fn from(point: &DataPoint) -> Self {
        Self {
            year: point.year,
            actual_value: point.observed_actual,
            predicted_value: point.projected_value,
            origin: if point.is_known_future {
                DataOrigin::KnownFuture
            } else {
                DataOrigin::Actual
            },
        }
    }
}

/// Emits the reconciled points and fills the years after the last trained year with
/// model values, up to `horizon` years and never past `max_year`.
///
/// Known-future points are never re-predicted. When the series ends on a
/// known-future point nothing is appended after it; only the gaps leading up to it
/// are filled.
pub struct SeriesProjector {
    horizon: u32,
    max_year: i32,
}

impl SeriesProjector {
    pub fn new(horizon: u32, max_year: i32) -> Self {
        Self { horizon, max_year }
    }

    pub fn project(
        &self,
        series: &ReconciledSeries,
        trend: Option<&FittedTrend>,
    ) -> Vec<ProjectedPoint> {
        let mut by_year: BTreeMap<i32, ProjectedPoint> = series
            .points
            .iter()
            .map(|p| (p.year, ProjectedPoint::from(p)))
            .collect();

        let (Some(trend), Some(last)) = (trend, series.last()) else {
            return by_year.into_values().collect();
        };

        let start = trend.last_training_year;
        let mut end = start
            .saturating_add(self.horizon.min(i32::MAX as u32) as i32)
            .min(self.max_year);
        if last.is_known_future {
            debug!(
                "Series ends on a known-future {:?} figure for {}, no years appended",
                last.source, last.year
            );
            end = end.min(last.year);
        }

        let Some(first) = start.checked_add(1) else {
            return by_year.into_values().collect();
        };

        for year in first..=end {
            by_year.entry(year).or_insert_with(|| ProjectedPoint {
                year,
                actual_value: None,
                predicted_value: trend.predict_year(year).max(0.0),
                origin: DataOrigin::Extrapolated,
            });
        }

        by_year.into_values().collect()
    }
}
