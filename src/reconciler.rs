use crate::schema::{DataPoint, FamilyTag, FinancialEntity, YearFigures};
use std::ops::RangeInclusive;

/// Minimum number of points an entity needs before a trend is attempted.
pub const MIN_SERIES_POINTS: usize = 2;

/// Collapses the four field families of an entity into one time series.
///
/// For each year of the window:
/// - an Actual figure always wins and the point is not known-future;
/// - otherwise the first of Landing, Budget, Plan that is present becomes a
///   known-future point;
/// - a year with nothing recorded yields no point at all.
pub struct FieldReconciler {
    window: RangeInclusive<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSeries {
    pub points: Vec<DataPoint>,
}

impl ReconciledSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Fewer than two points is reported upstream as insufficient data, not as an error.
    pub fn is_sufficient(&self) -> bool {
        self.points.len() >= MIN_SERIES_POINTS
    }

    /// Points eligible for training: everything that is not a human-entered forecast.
    pub fn training_points(&self) -> Vec<&DataPoint> {
        self.points.iter().filter(|p| !p.is_known_future).collect()
    }

    pub fn last(&self) -> Option<&DataPoint> {
        self.points.last()
    }
}

impl FieldReconciler {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            window: start_year..=end_year,
        }
    }

    pub fn reconcile(&self, entity: &FinancialEntity) -> ReconciledSeries {
        if self.window.is_empty() {
            return ReconciledSeries { points: Vec::new() };
        }

        let points = entity
            .years
            .range(self.window.clone())
            .filter_map(|(year, figures)| reconcile_year(figures, *year))
            .collect();

        ReconciledSeries { points }
    }
}

/// Non-finite amounts are treated as absent.
fn reconcile_year(figures: &YearFigures, year: i32) -> Option<DataPoint> {
    let finite = |family: FamilyTag| figures.get(family).filter(|v| v.is_finite());

    if let Some(actual) = finite(FamilyTag::Actual) {
        return Some(DataPoint {
            year,
            observed_actual: Some(actual),
            projected_value: actual,
            is_known_future: false,
            source: FamilyTag::Actual,
        });
    }

    FamilyTag::KNOWN_FUTURE_PRECEDENCE
        .iter()
        .find_map(|family| finite(*family).map(|v| (*family, v)))
        .map(|(family, value)| DataPoint {
            year,
            observed_actual: None,
            projected_value: value,
            is_known_future: true,
            source: family,
        })
}
