//! # IT Budget Forecaster
//!
//! A library for turning year-tagged IT budget lines into one reconciled time series
//! per axis and projecting it forward with a minimal linear trend.
//!
//! ## Core Concepts
//!
//! - **Families**: each year of a line may carry an Actual, a Budget, a Landing
//!   (mid-year revised forecast) and a Plan figure
//! - **Reconciliation**: Actual always wins; otherwise Landing > Budget > Plan gives a
//!   *known-future* point; empty years are skipped
//! - **Trend**: a one-weight, one-bias linear model over the ordinal index of the
//!   non known-future points, trained on standardized values
//! - **Projection**: model values fill the years after the last trained year, never
//!   overwrite a known-future figure, never go below zero and never pass the
//!   configured ceiling year
//!
//! Only aggregate ("Total") rows are projected; per-counterparty rows are display-only.
//!
//! ## Example
//!
//! ```rust,ignore
//! use it_budget_forecaster::*;
//!
//! let hosting = FinancialEntity::aggregate("Hosting")
//!     .with_values(FamilyTag::Actual, &[(2021, 100.0), (2022, 120.0), (2023, 150.0)])
//!     .with_value(2024, FamilyTag::Budget, 180.0)
//!     .with_value(2026, FamilyTag::Plan, 220.0);
//!
//! let outcome = generate_predictions(&[hosting], 5).unwrap();
//! for record in &outcome.records {
//!     println!("{} {:?} {}", record.year, record.actual_value, record.predicted_value);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod projector;
pub mod reconciler;
pub mod schema;
pub mod trend;
pub mod utils;
pub mod variance;

pub use config::{ForecastConfig, TrainingConfig};
pub use engine::{DiagnosticKind, EntityDiagnostic, EntityForecast, ForecastOutcome, PredictionEngine};
pub use error::{ForecastError, Result};
pub use export::{pivot_by_entity, to_json, write_csv, PivotRow};
pub use ingestion::{ColumnScheme, IngestionReport, RawEntityRecord, RejectedRecord};
pub use projector::{ProjectedPoint, SeriesProjector};
pub use reconciler::{FieldReconciler, ReconciledSeries};
pub use schema::*;
pub use trend::{FittedTrend, TrendFitter, TrendModel};
pub use utils::*;
pub use variance::VarianceFields;

use log::{debug, info};

pub struct BudgetForecastProcessor;

impl BudgetForecastProcessor {
    pub fn process(
        entities: &[FinancialEntity],
        config: &ForecastConfig,
    ) -> Result<ForecastOutcome> {
        let aggregates = entities.iter().filter(|e| e.is_aggregate()).count();
        info!(
            "Forecasting {} aggregate entities out of {} ({} years, ceiling {})",
            aggregates,
            entities.len(),
            config.years_to_predict,
            config.max_projection_year
        );

        let outcome = PredictionEngine::new(config)?.run(entities)?;

        for diagnostic in &outcome.diagnostics {
            debug!("Diagnostic for '{}': {:?}", diagnostic.entity, diagnostic.kind);
        }

        Ok(outcome)
    }

    /// Ingests raw persistence/import records with the default column scheme first.
    /// Records that cannot be ingested are skipped and reported as diagnostics.
    pub fn process_records(
        records: &[RawEntityRecord],
        config: &ForecastConfig,
    ) -> Result<ForecastOutcome> {
        let report = ingestion::parse_records(records);
        if !report.rejected.is_empty() {
            info!(
                "{} of {} records rejected during ingestion",
                report.rejected.len(),
                records.len()
            );
        }

        let outcome = Self::process(&report.entities, config)?;
        Ok(outcome.with_rejections(&report.rejected))
    }
}

pub fn generate_predictions(
    entities: &[FinancialEntity],
    years_to_predict: u32,
) -> Result<ForecastOutcome> {
    let config = ForecastConfig::default().with_years_to_predict(years_to_predict);
    BudgetForecastProcessor::process(entities, &config)
}

pub fn generate_predictions_from_records(
    records: &[RawEntityRecord],
    config: &ForecastConfig,
) -> Result<ForecastOutcome> {
    BudgetForecastProcessor::process_records(records, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_end_to_end_processing() {
        let hosting = FinancialEntity::aggregate("Hosting")
            .with_values(
                FamilyTag::Actual,
                &[(2021, 100.0), (2022, 120.0), (2023, 150.0)],
            )
            .with_value(2024, FamilyTag::Budget, 180.0)
            .with_value(2026, FamilyTag::Plan, 220.0);

        let outcome = generate_predictions(&[hosting], 5).unwrap();
        let years: Vec<i32> = outcome.records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2022, 2023, 2024, 2025, 2026]);

        let extrapolated = &outcome.records[4];
        assert_eq!(extrapolated.origin, DataOrigin::Extrapolated);
        assert!(
            (extrapolated.predicted_value - 198.33).abs() < 0.5,
            "2025 should follow the 2021-2023 trend, got {}",
            extrapolated.predicted_value
        );
    }

    #[test]
    fn test_records_pipeline() {
        let records: Vec<RawEntityRecord> = vec![
            serde_json::from_value(json!({
                "Axe_IT": "Total Network",
                "ANNEE_2021": "10",
                "ANNEE_2022": "20",
                "ANNEE_2023": "30"
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "Axe_IT": "Network",
                "Contrepartie": "F9",
                "ANNEE_2023": "30"
            }))
            .unwrap(),
        ];

        let config = ForecastConfig::default().with_years_to_predict(2);
        let outcome = generate_predictions_from_records(&records, &config).unwrap();

        assert_eq!(outcome.records.len(), 5);
        assert!(outcome.records.iter().all(|r| r.is_aggregate));
        assert!(outcome.diagnostics.is_empty());
        let last = outcome.records.last().unwrap();
        assert_eq!(last.year, 2025);
        assert!((last.predicted_value - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_records_pipeline_skips_unidentified_row() {
        let records: Vec<RawEntityRecord> = vec![
            serde_json::from_value(json!({
                "Axe_IT": "Total Hosting",
                "ANNEE_2021": "100",
                "ANNEE_2022": "120",
                "ANNEE_2023": "150"
            }))
            .unwrap(),
            serde_json::from_value(json!({ "Contrepartie": "F9", "ANNEE_2023": "3" })).unwrap(),
        ];

        let config = ForecastConfig::default().with_years_to_predict(2);
        let outcome = generate_predictions_from_records(&records, &config).unwrap();

        let years: Vec<i32> = outcome.records_for("Hosting").map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2022, 2023, 2024, 2025]);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].entity, "record #1");
        assert!(matches!(
            outcome.diagnostics[0].kind,
            DiagnosticKind::RejectedRecord { index: 1, .. }
        ));
    }

    #[test]
    fn test_records_pipeline_with_only_rejected_rows() {
        let records: Vec<RawEntityRecord> =
            vec![serde_json::from_value(json!({ "ANNEE_2023": "3" })).unwrap()];
        assert!(matches!(
            generate_predictions_from_records(&records, &ForecastConfig::default()),
            Err(ForecastError::NoPredictableData)
        ));
    }
}
