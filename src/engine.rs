use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::ingestion::RejectedRecord;
use crate::projector::{ProjectedPoint, SeriesProjector};
use crate::reconciler::FieldReconciler;
use crate::schema::{EntityIdentity, FinancialEntity, PredictionRecord};
use crate::trend::{FittedTrend, TrendFitter};
use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Reconciliation produced fewer than two points.
    InsufficientData { points: usize },
    /// Fewer than two non known-future points; no extrapolation.
    InsufficientTrainingData { found: usize },
    /// Identical training values; a constant predictor was used.
    NumericDegeneracy { value: f64 },
    /// Nothing in the scan window for this entity.
    NoUsableData,
    /// The input record could not be ingested and was left out of the run.
    RejectedRecord { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDiagnostic {
    pub entity: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

/// Output of one aggregate entity: its records in ascending year order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityForecast {
    pub entity: String,
    pub records: Vec<PredictionRecord>,
    pub diagnostics: Vec<EntityDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastOutcome {
    pub records: Vec<PredictionRecord>,
    pub diagnostics: Vec<EntityDiagnostic>,
}

impl ForecastOutcome {
    fn absorb(&mut self, forecast: EntityForecast) {
        self.records.extend(forecast.records);
        self.diagnostics.extend(forecast.diagnostics);
    }

    /// Reports ingestion rejections ahead of the per-entity diagnostics.
    pub fn with_rejections(mut self, rejected: &[RejectedRecord]) -> Self {
        let notes = rejected.iter().map(|r| EntityDiagnostic {
            entity: r.axis.clone().unwrap_or_else(|| format!("record #{}", r.index)),
            kind: DiagnosticKind::RejectedRecord {
                index: r.index,
                reason: r.reason.clone(),
            },
        });
        self.diagnostics.splice(0..0, notes);
        self
    }

    pub fn records_for<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a PredictionRecord> {
        self.records.iter().filter(move |r| r.entity_name == entity)
    }
}

pub struct PredictionEngine {
    reconciler: FieldReconciler,
    fitter: TrendFitter,
    projector: SeriesProjector,
}

impl PredictionEngine {
    pub fn new(config: &ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reconciler: FieldReconciler::new(config.history_start_year, config.max_projection_year),
            fitter: TrendFitter::new(config.training.clone()),
            projector: SeriesProjector::new(config.years_to_predict, config.max_projection_year),
        })
    }

    /// Runs reconcile, fit and project for one entity. Detail rows yield `None`.
    pub fn forecast_entity(&self, entity: &FinancialEntity) -> Option<EntityForecast> {
        if !entity.is_aggregate() {
            debug!(
                "Skipping detail row '{}' ({:?})",
                entity.name(),
                entity.identity.counterparty_code
            );
            return None;
        }

        let name = entity.name().to_string();
        let mut diagnostics = Vec::new();
        let mut note = |kind: DiagnosticKind| {
            diagnostics.push(EntityDiagnostic {
                entity: name.clone(),
                kind,
            })
        };

        let series = self.reconciler.reconcile(entity);
        if series.is_empty() {
            warn!("No usable data for entity '{}'", name);
            note(DiagnosticKind::NoUsableData);
            return Some(EntityForecast {
                entity: name.clone(),
                records: Vec::new(),
                diagnostics,
            });
        }

        if !series.is_sufficient() {
            note(DiagnosticKind::InsufficientData {
                points: series.len(),
            });
        }

        let trend: Option<FittedTrend> = match self.fitter.fit(&name, &series.training_points()) {
            Ok(trend) => {
                if trend.model.is_constant() {
                    note(DiagnosticKind::NumericDegeneracy {
                        value: trend.model.predict(0.0),
                    });
                }
                Some(trend)
            }
            Err(ForecastError::InsufficientTrainingData { found, .. }) => {
                warn!(
                    "Insufficient training data for entity '{}' ({} point(s)), emitting known points only",
                    name, found
                );
                note(DiagnosticKind::InsufficientTrainingData { found });
                None
            }
            Err(e) => {
                warn!("Trend fitting failed for entity '{}': {}", name, e);
                None
            }
        };

        let records = self
            .projector
            .project(&series, trend.as_ref())
            .into_iter()
            .map(|point| tag(&entity.identity, point))
            .collect();

        Some(EntityForecast {
            entity: name,
            records,
            diagnostics,
        })
    }

    pub fn run(&self, entities: &[FinancialEntity]) -> Result<ForecastOutcome> {
        self.run_cancellable(entities, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but checks `cancel` before each entity.
    pub fn run_cancellable(
        &self,
        entities: &[FinancialEntity],
        cancel: &AtomicBool,
    ) -> Result<ForecastOutcome> {
        info!("Generating predictions for {} entities", entities.len());

        let mut outcome = ForecastOutcome::default();
        for (processed, entity) in entities.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!("Prediction run cancelled after {} entities", processed);
                return Err(ForecastError::Cancelled { processed });
            }
            if let Some(forecast) = self.forecast_entity(entity) {
                outcome.absorb(forecast);
            }
        }

        finish(outcome)
    }

    /// Yields one [`EntityForecast`] per aggregate entity. Dropping the stream stops
    /// the run between entities.
    pub fn prediction_stream<'a>(
        &'a self,
        entities: &'a [FinancialEntity],
    ) -> impl Stream<Item = EntityForecast> + 'a {
        stream::iter(entities).filter_map(move |entity| async move { self.forecast_entity(entity) })
    }

    pub async fn run_async(&self, entities: &[FinancialEntity]) -> Result<ForecastOutcome> {
        let outcome = self
            .prediction_stream(entities)
            .fold(ForecastOutcome::default(), |mut acc, forecast| async move {
                acc.absorb(forecast);
                acc
            })
            .await;

        finish(outcome)
    }
}

fn finish(outcome: ForecastOutcome) -> Result<ForecastOutcome> {
    if outcome.records.is_empty() {
        return Err(ForecastError::NoPredictableData);
    }

    info!(
        "Generated {} prediction records ({} diagnostics)",
        outcome.records.len(),
        outcome.diagnostics.len()
    );
    Ok(outcome)
}

fn tag(identity: &EntityIdentity, point: ProjectedPoint) -> PredictionRecord {
    PredictionRecord {
        year: point.year,
        actual_value: point.actual_value,
        predicted_value: point.predicted_value,
        entity_name: identity.name.clone(),
        is_aggregate: identity.is_aggregate,
        counterparty_code: identity.counterparty_code.clone(),
        counterparty_label: identity.counterparty_label.clone(),
        origin: point.origin,
    }
}
