//! Single-feature linear trend fitted by gradient descent.
//!
//! The feature is the ordinal position of a training point (0, 1, 2, ...), not the
//! calendar year. Targets are standardized before training and the model output is
//! mapped back with the same mean and standard deviation.

use crate::config::TrainingConfig;
use crate::error::{ForecastError, Result};
use crate::reconciler::MIN_SERIES_POINTS;
use crate::schema::DataPoint;
use crate::utils::mean_and_std;
use log::debug;

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendModel {
    Linear {
        weight: f64,
        bias: f64,
        mean: f64,
        std: f64,
    },
    /// All training targets were identical.
    Constant { value: f64 },
}

impl TrendModel {
    /// Destandardized model output for an ordinal index.
    pub fn predict(&self, index: f64) -> f64 {
        match *self {
            TrendModel::Linear {
                weight,
                bias,
                mean,
                std,
            } => (weight * index + bias) * std + mean,
            TrendModel::Constant { value } => value,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, TrendModel::Constant { .. })
    }
}

/// A model bound to the training set it was fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTrend {
    pub model: TrendModel,
    /// Number of training points; the last one has ordinal `training_len - 1`.
    pub training_len: usize,
    /// Year of the last training point.
    pub last_training_year: i32,
}

impl FittedTrend {
    /// Model value for a year after the last training year, indexed by its
    /// distance from that year.
    pub fn predict_year(&self, year: i32) -> f64 {
        let offset = f64::from(year) - f64::from(self.last_training_year);
        let index = (self.training_len - 1) as f64 + offset;
        self.model.predict(index)
    }
}

pub struct TrendFitter {
    config: TrainingConfig,
}

impl TrendFitter {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fits a trend to `training`, which must already exclude known-future points
    /// and be in chronological order.
    pub fn fit(&self, entity: &str, training: &[&DataPoint]) -> Result<FittedTrend> {
        if training.len() < MIN_SERIES_POINTS {
            return Err(ForecastError::InsufficientTrainingData {
                entity: entity.to_string(),
                found: training.len(),
            });
        }

        let targets: Vec<f64> = training.iter().map(|p| p.projected_value).collect();
        let last_training_year = training[training.len() - 1].year;

        let (mean, std) = mean_and_std(&targets).ok_or_else(|| {
            ForecastError::InsufficientTrainingData {
                entity: entity.to_string(),
                found: 0,
            }
        })?;

        let model = if std == 0.0 || !std.is_finite() {
            debug!(
                "Entity '{}': all {} training values equal {}, using constant predictor",
                entity,
                targets.len(),
                mean
            );
            TrendModel::Constant { value: mean }
        } else {
            let standardized: Vec<f64> = targets.iter().map(|v| (v - mean) / std).collect();
            let (weight, bias) = self.train(&standardized);
            debug!(
                "Entity '{}': fitted weight {:.6}, bias {:.6} over {} points",
                entity,
                weight,
                bias,
                standardized.len()
            );
            TrendModel::Linear {
                weight,
                bias,
                mean,
                std,
            }
        };

        Ok(FittedTrend {
            model,
            training_len: training.len(),
            last_training_year,
        })
    }

    /// Minimizes mean squared error of `weight * i + bias` against `targets` with Adam.
    fn train(&self, targets: &[f64]) -> (f64, f64) {
        let n = targets.len() as f64;
        let lr = self.config.learning_rate;

        let mut weight = 0.0;
        let mut bias = 0.0;
        let mut weight_moments = Moments::default();
        let mut bias_moments = Moments::default();

        for epoch in 1..=self.config.epochs {
            let (mut grad_w, mut grad_b) = (0.0, 0.0);
            for (i, target) in targets.iter().enumerate() {
                let x = i as f64;
                let error = weight * x + bias - target;
                grad_w += 2.0 * error * x;
                grad_b += 2.0 * error;
            }
            grad_w /= n;
            grad_b /= n;

            weight -= lr * weight_moments.step(grad_w, epoch);
            bias -= lr * bias_moments.step(grad_b, epoch);
        }

        (weight, bias)
    }
}

#[derive(Default)]
struct Moments {
    first: f64,
    second: f64,
}

impl Moments {
    fn step(&mut self, gradient: f64, epoch: usize) -> f64 {
        self.first = BETA1 * self.first + (1.0 - BETA1) * gradient;
        self.second = BETA2 * self.second + (1.0 - BETA2) * gradient * gradient;
        let first_hat = self.first / (1.0 - BETA1.powi(epoch as i32));
        let second_hat = self.second / (1.0 - BETA2.powi(epoch as i32));
        first_hat / (second_hat.sqrt() + EPSILON)
    }
}
