//! Tunables for a prediction run.
//!
//! Only `years_to_predict` is meant to be exposed to end users; the scan window and
//! the optimiser settings are fixed per deployment and default to the values the
//! budgeting tool has always used.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_YEARS_TO_PREDICT: u32 = 10;
pub const DEFAULT_HISTORY_START_YEAR: i32 = 2020;
pub const DEFAULT_MAX_PROJECTION_YEAR: i32 = 2030;

/// Calendar years a window may cover; matches the four-digit year columns.
pub const MIN_SUPPORTED_YEAR: i32 = 1900;
pub const MAX_SUPPORTED_YEAR: i32 = 9999;

const HISTORY_YEARS_BEFORE_CURRENT: i32 = 4;
const PROJECTION_YEARS_AFTER_CURRENT: i32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
        }
    }
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_epochs() -> usize {
    300
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of years to extrapolate past the last trained year.
    #[serde(default = "default_years_to_predict")]
    pub years_to_predict: u32,

    /// First year scanned by the reconciler.
    #[serde(default = "default_history_start_year")]
    pub history_start_year: i32,

    /// Last year scanned by the reconciler and the hard ceiling for extrapolation.
    #[serde(default = "default_max_projection_year")]
    pub max_projection_year: i32,

    #[serde(default)]
    pub training: TrainingConfig,
}

fn default_years_to_predict() -> u32 {
    DEFAULT_YEARS_TO_PREDICT
}

fn default_history_start_year() -> i32 {
    DEFAULT_HISTORY_START_YEAR
}

fn default_max_projection_year() -> i32 {
    DEFAULT_MAX_PROJECTION_YEAR
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            years_to_predict: DEFAULT_YEARS_TO_PREDICT,
            history_start_year: DEFAULT_HISTORY_START_YEAR,
            max_projection_year: DEFAULT_MAX_PROJECTION_YEAR,
            training: TrainingConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Window spanning a few years of history before `current_year` and a few
    /// years of projection after it.
    pub fn anchored_to(current_year: i32) -> Self {
        Self {
            history_start_year: current_year.saturating_sub(HISTORY_YEARS_BEFORE_CURRENT),
            max_projection_year: current_year.saturating_add(PROJECTION_YEARS_AFTER_CURRENT),
            ..Self::default()
        }
    }

    pub fn for_current_year() -> Self {
        Self::anchored_to(Local::now().year())
    }

    pub fn with_years_to_predict(mut self, years: u32) -> Self {
        self.years_to_predict = years;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.years_to_predict == 0 {
            return Err(ForecastError::InvalidConfig(
                "years_to_predict must be a positive integer".to_string(),
            ));
        }

        let supported = MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR;
        for (field, year) in [
            ("history_start_year", self.history_start_year),
            ("max_projection_year", self.max_projection_year),
        ] {
            if !supported.contains(&year) {
                return Err(ForecastError::InvalidConfig(format!(
                    "{} {} is outside {}..={}",
                    field, year, MIN_SUPPORTED_YEAR, MAX_SUPPORTED_YEAR
                )));
            }
        }

        if self.history_start_year > self.max_projection_year {
            return Err(ForecastError::InvalidConfig(format!(
                "history_start_year {} is after max_projection_year {}",
                self.history_start_year, self.max_projection_year
            )));
        }

        if !self.training.learning_rate.is_finite() || self.training.learning_rate <= 0.0 {
            return Err(ForecastError::InvalidConfig(format!(
                "learning_rate must be a positive finite number, got {}",
                self.training.learning_rate
            )));
        }

        if self.training.epochs == 0 {
            return Err(ForecastError::InvalidConfig(
                "epochs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.years_to_predict, 10);
        assert_eq!(config.history_start_year, 2020);
        assert_eq!(config.max_projection_year, 2030);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ForecastConfig::from_json_str(r#"{ "years_to_predict": 5 }"#).unwrap();
        assert_eq!(config.years_to_predict, 5);
        assert_eq!(config.max_projection_year, 2030);
        assert_eq!(config.training, TrainingConfig::default());
    }

    #[test]
    fn test_anchored_window() {
        let config = ForecastConfig::anchored_to(2024);
        assert_eq!(config.history_start_year, 2020);
        assert_eq!(config.max_projection_year, 2030);

        let today = ForecastConfig::for_current_year();
        assert_eq!(
            today.max_projection_year - today.history_start_year,
            HISTORY_YEARS_BEFORE_CURRENT + PROJECTION_YEARS_AFTER_CURRENT
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            ForecastConfig::default().with_years_to_predict(0).validate(),
            Err(ForecastError::InvalidConfig(_))
        ));

        let inverted = ForecastConfig {
            history_start_year: 2031,
            ..ForecastConfig::default()
        };
        assert!(inverted.validate().is_err());

        let mut bad_rate = ForecastConfig::default();
        bad_rate.training.learning_rate = f64::NAN;
        assert!(bad_rate.validate().is_err());

        assert!(ForecastConfig::from_json_str(r#"{ "training": { "epochs": 0 } }"#).is_err());
    }

    #[test]
    fn test_validation_bounds_window_years() {
        let far_future = ForecastConfig {
            max_projection_year: 10_000,
            ..ForecastConfig::default()
        };
        assert!(matches!(
            far_future.validate(),
            Err(ForecastError::InvalidConfig(_))
        ));

        assert!(ForecastConfig::from_json_str(
            r#"{ "history_start_year": -2147483648, "max_projection_year": 2147483647 }"#
        )
        .is_err());

        assert!(ForecastConfig::anchored_to(MAX_SUPPORTED_YEAR - PROJECTION_YEARS_AFTER_CURRENT)
            .validate()
            .is_ok());
    }
}
