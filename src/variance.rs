use crate::error::{ForecastError, Result};
use crate::schema::{FamilyTag, FinancialEntity};
use serde::{Deserialize, Serialize};

/// Derived fields stored alongside each budget line by the CRUD layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceFields {
    pub budget_vs_actual: f64,
    /// Share of the annual budget consumed by the end of `month`, assuming even spend.
    pub budget_ytd: f64,
    pub budget_vs_actual_ytd: f64,
}

impl VarianceFields {
    /// Missing amounts count as zero.
    pub fn compute(budget: Option<f64>, actual: Option<f64>, month: u32) -> Result<Self> {
        validate_month(month)?;

        let budget = budget.unwrap_or(0.0);
        let actual = actual.unwrap_or(0.0);
        let budget_ytd = if budget != 0.0 {
            budget * f64::from(month) / 12.0
        } else {
            0.0
        };

        Ok(Self {
            budget_vs_actual: budget - actual,
            budget_ytd,
            budget_vs_actual_ytd: budget_ytd - actual,
        })
    }
}

pub fn validate_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(ForecastError::InvalidMonth(month));
    }
    Ok(())
}

impl FinancialEntity {
    /// `budget - actual` for a year, when both figures exist.
    pub fn budget_variance(&self, year: i32) -> Option<f64> {
        let budget = self.value(year, FamilyTag::Budget)?;
        let actual = self.value(year, FamilyTag::Actual)?;
        Some(budget - actual)
    }

    pub fn variance_fields(&self, year: i32, month: u32) -> Result<VarianceFields> {
        VarianceFields::compute(
            self.value(year, FamilyTag::Budget),
            self.value(year, FamilyTag::Actual),
            month,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_mid_year() {
        let fields = VarianceFields::compute(Some(1200.0), Some(500.0), 6).unwrap();
        assert_eq!(fields.budget_vs_actual, 700.0);
        assert_eq!(fields.budget_ytd, 600.0);
        assert_eq!(fields.budget_vs_actual_ytd, 100.0);
    }

    #[test]
    fn test_missing_amounts_count_as_zero() {
        let fields = VarianceFields::compute(None, Some(250.0), 3).unwrap();
        assert_eq!(fields.budget_vs_actual, -250.0);
        assert_eq!(fields.budget_ytd, 0.0);
        assert_eq!(fields.budget_vs_actual_ytd, -250.0);
    }

    #[test]
    fn test_invalid_month() {
        assert!(matches!(
            VarianceFields::compute(Some(1.0), None, 13),
            Err(ForecastError::InvalidMonth(13))
        ));
        assert!(validate_month(0).is_err());
        assert!(validate_month(12).is_ok());
    }

    #[test]
    fn test_entity_variance() {
        let entity = FinancialEntity::aggregate("Hosting")
            .with_value(2023, FamilyTag::Budget, 160.0)
            .with_value(2023, FamilyTag::Actual, 150.0)
            .with_value(2024, FamilyTag::Budget, 180.0);

        assert_eq!(entity.budget_variance(2023), Some(10.0));
        assert_eq!(entity.budget_variance(2024), None);
        assert_eq!(entity.variance_fields(2023, 12).unwrap().budget_ytd, 160.0);
    }
}
