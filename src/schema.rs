use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum FamilyTag {
    #[schemars(description = "Amount actually spent during the year (realised figure)")]
    Actual,

    #[schemars(description = "Approved budget for the year")]
    Budget,

    #[schemars(
        description = "Mid-year revised forecast ('atterrissage'). More current than the Budget for the same year."
    )]
    Landing,

    #[schemars(description = "Long-range plan figure, used for years not yet budgeted")]
    Plan,
}

impl FamilyTag {
    pub const ALL: [FamilyTag; 4] = [
        FamilyTag::Actual,
        FamilyTag::Budget,
        FamilyTag::Landing,
        FamilyTag::Plan,
    ];

    /// Forecast families, most authoritative first.
    pub const KNOWN_FUTURE_PRECEDENCE: [FamilyTag; 3] =
        [FamilyTag::Landing, FamilyTag::Budget, FamilyTag::Plan];
}

/// The figures recorded for one calendar year. Empty cells stay `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearFigures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<f64>,
}

impl YearFigures {
    pub fn get(&self, family: FamilyTag) -> Option<f64> {
        match family {
            FamilyTag::Actual => self.actual,
            FamilyTag::Budget => self.budget,
            FamilyTag::Landing => self.landing,
            FamilyTag::Plan => self.plan,
        }
    }

    fn slot_mut(&mut self, family: FamilyTag) -> &mut Option<f64> {
        match family {
            FamilyTag::Actual => &mut self.actual,
            FamilyTag::Budget => &mut self.budget,
            FamilyTag::Landing => &mut self.landing,
            FamilyTag::Plan => &mut self.plan,
        }
    }

    pub fn is_empty(&self) -> bool {
        FamilyTag::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityIdentity {
    #[schemars(description = "Axis label with any 'Total ' prefix removed (e.g. 'Hosting')")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Counterparty / supplier code, absent on aggregate rows")]
    pub counterparty_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Long human-readable label of the counterparty")]
    pub counterparty_label: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "True for the summed 'Total' row of an axis. Only aggregate rows are projected; detail rows are display-only."
    )]
    pub is_aggregate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialEntity {
    pub identity: EntityIdentity,

    /// Sparse `(year, family) -> amount` mapping, grouped by year.
    #[serde(default)]
    pub years: BTreeMap<i32, YearFigures>,
}

impl FinancialEntity {
    pub fn new(name: impl Into<String>, is_aggregate: bool) -> Self {
        Self {
            identity: EntityIdentity {
                name: name.into(),
                counterparty_code: None,
                counterparty_label: None,
                is_aggregate,
            },
            years: BTreeMap::new(),
        }
    }

    pub fn aggregate(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn detail(
        name: impl Into<String>,
        counterparty_code: impl Into<String>,
        counterparty_label: Option<String>,
    ) -> Self {
        let mut entity = Self::new(name, false);
        entity.identity.counterparty_code = Some(counterparty_code.into());
        entity.identity.counterparty_label = counterparty_label;
        entity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn is_aggregate(&self) -> bool {
        self.identity.is_aggregate
    }

    /// Stores a value and returns the one it replaced, if any.
    /// Non-finite values are not stored.
    pub fn set(&mut self, year: i32, family: FamilyTag, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        self.years
            .entry(year)
            .or_default()
            .slot_mut(family)
            .replace(value)
    }

    pub fn with_value(mut self, year: i32, family: FamilyTag, value: f64) -> Self {
        self.set(year, family, value);
        self
    }

    pub fn with_values(mut self, family: FamilyTag, values: &[(i32, f64)]) -> Self {
        for (year, value) in values {
            self.set(*year, family, *value);
        }
        self
    }

    pub fn value(&self, year: i32, family: FamilyTag) -> Option<f64> {
        self.years.get(&year).and_then(|figures| figures.get(family))
    }

    pub fn year_span(&self) -> Option<(i32, i32)> {
        let mut populated = self
            .years
            .iter()
            .filter(|(_, figures)| !figures.is_empty())
            .map(|(year, _)| *year);
        let first = populated.next()?;
        let last = populated.last().unwrap_or(first);
        Some((first, last))
    }
}

/// One reconciled sample of an entity's time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub year: i32,
    /// Set only when a true actual figure exists for the year.
    pub observed_actual: Option<f64>,
    /// Always populated: the actual, or the precedence-resolved forecast figure.
    pub projected_value: f64,
    pub is_known_future: bool,
    /// Family that supplied `projected_value`.
    pub source: FamilyTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DataOrigin {
    /// A realised figure from the source data
    Actual,
    /// A human-entered Budget, Landing or Plan figure passed through unchanged
    KnownFuture,
    /// Generated by the fitted trend model
    Extrapolated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub year: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,

    pub predicted_value: f64,

    pub entity_name: String,

    pub is_aggregate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_label: Option<String>,

    pub origin: DataOrigin,
}

impl PredictionRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Vec<PredictionRecord>)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
