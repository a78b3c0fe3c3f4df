//! Converts the flat records handed over by the persistence and spreadsheet layers
//! into [`FinancialEntity`] values.
//!
//! Those layers name their columns after a family prefix and a year
//! (`ANNEE_2023`, `BUDGET_2024`, `ATTERISSAGE_2024`, `PLAN_2026`, ...). The naming
//! has changed several times, so every convention lives in [`ColumnScheme`] and the
//! rest of the crate only ever sees `(year, family) -> amount`.

use crate::error::{ForecastError, Result};
use crate::schema::{EntityIdentity, FamilyTag, FinancialEntity};
use crate::utils::{parse_amount, parse_year};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;

pub type RawEntityRecord = BTreeMap<String, Value>;

/// A record that could not be turned into an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// Position of the record in the input batch.
    pub index: usize,
    /// Axis label, when the record had one.
    pub axis: Option<String>,
    pub reason: String,
}

/// Result of ingesting a batch: one bad row never discards the others.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub entities: Vec<FinancialEntity>,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone)]
pub struct ColumnScheme {
    pub axis_key: String,
    pub counterparty_key: String,
    pub label_key: String,
    /// Optional boolean column that overrides the prefix-based aggregate detection.
    pub aggregate_flag_key: String,
    pub aggregate_prefix: String,
    pub family_prefixes: Vec<(String, FamilyTag)>,
}

impl Default for ColumnScheme {
    fn default() -> Self {
        let prefixes = [
            ("ANNEE_", FamilyTag::Actual),
            ("ACTUAL_", FamilyTag::Actual),
            ("REEL_", FamilyTag::Actual),
            ("BUDGET_", FamilyTag::Budget),
            ("ATTERISSAGE_", FamilyTag::Landing),
            ("ATTERRISSAGE_", FamilyTag::Landing),
            ("LANDING_", FamilyTag::Landing),
            ("PLAN_", FamilyTag::Plan),
        ];

        Self {
            axis_key: "Axe_IT".to_string(),
            counterparty_key: "Contrepartie".to_string(),
            label_key: "Lib_Long".to_string(),
            aggregate_flag_key: "isTotal".to_string(),
            aggregate_prefix: "Total ".to_string(),
            family_prefixes: prefixes
                .into_iter()
                .map(|(p, f)| (p.to_string(), f))
                .collect(),
        }
    }
}

impl ColumnScheme {
    /// Maps a column key to its `(year, family)`, or `None` for non year-tagged columns.
    pub fn parse_column_key(&self, key: &str) -> Option<(i32, FamilyTag)> {
        let upper = key.trim().to_ascii_uppercase();
        self.family_prefixes.iter().find_map(|(prefix, family)| {
            upper
                .strip_prefix(&prefix.to_ascii_uppercase())
                .and_then(parse_year)
                .map(|year| (year, *family))
        })
    }

    pub fn parse_record(&self, record: &RawEntityRecord) -> Result<FinancialEntity> {
        let axis = text_field(record, &self.axis_key).ok_or_else(|| {
            ForecastError::MissingIdentity(format!("no '{}' value in record", self.axis_key))
        })?;

        let prefixed = axis.starts_with(&self.aggregate_prefix);
        let is_aggregate = match record.get(&self.aggregate_flag_key) {
            Some(Value::Bool(flag)) => *flag,
            _ => prefixed,
        };
        let name = if prefixed {
            axis[self.aggregate_prefix.len()..].trim().to_string()
        } else {
            axis
        };

        let mut entity = FinancialEntity {
            identity: EntityIdentity {
                name,
                counterparty_code: text_field(record, &self.counterparty_key),
                counterparty_label: text_field(record, &self.label_key),
                is_aggregate,
            },
            years: BTreeMap::new(),
        };

        for (key, cell) in record {
            let Some((year, family)) = self.parse_column_key(key) else {
                continue;
            };
            let Some(amount) = parse_amount(cell) else {
                continue;
            };
            if entity.set(year, family, amount).is_some() {
                return Err(ForecastError::DuplicateField {
                    entity: entity.identity.name.clone(),
                    year,
                    family,
                });
            }
        }

        debug!(
            "Ingested entity '{}' (aggregate: {}) with {} populated years",
            entity.identity.name,
            entity.identity.is_aggregate,
            entity.years.len()
        );

        Ok(entity)
    }

    pub fn parse_records(&self, records: &[RawEntityRecord]) -> IngestionReport {
        let mut report = IngestionReport::default();

        for (index, record) in records.iter().enumerate() {
            match self.parse_record(record) {
                Ok(entity) => report.entities.push(entity),
                Err(e) => {
                    let axis = text_field(record, &self.axis_key);
                    warn!("Skipping record #{} ({:?}): {}", index, axis, e);
                    report.rejected.push(RejectedRecord {
                        index,
                        axis,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

pub fn parse_records(records: &[RawEntityRecord]) -> IngestionReport {
    ColumnScheme::default().parse_records(records)
}

fn text_field(record: &RawEntityRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
