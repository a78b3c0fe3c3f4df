use crate::error::Result;
use crate::schema::PredictionRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub entity_name: String,
    pub counterparty_code: Option<String>,
    pub counterparty_label: Option<String>,
    pub values: BTreeMap<i32, f64>,
}

pub fn to_json(records: &[PredictionRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// One row per entity/counterparty, in order of first appearance.
pub fn pivot_by_entity(records: &[PredictionRecord]) -> Vec<PivotRow> {
    let mut rows: Vec<PivotRow> = Vec::new();

    for record in records {
        let position = rows.iter().position(|row| {
            row.entity_name == record.entity_name
                && row.counterparty_code == record.counterparty_code
                && row.counterparty_label == record.counterparty_label
        });

        let row = match position {
            Some(idx) => &mut rows[idx],
            None => {
                rows.push(PivotRow {
                    entity_name: record.entity_name.clone(),
                    counterparty_code: record.counterparty_code.clone(),
                    counterparty_label: record.counterparty_label.clone(),
                    values: BTreeMap::new(),
                });
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };
        row.values.insert(record.year, record.predicted_value);
    }

    rows
}

pub fn write_csv<W: Write>(records: &[PredictionRecord], writer: W) -> Result<()> {
    let rows = pivot_by_entity(records);
    let years: BTreeSet<i32> = rows.iter().flat_map(|r| r.values.keys().copied()).collect();

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        "Axe".to_string(),
        "Contrepartie".to_string(),
        "Lib_Long".to_string(),
    ];
    header.extend(years.iter().map(|y| format!("Prediction_{}", y)));
    csv_writer.write_record(&header)?;

    for row in &rows {
        let mut fields = vec![
            row.entity_name.clone(),
            row.counterparty_code.clone().unwrap_or_default(),
            row.counterparty_label.clone().unwrap_or_default(),
        ];
        fields.extend(years.iter().map(|y| {
            row.values
                .get(y)
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default()
        }));
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataOrigin;

    fn record(entity: &str, year: i32, value: f64) -> PredictionRecord {
        PredictionRecord {
            year,
            actual_value: None,
            predicted_value: value,
            entity_name: entity.to_string(),
            is_aggregate: true,
            counterparty_code: None,
            counterparty_label: None,
            origin: DataOrigin::Extrapolated,
        }
    }

    #[test]
    fn test_pivot_keeps_first_seen_order() {
        let records = vec![
            record("Hosting", 2023, 1.0),
            record("Network", 2024, 2.0),
            record("Hosting", 2024, 3.0),
        ];

        let rows = pivot_by_entity(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_name, "Hosting");
        assert_eq!(rows[0].values.len(), 2);
        assert_eq!(rows[1].values.get(&2024), Some(&2.0));
    }

    #[test]
    fn test_csv_has_union_of_years() {
        let records = vec![record("Hosting", 2023, 150.0), record("Network", 2025, 12.346)];

        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Axe,Contrepartie,Lib_Long,Prediction_2023,Prediction_2025");
        assert_eq!(lines[1], "Hosting,,,150.00,");
        assert_eq!(lines[2], "Network,,,,12.35");
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_csv_write_failure_is_io_error() {
        let records = vec![record("Hosting", 2024, 1.0)];
        let err = write_csv(&records, FullDisk).unwrap_err();
        assert!(matches!(err, crate::error::ForecastError::IoError(_)));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = to_json(&[record("Hosting", 2025, 198.0)]).unwrap();
        assert!(json.contains("\"predictedValue\": 198.0"));
        assert!(json.contains("\"origin\": \"extrapolated\""));
        assert!(!json.contains("actualValue"));
    }
}
