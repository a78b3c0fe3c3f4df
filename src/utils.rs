use serde_json::Value;

/// Normalizes a spreadsheet/database cell into an amount.
/// Returns `None` for empty, non-numeric or non-finite cells; they are absent, not zero.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

/// Parses a formatted amount such as `"1,234.50"`, `"12 000 €"` or `"-350"`.
/// Commas and spaces are treated as thousands separators.
pub fn parse_amount_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses the year suffix of a column key (`"2024"` in `"BUDGET_2024"`).
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Population mean and standard deviation. Returns `None` for an empty slice.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount_numbers() {
        assert_eq!(parse_amount(&json!(150)), Some(150.0));
        assert_eq!(parse_amount(&json!(-12.5)), Some(-12.5));
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!(true)), None);
    }

    #[test]
    fn test_parse_amount_formatted_strings() {
        assert_eq!(parse_amount(&json!("1,234.50")), Some(1234.5));
        assert_eq!(parse_amount(&json!("12 000 €")), Some(12000.0));
        assert_eq!(parse_amount(&json!("\u{a0}-350 ")), Some(-350.0));
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!("n/a")), None);
        assert_eq!(parse_amount(&json!("-")), None);
        assert_eq!(parse_amount(&json!("1.2.3")), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2024"), Some(2024));
        assert_eq!(parse_year(" 2031"), Some(2031));
        assert_eq!(parse_year("24"), None);
        assert_eq!(parse_year("20x4"), None);
    }

    #[test]
    fn test_mean_and_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);

        let (_, std) = mean_and_std(&[3.0, 3.0]).unwrap();
        assert_eq!(std, 0.0);

        assert!(mean_and_std(&[]).is_none());
    }
}
