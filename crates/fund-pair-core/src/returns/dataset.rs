use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// One data row: column name to raw cell value.
pub type Row = Map<String, Value>;

/// An already-parsed tabular dataset.
///
/// `columns` is the source header. When it is empty the header is derived
/// from the rows themselves: keys of the first row in order, then any new
/// keys of later rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Dataset { columns, rows }
    }

    /// Build from rows only, deriving the header from key order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Dataset {
            columns: Vec::new(),
            rows,
        }
    }

    pub fn header(&self) -> Vec<String> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        let mut header: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !header.iter().any(|h| h == key) {
                    header.push(key.clone());
                }
            }
        }
        header
    }
}

/// Coerce a raw cell to a return observation.
///
/// Finite numbers and numeric strings (plain or scientific notation) are
/// accepted; null, booleans, blanks and free text are missing.
pub fn coerce_return(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    return None;
                }
            }
            parse_decimal(&n.to_string())
        }
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Time label of a row, or `None` when the label is missing or blank.
pub fn time_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_return(&json!(0.015)), Some(dec!(0.015)));
        assert_eq!(coerce_return(&json!(-2)), Some(dec!(-2)));
        assert_eq!(coerce_return(&json!(" 0.25 ")), Some(dec!(0.25)));
        assert_eq!(coerce_return(&json!("1e-3")), Some(dec!(0.001)));
    }

    #[test]
    fn test_coerce_missing_values() {
        assert_eq!(coerce_return(&json!(null)), None);
        assert_eq!(coerce_return(&json!("")), None);
        assert_eq!(coerce_return(&json!("n/a")), None);
        assert_eq!(coerce_return(&json!(true)), None);
        assert_eq!(coerce_return(&json!([0.1])), None);
    }

    #[test]
    fn test_time_label() {
        assert_eq!(time_label(Some(&json!("2024-01"))), Some("2024-01".into()));
        assert_eq!(time_label(Some(&json!(2024))), Some("2024".into()));
        assert_eq!(time_label(Some(&json!("  "))), None);
        assert_eq!(time_label(Some(&json!(null))), None);
        assert_eq!(time_label(None), None);
    }

    #[test]
    fn test_header_derived_from_rows() {
        let rows: Vec<Row> = vec![
            json!({"Date": "2024-01", "Alpha": 0.1})
                .as_object()
                .cloned()
                .unwrap(),
            json!({"Date": "2024-02", "Alpha": 0.2, "Beta": 0.3})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        let ds = Dataset::from_rows(rows);
        assert_eq!(ds.header(), vec!["Date", "Alpha", "Beta"]);
    }

    #[test]
    fn test_explicit_columns_win() {
        let ds: Dataset = serde_json::from_value(json!({
            "columns": ["Date", "Beta", "Alpha"],
            "rows": [{"Alpha": 0.1, "Beta": 0.2, "Date": "2024-01"}]
        }))
        .unwrap();
        assert_eq!(ds.header(), vec!["Date", "Beta", "Alpha"]);
    }
}
