use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The canonical tabular shape extracted from a backend payload.
///
/// `columns` is the declared column order; by convention the first column is
/// the category key and the second the value key. Cells are loosely typed:
/// JSON numbers, numeric strings, plain strings and nulls all occur in
/// production payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl AnalyticsTable {
    /// A table is usable only with at least one row and two declared columns.
    pub fn is_valid(&self) -> bool {
        !self.rows.is_empty() && self.columns.len() >= 2
    }

    pub fn category_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell lookup by column name.
    pub fn cell<'a>(&'a self, row: usize, column: &str) -> Option<&'a Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Parse a cell as a number: JSON numbers directly, strings after trimming
/// and dropping thousands separators. Anything else is non-numeric.
pub fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Extract the first run of digits embedded in a cell's text, so that
/// "Band 10" orders after "Band 2". Returns None when the cell has no digits.
pub fn embedded_number(value: &Value) -> Option<u64> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cell_number_handles_numbers_and_numeric_strings() {
        assert_eq!(cell_number(&json!(42)), Some(42.0));
        assert_eq!(cell_number(&json!(3.5)), Some(3.5));
        assert_eq!(cell_number(&json!("  1,250 ")), Some(1250.0));
        assert_eq!(cell_number(&json!("Band 3")), None);
        assert_eq!(cell_number(&json!(null)), None);
        assert_eq!(cell_number(&json!(true)), None);
    }

    #[test]
    fn embedded_number_takes_first_digit_run() {
        assert_eq!(embedded_number(&json!("Band 10")), Some(10));
        assert_eq!(embedded_number(&json!("Band 2")), Some(2));
        assert_eq!(embedded_number(&json!("Grade 7 (senior)")), Some(7));
        assert_eq!(embedded_number(&json!("Finance")), None);
        assert_eq!(embedded_number(&json!(12)), Some(12));
    }
}
