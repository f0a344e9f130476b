use log::debug;
use serde_json::{Map, Value};

use crate::models::table::AnalyticsTable;

/// Column-name fragments preferred as the category key when columns must be
/// inferred from a legacy row's key set.
const CATEGORY_HINTS: &[&str] = &["band", "grade", "level"];
/// Column-name fragments preferred as the value key.
const VALUE_HINTS: &[&str] = &["count", "total", "jumlah", "amount"];

/// The historical payload shape a table was decoded from.
///
/// Shape (a) `{columns, rows}` is the contract going forward; (b) and (c) are
/// kept for payloads produced by older backend versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// `{columns, rows}` at the top level.
    ColumnsRows,
    /// `{data: {columns, rows}}`.
    Nested,
    /// `{rows}` without `columns`; columns inferred from the first row.
    LegacyRows,
}

/// Locate a tabular payload across the known shapes, first match wins.
/// Total: returns `None` on anything malformed, never errors.
pub fn extract(value: &Value) -> Option<AnalyticsTable> {
    decode(value).map(|(_, table)| table)
}

/// Like [`extract`] but also reports which shape matched.
pub fn decode(value: &Value) -> Option<(TableShape, AnalyticsTable)> {
    if let Some(table) = columns_rows(value) {
        return Some((TableShape::ColumnsRows, table));
    }
    if let Some(table) = value.get("data").and_then(columns_rows) {
        debug!("analytics payload matched nested {{data: {{columns, rows}}}} shape");
        return Some((TableShape::Nested, table));
    }
    if let Some(table) = legacy_rows(value) {
        debug!("analytics payload matched legacy rows-only shape");
        return Some((TableShape::LegacyRows, table));
    }
    None
}

/// Strict decoder for the canonical `{columns, rows}` shape.
fn columns_rows(value: &Value) -> Option<AnalyticsTable> {
    let obj = value.as_object()?;
    let columns: Vec<String> = obj
        .get("columns")?
        .as_array()?
        .iter()
        .map(|c| c.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    let rows = object_rows(obj.get("rows")?)?;
    validate(columns, rows)
}

/// Decoder for `{rows}` without declared columns. The column order is
/// inferred from the first row's key set, preferring hinted category/value
/// keys, falling back to key order (first key = category, second = value).
fn legacy_rows(value: &Value) -> Option<AnalyticsTable> {
    let obj = value.as_object()?;
    if obj.contains_key("columns") {
        return None;
    }
    let rows = object_rows(obj.get("rows")?)?;
    let first = rows.first()?;
    let keys: Vec<String> = first.keys().cloned().collect();
    if keys.len() < 2 {
        return None;
    }

    let category = keys
        .iter()
        .find(|k| name_matches(k, CATEGORY_HINTS))
        .cloned()
        .unwrap_or_else(|| keys[0].clone());
    let value_key = keys
        .iter()
        .find(|k| **k != category && name_matches(k, VALUE_HINTS))
        .cloned()
        .unwrap_or_else(|| {
            keys.iter()
                .find(|k| **k != category)
                .cloned()
                .unwrap_or_else(|| keys[1].clone())
        });

    let mut columns = vec![category.clone(), value_key.clone()];
    columns.extend(
        keys.into_iter()
            .filter(|k| *k != category && *k != value_key),
    );
    validate(columns, rows)
}

fn object_rows(value: &Value) -> Option<Vec<Map<String, Value>>> {
    value
        .as_array()?
        .iter()
        .map(|r| r.as_object().cloned())
        .collect()
}

/// A table is usable only with a non-empty row set, two or more columns, and
/// at least two keys per row.
fn validate(columns: Vec<String>, rows: Vec<Map<String, Value>>) -> Option<AnalyticsTable> {
    let table = AnalyticsTable { columns, rows };
    if !table.is_valid() || table.rows.iter().any(|r| r.len() < 2) {
        return None;
    }
    Some(table)
}

pub(crate) fn name_matches(name: &str, hints: &[&str]) -> bool {
    let lower = name.to_lowercase();
    hints.iter().any(|h| lower.contains(h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical() -> Value {
        json!({
            "columns": ["band", "count"],
            "rows": [
                {"band": "Band 1", "count": 5},
                {"band": "Band 2", "count": 7}
            ]
        })
    }

    #[test]
    fn decodes_canonical_columns_rows() {
        let (shape, table) = decode(&canonical()).unwrap();
        assert_eq!(shape, TableShape::ColumnsRows);
        assert_eq!(table.columns, vec!["band", "count"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn decodes_nested_data_shape() {
        let (shape, table) = decode(&json!({ "data": canonical() })).unwrap();
        assert_eq!(shape, TableShape::Nested);
        assert_eq!(table.columns, vec!["band", "count"]);
    }

    #[test]
    fn infers_columns_from_legacy_rows() {
        let payload = json!({
            "rows": [
                {"jumlah": 12, "grade": "Grade 3"},
                {"jumlah": 4, "grade": "Grade 1"}
            ]
        });
        let (shape, table) = decode(&payload).unwrap();
        assert_eq!(shape, TableShape::LegacyRows);
        // Hinted keys win over raw key order: grade is the category.
        assert_eq!(table.columns, vec!["grade", "jumlah"]);
    }

    #[test]
    fn legacy_rows_fall_back_to_key_order() {
        let payload = json!({
            "rows": [
                {"dept": "Finance", "headcount_share": 10}
            ]
        });
        let (_, table) = decode(&payload).unwrap();
        assert_eq!(table.columns, vec!["dept", "headcount_share"]);
    }

    #[test]
    fn extract_is_consistent_across_shapes() {
        // The same logical table must decode identically from all three shapes.
        let a = extract(&canonical()).unwrap();
        let b = extract(&json!({ "data": canonical() })).unwrap();
        let c = extract(&json!({
            "rows": [
                {"band": "Band 1", "count": 5},
                {"band": "Band 2", "count": 7}
            ]
        }))
        .unwrap();
        assert_eq!(a.columns, b.columns);
        assert_eq!(a.columns, c.columns);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.rows, c.rows);
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(extract(&json!("just text")).is_none());
        assert!(extract(&json!({"columns": ["a", "b"], "rows": []})).is_none());
        assert!(extract(&json!({"columns": ["only_one"], "rows": [{"only_one": 1, "x": 2}]})).is_none());
        assert!(extract(&json!({"rows": [{"single_key": 1}]})).is_none());
        assert!(extract(&json!({"rows": [[1, 2], [3, 4]]})).is_none());
        assert!(extract(&json!(null)).is_none());
    }
}
